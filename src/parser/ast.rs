//! Syntax tree produced by the parser and consumed by the formatter
//!
//! The tree keeps just enough of the source to print it back in house
//! style: type and declarator spellings are kept as token text rather than
//! resolved types, operators are kept as [`TokenKind`]s, and anything the
//! grammar does not model survives as an [`Unparsed`] region holding its
//! verbatim text.
//!
//! Every [`Node`] owns its children exclusively, so dropping the program
//! node drops the whole tree.

use super::lexer::TokenKind;
use std::fmt::Write as _;

/// Source location information for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `// ...`
    Line,
    /// `/* ... */`
    Block,
}

/// A comment attached to a node, text kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub style: CommentStyle,
    pub location: SourceLocation,
}

/// A syntax node plus the formatting metadata the parser attached to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub location: SourceLocation,
    /// Comments on the lines above the node.
    pub leading_comments: Vec<Comment>,
    /// Comments on the same line as the node's last token.
    pub trailing_comments: Vec<Comment>,
    /// At least one blank source line preceded the node.
    pub blank_line_before: bool,
}

/// An ordered list of items plus comments that precede the closing brace
/// (or the end of the file) without any item after them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Body {
    pub items: Vec<Node>,
    pub dangling_comments: Vec<Comment>,
}

impl Body {
    pub fn new(items: Vec<Node>) -> Self {
        Self {
            items,
            dangling_comments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // Top level and declarations
    Program(Body),
    Function(Function),
    VarDecl(VarDecl),
    Struct(Aggregate),
    Union(Aggregate),
    Enum(EnumDef),
    EnumValue {
        name: String,
        value: Option<Box<Node>>,
    },
    Typedef(Typedef),
    FunctionPointer(FunctionPointer),
    Param(Param),
    /// Directive text exactly as written.
    Preprocessor {
        text: String,
    },
    Unparsed(Unparsed),

    // Statements
    Block(Body),
    If {
        condition: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Option<Box<Node>>,
    },
    While {
        condition: Box<Node>,
        body: Box<Node>,
    },
    For {
        init: ForInit,
        condition: Option<Box<Node>>,
        step: Vec<Node>,
        body: Box<Node>,
    },
    DoWhile {
        body: Box<Node>,
        condition: Box<Node>,
    },
    Switch {
        scrutinee: Box<Node>,
        body: Body,
    },
    /// `case x:` or, with no label, `default:`.
    Case {
        label: Option<Box<Node>>,
        statements: Vec<Node>,
    },
    Return {
        value: Option<Box<Node>>,
    },
    Break,
    Continue,
    Goto {
        label: String,
    },
    Label {
        name: String,
    },
    ExprStmt {
        expr: Box<Node>,
    },
    /// A lone `;`.
    Empty,

    // Expressions
    Binary {
        op: TokenKind,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Unary {
        op: TokenKind,
        operand: Box<Node>,
        postfix: bool,
    },
    /// The callee is the first child, arguments follow.
    Call {
        callee: Box<Node>,
        args: Vec<Node>,
    },
    Literal {
        text: String,
    },
    Identifier {
        name: String,
    },
    MemberAccess {
        object: Box<Node>,
        member: String,
        arrow: bool,
    },
    ArrayAccess {
        array: Box<Node>,
        index: Box<Node>,
    },
    Cast {
        type_name: String,
        operand: Box<Node>,
    },
    Sizeof(SizeofOperand),
    Ternary {
        condition: Box<Node>,
        then_expr: Box<Node>,
        else_expr: Box<Node>,
    },
    /// Parentheses written by the author around an expression.
    Grouped {
        inner: Box<Node>,
    },
    InitList {
        elements: Vec<Node>,
    },
    /// A bare type used as an argument, as in `va_arg(ap, int)`.
    TypeName {
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub return_type: Vec<String>,
    pub name: String,
    /// [`NodeKind::Param`] nodes.
    pub params: Vec<Node>,
    /// `None` for a prototype.
    pub body: Option<Box<Node>>,
}

/// One declared name: pointer prefix, name, array suffixes and initializer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Declarator {
    /// `*` tokens and the qualifiers between them, e.g. `["*", "const"]`.
    pub pointer: Vec<String>,
    pub name: String,
    /// Each bracket pair as written, whitespace collapsed: `"[N + 1]"`.
    pub array_suffix: Vec<String>,
    /// Bit-field width of a struct member.
    pub bit_width: Option<Box<Node>>,
    pub init: Option<Box<Node>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub type_tokens: Vec<String>,
    pub declarator: Declarator,
    /// Comma-chained declarators sharing `type_tokens`.
    pub siblings: Vec<Declarator>,
}

impl VarDecl {
    /// Every declarator, primary first.
    pub fn declarators(&self) -> impl Iterator<Item = &Declarator> {
        std::iter::once(&self.declarator).chain(self.siblings.iter())
    }
}

/// `struct` or `union` definition / forward declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub tag: Option<String>,
    /// `None` for `struct tag;`.
    pub members: Option<Body>,
    /// Variables declared after the closing brace.
    pub instances: Vec<Declarator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub tag: Option<String>,
    /// [`NodeKind::EnumValue`] entries; `None` for `enum tag;`.
    pub values: Option<Body>,
    pub instances: Vec<Declarator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Typedef {
    pub alias: String,
    /// Stars between the target type and the alias.
    pub pointer: Vec<String>,
    pub target: TypedefTarget,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedefTarget {
    /// `typedef struct {...} name;` and friends: a Struct/Union/Enum node.
    Aggregate(Box<Node>),
    /// `typedef int (*name)(int);`, the alias being the pointer's name.
    FunctionPointer(FunctionPointer),
    /// `typedef unsigned long name[4];`
    Plain {
        type_tokens: Vec<String>,
        array_suffix: Vec<String>,
    },
}

/// `ret (*name)(params)`, as a declaration, parameter or typedef target.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionPointer {
    pub return_type: Vec<String>,
    pub pointer: Vec<String>,
    pub name: String,
    pub params: Vec<Node>,
    pub init: Option<Box<Node>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Named {
        type_tokens: Vec<String>,
        name: Option<String>,
        array_suffix: Vec<String>,
    },
    FunctionPointer(FunctionPointer),
    /// `...`
    Variadic,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    Decl(Box<Node>),
    /// Possibly empty comma list.
    Exprs(Vec<Node>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SizeofOperand {
    Type(String),
    Expr(Box<Node>),
}

/// Verbatim text of a region the grammar could not model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unparsed {
    pub text: String,
    pub start_line: usize,
    pub end_line: usize,
}

/// Spell a run of type tokens the house way: words separated by single
/// spaces, stars hugging whatever follows them.
///
/// `["struct", "node", "*", "*"]` becomes `struct node **` and
/// `["char", "*", "const"]` becomes `char *const`.
pub fn join_type_tokens<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut out = String::new();
    for token in tokens {
        let token = token.as_ref();
        let needs_space = !out.is_empty()
            && match token {
                "*" => !out.ends_with('*'),
                "[" | "]" => false,
                _ => !out.ends_with('*') && !out.ends_with('['),
            };
        if needs_space {
            out.push(' ');
        }
        out.push_str(token);
    }
    out
}

impl Node {
    pub fn new(kind: NodeKind, location: SourceLocation) -> Self {
        Self {
            kind,
            location,
            leading_comments: Vec::new(),
            trailing_comments: Vec::new(),
            blank_line_before: false,
        }
    }

    /// Upper-case kind name, as shown by the tree dump.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Program(_) => "PROGRAM",
            NodeKind::Function(_) => "FUNCTION",
            NodeKind::VarDecl(_) => "VAR_DECL",
            NodeKind::Struct(_) => "STRUCT",
            NodeKind::Union(_) => "UNION",
            NodeKind::Enum(_) => "ENUM",
            NodeKind::EnumValue { .. } => "ENUM_VALUE",
            NodeKind::Typedef(_) => "TYPEDEF",
            NodeKind::FunctionPointer(_) => "FUNCTION_POINTER",
            NodeKind::Param(_) => "PARAM",
            NodeKind::Preprocessor { .. } => "PREPROCESSOR",
            NodeKind::Unparsed(_) => "UNPARSED",
            NodeKind::Block(_) => "BLOCK",
            NodeKind::If { .. } => "IF",
            NodeKind::While { .. } => "WHILE",
            NodeKind::For { .. } => "FOR",
            NodeKind::DoWhile { .. } => "DO_WHILE",
            NodeKind::Switch { .. } => "SWITCH",
            NodeKind::Case { .. } => "CASE",
            NodeKind::Return { .. } => "RETURN",
            NodeKind::Break => "BREAK",
            NodeKind::Continue => "CONTINUE",
            NodeKind::Goto { .. } => "GOTO",
            NodeKind::Label { .. } => "LABEL",
            NodeKind::ExprStmt { .. } => "EXPR_STMT",
            NodeKind::Empty => "EMPTY",
            NodeKind::Binary { .. } => "BINARY_OP",
            NodeKind::Unary { .. } => "UNARY_OP",
            NodeKind::Call { .. } => "CALL",
            NodeKind::Literal { .. } => "LITERAL",
            NodeKind::Identifier { .. } => "IDENTIFIER",
            NodeKind::MemberAccess { .. } => "MEMBER_ACCESS",
            NodeKind::ArrayAccess { .. } => "ARRAY_ACCESS",
            NodeKind::Cast { .. } => "CAST",
            NodeKind::Sizeof(_) => "SIZEOF",
            NodeKind::Ternary { .. } => "TERNARY",
            NodeKind::Grouped { .. } => "GROUPED",
            NodeKind::InitList { .. } => "INIT_LIST",
            NodeKind::TypeName { .. } => "TYPE_EXPR",
        }
    }

    /// Name or spelling associated with the node, if any.
    pub fn label(&self) -> Option<String> {
        match &self.kind {
            NodeKind::Function(f) => Some(f.name.clone()),
            NodeKind::VarDecl(v) => Some(v.declarator.name.clone()),
            NodeKind::Struct(a) | NodeKind::Union(a) => a.tag.clone(),
            NodeKind::Enum(e) => e.tag.clone(),
            NodeKind::EnumValue { name, .. } => Some(name.clone()),
            NodeKind::Typedef(t) => Some(t.alias.clone()),
            NodeKind::FunctionPointer(fp) => Some(fp.name.clone()),
            NodeKind::Param(Param::Named { name, .. }) => name.clone(),
            NodeKind::Param(Param::FunctionPointer(fp)) => Some(fp.name.clone()),
            NodeKind::Param(Param::Variadic) => Some("...".to_string()),
            NodeKind::Goto { label } => Some(label.clone()),
            NodeKind::Label { name } => Some(name.clone()),
            NodeKind::Binary { op, .. } | NodeKind::Unary { op, .. } => {
                op.spelling().map(str::to_string)
            }
            NodeKind::Literal { text } | NodeKind::TypeName { text } => Some(text.clone()),
            NodeKind::Identifier { name } => Some(name.clone()),
            NodeKind::MemberAccess { member, .. } => Some(member.clone()),
            NodeKind::Cast { type_name, .. } => Some(type_name.clone()),
            NodeKind::Sizeof(SizeofOperand::Type(text)) => Some(text.clone()),
            _ => None,
        }
    }

    /// Child nodes in source order. Function parameters live in the
    /// function payload and are not listed here.
    pub fn children(&self) -> Vec<&Node> {
        fn boxed(node: &Option<Box<Node>>) -> Option<&Node> {
            node.as_deref()
        }

        match &self.kind {
            NodeKind::Program(body) | NodeKind::Block(body) => body.items.iter().collect(),
            NodeKind::Function(f) => boxed(&f.body).into_iter().collect(),
            NodeKind::VarDecl(v) => v.declarators().filter_map(|d| boxed(&d.init)).collect(),
            NodeKind::Struct(a) | NodeKind::Union(a) => a
                .members
                .iter()
                .flat_map(|body| body.items.iter())
                .collect(),
            NodeKind::Enum(e) => e.values.iter().flat_map(|body| body.items.iter()).collect(),
            NodeKind::EnumValue { value, .. } => boxed(value).into_iter().collect(),
            NodeKind::Typedef(t) => match &t.target {
                TypedefTarget::Aggregate(node) => vec![node.as_ref()],
                _ => Vec::new(),
            },
            NodeKind::FunctionPointer(fp) => boxed(&fp.init).into_iter().collect(),
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let mut out = vec![condition.as_ref(), then_branch.as_ref()];
                out.extend(boxed(else_branch));
                out
            }
            NodeKind::While { condition, body } => vec![condition.as_ref(), body.as_ref()],
            NodeKind::For {
                init,
                condition,
                step,
                body,
            } => {
                let mut out: Vec<&Node> = match init {
                    ForInit::Decl(decl) => vec![decl.as_ref()],
                    ForInit::Exprs(exprs) => exprs.iter().collect(),
                };
                out.extend(boxed(condition));
                out.extend(step.iter());
                out.push(body.as_ref());
                out
            }
            NodeKind::DoWhile { body, condition } => vec![body.as_ref(), condition.as_ref()],
            NodeKind::Switch { scrutinee, body } => {
                let mut out = vec![scrutinee.as_ref()];
                out.extend(body.items.iter());
                out
            }
            NodeKind::Case { label, statements } => {
                let mut out: Vec<&Node> = boxed(label).into_iter().collect();
                out.extend(statements.iter());
                out
            }
            NodeKind::Return { value } => boxed(value).into_iter().collect(),
            NodeKind::ExprStmt { expr } => vec![expr.as_ref()],
            NodeKind::Binary { lhs, rhs, .. } => vec![lhs.as_ref(), rhs.as_ref()],
            NodeKind::Unary { operand, .. } => vec![operand.as_ref()],
            NodeKind::Call { callee, args } => {
                let mut out = vec![callee.as_ref()];
                out.extend(args.iter());
                out
            }
            NodeKind::MemberAccess { object, .. } => vec![object.as_ref()],
            NodeKind::ArrayAccess { array, index } => vec![array.as_ref(), index.as_ref()],
            NodeKind::Cast { operand, .. } => vec![operand.as_ref()],
            NodeKind::Sizeof(SizeofOperand::Expr(expr)) => vec![expr.as_ref()],
            NodeKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => vec![condition.as_ref(), then_expr.as_ref(), else_expr.as_ref()],
            NodeKind::Grouped { inner } => vec![inner.as_ref()],
            NodeKind::InitList { elements } => elements.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Declarations grouped before the logic of a block.
    pub fn is_declaration(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::VarDecl(_)
                | NodeKind::FunctionPointer(_)
                | NodeKind::Typedef(_)
                | NodeKind::Struct(_)
                | NodeKind::Union(_)
                | NodeKind::Enum(_)
        )
    }
}

/// Indented dump of the tree: one node per line with its kind, name and
/// child count.
pub fn dump_tree(root: &Node) -> String {
    fn walk(node: &Node, depth: usize, out: &mut String) {
        let children = node.children();
        let _ = write!(out, "{}{}", "  ".repeat(depth), node.kind_name());
        if let Some(label) = node.label() {
            let _ = write!(out, " '{label}'");
        }
        if let NodeKind::Unparsed(raw) = &node.kind {
            let _ = write!(out, " (lines {}-{})", raw.start_line, raw.end_line);
        }
        if !children.is_empty() {
            let _ = write!(out, " [{} children]", children.len());
        }
        out.push('\n');
        for child in children {
            walk(child, depth + 1, out);
        }
    }

    let mut out = String::new();
    walk(root, 0, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Node {
        Node::new(
            NodeKind::Identifier {
                name: name.to_string(),
            },
            SourceLocation::new(1, 1),
        )
    }

    #[test]
    fn test_call_lists_callee_first() {
        let call = Node::new(
            NodeKind::Call {
                callee: Box::new(ident("f")),
                args: vec![ident("a"), ident("b")],
            },
            SourceLocation::default(),
        );

        let names: Vec<_> = call.children().iter().filter_map(|c| c.label()).collect();
        assert_eq!(names, vec!["f", "a", "b"]);
    }

    #[test]
    fn test_dump_tree() {
        let program = Node::new(
            NodeKind::Program(Body::new(vec![Node::new(
                NodeKind::ExprStmt {
                    expr: Box::new(ident("x")),
                },
                SourceLocation::new(1, 1),
            )])),
            SourceLocation::new(1, 1),
        );

        assert_eq!(
            dump_tree(&program),
            "PROGRAM [1 children]\n  EXPR_STMT [1 children]\n    IDENTIFIER 'x'\n"
        );
    }

    #[test]
    fn test_join_type_tokens() {
        assert_eq!(join_type_tokens(&["struct", "node", "*", "*"]), "struct node **");
        assert_eq!(join_type_tokens(&["char", "*", "const"]), "char *const");
        assert_eq!(join_type_tokens(&["unsigned", "long", "int"]), "unsigned long int");
        assert_eq!(join_type_tokens(&["int", "[", "3", "]"]), "int[3]");
        assert_eq!(join_type_tokens::<&str>(&[]), "");
    }

    #[test]
    fn test_declaration_kinds() {
        let decl = Node::new(
            NodeKind::VarDecl(VarDecl {
                type_tokens: vec!["int".to_string()],
                declarator: Declarator {
                    name: "x".to_string(),
                    ..Declarator::default()
                },
                siblings: Vec::new(),
            }),
            SourceLocation::default(),
        );
        assert!(decl.is_declaration());
        assert!(!ident("x").is_declaration());
    }
}
