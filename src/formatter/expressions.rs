//! Expression and declarator rendering
//!
//! Everything here is a pure function from tree to single-line text. Binary
//! operators get one space on each side, unary operators hug their operand,
//! and parentheses appear only where the tree has a `Grouped`, `Cast` or
//! call node.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;

/// Render an expression node on one line.
pub fn expr_text(node: &Node) -> String {
    match &node.kind {
        NodeKind::Binary {
            op: TokenKind::Comma,
            lhs,
            rhs,
        } => format!("{}, {}", expr_text(lhs), expr_text(rhs)),
        NodeKind::Binary { op, lhs, rhs } => format!(
            "{} {} {}",
            expr_text(lhs),
            op.spelling().unwrap_or_default(),
            expr_text(rhs)
        ),
        NodeKind::Unary {
            op,
            operand,
            postfix: true,
        } => format!("{}{}", expr_text(operand), op.spelling().unwrap_or_default()),
        NodeKind::Unary { op, operand, .. } => {
            let op = op.spelling().unwrap_or_default();
            let operand = expr_text(operand);
            // `- -x` must not collapse into `--x`, nor `& &x` into `&&x`.
            if op.len() == 1 && "+-&".contains(op) && operand.starts_with(op) {
                format!("{op} {operand}")
            } else {
                format!("{op}{operand}")
            }
        }
        NodeKind::Call { callee, args } => {
            format!("{}({})", expr_text(callee), list_text(args))
        }
        NodeKind::Literal { text } | NodeKind::TypeName { text } => text.clone(),
        NodeKind::Identifier { name } => name.clone(),
        NodeKind::MemberAccess {
            object,
            member,
            arrow,
        } => {
            let access = if *arrow { "->" } else { "." };
            format!("{}{access}{member}", expr_text(object))
        }
        NodeKind::ArrayAccess { array, index } => {
            format!("{}[{}]", expr_text(array), expr_text(index))
        }
        NodeKind::Cast { type_name, operand } => {
            format!("({type_name}){}", expr_text(operand))
        }
        NodeKind::Sizeof(SizeofOperand::Type(type_name)) => format!("sizeof({type_name})"),
        NodeKind::Sizeof(SizeofOperand::Expr(operand)) => match operand.kind {
            NodeKind::Grouped { .. } => format!("sizeof{}", expr_text(operand)),
            _ => format!("sizeof {}", expr_text(operand)),
        },
        NodeKind::Ternary {
            condition,
            then_expr,
            else_expr,
        } => format!(
            "{} ? {} : {}",
            expr_text(condition),
            expr_text(then_expr),
            expr_text(else_expr)
        ),
        NodeKind::Grouped { inner } => format!("({})", expr_text(inner)),
        NodeKind::InitList { elements } => format!("{{{}}}", list_text(elements)),
        NodeKind::Unparsed(raw) => raw.text.clone(),
        _ => String::new(),
    }
}

/// Comma-separated expressions.
pub fn list_text(nodes: &[Node]) -> String {
    nodes.iter().map(expr_text).collect::<Vec<_>>().join(", ")
}

/// `*name`, `**const name` or just `name`.
pub fn pointer_and_name(pointer: &[String], name: &str) -> String {
    let pointer = join_type_tokens(pointer);
    if pointer.is_empty() || pointer.ends_with('*') || name.is_empty() {
        format!("{pointer}{name}")
    } else {
        format!("{pointer} {name}")
    }
}

/// A type followed by a name: `char *s`, `unsigned long n`.
pub fn typed_name(type_text: &str, name: &str) -> String {
    if type_text.is_empty() {
        name.to_string()
    } else if name.is_empty() || type_text.ends_with('*') {
        format!("{type_text}{name}")
    } else {
        format!("{type_text} {name}")
    }
}

/// Pointer, name, array suffixes, bit width and initializer.
pub fn declarator_text(declarator: &Declarator) -> String {
    let mut text = pointer_and_name(&declarator.pointer, &declarator.name);
    for suffix in &declarator.array_suffix {
        text.push_str(suffix);
    }
    if let Some(width) = &declarator.bit_width {
        text.push_str(" : ");
        text.push_str(&expr_text(width));
    }
    if let Some(init) = &declarator.init {
        text.push_str(" = ");
        text.push_str(&expr_text(init));
    }
    text
}

/// A variable declaration without its terminating `;`.
pub fn var_decl_text(decl: &VarDecl) -> String {
    let declarators: Vec<_> = decl.declarators().map(declarator_text).collect();
    typed_name(&join_type_tokens(&decl.type_tokens), &declarators.join(", "))
}

/// `ret (*name)(params)` plus any initializer.
pub fn function_pointer_text(pointer: &FunctionPointer) -> String {
    let mut text = format!(
        "{} ({})({})",
        join_type_tokens(&pointer.return_type),
        pointer_and_name(&pointer.pointer, &pointer.name),
        params_text(&pointer.params)
    );
    if let Some(init) = &pointer.init {
        text.push_str(" = ");
        text.push_str(&expr_text(init));
    }
    text
}

/// Parameter list contents, without the parentheses.
pub fn params_text(params: &[Node]) -> String {
    params
        .iter()
        .map(|param| match &param.kind {
            NodeKind::Param(Param::Named {
                type_tokens,
                name,
                array_suffix,
            }) => {
                let mut text = typed_name(
                    &join_type_tokens(type_tokens),
                    name.as_deref().unwrap_or_default(),
                );
                text.push_str(&array_suffix.concat());
                text
            }
            NodeKind::Param(Param::FunctionPointer(pointer)) => function_pointer_text(pointer),
            NodeKind::Param(Param::Variadic) => "...".to_string(),
            _ => String::new(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Comment text as printed: line comments become block comments.
pub fn comment_text(comment: &Comment) -> String {
    match comment.style {
        CommentStyle::Block => comment.text.clone(),
        CommentStyle::Line => {
            let body = comment.text.trim_start_matches('/').trim();
            if body.is_empty() {
                "/* */".to_string()
            } else {
                format!("/* {} */", body.replace("*/", "* /"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse::Parser;

    fn render(source: &str) -> String {
        let mut parser = Parser::new(source);
        let expr = parser
            .parse_comma_expression()
            .expect("expression parses");
        expr_text(&expr)
    }

    #[test]
    fn test_operator_spacing() {
        assert_eq!(render("a+b*c"), "a + b * c");
        assert_eq!(render("x=y<<2|z"), "x = y << 2 | z");
        assert_eq!(render("!done&&i<n"), "!done && i < n");
        assert_eq!(render("a?b:c"), "a ? b : c");
        assert_eq!(render("i=0,j=1"), "i = 0, j = 1");
    }

    #[test]
    fn test_unary_and_postfix() {
        assert_eq!(render("- -x"), "- -x");
        assert_eq!(render("-(-x)"), "-(-x)");
        assert_eq!(render("*p++"), "*p++");
        assert_eq!(render("& &x"), "& &x");
        assert_eq!(render("~ mask"), "~mask");
    }

    #[test]
    fn test_postfix_chains_and_calls() {
        assert_eq!(render("f( a,b )"), "f(a, b)");
        assert_eq!(render("list -> head . next [ i ]"), "list->head.next[i]");
        assert_eq!(render("g()"), "g()");
    }

    #[test]
    fn test_casts_and_sizeof() {
        assert_eq!(render("(char*)buf"), "(char *)buf");
        assert_eq!(render("sizeof(struct node)"), "sizeof(struct node)");
        assert_eq!(render("sizeof x"), "sizeof x");
        assert_eq!(render("sizeof(x)"), "sizeof(x)");
    }

    #[test]
    fn test_declarators() {
        let declarator = Declarator {
            pointer: vec!["*".to_string(), "const".to_string()],
            name: "p".to_string(),
            array_suffix: vec!["[4]".to_string()],
            ..Declarator::default()
        };
        assert_eq!(declarator_text(&declarator), "*const p[4]");
        assert_eq!(typed_name("char *", "s"), "char *s");
        assert_eq!(typed_name("int", "n"), "int n");
        assert_eq!(typed_name("void", ""), "void");
    }

    #[test]
    fn test_line_comment_conversion() {
        let comment = |text: &str, style| Comment {
            text: text.to_string(),
            style,
            location: SourceLocation::default(),
        };
        assert_eq!(
            comment_text(&comment("// line comment", CommentStyle::Line)),
            "/* line comment */"
        );
        assert_eq!(
            comment_text(&comment("// ends */ early", CommentStyle::Line)),
            "/* ends * / early */"
        );
        assert_eq!(comment_text(&comment("//", CommentStyle::Line)), "/* */");
        assert_eq!(
            comment_text(&comment("/* kept */", CommentStyle::Block)),
            "/* kept */"
        );
    }
}
