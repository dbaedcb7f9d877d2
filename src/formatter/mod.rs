//! Pretty-printer for the syntax tree
//!
//! [`Formatter`] walks a [`Node`] tree and writes the house style:
//!
//! - one tab per nesting level
//! - opening braces on their own line at the parent indent (`do {` excepted)
//! - `return (expr);`
//! - line comments rewritten as block comments
//! - preprocessor lines and unparsed regions reproduced verbatim
//! - at most one blank line between items, with forced blank lines between
//!   top-level groups and after a block's leading declarations
//!
//! Formatting cannot fail. The formatter only tracks the output column so it
//! can report lines that run past [`FormatConfig::max_line_length`].
//!
//! # Module Organization
//!
//! - This module: output bookkeeping, blank-line policy, top-level items,
//!   structs, unions, enums and typedefs
//! - `statements`: blocks and control flow
//! - `expressions`: pure one-line rendering of expressions and declarators

mod expressions;
mod statements;

pub use expressions::{comment_text, expr_text};

use crate::config::FormatConfig;
use crate::parser::ast::*;
use expressions::{
    declarator_text, function_pointer_text, params_text, pointer_and_name, typed_name,
    var_decl_text,
};

/// Formatted program text plus diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    pub text: String,
    /// 1-based output line numbers wider than the configured limit.
    pub overlong_lines: Vec<usize>,
}

/// Format a tree with the default configuration.
pub fn format(root: &Node) -> String {
    Formatter::new(&FormatConfig::default()).format_program(root).text
}

/// Top-level grouping used to decide forced blank lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Preprocessor,
    FunctionDef,
    Prototype,
    VarDecl,
    SimpleTypedef,
    Aggregate,
    Unparsed,
    Other,
}

impl Group {
    fn of(node: &Node) -> Self {
        match &node.kind {
            NodeKind::Preprocessor { .. } => Group::Preprocessor,
            NodeKind::Function(f) if f.body.is_some() => Group::FunctionDef,
            NodeKind::Function(_) => Group::Prototype,
            NodeKind::VarDecl(_) | NodeKind::FunctionPointer(_) => Group::VarDecl,
            NodeKind::Typedef(t) => match &t.target {
                TypedefTarget::Aggregate(inner) if has_body(inner) => Group::Aggregate,
                _ => Group::SimpleTypedef,
            },
            NodeKind::Struct(_) | NodeKind::Union(_) | NodeKind::Enum(_) => {
                if has_body(node) {
                    Group::Aggregate
                } else {
                    Group::SimpleTypedef
                }
            }
            NodeKind::Unparsed(_) => Group::Unparsed,
            _ => Group::Other,
        }
    }

    /// Groups that always stand apart from their neighbours.
    fn is_block(self) -> bool {
        matches!(self, Group::FunctionDef | Group::Aggregate)
    }
}

fn has_body(node: &Node) -> bool {
    match &node.kind {
        NodeKind::Struct(a) | NodeKind::Union(a) => a.members.is_some(),
        NodeKind::Enum(e) => e.values.is_some(),
        _ => false,
    }
}

/// Whether a blank line separates two adjacent top-level items.
fn top_level_blank(prev: &Node, next: &Node) -> bool {
    let (before, after) = (Group::of(prev), Group::of(next));

    if before.is_block() || after.is_block() {
        return true;
    }
    if before == Group::Preprocessor && after != Group::Preprocessor {
        return true;
    }
    if before != after
        && (matches!(
            before,
            Group::VarDecl | Group::SimpleTypedef | Group::Prototype
        ) || matches!(after, Group::Prototype | Group::SimpleTypedef))
    {
        return true;
    }
    next.blank_line_before
}

/// Output context threaded through the recursive print calls.
pub struct Formatter<'a> {
    config: &'a FormatConfig,
    out: String,
    indent: usize,
    column: usize,
    line: usize,
    overlong_lines: Vec<usize>,
}

impl<'a> Formatter<'a> {
    pub fn new(config: &'a FormatConfig) -> Self {
        Self {
            config,
            out: String::new(),
            indent: 0,
            column: 0,
            line: 1,
            overlong_lines: Vec::new(),
        }
    }

    /// Format a `Program` node. Any other node is printed as a single item.
    pub fn format_program(mut self, root: &Node) -> Formatted {
        match &root.kind {
            NodeKind::Program(body) => {
                let mut prev: Option<&Node> = None;
                for item in &body.items {
                    if prev.is_some_and(|p| top_level_blank(p, item)) {
                        self.blank_line();
                    }
                    self.format_item(item);
                    prev = Some(item);
                }
                for comment in &body.dangling_comments {
                    self.comment_line(comment);
                }
            }
            _ => self.format_item(root),
        }

        if !self.overlong_lines.is_empty() {
            tracing::debug!(lines = ?self.overlong_lines, "lines exceed the length limit");
        }
        Formatted {
            text: self.out,
            overlong_lines: self.overlong_lines,
        }
    }

    // ===== Output bookkeeping =====

    /// Append text, tracking the display column. Embedded newlines end lines.
    pub(crate) fn write(&mut self, text: &str) {
        for (i, piece) in text.split('\n').enumerate() {
            if i > 0 {
                self.end_line();
            }
            for ch in piece.chars() {
                self.column = self.config.advance_column(self.column, ch);
            }
            self.out.push_str(piece);
        }
    }

    /// Indentation for a new line.
    pub(crate) fn start_line(&mut self) {
        for _ in 0..self.indent {
            self.write("\t");
        }
    }

    pub(crate) fn end_line(&mut self) {
        if self.column > self.config.max_line_length {
            self.overlong_lines.push(self.line);
        }
        self.out.push('\n');
        self.line += 1;
        self.column = 0;
    }

    pub(crate) fn blank_line(&mut self) {
        self.end_line();
    }

    /// A full line at the current indent.
    pub(crate) fn line(&mut self, text: &str) {
        self.start_line();
        self.write(text);
        self.end_line();
    }

    /// Multi-line text: first line at the current indent, the rest verbatim.
    pub(crate) fn write_verbatim(&mut self, text: &str) {
        self.start_line();
        self.write(text.trim_end());
    }

    pub(crate) fn comment_line(&mut self, comment: &Comment) {
        self.write_verbatim(&comment_text(comment));
        self.end_line();
    }

    // ===== Items =====

    /// Leading comments, the node, its trailing comments and a newline.
    pub(crate) fn format_item(&mut self, node: &Node) {
        self.format_item_open(node);
        self.end_line();
    }

    /// Like [`Formatter::format_item`] but leaves the last line open.
    pub(crate) fn format_item_open(&mut self, node: &Node) {
        for comment in &node.leading_comments {
            self.comment_line(comment);
        }
        self.format_node(node);
        for comment in &node.trailing_comments {
            self.write(" ");
            self.write(&comment_text(comment));
        }
    }

    /// Print one node starting at the beginning of a line and stopping at
    /// the end of its last line.
    pub(crate) fn format_node(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::Program(_) => {}
            NodeKind::Function(function) => self.format_function(function),
            NodeKind::VarDecl(decl) => {
                self.start_line();
                self.write(&var_decl_text(decl));
                self.write(";");
            }
            NodeKind::FunctionPointer(pointer) => {
                self.start_line();
                self.write(&function_pointer_text(pointer));
                self.write(";");
            }
            NodeKind::Struct(_) | NodeKind::Union(_) | NodeKind::Enum(_) => {
                self.start_line();
                self.format_tag_body(node);
                self.write_instances(node);
                self.write(";");
            }
            NodeKind::Typedef(typedef) => self.format_typedef(typedef),
            NodeKind::EnumValue { name, value } => {
                self.start_line();
                self.write(name);
                if let Some(value) = value {
                    self.write(" = ");
                    self.write(&expr_text(value));
                }
            }
            NodeKind::Param(_) => {
                self.start_line();
                self.write(&params_text(std::slice::from_ref(node)));
            }
            NodeKind::Preprocessor { text } => self.write(text),
            NodeKind::Unparsed(raw) => self.write_verbatim(&raw.text),
            _ => self.format_statement(node),
        }
    }

    fn format_function(&mut self, function: &Function) {
        self.start_line();
        let head = typed_name(&join_type_tokens(&function.return_type), &function.name);
        self.write(&format!("{head}({})", params_text(&function.params)));

        match &function.body {
            Some(body) => {
                self.end_line();
                self.format_block(body);
            }
            None => self.write(";"),
        }
    }

    fn format_typedef(&mut self, typedef: &Typedef) {
        self.start_line();
        self.write("typedef ");
        match &typedef.target {
            TypedefTarget::Aggregate(inner) => {
                self.format_tag_body(inner);
                self.write(" ");
                self.write(&pointer_and_name(&typedef.pointer, &typedef.alias));
            }
            TypedefTarget::FunctionPointer(pointer) => {
                self.write(&function_pointer_text(pointer));
            }
            TypedefTarget::Plain {
                type_tokens,
                array_suffix,
            } => {
                let name = pointer_and_name(&typedef.pointer, &typedef.alias);
                self.write(&typed_name(&join_type_tokens(type_tokens), &name));
                self.write(&array_suffix.concat());
            }
        }
        self.write(";");
    }

    /// `struct tag`, then the braced body if there is one. The cursor is
    /// already on the first line; it is left after the closing brace.
    fn format_tag_body(&mut self, node: &Node) {
        let (keyword, tag) = match &node.kind {
            NodeKind::Struct(a) => ("struct", &a.tag),
            NodeKind::Union(a) => ("union", &a.tag),
            NodeKind::Enum(e) => ("enum", &e.tag),
            _ => return,
        };
        self.write(keyword);
        if let Some(tag) = tag {
            self.write(" ");
            self.write(tag);
        }

        match &node.kind {
            NodeKind::Struct(Aggregate {
                members: Some(body),
                ..
            })
            | NodeKind::Union(Aggregate {
                members: Some(body),
                ..
            }) => {
                self.end_line();
                self.line("{");
                self.indent += 1;
                self.format_body_items(body);
                self.indent -= 1;
                self.start_line();
                self.write("}");
            }
            NodeKind::Enum(EnumDef {
                values: Some(body), ..
            }) => {
                self.end_line();
                self.line("{");
                self.indent += 1;
                self.format_enum_values(body);
                self.indent -= 1;
                self.start_line();
                self.write("}");
            }
            _ => {}
        }
    }

    fn write_instances(&mut self, node: &Node) {
        let instances = match &node.kind {
            NodeKind::Struct(a) | NodeKind::Union(a) => &a.instances,
            NodeKind::Enum(e) => &e.instances,
            _ => return,
        };
        if !instances.is_empty() {
            let names: Vec<_> = instances.iter().map(declarator_text).collect();
            self.write(" ");
            self.write(&names.join(", "));
        }
    }

    /// One value per line, comma after every value but the last.
    fn format_enum_values(&mut self, body: &Body) {
        let count = body.items.len();
        for (i, value) in body.items.iter().enumerate() {
            if i > 0 && value.blank_line_before {
                self.blank_line();
            }
            for comment in &value.leading_comments {
                self.comment_line(comment);
            }
            self.format_node(value);
            if i + 1 < count && matches!(value.kind, NodeKind::EnumValue { .. }) {
                self.write(",");
            }
            for comment in &value.trailing_comments {
                self.write(" ");
                self.write(&comment_text(comment));
            }
            self.end_line();
        }
        for comment in &body.dangling_comments {
            self.comment_line(comment);
        }
    }

    /// Items of a struct/union body or switch: the author's blank lines are
    /// kept, except before the first item.
    pub(crate) fn format_body_items(&mut self, body: &Body) {
        for (i, item) in body.items.iter().enumerate() {
            if i > 0 && item.blank_line_before {
                self.blank_line();
            }
            self.format_item(item);
        }
        for comment in &body.dangling_comments {
            self.comment_line(comment);
        }
    }
}
