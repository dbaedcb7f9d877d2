//! Statement printing
//!
//! Blocks put their braces on lines of their own at the enclosing indent.
//! A control statement whose body is not a block gets the body on the next
//! line, one level deeper. `case` labels sit at the `switch` indent and
//! ordinary labels one level out from their statements.

use super::expressions::{expr_text, function_pointer_text, list_text, var_decl_text};
use super::Formatter;
use crate::parser::ast::*;

impl Formatter<'_> {
    pub(super) fn format_statement(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::Block(_) => self.format_block(node),
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.start_line();
                self.format_if(condition, then_branch, else_branch.as_deref());
            }
            NodeKind::While { condition, body } => {
                self.start_line();
                self.write(&format!("while ({})", expr_text(condition)));
                self.format_substatement(body);
            }
            NodeKind::For {
                init,
                condition,
                step,
                body,
            } => {
                self.start_line();
                self.write(&for_header(init, condition.as_deref(), step));
                self.format_substatement(body);
            }
            NodeKind::DoWhile { body, condition } => self.format_do_while(body, condition),
            NodeKind::Switch { scrutinee, body } => self.format_switch(scrutinee, body),
            NodeKind::Case { label, statements } => self.format_case(label.as_deref(), statements),
            NodeKind::Return { value } => {
                self.start_line();
                match value.as_deref() {
                    None => self.write("return;"),
                    Some(value) if matches!(value.kind, NodeKind::Grouped { .. }) => {
                        self.write(&format!("return {};", expr_text(value)));
                    }
                    Some(value) => self.write(&format!("return ({});", expr_text(value))),
                }
            }
            NodeKind::Break => {
                self.start_line();
                self.write("break;");
            }
            NodeKind::Continue => {
                self.start_line();
                self.write("continue;");
            }
            NodeKind::Goto { label } => {
                self.start_line();
                self.write(&format!("goto {label};"));
            }
            NodeKind::Label { name } => {
                let indent = self.indent;
                self.indent = indent.saturating_sub(1);
                self.start_line();
                self.indent = indent;
                self.write(&format!("{name}:"));
            }
            NodeKind::ExprStmt { expr } => {
                self.start_line();
                self.write(&expr_text(expr));
                self.write(";");
            }
            NodeKind::Empty => {
                self.start_line();
                self.write(";");
            }
            _ => {
                // Bare expression nodes only reach here from callers
                // formatting a lone node.
                self.start_line();
                self.write(&expr_text(node));
            }
        }
    }

    /// `{`, the block's items one level deeper, then `}` left open.
    pub(super) fn format_block(&mut self, node: &Node) {
        self.line("{");
        self.indent += 1;
        if let NodeKind::Block(body) = &node.kind {
            self.format_block_items(body);
        }
        self.indent -= 1;
        self.start_line();
        self.write("}");
    }

    /// A run of leading declarations is followed by exactly one blank line.
    /// The author's blank lines count only after that point.
    fn format_block_items(&mut self, body: &Body) {
        let mut in_declarations = body.items.first().is_some_and(Node::is_declaration);

        for (i, item) in body.items.iter().enumerate() {
            let blank = if in_declarations {
                if item.is_declaration() {
                    false
                } else {
                    in_declarations = false;
                    true
                }
            } else {
                i > 0 && item.blank_line_before
            };

            if blank {
                self.blank_line();
            }
            self.format_item(item);
        }

        for comment in &body.dangling_comments {
            self.comment_line(comment);
        }
    }

    /// Body of a control statement, starting on the next line.
    fn format_substatement(&mut self, body: &Node) {
        self.end_line();
        if matches!(body.kind, NodeKind::Block(_)) {
            self.format_item_open(body);
        } else {
            self.indent += 1;
            self.format_item_open(body);
            self.indent -= 1;
        }
    }

    fn format_if(&mut self, condition: &Node, then_branch: &Node, else_branch: Option<&Node>) {
        self.write(&format!("if ({})", expr_text(condition)));
        self.format_substatement(then_branch);

        let Some(else_branch) = else_branch else {
            return;
        };
        self.end_line();
        self.start_line();
        self.write("else");
        match &else_branch.kind {
            NodeKind::If {
                condition,
                then_branch,
                else_branch: nested,
            } if else_branch.leading_comments.is_empty() => {
                self.write(" ");
                self.format_if(condition, then_branch, nested.as_deref());
            }
            _ => self.format_substatement(else_branch),
        }
    }

    fn format_do_while(&mut self, body: &Node, condition: &Node) {
        self.start_line();
        self.write("do");

        match &body.kind {
            NodeKind::Block(items)
                if body.leading_comments.is_empty() && body.trailing_comments.is_empty() =>
            {
                self.write(" {");
                self.end_line();
                self.indent += 1;
                self.format_block_items(items);
                self.indent -= 1;
                self.start_line();
                self.write("} ");
            }
            _ => {
                self.format_substatement(body);
                self.end_line();
                self.start_line();
            }
        }
        self.write(&format!("while ({});", expr_text(condition)));
    }

    fn format_switch(&mut self, scrutinee: &Node, body: &Body) {
        self.start_line();
        self.write(&format!("switch ({})", expr_text(scrutinee)));
        self.end_line();
        self.line("{");

        for (i, item) in body.items.iter().enumerate() {
            if i > 0 && item.blank_line_before {
                self.blank_line();
            }
            if matches!(item.kind, NodeKind::Case { .. }) {
                self.format_item(item);
            } else {
                self.indent += 1;
                self.format_item(item);
                self.indent -= 1;
            }
        }

        self.indent += 1;
        for comment in &body.dangling_comments {
            self.comment_line(comment);
        }
        self.indent -= 1;
        self.start_line();
        self.write("}");
    }

    fn format_case(&mut self, label: Option<&Node>, statements: &[Node]) {
        self.start_line();
        match label {
            Some(label) => self.write(&format!("case {}:", expr_text(label))),
            None => self.write("default:"),
        }

        self.indent += 1;
        for (i, statement) in statements.iter().enumerate() {
            self.end_line();
            if i > 0 && statement.blank_line_before {
                self.blank_line();
            }
            self.format_item_open(statement);
        }
        self.indent -= 1;
    }
}

/// `for (init; condition; step)` with empty clauses collapsed: `for (;;)`.
fn for_header(init: &ForInit, condition: Option<&Node>, step: &[Node]) -> String {
    let init = match init {
        ForInit::Decl(decl) => match &decl.kind {
            NodeKind::VarDecl(decl) => var_decl_text(decl),
            NodeKind::FunctionPointer(pointer) => function_pointer_text(pointer),
            _ => String::new(),
        },
        ForInit::Exprs(exprs) => list_text(exprs),
    };
    let condition = condition
        .map(|c| format!(" {}", expr_text(c)))
        .unwrap_or_default();
    let step = if step.is_empty() {
        String::new()
    } else {
        format!(" {}", list_text(step))
    };
    format!("for ({init};{condition};{step})")
}

#[cfg(test)]
mod tests {
    use crate::formatter::format;
    use crate::parser::parse::Parser;
    use pretty_assertions::assert_eq;

    fn fmt(source: &str) -> String {
        let mut parser = Parser::new(source);
        format(&parser.parse_program())
    }

    /// Format `body` inside `void f(void)` and return the lines between the
    /// braces.
    fn fmt_body(body: &str) -> String {
        let out = fmt(&format!("void f(void)\n{{\n{body}\n}}\n"));
        let inner = out
            .strip_prefix("void f(void)\n{\n")
            .and_then(|s| s.strip_suffix("}\n"))
            .expect("function frame");
        inner.to_string()
    }

    #[test]
    fn test_minimal_function() {
        assert_eq!(
            fmt("int main(void)\n{\nreturn 0;\n}"),
            "int main(void)\n{\n\treturn (0);\n}\n"
        );
    }

    #[test]
    fn test_return_parentheses() {
        assert_eq!(fmt_body("return 5;"), "\treturn (5);\n");
        assert_eq!(fmt_body("return;"), "\treturn;\n");
        assert_eq!(fmt_body("return (a + b);"), "\treturn (a + b);\n");
        assert_eq!(fmt_body("return a+b;"), "\treturn (a + b);\n");
    }

    #[test]
    fn test_declarations_then_blank_line() {
        assert_eq!(
            fmt_body("int i, j, k;\n\nchar *s;\ni = 0;\n\n\nj = 1;\nk = 2;"),
            "\tint i, j, k;\n\tchar *s;\n\n\ti = 0;\n\n\tj = 1;\n\tk = 2;\n"
        );
    }

    #[test]
    fn test_if_else_layout() {
        assert_eq!(
            fmt_body("if (a) x = 1;\nelse if (b) {\ny = 2;\n} else\nz = 3;"),
            "\tif (a)\n\t\tx = 1;\n\telse if (b)\n\t{\n\t\ty = 2;\n\t}\n\telse\n\t\tz = 3;\n"
        );
    }

    #[test]
    fn test_loops_layout() {
        assert_eq!(
            fmt_body("for(i=0;i<n;i++){sum+=i;}\nfor(;;) break;\nwhile (*p) p++;"),
            "\tfor (i = 0; i < n; i++)\n\t{\n\t\tsum += i;\n\t}\n\tfor (;;)\n\t\tbreak;\n\twhile (*p)\n\t\tp++;\n"
        );
    }

    #[test]
    fn test_do_while_keeps_brace_on_keyword_line() {
        assert_eq!(
            fmt_body("do\n{\nx--;\n}\nwhile (x > 0);"),
            "\tdo {\n\t\tx--;\n\t} while (x > 0);\n"
        );
    }

    #[test]
    fn test_switch_layout() {
        assert_eq!(
            fmt_body("switch (c) {\ncase 'a': n++; break;\ndefault:\nreturn;\n}"),
            "\tswitch (c)\n\t{\n\tcase 'a':\n\t\tn++;\n\t\tbreak;\n\tdefault:\n\t\treturn;\n\t}\n"
        );
    }

    #[test]
    fn test_labels_are_outdented() {
        assert_eq!(
            fmt_body("goto done;\ndone:\nreturn;"),
            "\tgoto done;\ndone:\n\treturn;\n"
        );
    }

    #[test]
    fn test_statement_expression_kept_verbatim() {
        assert_eq!(
            fmt_body("x = ({ int y = 2;  y * y; });\nz = 1;"),
            "\tx = ({ int y = 2;  y * y; });\n\tz = 1;\n"
        );
    }

    #[test]
    fn test_comment_before_closing_brace() {
        assert_eq!(fmt_body("x = 1;\n// done"), "\tx = 1;\n\t/* done */\n");
    }

    #[test]
    fn test_local_pointer_declaration() {
        assert_eq!(fmt_body("foo_t *x;\nx = NULL;"), "\tfoo_t *x;\n\n\tx = NULL;\n");
    }

    #[test]
    fn test_trailing_comment_stays_on_branch() {
        assert_eq!(
            fmt_body("if (a)\n\t\tx = 1; /* set */\n\telse\n\t\ty = 2; // other"),
            "\tif (a)\n\t\tx = 1; /* set */\n\telse\n\t\ty = 2; /* other */\n"
        );
        assert_eq!(
            fmt_body("while (n)\nn--; /* count down */\nn = 1;"),
            "\twhile (n)\n\t\tn--; /* count down */\n\tn = 1;\n"
        );
    }

    #[test]
    fn test_comment_after_do_body_is_kept() {
        let out = fmt_body("do {\nn++;\n} /* again */ while (n < 3);");
        assert_eq!(
            out,
            "\tdo\n\t{\n\t\tn++;\n\t} /* again */\n\twhile (n < 3);\n"
        );
        assert_eq!(fmt_body(&out), out);
    }
}
