//! Statement parsing implementation
//!
//! This module handles parsing of all C statement types:
//!
//! - Declarations: `int x = 42;`, local typedefs and tag definitions
//! - Control flow: `if`, `while`, `for`, `do-while`, `switch`
//! - Jump statements: `return`, `break`, `continue`, `goto`
//! - Labels, empty statements and preprocessor lines inside bodies
//! - Compound statements: `{ ... }`
//! - Expression statements: function calls, assignments
//!
//! # Grammar
//!
//! ```text
//! statement ::= block | if_stmt | while_stmt | for_stmt | do_while_stmt
//!             | switch_stmt | return_stmt | break_stmt | continue_stmt
//!             | goto_stmt | label | ';' | PREPROCESSOR | typedef
//!             | declaration | expr (',' expr)* ';'
//! switch_body ::= '{' (statement | case)* '}'
//! case        ::= ('case' expr | 'default') ':' statement*
//! ```
//!
//! Every statement directly inside a body goes through
//! [`Parser::parse_item`], so a statement the grammar cannot handle is kept
//! verbatim and its neighbours still parse.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser, Recovery};

impl Parser {
    /// `{ statement* }` in a fresh scope.
    pub(crate) fn parse_block(&mut self) -> Result<Node, ParseError> {
        let loc = self.current_location();
        self.expect_token(TokenKind::LBrace, "to open block")?;

        let outer = self.scope;
        self.scope = self.symbols.create_scope(Some(outer));
        let result = self.parse_block_items();
        self.scope = outer;

        Ok(Node::new(NodeKind::Block(result?), loc))
    }

    fn parse_block_items(&mut self) -> Result<Body, ParseError> {
        let mut body = Body::default();

        loop {
            let blank = self.skip_trivia() > 1;
            if self.check(TokenKind::RBrace) || self.is_at_end() {
                body.dangling_comments = std::mem::take(&mut self.pending_comments);
                break;
            }
            let statement = self.parse_item(blank, Recovery::Statement, Self::parse_statement);
            body.items.push(statement);
        }

        self.expect_token(TokenKind::RBrace, "to close block")?;
        Ok(body)
    }

    /// Parse one statement. Fails at `}` and end of input so the enclosing
    /// body keeps its closing brace.
    pub(crate) fn parse_statement(&mut self) -> Result<Node, ParseError> {
        self.nested(Self::parse_statement_kind)
    }

    fn parse_statement_kind(&mut self) -> Result<Node, ParseError> {
        let loc = self.current_location();

        match self.peek_kind() {
            TokenKind::RBrace | TokenKind::Eof => Err(self.error_here("Expected a statement")),
            TokenKind::LBrace => self.parse_block(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Do => self.parse_do_while_statement(),
            TokenKind::Switch => self.parse_switch_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Break => {
                self.advance();
                self.expect_semicolon("after 'break'")?;
                Ok(Node::new(NodeKind::Break, loc))
            }
            TokenKind::Continue => {
                self.advance();
                self.expect_semicolon("after 'continue'")?;
                Ok(Node::new(NodeKind::Continue, loc))
            }
            TokenKind::Goto => {
                self.advance();
                let label = self.expect_identifier("after 'goto'")?;
                self.expect_semicolon("after 'goto'")?;
                Ok(Node::new(NodeKind::Goto { label }, loc))
            }
            TokenKind::Semicolon => {
                self.advance();
                Ok(Node::new(NodeKind::Empty, loc))
            }
            TokenKind::Preprocessor => Ok(self.parse_preprocessor()),
            TokenKind::Typedef => self.parse_typedef(),
            TokenKind::Case | TokenKind::Default => {
                Err(self.error_here("Case label outside of switch"))
            }
            TokenKind::Ident if self.peek_ahead_kind(1) == TokenKind::Colon => {
                let name = self.advance().text;
                self.advance();
                Ok(Node::new(NodeKind::Label { name }, loc))
            }
            kind if kind.is_tag_keyword() && self.is_tag_definition() => {
                self.parse_tag_definition()
            }
            _ if self.is_declaration_start() => self.parse_declaration(),
            _ => self.parse_expression_statement(),
        }
    }

    /// Statement nested directly under a control keyword. Comments parked
    /// since the keyword become its leading comments, comments after it on
    /// its last line its trailing ones.
    fn parse_substatement(&mut self) -> Result<Box<Node>, ParseError> {
        self.skip_trivia();
        let leading = std::mem::take(&mut self.pending_comments);
        let mut node = self.parse_statement()?;
        node.leading_comments = leading;
        node.trailing_comments = self.collect_trailing_comments();
        Ok(Box::new(node))
    }

    /// `( expr )` after `if`, `while` and `switch`.
    fn parse_condition(&mut self, keyword: &str) -> Result<Box<Node>, ParseError> {
        self.expect_token(TokenKind::LParen, &format!("after '{keyword}'"))?;
        let condition = self.parse_expression()?;
        self.expect_token(TokenKind::RParen, &format!("after {keyword} condition"))?;
        Ok(Box::new(condition))
    }

    fn parse_expression_statement(&mut self) -> Result<Node, ParseError> {
        let loc = self.current_location();
        let expr = self.parse_comma_expression()?;
        self.expect_semicolon("after expression")?;
        Ok(Node::new(
            NodeKind::ExprStmt {
                expr: Box::new(expr),
            },
            loc,
        ))
    }

    fn parse_return_statement(&mut self) -> Result<Node, ParseError> {
        let loc = self.current_location();
        self.advance();

        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_semicolon("after return")?;

        Ok(Node::new(NodeKind::Return { value }, loc))
    }

    fn parse_if_statement(&mut self) -> Result<Node, ParseError> {
        let loc = self.current_location();
        self.advance();

        let condition = self.parse_condition("if")?;
        let then_branch = self.parse_substatement()?;
        let else_branch = if self.match_token(TokenKind::Else) {
            Some(self.parse_substatement()?)
        } else {
            None
        };

        Ok(Node::new(
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            },
            loc,
        ))
    }

    fn parse_while_statement(&mut self) -> Result<Node, ParseError> {
        let loc = self.current_location();
        self.advance();

        let condition = self.parse_condition("while")?;
        let body = self.parse_substatement()?;

        Ok(Node::new(NodeKind::While { condition, body }, loc))
    }

    fn parse_do_while_statement(&mut self) -> Result<Node, ParseError> {
        let loc = self.current_location();
        self.advance();

        let body = self.parse_substatement()?;
        self.expect_token(TokenKind::While, "after do body")?;
        let condition = self.parse_condition("while")?;
        self.expect_semicolon("after do-while")?;

        Ok(Node::new(NodeKind::DoWhile { body, condition }, loc))
    }

    /// `for (init; condition; step) body`, with the init declaration scoped
    /// to the loop.
    fn parse_for_statement(&mut self) -> Result<Node, ParseError> {
        let loc = self.current_location();
        self.advance();

        let outer = self.scope;
        self.scope = self.symbols.create_scope(Some(outer));
        let result = self.parse_for_rest(loc);
        self.scope = outer;
        result
    }

    fn parse_for_rest(&mut self, loc: SourceLocation) -> Result<Node, ParseError> {
        self.expect_token(TokenKind::LParen, "after 'for'")?;

        let init = if self.match_token(TokenKind::Semicolon) {
            ForInit::Exprs(Vec::new())
        } else if self.is_declaration_start() {
            ForInit::Decl(Box::new(self.parse_declaration()?))
        } else {
            let exprs = self.parse_expression_list()?;
            self.expect_semicolon("after for initializer")?;
            ForInit::Exprs(exprs)
        };

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_semicolon("after for condition")?;

        let step = if self.check(TokenKind::RParen) {
            Vec::new()
        } else {
            self.parse_expression_list()?
        };
        self.expect_token(TokenKind::RParen, "after for clauses")?;

        let body = self.parse_substatement()?;

        Ok(Node::new(
            NodeKind::For {
                init,
                condition,
                step,
                body,
            },
            loc,
        ))
    }

    fn parse_switch_statement(&mut self) -> Result<Node, ParseError> {
        let loc = self.current_location();
        self.advance();

        let scrutinee = self.parse_condition("switch")?;
        self.expect_token(TokenKind::LBrace, "to open switch body")?;

        let outer = self.scope;
        self.scope = self.symbols.create_scope(Some(outer));
        let result = self.parse_switch_items();
        self.scope = outer;

        Ok(Node::new(
            NodeKind::Switch {
                scrutinee,
                body: result?,
            },
            loc,
        ))
    }

    fn parse_switch_items(&mut self) -> Result<Body, ParseError> {
        let mut body = Body::default();

        loop {
            let blank = self.skip_trivia() > 1;
            if self.check(TokenKind::RBrace) || self.is_at_end() {
                body.dangling_comments = std::mem::take(&mut self.pending_comments);
                break;
            }
            let item = self.parse_item(blank, Recovery::Statement, Self::parse_switch_item);
            body.items.push(item);
        }

        self.expect_token(TokenKind::RBrace, "to close switch body")?;
        Ok(body)
    }

    fn parse_switch_item(&mut self) -> Result<Node, ParseError> {
        match self.peek_kind() {
            TokenKind::Case | TokenKind::Default => self.parse_case(),
            _ => self.parse_statement(),
        }
    }

    /// A `case`/`default` label and the statements up to the next label or
    /// the end of the switch body.
    fn parse_case(&mut self) -> Result<Node, ParseError> {
        let loc = self.current_location();
        let label = if self.match_token(TokenKind::Default) {
            None
        } else {
            self.advance();
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_token(TokenKind::Colon, "after case label")?;

        let mut statements = Vec::new();
        loop {
            let before = self.checkpoint();
            let blank = self.skip_trivia() > 1;
            if matches!(
                self.peek_kind(),
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
            ) {
                // Leave the blank line and comments to the next label.
                self.rewind(before);
                break;
            }
            let statement = self.parse_item(blank, Recovery::Statement, Self::parse_statement);
            statements.push(statement);
        }

        Ok(Node::new(NodeKind::Case { label, statements }, loc))
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::lexer::TokenKind;
    use crate::parser::parse::Parser;

    /// Parse `body` wrapped in a function and return the block's items.
    fn parse_body(body: &str) -> (Vec<Node>, usize) {
        let source = format!("void test(void)\n{{\n{body}\n}}\n");
        let mut parser = Parser::new(&source);
        let program = parser.parse_program();
        let NodeKind::Program(mut items) = program.kind else {
            panic!("Expected program node");
        };
        assert_eq!(items.items.len(), 1, "function did not parse: {source}");
        let NodeKind::Function(function) = items.items.remove(0).kind else {
            panic!("Expected function");
        };
        let NodeKind::Block(block) = function.body.expect("function body").kind else {
            panic!("Expected block");
        };
        (block.items, parser.error_count())
    }

    #[test]
    fn test_statement_expression_is_kept_verbatim() {
        let (items, errors) = parse_body(
            "\tint a = 1;\n\tx = ({ int y = a; y * 2; });\n\ta = 2;\n\treturn a;",
        );
        assert_eq!(errors, 1);
        assert_eq!(items.len(), 4);
        match &items[1].kind {
            NodeKind::Unparsed(raw) => assert_eq!(raw.text, "x = ({ int y = a; y * 2; });"),
            _ => panic!("Expected unparsed region"),
        }
        assert!(matches!(items[2].kind, NodeKind::ExprStmt { .. }));
        assert!(matches!(items[3].kind, NodeKind::Return { .. }));
    }

    #[test]
    fn test_if_else_chain() {
        let (items, errors) = parse_body("if (a) x = 1; else if (b) { x = 2; } else x = 3;");
        assert_eq!(errors, 0);
        match &items[0].kind {
            NodeKind::If {
                else_branch: Some(else_branch),
                ..
            } => assert!(matches!(
                else_branch.kind,
                NodeKind::If {
                    else_branch: Some(_),
                    ..
                }
            )),
            _ => panic!("Expected if/else"),
        }
    }

    #[test]
    fn test_loops() {
        let (items, errors) = parse_body(
            "for (int i = 0; i < n; i++) sum += i;\nfor (;;) break;\nwhile (x--) ;\ndo { x++; } while (x < 10);",
        );
        assert_eq!(errors, 0);
        match &items[0].kind {
            NodeKind::For {
                init: ForInit::Decl(decl),
                condition: Some(_),
                step,
                ..
            } => {
                assert!(matches!(decl.kind, NodeKind::VarDecl(_)));
                assert_eq!(step.len(), 1);
            }
            _ => panic!("Expected for with declaration"),
        }
        assert!(matches!(
            &items[1].kind,
            NodeKind::For { init: ForInit::Exprs(init), condition: None, step, .. }
                if init.is_empty() && step.is_empty()
        ));
        assert!(matches!(items[2].kind, NodeKind::While { .. }));
        assert!(matches!(items[3].kind, NodeKind::DoWhile { .. }));
    }

    #[test]
    fn test_for_with_comma_lists() {
        let (items, errors) = parse_body("for (i = 0, j = n; i < j; i++, j--) swap(i, j);");
        assert_eq!(errors, 0);
        assert!(matches!(
            &items[0].kind,
            NodeKind::For { init: ForInit::Exprs(init), step, .. } if init.len() == 2 && step.len() == 2
        ));
    }

    #[test]
    fn test_switch_cases() {
        let (items, errors) = parse_body(
            "switch (c) {\ncase 'a':\ncase 'b':\n\tn++;\n\tbreak;\n\ndefault:\n\treturn 0;\n}",
        );
        assert_eq!(errors, 0);
        let NodeKind::Switch { body, .. } = &items[0].kind else {
            panic!("Expected switch");
        };
        assert_eq!(body.items.len(), 3);
        assert!(matches!(&body.items[0].kind, NodeKind::Case { label: Some(_), statements } if statements.is_empty()));
        assert!(matches!(&body.items[1].kind, NodeKind::Case { statements, .. } if statements.len() == 2));
        assert!(matches!(&body.items[2].kind, NodeKind::Case { label: None, .. }));
        assert!(body.items[2].blank_line_before);
    }

    #[test]
    fn test_labels_and_goto() {
        let (items, errors) = parse_body("goto out;\nout:\n\treturn;");
        assert_eq!(errors, 0);
        assert!(matches!(&items[0].kind, NodeKind::Goto { label } if label == "out"));
        assert!(matches!(&items[1].kind, NodeKind::Label { name } if name == "out"));
        assert!(matches!(items[2].kind, NodeKind::Return { value: None }));
    }

    #[test]
    fn test_pointer_declaration_versus_multiplication() {
        let (items, errors) = parse_body("foo *bar;\nfoo* baz;\na * b;\na*b;\nint n;\nn *m;");
        assert_eq!(errors, 0);
        assert!(matches!(items[0].kind, NodeKind::VarDecl(_)));
        assert!(matches!(items[1].kind, NodeKind::VarDecl(_)));
        for item in &items[2..4] {
            match &item.kind {
                NodeKind::ExprStmt { expr } => assert!(matches!(
                    expr.kind,
                    NodeKind::Binary {
                        op: TokenKind::Star,
                        ..
                    }
                )),
                _ => panic!("Expected multiplication"),
            }
        }
        // `n` is a known variable, so this stays an expression.
        assert!(matches!(items[5].kind, NodeKind::ExprStmt { .. }));
    }

    #[test]
    fn test_block_scoped_typedef_names() {
        let (items, errors) = parse_body("typedef int count_t;\n{\n\tcount_t *c;\n}\ncount_t total;");
        assert_eq!(errors, 0);
        assert!(matches!(items[0].kind, NodeKind::Typedef(_)));
        assert!(matches!(items[1].children()[0].kind, NodeKind::VarDecl(_)));
        assert!(matches!(items[2].kind, NodeKind::VarDecl(_)));
    }

    #[test]
    fn test_comments_inside_block() {
        let (items, _) = parse_body("\t// first\n\tx = 1; /* trailing */\n\n\ty = 2;");
        assert_eq!(items[0].leading_comments.len(), 1);
        assert_eq!(items[0].trailing_comments.len(), 1);
        assert!(items[1].blank_line_before);
    }

    #[test]
    fn test_stray_case_is_recovered() {
        let (items, errors) = parse_body("case 1: x = 1;\ny = 2;");
        assert_eq!(errors, 1);
        assert!(matches!(items[0].kind, NodeKind::Unparsed(_)));
        assert!(matches!(items.last().map(|n| &n.kind), Some(NodeKind::ExprStmt { .. })));
    }

    #[test]
    fn test_deeply_nested_blocks_are_cut_off() {
        let body = format!("{}x = 1;{}\ny = 2;", "{".repeat(1000), "}".repeat(1000));
        let (items, errors) = std::thread::Builder::new()
            .stack_size(8 * 1024 * 1024)
            .spawn(move || parse_body(&body))
            .expect("spawn parser thread")
            .join()
            .expect("parser thread finished");

        assert_eq!(errors, 1);
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0].kind, NodeKind::Block(_)));
        assert!(matches!(items[1].kind, NodeKind::ExprStmt { .. }));
    }

    #[test]
    fn test_substatement_keeps_its_trailing_comment() {
        let (items, errors) = parse_body("if (a)\n\t\tx = 1; /* set */\n\telse\n\t\ty = 2;");
        assert_eq!(errors, 0);
        match &items[0].kind {
            NodeKind::If {
                then_branch,
                else_branch: Some(else_branch),
                ..
            } => {
                assert_eq!(then_branch.trailing_comments.len(), 1);
                assert_eq!(then_branch.trailing_comments[0].text, "/* set */");
                assert!(else_branch.leading_comments.is_empty());
            }
            _ => panic!("Expected if statement"),
        }
    }
}
