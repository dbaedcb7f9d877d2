//! Expression parsing implementation
//!
//! This module handles parsing of C expressions using precedence climbing
//! for binary operators and recursive descent for other expression forms.
//!
//! # Supported Expressions
//!
//! - Literals: integers, floats, characters, strings (adjacent strings join)
//! - Identifiers
//! - Binary operators: assignment, arithmetic, comparison, logical, bitwise
//! - Unary operators: `!`, `~`, `+`, `-`, `*`, `&`, `++`, `--`
//! - Postfix: `[]`, `()`, `.`, `->`, `++`, `--`
//! - Ternary: `? :`
//! - Type casts: `(type)expr`
//! - `sizeof` with a type or an expression
//! - Bare type names as call arguments (`va_arg(ap, int)`)
//!
//! # Precedence
//!
//! Binary operators follow C precedence rules using a precedence climbing
//! algorithm. Assignment is right-associative; everything else is
//! left-associative. The ternary sits between assignment and `||`.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};

/// Lowest binary precedence (assignment).
const ASSIGNMENT_PRECEDENCE: u8 = 1;

impl Parser {
    /// Parse an expression without the comma operator.
    pub(crate) fn parse_expression(&mut self) -> Result<Node, ParseError> {
        self.parse_binary(ASSIGNMENT_PRECEDENCE)
    }

    /// Expressions chained by the comma operator, folded left.
    pub(crate) fn parse_comma_expression(&mut self) -> Result<Node, ParseError> {
        let mut expr = self.parse_expression()?;
        while self.check(TokenKind::Comma) {
            let loc = expr.location;
            self.advance();
            let rhs = self.parse_expression()?;
            expr = Node::new(
                NodeKind::Binary {
                    op: TokenKind::Comma,
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                },
                loc,
            );
        }
        Ok(expr)
    }

    /// Comma-separated expressions (for-loop clauses and call arguments).
    pub(crate) fn parse_expression_list(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut exprs = vec![self.parse_expression()?];
        while self.match_token(TokenKind::Comma) {
            exprs.push(self.parse_expression()?);
        }
        Ok(exprs)
    }

    /// Precedence climbing over binary operators and the ternary.
    fn parse_binary(&mut self, min_prec: u8) -> Result<Node, ParseError> {
        let mut lhs = self.parse_unary()?;

        loop {
            let kind = self.peek_kind();

            if kind == TokenKind::Question {
                if min_prec > ASSIGNMENT_PRECEDENCE {
                    break;
                }
                self.advance();
                let then_expr = self.parse_comma_expression()?;
                self.expect_token(TokenKind::Colon, "in conditional expression")?;
                let else_expr = self.parse_binary(min_prec)?;
                let loc = lhs.location;
                lhs = Node::new(
                    NodeKind::Ternary {
                        condition: Box::new(lhs),
                        then_expr: Box::new(then_expr),
                        else_expr: Box::new(else_expr),
                    },
                    loc,
                );
                continue;
            }

            let Some(prec) = kind.binary_precedence() else {
                break;
            };
            if prec < min_prec {
                break;
            }

            let op = self.advance().kind;
            let rhs = if op.is_assignment() {
                self.parse_binary(prec)?
            } else {
                self.parse_binary(prec + 1)?
            };
            let loc = lhs.location;
            lhs = Node::new(
                NodeKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                loc,
            );
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Node, ParseError> {
        self.nested(Self::parse_prefixed)
    }

    /// Prefix operators, `sizeof` and casts, then a postfix expression.
    fn parse_prefixed(&mut self) -> Result<Node, ParseError> {
        let loc = self.current_location();

        match self.peek_kind() {
            TokenKind::Bang
            | TokenKind::Tilde
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Amp
            | TokenKind::PlusPlus
            | TokenKind::MinusMinus => {
                let op = self.advance().kind;
                let operand = self.parse_unary()?;
                Ok(Node::new(
                    NodeKind::Unary {
                        op,
                        operand: Box::new(operand),
                        postfix: false,
                    },
                    loc,
                ))
            }
            TokenKind::Sizeof => {
                self.advance();
                let operand = if self.looks_like_type_in_parens() {
                    SizeofOperand::Type(self.parse_type_in_parens()?)
                } else {
                    SizeofOperand::Expr(Box::new(self.parse_unary()?))
                };
                Ok(Node::new(NodeKind::Sizeof(operand), loc))
            }
            TokenKind::LParen if self.looks_like_type_in_parens() => {
                let type_name = self.parse_type_in_parens()?;
                if self.check(TokenKind::LBrace) {
                    return Err(self.error_here("Compound literals are not supported"));
                }
                let operand = self.parse_unary()?;
                Ok(Node::new(
                    NodeKind::Cast {
                        type_name,
                        operand: Box::new(operand),
                    },
                    loc,
                ))
            }
            _ => self.parse_postfix(),
        }
    }

    /// Is the next significant token a `(` opening a type name?
    ///
    /// Only type keywords, typedef names, tag references, `*` and array
    /// brackets may appear before the `)`, and at least one of them must
    /// name a type. `(foo *)` also counts: a `*` directly before `)` cannot
    /// end an expression.
    pub(crate) fn looks_like_type_in_parens(&self) -> bool {
        if self.peek_kind() != TokenKind::LParen {
            return false;
        }

        let mut n = 1;
        let mut saw_type = false;
        loop {
            let token = self.peek_ahead(n);
            match token.kind {
                TokenKind::RParen => return saw_type,
                kind if kind.is_base_type() || kind.is_qualifier() => saw_type = true,
                kind if kind.is_tag_keyword() => {
                    saw_type = true;
                    if self.peek_ahead_kind(n + 1) == TokenKind::Ident {
                        n += 1;
                    }
                }
                TokenKind::Ident if !saw_type && self.is_typedef_name(&token.text) => {
                    saw_type = true;
                }
                TokenKind::Ident if !saw_type && self.peek_ahead_kind(n + 1) == TokenKind::Star => {
                    let mut end = n + 1;
                    while self.peek_ahead_kind(end) == TokenKind::Star {
                        end += 1;
                    }
                    if self.peek_ahead_kind(end) != TokenKind::RParen {
                        return false;
                    }
                    saw_type = true;
                }
                TokenKind::Star
                | TokenKind::LBracket
                | TokenKind::RBracket
                | TokenKind::IntLiteral => {}
                _ => return false,
            }
            n += 1;
        }
    }

    /// `( type )`, returning the normalized type text without parentheses.
    fn parse_type_in_parens(&mut self) -> Result<String, ParseError> {
        self.expect_token(TokenKind::LParen, "before type name")?;
        let mut words = Vec::new();
        while !self.check(TokenKind::RParen) {
            if self.is_at_end() {
                return Err(self.error_here("Expected ')' after type name"));
            }
            words.push(self.advance().text);
        }
        self.advance();
        Ok(join_type_tokens(&words))
    }

    fn parse_postfix(&mut self) -> Result<Node, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            let loc = expr.location;
            expr = match self.peek_kind() {
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_comma_expression()?;
                    self.expect_token(TokenKind::RBracket, "after array index")?;
                    Node::new(
                        NodeKind::ArrayAccess {
                            array: Box::new(expr),
                            index: Box::new(index),
                        },
                        loc,
                    )
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = if self.check(TokenKind::RParen) {
                        Vec::new()
                    } else {
                        self.parse_expression_list()?
                    };
                    self.expect_token(TokenKind::RParen, "after call arguments")?;
                    Node::new(
                        NodeKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        loc,
                    )
                }
                TokenKind::Dot | TokenKind::Arrow => {
                    let arrow = self.advance().kind == TokenKind::Arrow;
                    let member = self.expect_identifier("after member access")?;
                    Node::new(
                        NodeKind::MemberAccess {
                            object: Box::new(expr),
                            member,
                            arrow,
                        },
                        loc,
                    )
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op = self.advance().kind;
                    Node::new(
                        NodeKind::Unary {
                            op,
                            operand: Box::new(expr),
                            postfix: true,
                        },
                        loc,
                    )
                }
                _ => break,
            };
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        let loc = self.current_location();

        match self.peek_kind() {
            TokenKind::IntLiteral | TokenKind::FloatLiteral | TokenKind::CharLiteral => {
                let text = self.advance().text;
                Ok(Node::new(NodeKind::Literal { text }, loc))
            }
            TokenKind::StringLiteral => {
                let mut parts = vec![self.advance().text];
                while self.check(TokenKind::StringLiteral) {
                    parts.push(self.advance().text);
                }
                Ok(Node::new(
                    NodeKind::Literal {
                        text: parts.join(" "),
                    },
                    loc,
                ))
            }
            TokenKind::Ident => {
                let name = self.advance().text;
                Ok(Node::new(NodeKind::Identifier { name }, loc))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_comma_expression()?;
                self.expect_token(TokenKind::RParen, "after expression")?;
                Ok(Node::new(
                    NodeKind::Grouped {
                        inner: Box::new(inner),
                    },
                    loc,
                ))
            }
            kind if kind.starts_type() => self.parse_type_name_argument(),
            _ => Err(self.error_here("Expected expression")),
        }
    }

    /// A type used as a macro argument, up to the next `,` or `)` at depth zero.
    fn parse_type_name_argument(&mut self) -> Result<Node, ParseError> {
        let loc = self.current_location();
        let mut words = Vec::new();
        let mut depth = 0usize;

        loop {
            match self.peek_kind() {
                TokenKind::Comma | TokenKind::RParen if depth == 0 => break,
                TokenKind::Semicolon | TokenKind::LBrace | TokenKind::RBrace | TokenKind::Eof => {
                    return Err(self.error_here("Expected ',' or ')' after type name"));
                }
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                _ => {}
            }
            words.push(self.advance().text);
        }

        Ok(Node::new(
            NodeKind::TypeName {
                text: join_type_tokens(&words),
            },
            loc,
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::lexer::TokenKind;
    use crate::parser::parse::Parser;

    fn parse_expr(source: &str) -> Node {
        let mut parser = Parser::new(source);
        let expr = parser.parse_comma_expression().expect("expression parses");
        assert!(parser.is_at_end(), "trailing input after {source:?}");
        expr
    }

    fn binary_op(node: &Node) -> TokenKind {
        match node.kind {
            NodeKind::Binary { op, .. } => op,
            _ => panic!("Expected binary node, got {}", node.kind_name()),
        }
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expr("a + b * c");
        assert_eq!(binary_op(&expr), TokenKind::Plus);
        let NodeKind::Binary { rhs, .. } = &expr.kind else {
            unreachable!()
        };
        assert_eq!(binary_op(rhs), TokenKind::Star);
    }

    #[test]
    fn test_left_associativity() {
        let expr = parse_expr("a - b - c");
        let NodeKind::Binary { lhs, rhs, .. } = &expr.kind else {
            unreachable!()
        };
        assert_eq!(binary_op(lhs), TokenKind::Minus);
        assert!(matches!(rhs.kind, NodeKind::Identifier { .. }));
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let expr = parse_expr("a = b += c");
        assert_eq!(binary_op(&expr), TokenKind::Eq);
        let NodeKind::Binary { rhs, .. } = &expr.kind else {
            unreachable!()
        };
        assert_eq!(binary_op(rhs), TokenKind::PlusEq);
    }

    #[test]
    fn test_ternary_binds_below_logical_or() {
        let expr = parse_expr("x = a || b ? c : d");
        let NodeKind::Binary { rhs, .. } = &expr.kind else {
            unreachable!()
        };
        match &rhs.kind {
            NodeKind::Ternary { condition, .. } => assert_eq!(binary_op(condition), TokenKind::OrOr),
            _ => panic!("Expected ternary"),
        }
    }

    #[test]
    fn test_unary_and_postfix() {
        let expr = parse_expr("-*p++");
        match &expr.kind {
            NodeKind::Unary {
                op: TokenKind::Minus,
                operand,
                postfix: false,
            } => match &operand.kind {
                NodeKind::Unary {
                    op: TokenKind::Star,
                    operand,
                    ..
                } => assert!(matches!(
                    operand.kind,
                    NodeKind::Unary { postfix: true, .. }
                )),
                _ => panic!("Expected dereference"),
            },
            _ => panic!("Expected negation"),
        }
    }

    #[test]
    fn test_member_access_and_calls() {
        let expr = parse_expr("list->head.next[i](x, y)");
        match &expr.kind {
            NodeKind::Call { callee, args } => {
                assert_eq!(args.len(), 2);
                assert!(matches!(callee.kind, NodeKind::ArrayAccess { .. }));
            }
            _ => panic!("Expected call"),
        }
    }

    #[test]
    fn test_cast_and_grouping() {
        assert!(matches!(
            parse_expr("(unsigned long)x").kind,
            NodeKind::Cast { ref type_name, .. } if type_name == "unsigned long"
        ));
        assert!(matches!(
            parse_expr("(char*)buf").kind,
            NodeKind::Cast { ref type_name, .. } if type_name == "char *"
        ));
        assert!(matches!(
            parse_expr("(struct node *)p").kind,
            NodeKind::Cast { ref type_name, .. } if type_name == "struct node *"
        ));
        assert!(matches!(parse_expr("(a)").kind, NodeKind::Grouped { .. }));
        assert!(matches!(
            parse_expr("(size_t)n").kind,
            NodeKind::Cast { .. }
        ));
    }

    #[test]
    fn test_sizeof_forms() {
        assert!(matches!(
            parse_expr("sizeof(int *)").kind,
            NodeKind::Sizeof(SizeofOperand::Type(ref t)) if t == "int *"
        ));
        assert!(matches!(
            parse_expr("sizeof buf").kind,
            NodeKind::Sizeof(SizeofOperand::Expr(_))
        ));
        assert!(matches!(
            parse_expr("sizeof(x)").kind,
            NodeKind::Sizeof(SizeofOperand::Expr(_))
        ));
    }

    #[test]
    fn test_adjacent_strings_join() {
        assert!(matches!(
            parse_expr("\"abc\"\n\t\"def\"").kind,
            NodeKind::Literal { ref text } if text == "\"abc\" \"def\""
        ));
    }

    #[test]
    fn test_type_name_argument() {
        match parse_expr("va_arg(ap, unsigned int)").kind {
            NodeKind::Call { args, .. } => {
                assert!(matches!(&args[1].kind, NodeKind::TypeName { text } if text == "unsigned int"));
            }
            _ => panic!("Expected call"),
        }
    }

    #[test]
    fn test_comma_operator() {
        assert_eq!(binary_op(&parse_expr("a = 1, b = 2")), TokenKind::Comma);
    }

    #[test]
    fn test_missing_operand_is_an_error() {
        let mut parser = Parser::new("a + ;");
        assert!(parser.parse_expression().is_err());
    }
}
