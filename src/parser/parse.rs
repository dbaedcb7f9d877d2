//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure:
//! the error type, cursor helpers, comment and blank-line attachment, the
//! unparsed-region recovery protocol, and the top-level driving loop.
//!
//! # Parser Architecture
//!
//! - This module: Parser struct, helper methods, recovery and coordination
//! - `declarations`: functions, variables, typedefs, structs, unions, enums
//! - `statements`: blocks and control flow
//! - `expressions`: precedence climbing and unary/postfix forms
//!
//! Parser methods are split across files using `impl Parser` blocks.
//!
//! # Cursor and trivia
//!
//! The cursor indexes the lossless token array. Lookahead helpers skip
//! trivia without consuming it; [`Parser::advance`] consumes the trivia in
//! front of the next significant token, parking any comments it passes in a
//! pending buffer. The next item parsed at statement level takes the pending
//! comments as its leading comments; comments still pending when an item
//! ends were inside it and join its leading comments.
//!
//! # Recovery
//!
//! Every item (top-level declaration, statement, struct member, enum entry)
//! is parsed through [`Parser::parse_item`]. If its production fails, the
//! cursor is rewound to the item start, a context-specific scan finds the end
//! of the broken region, and the region's verbatim text becomes an
//! [`NodeKind::Unparsed`] node. Each scan advances at least one token, so
//! parsing always terminates. Nesting deeper than [`MAX_NESTING`] fails the
//! same way, so deep input cannot exhaust the stack.

use crate::parser::ast::*;
use crate::parser::lexer::{Lexer, Token, TokenKind};
use crate::parser::symbols::{ScopeId, SymbolKind, SymbolTable};
use thiserror::Error;

/// Parser error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at line {}, column {}: {message}", location.line, location.column)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

/// Where a recovery scan is allowed to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Recovery {
    /// After a `;` at brace depth zero, or after the `}` closing a skipped block.
    TopLevel,
    /// After a `;` at depth zero, or before an unmatched `}`.
    Statement,
    /// After a `,` at zero nesting, or before the enum's closing `}`.
    EnumEntry,
}

/// Deepest nesting of statements, expressions, initializers and tag bodies.
/// Anything deeper becomes an unparsed region instead of exhausting the stack.
pub(crate) const MAX_NESTING: usize = 128;

/// Saved parser state for backtracking.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    position: usize,
    pending: usize,
    errors: usize,
    unparsed: usize,
    last_line: usize,
    scope: ScopeId,
}

/// Recursive descent parser for C source formatting
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) symbols: SymbolTable,
    pub(crate) scope: ScopeId,
    /// Comments passed over since the last item started.
    pub(crate) pending_comments: Vec<Comment>,
    /// Line on which the last consumed significant token ends.
    pub(crate) last_line: usize,
    errors: Vec<ParseError>,
    unparsed_tokens: usize,
    depth: usize,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Self::from_tokens(Lexer::new(source).tokenize())
    }

    /// Parse an existing token array. A missing end-of-file token is appended.
    pub fn from_tokens(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let (location, offset) = tokens
                .last()
                .map(|t| (t.location, t.offset + t.text.len()))
                .unwrap_or_default();
            tokens.push(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                location,
                offset,
            });
        }

        let symbols = SymbolTable::new();
        let scope = symbols.global();
        Self {
            tokens,
            position: 0,
            symbols,
            scope,
            pending_comments: Vec::new(),
            last_line: 1,
            errors: Vec::new(),
            unparsed_tokens: 0,
            depth: 0,
        }
    }

    /// Parse the whole token stream. Never fails: constructs the grammar
    /// cannot handle come back as unparsed nodes and bump [`Parser::error_count`].
    pub fn parse_program(&mut self) -> Node {
        let location = SourceLocation::new(1, 1);
        let mut body = Body::default();

        loop {
            let blank = self.skip_trivia() > 1;
            if self.is_at_end() {
                body.dangling_comments = std::mem::take(&mut self.pending_comments);
                break;
            }
            let item = self.parse_item(blank, Recovery::TopLevel, Self::parse_top_level);
            body.items.push(item);
        }

        tracing::debug!(
            items = body.items.len(),
            errors = self.errors.len(),
            "parsed program"
        );
        Node::new(NodeKind::Program(body), location)
    }

    /// Number of regions that had to be preserved as unparsed text.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// The first failure behind each unparsed region, in source order.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Share of significant tokens that ended up inside unparsed regions.
    pub fn unparsed_ratio(&self) -> f64 {
        let total = self
            .tokens
            .iter()
            .filter(|t| t.is_significant() && t.kind != TokenKind::Eof)
            .count();
        if total == 0 {
            0.0
        } else {
            self.unparsed_tokens as f64 / total as f64
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Top-level dispatch: directive, typedef, tag definition, function,
    /// then global variable.
    fn parse_top_level(&mut self) -> Result<Node, ParseError> {
        match self.peek_kind() {
            TokenKind::Preprocessor => Ok(self.parse_preprocessor()),
            TokenKind::Typedef => self.parse_typedef(),
            TokenKind::Semicolon => {
                let loc = self.current_location();
                self.advance();
                Ok(Node::new(NodeKind::Empty, loc))
            }
            kind if kind.is_tag_keyword() && self.is_tag_definition() => {
                self.parse_tag_definition()
            }
            _ => {
                if let Some(function) = self.parse_function()? {
                    return Ok(function);
                }
                if self.is_declaration_start() {
                    return self.parse_declaration();
                }
                Err(self.error_here("Expected a declaration"))
            }
        }
    }

    pub(crate) fn parse_preprocessor(&mut self) -> Node {
        let loc = self.current_location();
        let token = self.advance();
        Node::new(
            NodeKind::Preprocessor {
                text: token.text.trim_end().to_string(),
            },
            loc,
        )
    }

    // ===== Items and recovery =====

    /// Parse one item with `production`, attaching pending comments, the
    /// blank-line flag and same-line trailing comments. A failed production
    /// is replaced by an unparsed node covering the broken region.
    pub(crate) fn parse_item(
        &mut self,
        blank: bool,
        recovery: Recovery,
        production: fn(&mut Self) -> Result<Node, ParseError>,
    ) -> Node {
        let leading = std::mem::take(&mut self.pending_comments);
        let start = self.checkpoint();

        let mut node = match production(self) {
            Ok(node) => node,
            Err(err) => self.recover(start, recovery, err),
        };

        // Comments from inside the item stay with it, after the ones above it.
        let inner = std::mem::take(&mut self.pending_comments);
        node.leading_comments = leading;
        node.leading_comments.extend(inner);
        node.blank_line_before = blank;
        node.trailing_comments = self.collect_trailing_comments();
        node
    }

    /// Run `production` one nesting level deeper.
    pub(crate) fn nested<T>(
        &mut self,
        production: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_here("Nesting too deep"));
        }
        self.depth += 1;
        let result = production(self);
        self.depth -= 1;
        result
    }

    /// Rewind to `start`, skip the broken region and wrap its text.
    pub(crate) fn recover(&mut self, start: Checkpoint, mode: Recovery, error: ParseError) -> Node {
        self.rewind(start);
        let begin = self.position;
        let location = self.tokens[begin].location;

        self.scan_recovery(mode);
        while self.position > begin + 1 && self.tokens[self.position - 1].is_trivia() {
            self.position -= 1;
        }

        let region = &self.tokens[begin..self.position];
        let text: String = region.iter().map(|t| t.text.as_str()).collect();
        let end_line = region
            .last()
            .map_or(location.line, |t| t.location.line + t.extra_lines());
        self.unparsed_tokens += region
            .iter()
            .filter(|t| t.is_significant() && t.kind != TokenKind::Eof)
            .count();
        self.last_line = end_line;

        tracing::debug!(
            start_line = location.line,
            end_line,
            "keeping region verbatim: {error}"
        );
        self.errors.push(error);

        Node::new(
            NodeKind::Unparsed(Unparsed {
                text,
                start_line: location.line,
                end_line,
            }),
            location,
        )
    }

    fn scan_recovery(&mut self, mode: Recovery) {
        let begin = self.position;
        let mut braces = 0usize;
        let mut parens = 0usize;

        while let Some(token) = self.tokens.get(self.position) {
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::LBrace => braces += 1,
                TokenKind::RBrace if braces == 0 => {
                    // Unmatched: the enclosing body's closing brace.
                    if mode == Recovery::TopLevel {
                        self.position += 1;
                    }
                    break;
                }
                TokenKind::RBrace => {
                    braces -= 1;
                    if braces == 0 && parens == 0 && mode != Recovery::EnumEntry {
                        self.position += 1;
                        if self.peek_kind() == TokenKind::Semicolon {
                            self.position = self.significant_index(0) + 1;
                        }
                        break;
                    }
                }
                TokenKind::LParen => parens += 1,
                TokenKind::RParen => parens = parens.saturating_sub(1),
                TokenKind::Semicolon if braces == 0 && mode != Recovery::EnumEntry => {
                    self.position += 1;
                    break;
                }
                TokenKind::Comma if braces == 0 && parens == 0 && mode == Recovery::EnumEntry => {
                    self.position += 1;
                    break;
                }
                _ => {}
            }
            self.position += 1;
        }

        if self.position == begin && !self.is_at_end() {
            self.position += 1;
        }
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            position: self.position,
            pending: self.pending_comments.len(),
            errors: self.errors.len(),
            unparsed: self.unparsed_tokens,
            last_line: self.last_line,
            scope: self.scope,
        }
    }

    pub(crate) fn rewind(&mut self, checkpoint: Checkpoint) {
        self.position = checkpoint.position;
        self.pending_comments.truncate(checkpoint.pending);
        self.errors.truncate(checkpoint.errors);
        self.unparsed_tokens = checkpoint.unparsed;
        self.last_line = checkpoint.last_line;
        self.scope = checkpoint.scope;
    }

    // ===== Trivia and comments =====

    /// Consume trivia up to the next significant token, parking comments in
    /// the pending buffer. Returns the longest run of consecutive newlines
    /// seen, so a value above one means a blank line.
    pub(crate) fn skip_trivia(&mut self) -> usize {
        let mut run = 0;
        let mut longest = 0;

        while let Some(token) = self.tokens.get(self.position) {
            match token.kind {
                TokenKind::Newline => {
                    run += 1;
                    longest = longest.max(run);
                }
                TokenKind::Whitespace => {}
                TokenKind::LineComment | TokenKind::BlockComment => {
                    let comment = comment_from(token);
                    self.pending_comments.push(comment);
                    run = 0;
                }
                _ => break,
            }
            self.position += 1;
        }

        longest
    }

    /// Comments that start on the line where the last consumed token ended.
    pub(crate) fn collect_trailing_comments(&mut self) -> Vec<Comment> {
        let mut comments = Vec::new();
        let mut index = self.position;

        while let Some(token) = self.tokens.get(index) {
            match token.kind {
                TokenKind::Whitespace => index += 1,
                TokenKind::LineComment | TokenKind::BlockComment
                    if token.location.line == self.last_line =>
                {
                    comments.push(comment_from(token));
                    index += 1;
                    self.position = index;
                }
                _ => break,
            }
        }

        comments
    }

    // ===== Helper methods =====

    /// Index of the `n`th significant token at or after the cursor.
    pub(crate) fn significant_index(&self, n: usize) -> usize {
        let mut seen = 0;
        for (index, token) in self.tokens.iter().enumerate().skip(self.position) {
            if token.is_significant() {
                if seen == n {
                    return index;
                }
                seen += 1;
            }
        }
        self.tokens.len() - 1
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.significant_index(0)]
    }

    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> &Token {
        &self.tokens[self.significant_index(n)]
    }

    pub(crate) fn peek_ahead_kind(&self, n: usize) -> TokenKind {
        self.peek_ahead(n).kind
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the next significant token (and the trivia before it).
    pub(crate) fn advance(&mut self) -> Token {
        self.skip_trivia();
        let token = self.tokens[self.position].clone();
        if token.kind != TokenKind::Eof {
            self.position += 1;
            self.last_line = token.location.line + token.extra_lines();
        }
        token
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location
    }

    pub(crate) fn error_here(&self, message: &str) -> ParseError {
        ParseError {
            message: format!("{}, found {}", message, self.peek()),
            location: self.current_location(),
        }
    }

    pub(crate) fn expect_token(&mut self, kind: TokenKind, ctx: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(&format!("Expected {kind} {ctx}")))
        }
    }

    pub(crate) fn expect_semicolon(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(TokenKind::Semicolon, ctx).map(|_| ())
    }

    pub(crate) fn expect_identifier(&mut self, ctx: &str) -> Result<String, ParseError> {
        if self.check(TokenKind::Ident) {
            Ok(self.advance().text)
        } else {
            Err(self.error_here(&format!("Expected identifier {ctx}")))
        }
    }

    /// Consume a bracketed run starting at the next significant token (which
    /// must be `open`) through its matching `close`, returning the raw text
    /// with whitespace runs collapsed. Comments inside stay in the text.
    pub(crate) fn consume_balanced(
        &mut self,
        open: TokenKind,
        close: TokenKind,
    ) -> Result<String, ParseError> {
        self.expect_token(open, "")?;
        let begin = self.position;
        let mut depth = 1usize;

        while let Some(token) = self.tokens.get(self.position) {
            match token.kind {
                TokenKind::Eof => break,
                kind if kind == open => depth += 1,
                kind if kind == close => {
                    depth -= 1;
                    if depth == 0 {
                        let inner: String = self.tokens[begin..self.position]
                            .iter()
                            .map(|t| t.text.as_str())
                            .collect();
                        self.last_line = token.location.line;
                        self.position += 1;
                        let open_text = open.spelling().unwrap_or_default();
                        let close_text = close.spelling().unwrap_or_default();
                        let inner = inner.split_whitespace().collect::<Vec<_>>().join(" ");
                        return Ok(format!("{open_text}{inner}{close_text}"));
                    }
                }
                _ => {}
            }
            self.position += 1;
        }

        Err(self.error_here(&format!("Expected {close} to balance {open}")))
    }

    /// Bind a declared name in the current scope.
    pub(crate) fn declare(&mut self, name: &str, kind: SymbolKind) {
        let scope = match kind {
            SymbolKind::Typedef => self.symbols.global(),
            _ => self.scope,
        };
        self.symbols.add(scope, name, kind);
    }

    pub(crate) fn is_typedef_name(&self, name: &str) -> bool {
        self.symbols.is_typedef(self.scope, name)
    }
}

fn comment_from(token: &Token) -> Comment {
    let style = match token.kind {
        TokenKind::LineComment => CommentStyle::Line,
        _ => CommentStyle::Block,
    };
    Comment {
        text: token.text.clone(),
        style,
        location: token.location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> (Node, Parser) {
        let mut parser = Parser::new(source);
        let program = parser.parse_program();
        (program, parser)
    }

    fn items(program: &Node) -> &[Node] {
        match &program.kind {
            NodeKind::Program(body) => &body.items,
            _ => panic!("Expected program node"),
        }
    }

    #[test]
    fn test_parse_simple_function() {
        let (program, parser) = parse("int main(void)\n{\nreturn 0;\n}");

        assert_eq!(parser.error_count(), 0);
        assert_eq!(items(&program).len(), 1);
        let function = &items(&program)[0];
        assert_eq!(function.kind_name(), "FUNCTION");
        assert_eq!(function.label().as_deref(), Some("main"));

        let children = function.children();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].kind_name(), "BLOCK");
        let statements = children[0].children();
        assert_eq!(statements.len(), 1);
        assert!(matches!(statements[0].kind, NodeKind::Return { value: Some(_) }));
    }

    #[test]
    fn test_preprocessor_items() {
        let (program, parser) = parse("#include <stdio.h>\n#define MAX 100\n");
        assert_eq!(parser.error_count(), 0);
        let texts: Vec<_> = items(&program)
            .iter()
            .map(|n| match &n.kind {
                NodeKind::Preprocessor { text } => text.as_str(),
                _ => panic!("Expected preprocessor node"),
            })
            .collect();
        assert_eq!(texts, vec!["#include <stdio.h>", "#define MAX 100"]);
    }

    #[test]
    fn test_leading_and_trailing_comments() {
        let source = "// line comment\n/* block comment */\nint x; /* after */\n";
        let (program, _) = parse(source);
        let decl = &items(&program)[0];

        assert_eq!(decl.leading_comments.len(), 2);
        assert_eq!(decl.leading_comments[0].style, CommentStyle::Line);
        assert_eq!(decl.leading_comments[1].style, CommentStyle::Block);
        assert_eq!(decl.trailing_comments.len(), 1);
        assert_eq!(decl.trailing_comments[0].text, "/* after */");
    }

    #[test]
    fn test_blank_line_flag_is_clamped() {
        let (program, _) = parse("int a;\n\n\n\nint b;\nint c;\n");
        let nodes = items(&program);
        assert!(!nodes[0].blank_line_before);
        assert!(nodes[1].blank_line_before);
        assert!(!nodes[2].blank_line_before);
    }

    #[test]
    fn test_comment_between_lines_is_not_a_blank_line() {
        let (program, _) = parse("int a;\n/* c */\nint b;\n");
        let nodes = items(&program);
        assert!(!nodes[1].blank_line_before);
        assert_eq!(nodes[1].leading_comments.len(), 1);
    }

    #[test]
    fn test_dangling_comment_at_end_of_file() {
        let (program, _) = parse("int a;\n/* the end */\n");
        match &program.kind {
            NodeKind::Program(body) => {
                assert_eq!(body.items.len(), 1);
                assert_eq!(body.dangling_comments.len(), 1);
            }
            _ => panic!("Expected program node"),
        }
    }

    #[test]
    fn test_top_level_recovery_balances_braces() {
        let source = "FOO(bar) { x = 1; }\nint y;\n";
        let (program, parser) = parse(source);
        let nodes = items(&program);

        assert_eq!(parser.error_count(), 1);
        assert_eq!(nodes.len(), 2);
        match &nodes[0].kind {
            NodeKind::Unparsed(raw) => assert_eq!(raw.text, "FOO(bar) { x = 1; }"),
            _ => panic!("Expected unparsed region"),
        }
        assert!(matches!(nodes[1].kind, NodeKind::VarDecl(_)));
    }

    #[test]
    fn test_recovery_makes_progress_on_stray_brace() {
        let (program, parser) = parse("}\nint x;\n");
        let nodes = items(&program);
        assert_eq!(nodes.len(), 2);
        assert!(matches!(nodes[0].kind, NodeKind::Unparsed(_)));
        assert_eq!(parser.error_count(), 1);
    }

    #[test]
    fn test_error_tokens_become_unparsed() {
        let (program, parser) = parse("int x = 1 @ 2;\nint y;\n");
        assert_eq!(parser.error_count(), 1);
        match &items(&program)[0].kind {
            NodeKind::Unparsed(raw) => assert_eq!(raw.text, "int x = 1 @ 2;"),
            _ => panic!("Expected unparsed region"),
        }
        assert!(parser.unparsed_ratio() > 0.0);
    }

    #[test]
    fn test_speculative_errors_are_discarded() {
        // The function attempt fails to match and is rewound before the
        // declaration parse succeeds; nothing is recorded.
        let (_, parser) = parse("int counter = 0;\nunsigned long total;\n");
        assert_eq!(parser.error_count(), 0);
        assert_eq!(parser.unparsed_ratio(), 0.0);
    }

    #[test]
    fn test_empty_source() {
        let (program, parser) = parse("");
        assert!(items(&program).is_empty());
        assert_eq!(parser.error_count(), 0);
    }

    #[test]
    fn test_comment_inside_item_stays_with_it() {
        let (program, parser) = parse("int x = /* mid */ 5;\nint y;\n");
        assert_eq!(parser.error_count(), 0);
        let nodes = items(&program);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].leading_comments.len(), 1);
        assert_eq!(nodes[0].leading_comments[0].text, "/* mid */");
        assert!(nodes[1].leading_comments.is_empty());
    }
}
