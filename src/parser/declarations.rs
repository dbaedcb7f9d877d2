//! Declaration parsing implementation
//!
//! Handles everything that introduces a name: functions and prototypes,
//! variables (with comma-chained declarators), function pointers, typedefs,
//! and struct/union/enum definitions.
//!
//! # Grammar
//!
//! ```text
//! function     → specifiers pointer IDENT '(' params ')' attribute* (';' | block)
//! declaration  → specifiers (fn_pointer | declarator (',' declarator)*) ';'
//! declarator   → pointer IDENT array* (':' expr)? ('=' initializer)?
//! fn_pointer   → '(' pointer IDENT ')' '(' params ')' ('=' initializer)?
//! specifiers   → (qualifier | storage | base | tag IDENT? | TYPEDEF_NAME)+
//! typedef      → 'typedef' (tag_body | specifiers) (fn_pointer | pointer IDENT array*) ';'
//! tag_body     → ('struct' | 'union') IDENT? ('{' member* '}')?
//!              | 'enum' IDENT? ('{' enum_value (',' enum_value)* ','? '}')?
//! ```
//!
//! # Declarations versus expressions
//!
//! A statement starting with an identifier is a declaration when the
//! identifier is a typedef name, when two identifiers follow each other
//! (`foo_t x;`), or when it has the shape `IDENT *+ IDENT` followed by one of
//! `; , = [` with the stars attached to exactly one side (`foo *bar;`,
//! `foo* bar;`). `a * b;` and `a*b;` stay multiplications, and so does any
//! shape whose leading identifier is already known as a variable.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser, Recovery};
use crate::parser::symbols::{Binding, SymbolKind};

impl Parser {
    // ===== Lookahead =====

    /// Does the next significant token start a declaration?
    pub(crate) fn is_declaration_start(&self) -> bool {
        let kind = self.peek_kind();
        if kind.starts_type() {
            return true;
        }
        if kind != TokenKind::Ident {
            return false;
        }

        let name = &self.peek().text;
        if self.is_typedef_name(name) {
            return true;
        }
        if self.is_known_value(name) {
            return false;
        }

        match self.peek_ahead_kind(1) {
            TokenKind::Ident => matches!(
                self.peek_ahead_kind(2),
                TokenKind::Semicolon | TokenKind::Comma | TokenKind::Eq | TokenKind::LBracket
            ),
            TokenKind::Star => self.looks_like_pointer_declaration(),
            _ => false,
        }
    }

    /// `IDENT *+ IDENT` followed by `; , = [`, stars attached to one side only.
    fn looks_like_pointer_declaration(&self) -> bool {
        let mut n = 1;
        while self.peek_ahead_kind(n) == TokenKind::Star {
            n += 1;
        }
        if self.peek_ahead_kind(n) != TokenKind::Ident
            || !matches!(
                self.peek_ahead_kind(n + 1),
                TokenKind::Semicolon | TokenKind::Comma | TokenKind::Eq | TokenKind::LBracket
            )
        {
            return false;
        }

        let type_index = self.significant_index(0);
        let first_star = self.significant_index(1);
        let last_star = self.significant_index(n - 1);
        let name_index = self.significant_index(n);

        let space_before = first_star > type_index + 1;
        let space_after = name_index > last_star + 1;
        space_before != space_after
    }

    /// Names bound as variables or functions are never taken as types.
    fn is_known_value(&self, name: &str) -> bool {
        matches!(
            self.symbols.lookup(self.scope, name),
            Some(Binding {
                kind: SymbolKind::Variable | SymbolKind::Function,
                ..
            })
        )
    }

    /// Whether the identifier `n` tokens ahead names a type here.
    fn ident_is_type(&self, n: usize, allow_unknown: bool) -> bool {
        let name = &self.peek_ahead(n).text;
        if self.is_typedef_name(name) {
            return true;
        }
        allow_unknown
            && !self.is_known_value(name)
            && matches!(
                self.peek_ahead_kind(n + 1),
                TokenKind::Ident | TokenKind::Star | TokenKind::Const | TokenKind::Volatile
            )
    }

    /// `struct {`, `struct name {` and the same for union/enum.
    pub(crate) fn is_tag_body_ahead(&self) -> bool {
        match self.peek_ahead_kind(1) {
            TokenKind::LBrace => true,
            TokenKind::Ident => self.peek_ahead_kind(2) == TokenKind::LBrace,
            _ => false,
        }
    }

    /// Tag definition or forward declaration rather than a return type.
    pub(crate) fn is_tag_definition(&self) -> bool {
        self.is_tag_body_ahead()
            || (self.peek_ahead_kind(1) == TokenKind::Ident
                && self.peek_ahead_kind(2) == TokenKind::Semicolon)
    }

    // ===== Type pieces =====

    /// Collect qualifiers, storage classes, base keywords, a tag reference or
    /// a typedef name.
    pub(crate) fn parse_type_specifiers(
        &mut self,
        allow_unknown: bool,
    ) -> Result<Vec<String>, ParseError> {
        let mut tokens = Vec::new();
        let mut has_base = false;

        loop {
            let kind = self.peek_kind();
            if kind.is_qualifier() || kind.is_storage_class() {
                tokens.push(self.advance().text);
            } else if kind.is_base_type() {
                tokens.push(self.advance().text);
                has_base = true;
            } else if kind.is_tag_keyword() && !has_base {
                tokens.push(self.advance().text);
                if self.check(TokenKind::Ident) {
                    tokens.push(self.advance().text);
                }
                has_base = true;
            } else if kind == TokenKind::Ident && !has_base && self.ident_is_type(0, allow_unknown) {
                tokens.push(self.advance().text);
                has_base = true;
            } else {
                break;
            }
        }

        if has_base {
            Ok(tokens)
        } else {
            Err(self.error_here("Expected a type"))
        }
    }

    /// Stars and the qualifiers that follow each of them.
    pub(crate) fn parse_pointer(&mut self) -> Vec<String> {
        let mut pointer = Vec::new();
        while self.check(TokenKind::Star) {
            pointer.push(self.advance().text);
            while self.peek_kind().is_qualifier() {
                pointer.push(self.advance().text);
            }
        }
        pointer
    }

    pub(crate) fn parse_array_suffix(&mut self) -> Result<Vec<String>, ParseError> {
        let mut suffix = Vec::new();
        while self.check(TokenKind::LBracket) {
            suffix.push(self.consume_balanced(TokenKind::LBracket, TokenKind::RBracket)?);
        }
        Ok(suffix)
    }

    /// GNU `__attribute__((...))` annotations are consumed and dropped.
    pub(crate) fn skip_attributes(&mut self) -> Result<(), ParseError> {
        while self.check(TokenKind::Ident) && self.peek().text == "__attribute__" {
            self.advance();
            self.consume_balanced(TokenKind::LParen, TokenKind::RParen)?;
        }
        Ok(())
    }

    // ===== Variables =====

    pub(crate) fn parse_declaration(&mut self) -> Result<Node, ParseError> {
        let loc = self.current_location();
        let type_tokens = self.parse_type_specifiers(true)?;

        if self.check(TokenKind::LParen) && self.peek_ahead_kind(1) == TokenKind::Star {
            let mut pointer = self.parse_function_pointer(type_tokens, false)?;
            if self.match_token(TokenKind::Eq) {
                pointer.init = Some(Box::new(self.parse_initializer()?));
            }
            self.expect_semicolon("after declaration")?;
            self.declare(&pointer.name, SymbolKind::Variable);
            return Ok(Node::new(NodeKind::FunctionPointer(pointer), loc));
        }

        let declarator = self.parse_declarator()?;
        let mut siblings = Vec::new();
        while self.match_token(TokenKind::Comma) {
            siblings.push(self.parse_declarator()?);
        }
        self.expect_semicolon("after declaration")?;

        let decl = VarDecl {
            type_tokens,
            declarator,
            siblings,
        };
        for declarator in decl.declarators() {
            self.declare(&declarator.name, SymbolKind::Variable);
        }
        Ok(Node::new(NodeKind::VarDecl(decl), loc))
    }

    pub(crate) fn parse_declarator(&mut self) -> Result<Declarator, ParseError> {
        let pointer = self.parse_pointer();
        let name = self.expect_identifier("in declaration")?;
        let array_suffix = self.parse_array_suffix()?;

        let bit_width = if self.match_token(TokenKind::Colon) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        let init = if self.match_token(TokenKind::Eq) {
            Some(Box::new(self.parse_initializer()?))
        } else {
            None
        };

        Ok(Declarator {
            pointer,
            name,
            array_suffix,
            bit_width,
            init,
        })
    }

    /// An expression or a (nested) brace-enclosed initializer list.
    pub(crate) fn parse_initializer(&mut self) -> Result<Node, ParseError> {
        if !self.check(TokenKind::LBrace) {
            return self.parse_expression();
        }

        let loc = self.current_location();
        self.advance();
        let mut elements = Vec::new();
        while !self.check(TokenKind::RBrace) {
            elements.push(self.nested(Self::parse_initializer)?);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        self.expect_token(TokenKind::RBrace, "to close initializer list")?;

        Ok(Node::new(NodeKind::InitList { elements }, loc))
    }

    /// `(*name)(params)` after the return type has been read.
    fn parse_function_pointer(
        &mut self,
        return_type: Vec<String>,
        allow_anonymous: bool,
    ) -> Result<FunctionPointer, ParseError> {
        self.expect_token(TokenKind::LParen, "before function pointer")?;
        let pointer = self.parse_pointer();
        let name = if self.check(TokenKind::Ident) {
            self.advance().text
        } else if allow_anonymous {
            String::new()
        } else {
            return Err(self.error_here("Expected function pointer name"));
        };
        self.expect_token(TokenKind::RParen, "after function pointer name")?;
        let params = self.parse_parameter_list()?;

        Ok(FunctionPointer {
            return_type,
            pointer,
            name,
            params,
            init: None,
        })
    }

    // ===== Functions =====

    /// Function definition or prototype. `Ok(None)` (with the cursor
    /// restored) when the input does not have the `type name (` shape.
    pub(crate) fn parse_function(&mut self) -> Result<Option<Node>, ParseError> {
        let start = self.checkpoint();
        let loc = self.current_location();

        let Ok(mut return_type) = self.parse_type_specifiers(true) else {
            self.rewind(start);
            return Ok(None);
        };
        return_type.extend(self.parse_pointer());

        if !(self.check(TokenKind::Ident) && self.peek_ahead_kind(1) == TokenKind::LParen) {
            self.rewind(start);
            return Ok(None);
        }
        let name = self.advance().text;
        self.declare(&name, SymbolKind::Function);

        let outer = self.scope;
        self.scope = self.symbols.create_scope(Some(outer));
        let result = self.parse_function_rest(return_type, name, loc);
        self.scope = outer;
        result.map(Some)
    }

    fn parse_function_rest(
        &mut self,
        return_type: Vec<String>,
        name: String,
        loc: SourceLocation,
    ) -> Result<Node, ParseError> {
        let params = self.parse_parameter_list()?;
        for param in &params {
            let name = match &param.kind {
                NodeKind::Param(Param::Named { name: Some(name), .. }) => name.as_str(),
                NodeKind::Param(Param::FunctionPointer(fp)) => fp.name.as_str(),
                _ => continue,
            };
            if !name.is_empty() {
                self.declare(name, SymbolKind::Variable);
            }
        }
        self.skip_attributes()?;

        let body = if self.match_token(TokenKind::Semicolon) {
            None
        } else if self.check(TokenKind::LBrace) {
            Some(Box::new(self.parse_block()?))
        } else {
            return Err(self.error_here("Expected '{' or ';' after function signature"));
        };

        Ok(Node::new(
            NodeKind::Function(Function {
                return_type,
                name,
                params,
                body,
            }),
            loc,
        ))
    }

    /// `( param (, param)* )` including the parentheses.
    pub(crate) fn parse_parameter_list(&mut self) -> Result<Vec<Node>, ParseError> {
        self.expect_token(TokenKind::LParen, "to open parameter list")?;
        let mut params = Vec::new();
        if self.match_token(TokenKind::RParen) {
            return Ok(params);
        }

        loop {
            params.push(self.parse_parameter()?);
            if self.match_token(TokenKind::Comma) {
                continue;
            }
            self.expect_token(TokenKind::RParen, "to close parameter list")?;
            return Ok(params);
        }
    }

    fn parse_parameter(&mut self) -> Result<Node, ParseError> {
        let loc = self.current_location();
        if self.match_token(TokenKind::Ellipsis) {
            return Ok(Node::new(NodeKind::Param(Param::Variadic), loc));
        }

        let mut type_tokens = match self.parse_type_specifiers(true) {
            Ok(tokens) => tokens,
            // An unnamed parameter of a type we have never seen: `f(foo_t)`.
            Err(_)
                if self.check(TokenKind::Ident)
                    && matches!(
                        self.peek_ahead_kind(1),
                        TokenKind::Comma | TokenKind::RParen
                    ) =>
            {
                vec![self.advance().text]
            }
            Err(err) => return Err(err),
        };

        if self.check(TokenKind::LParen) && self.peek_ahead_kind(1) == TokenKind::Star {
            let pointer = self.parse_function_pointer(type_tokens, true)?;
            return Ok(Node::new(
                NodeKind::Param(Param::FunctionPointer(pointer)),
                loc,
            ));
        }

        type_tokens.extend(self.parse_pointer());
        let name = if self.check(TokenKind::Ident) {
            Some(self.advance().text)
        } else {
            None
        };
        let array_suffix = self.parse_array_suffix()?;

        Ok(Node::new(
            NodeKind::Param(Param::Named {
                type_tokens,
                name,
                array_suffix,
            }),
            loc,
        ))
    }

    // ===== Typedefs =====

    pub(crate) fn parse_typedef(&mut self) -> Result<Node, ParseError> {
        let loc = self.current_location();
        self.expect_token(TokenKind::Typedef, "")?;

        let target = if self.peek_kind().is_tag_keyword() && self.is_tag_body_ahead() {
            TypedefTarget::Aggregate(Box::new(self.parse_tag_body()?))
        } else {
            let type_tokens = self.parse_type_specifiers(true)?;

            if self.check(TokenKind::LParen) && self.peek_ahead_kind(1) == TokenKind::Star {
                let pointer = self.parse_function_pointer(type_tokens, false)?;
                let alias = pointer.name.clone();
                self.declare(&alias, SymbolKind::Typedef);
                self.expect_semicolon("after typedef")?;
                return Ok(Node::new(
                    NodeKind::Typedef(Typedef {
                        alias,
                        pointer: Vec::new(),
                        target: TypedefTarget::FunctionPointer(pointer),
                    }),
                    loc,
                ));
            }

            TypedefTarget::Plain {
                type_tokens,
                array_suffix: Vec::new(),
            }
        };

        let pointer = self.parse_pointer();
        let alias = self.expect_identifier("for typedef name")?;
        self.declare(&alias, SymbolKind::Typedef);

        let target = match target {
            TypedefTarget::Plain { type_tokens, .. } => TypedefTarget::Plain {
                type_tokens,
                array_suffix: self.parse_array_suffix()?,
            },
            other => other,
        };
        self.expect_semicolon("after typedef")?;

        Ok(Node::new(
            NodeKind::Typedef(Typedef {
                alias,
                pointer,
                target,
            }),
            loc,
        ))
    }

    // ===== Structs, unions and enums =====

    /// A tag definition followed by optional variables and the closing `;`.
    pub(crate) fn parse_tag_definition(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_tag_body()?;

        let mut instances = Vec::new();
        if !self.check(TokenKind::Semicolon) {
            instances.push(self.parse_declarator()?);
            while self.match_token(TokenKind::Comma) {
                instances.push(self.parse_declarator()?);
            }
        }
        self.expect_semicolon("after definition")?;

        for instance in &instances {
            self.declare(&instance.name, SymbolKind::Variable);
        }
        match &mut node.kind {
            NodeKind::Struct(aggregate) | NodeKind::Union(aggregate) => {
                aggregate.instances = instances;
            }
            NodeKind::Enum(def) => def.instances = instances,
            _ => {}
        }
        Ok(node)
    }

    /// `struct`/`union`/`enum`, optional tag and optional body.
    pub(crate) fn parse_tag_body(&mut self) -> Result<Node, ParseError> {
        self.nested(|parser| {
            if parser.check(TokenKind::Enum) {
                parser.parse_enum()
            } else {
                parser.parse_aggregate()
            }
        })
    }

    fn parse_aggregate(&mut self) -> Result<Node, ParseError> {
        let loc = self.current_location();
        let keyword = self.advance();
        let tag = if self.check(TokenKind::Ident) {
            Some(self.advance().text)
        } else {
            None
        };
        let members = if self.check(TokenKind::LBrace) {
            Some(self.parse_member_list()?)
        } else {
            None
        };

        let aggregate = Aggregate {
            tag,
            members,
            instances: Vec::new(),
        };
        let kind = if keyword.kind == TokenKind::Union {
            NodeKind::Union(aggregate)
        } else {
            NodeKind::Struct(aggregate)
        };
        Ok(Node::new(kind, loc))
    }

    fn parse_member_list(&mut self) -> Result<Body, ParseError> {
        self.expect_token(TokenKind::LBrace, "to open member list")?;
        let mut body = Body::default();

        loop {
            let blank = self.skip_trivia() > 1;
            if self.check(TokenKind::RBrace) || self.is_at_end() {
                body.dangling_comments = std::mem::take(&mut self.pending_comments);
                break;
            }
            let member = self.parse_item(blank, Recovery::Statement, Self::parse_member);
            body.items.push(member);
        }

        self.expect_token(TokenKind::RBrace, "to close member list")?;
        Ok(body)
    }

    fn parse_member(&mut self) -> Result<Node, ParseError> {
        match self.peek_kind() {
            TokenKind::Preprocessor => Ok(self.parse_preprocessor()),
            kind if kind.is_tag_keyword() && self.is_tag_body_ahead() => {
                self.parse_tag_definition()
            }
            _ => self.parse_declaration(),
        }
    }

    fn parse_enum(&mut self) -> Result<Node, ParseError> {
        let loc = self.current_location();
        self.expect_token(TokenKind::Enum, "")?;
        let tag = if self.check(TokenKind::Ident) {
            Some(self.advance().text)
        } else {
            None
        };
        let values = if self.check(TokenKind::LBrace) {
            Some(self.parse_enum_body()?)
        } else {
            None
        };

        Ok(Node::new(
            NodeKind::Enum(EnumDef {
                tag,
                values,
                instances: Vec::new(),
            }),
            loc,
        ))
    }

    fn parse_enum_body(&mut self) -> Result<Body, ParseError> {
        self.expect_token(TokenKind::LBrace, "to open enum body")?;
        let mut body = Body::default();

        loop {
            let blank = self.skip_trivia() > 1;
            if self.check(TokenKind::RBrace) || self.is_at_end() {
                body.dangling_comments = std::mem::take(&mut self.pending_comments);
                break;
            }
            let value = self.parse_item(blank, Recovery::EnumEntry, Self::parse_enum_value);
            body.items.push(value);
        }

        self.expect_token(TokenKind::RBrace, "to close enum body")?;
        Ok(body)
    }

    /// `NAME` or `NAME = expr`, plus the separating comma if present.
    fn parse_enum_value(&mut self) -> Result<Node, ParseError> {
        let loc = self.current_location();
        let name = self.expect_identifier("in enum body")?;
        let value = if self.match_token(TokenKind::Eq) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        if !self.check(TokenKind::RBrace) {
            self.expect_token(TokenKind::Comma, "between enum values")?;
        }

        self.declare(&name, SymbolKind::Variable);
        Ok(Node::new(NodeKind::EnumValue { name, value }, loc))
    }
}
