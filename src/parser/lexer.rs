//! Lossless lexer for C source code
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! Unlike a compiler front end, nothing is discarded: whitespace runs, newlines,
//! comments and whole preprocessor directives are first-class tokens, so the
//! concatenated text of every token reproduces the input exactly.
//!
//! The lexer never fails. Characters it cannot classify (stray bytes,
//! unterminated literals or comments) come out as [`TokenKind::Error`] tokens
//! carrying their verbatim text, and the parser folds them into unparsed
//! regions.

use super::ast::SourceLocation;
use std::fmt;

/// Token categories produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Trivia
    Whitespace,
    Newline,
    LineComment,
    BlockComment,

    /// A whole directive line, continuations included.
    Preprocessor,

    // Literals and names
    Ident,
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    CharLiteral,

    // Keywords
    If,
    Else,
    While,
    For,
    Do,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Return,
    Goto,
    Typedef,
    Struct,
    Union,
    Enum,
    Sizeof,
    Void,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Signed,
    Unsigned,
    Const,
    Volatile,
    Static,
    Extern,
    Auto,
    Register,
    Inline,

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Assignment
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,
    ShlEq,
    ShrEq,

    // Comparison
    EqEq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,

    // Logical and bitwise
    AndAnd,
    OrOr,
    Bang,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Shl,
    Shr,

    PlusPlus,
    MinusMinus,
    Arrow,
    Dot,
    Ellipsis,
    Question,
    Colon,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,

    Eof,
    Error,
}

impl TokenKind {
    /// Whitespace, newlines and comments.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::Newline
                | TokenKind::LineComment
                | TokenKind::BlockComment
        )
    }

    pub fn is_comment(self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::BlockComment)
    }

    /// Built-in type specifiers (`int`, `unsigned`, ...).
    pub fn is_base_type(self) -> bool {
        matches!(
            self,
            TokenKind::Void
                | TokenKind::Char
                | TokenKind::Short
                | TokenKind::Int
                | TokenKind::Long
                | TokenKind::Float
                | TokenKind::Double
                | TokenKind::Signed
                | TokenKind::Unsigned
        )
    }

    pub fn is_qualifier(self) -> bool {
        matches!(self, TokenKind::Const | TokenKind::Volatile)
    }

    pub fn is_storage_class(self) -> bool {
        matches!(
            self,
            TokenKind::Static
                | TokenKind::Extern
                | TokenKind::Auto
                | TokenKind::Register
                | TokenKind::Inline
        )
    }

    /// `struct`, `union` or `enum`.
    pub fn is_tag_keyword(self) -> bool {
        matches!(self, TokenKind::Struct | TokenKind::Union | TokenKind::Enum)
    }

    /// Any keyword that can start a declaration's type.
    pub fn starts_type(self) -> bool {
        self.is_base_type()
            || self.is_qualifier()
            || self.is_storage_class()
            || self.is_tag_keyword()
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            TokenKind::Eq
                | TokenKind::PlusEq
                | TokenKind::MinusEq
                | TokenKind::StarEq
                | TokenKind::SlashEq
                | TokenKind::PercentEq
                | TokenKind::AmpEq
                | TokenKind::PipeEq
                | TokenKind::CaretEq
                | TokenKind::ShlEq
                | TokenKind::ShrEq
        )
    }

    /// Binding strength of a binary operator; higher binds tighter.
    pub fn binary_precedence(self) -> Option<u8> {
        let prec = match self {
            kind if kind.is_assignment() => 1,
            TokenKind::OrOr => 2,
            TokenKind::AndAnd => 3,
            TokenKind::Pipe => 4,
            TokenKind::Caret => 5,
            TokenKind::Amp => 6,
            TokenKind::EqEq | TokenKind::NotEq => 7,
            TokenKind::Lt | TokenKind::Gt | TokenKind::Le | TokenKind::Ge => 8,
            TokenKind::Shl | TokenKind::Shr => 9,
            TokenKind::Plus | TokenKind::Minus => 10,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 11,
            _ => return None,
        };
        Some(prec)
    }

    /// Fixed source spelling of keywords and punctuation.
    pub fn spelling(self) -> Option<&'static str> {
        if let Some((text, _)) = KEYWORDS.iter().find(|(_, k)| *k == self) {
            return Some(text);
        }
        PUNCTUATION
            .iter()
            .find(|(_, k)| *k == self)
            .map(|(text, _)| *text)
    }

    /// Upper-case name used by the token dump.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Whitespace => "WHITESPACE",
            TokenKind::Newline => "NEWLINE",
            TokenKind::LineComment => "COMMENT_LINE",
            TokenKind::BlockComment => "COMMENT_BLOCK",
            TokenKind::Preprocessor => "PREPROCESSOR",
            TokenKind::Ident => "IDENTIFIER",
            TokenKind::IntLiteral => "INTEGER",
            TokenKind::FloatLiteral => "FLOAT",
            TokenKind::StringLiteral => "STRING",
            TokenKind::CharLiteral => "CHAR",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::While => "WHILE",
            TokenKind::For => "FOR",
            TokenKind::Do => "DO",
            TokenKind::Switch => "SWITCH",
            TokenKind::Case => "CASE",
            TokenKind::Default => "DEFAULT",
            TokenKind::Break => "BREAK",
            TokenKind::Continue => "CONTINUE",
            TokenKind::Return => "RETURN",
            TokenKind::Goto => "GOTO",
            TokenKind::Typedef => "TYPEDEF",
            TokenKind::Struct => "STRUCT",
            TokenKind::Union => "UNION",
            TokenKind::Enum => "ENUM",
            TokenKind::Sizeof => "SIZEOF",
            TokenKind::Void => "VOID",
            TokenKind::Char => "CHAR_KW",
            TokenKind::Short => "SHORT",
            TokenKind::Int => "INT",
            TokenKind::Long => "LONG",
            TokenKind::Float => "FLOAT_KW",
            TokenKind::Double => "DOUBLE",
            TokenKind::Signed => "SIGNED",
            TokenKind::Unsigned => "UNSIGNED",
            TokenKind::Const => "CONST",
            TokenKind::Volatile => "VOLATILE",
            TokenKind::Static => "STATIC",
            TokenKind::Extern => "EXTERN",
            TokenKind::Auto => "AUTO",
            TokenKind::Register => "REGISTER",
            TokenKind::Inline => "INLINE",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "STAR",
            TokenKind::Slash => "SLASH",
            TokenKind::Percent => "PERCENT",
            TokenKind::Eq => "ASSIGN",
            TokenKind::PlusEq => "PLUS_ASSIGN",
            TokenKind::MinusEq => "MINUS_ASSIGN",
            TokenKind::StarEq => "STAR_ASSIGN",
            TokenKind::SlashEq => "SLASH_ASSIGN",
            TokenKind::PercentEq => "PERCENT_ASSIGN",
            TokenKind::AmpEq => "AMPERSAND_ASSIGN",
            TokenKind::PipeEq => "PIPE_ASSIGN",
            TokenKind::CaretEq => "CARET_ASSIGN",
            TokenKind::ShlEq => "LSHIFT_ASSIGN",
            TokenKind::ShrEq => "RSHIFT_ASSIGN",
            TokenKind::EqEq => "EQUAL",
            TokenKind::NotEq => "NOT_EQUAL",
            TokenKind::Lt => "LESS",
            TokenKind::Gt => "GREATER",
            TokenKind::Le => "LESS_EQUAL",
            TokenKind::Ge => "GREATER_EQUAL",
            TokenKind::AndAnd => "LOGICAL_AND",
            TokenKind::OrOr => "LOGICAL_OR",
            TokenKind::Bang => "LOGICAL_NOT",
            TokenKind::Amp => "AMPERSAND",
            TokenKind::Pipe => "PIPE",
            TokenKind::Caret => "CARET",
            TokenKind::Tilde => "TILDE",
            TokenKind::Shl => "LSHIFT",
            TokenKind::Shr => "RSHIFT",
            TokenKind::PlusPlus => "INCREMENT",
            TokenKind::MinusMinus => "DECREMENT",
            TokenKind::Arrow => "ARROW",
            TokenKind::Dot => "DOT",
            TokenKind::Ellipsis => "ELLIPSIS",
            TokenKind::Question => "QUESTION",
            TokenKind::Colon => "COLON",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::LBracket => "LBRACKET",
            TokenKind::RBracket => "RBRACKET",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Comma => "COMMA",
            TokenKind::Eof => "EOF",
            TokenKind::Error => "ERROR",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident => write!(f, "identifier"),
            TokenKind::IntLiteral | TokenKind::FloatLiteral => write!(f, "number"),
            TokenKind::StringLiteral => write!(f, "string literal"),
            TokenKind::CharLiteral => write!(f, "character literal"),
            TokenKind::Preprocessor => write!(f, "preprocessor directive"),
            TokenKind::Eof => write!(f, "end of file"),
            TokenKind::Error => write!(f, "invalid input"),
            other => match other.spelling() {
                Some(text) => write!(f, "'{text}'"),
                None => write!(f, "{}", other.name().to_lowercase()),
            },
        }
    }
}

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("auto", TokenKind::Auto),
    ("break", TokenKind::Break),
    ("case", TokenKind::Case),
    ("char", TokenKind::Char),
    ("const", TokenKind::Const),
    ("continue", TokenKind::Continue),
    ("default", TokenKind::Default),
    ("do", TokenKind::Do),
    ("double", TokenKind::Double),
    ("else", TokenKind::Else),
    ("enum", TokenKind::Enum),
    ("extern", TokenKind::Extern),
    ("float", TokenKind::Float),
    ("for", TokenKind::For),
    ("goto", TokenKind::Goto),
    ("if", TokenKind::If),
    ("inline", TokenKind::Inline),
    ("int", TokenKind::Int),
    ("long", TokenKind::Long),
    ("register", TokenKind::Register),
    ("return", TokenKind::Return),
    ("short", TokenKind::Short),
    ("signed", TokenKind::Signed),
    ("sizeof", TokenKind::Sizeof),
    ("static", TokenKind::Static),
    ("struct", TokenKind::Struct),
    ("switch", TokenKind::Switch),
    ("typedef", TokenKind::Typedef),
    ("union", TokenKind::Union),
    ("unsigned", TokenKind::Unsigned),
    ("void", TokenKind::Void),
    ("volatile", TokenKind::Volatile),
    ("while", TokenKind::While),
];

// Longest spellings first so that maximal munch falls out of a linear scan.
const PUNCTUATION: &[(&str, TokenKind)] = &[
    ("...", TokenKind::Ellipsis),
    ("<<=", TokenKind::ShlEq),
    (">>=", TokenKind::ShrEq),
    ("->", TokenKind::Arrow),
    ("++", TokenKind::PlusPlus),
    ("--", TokenKind::MinusMinus),
    ("<<", TokenKind::Shl),
    (">>", TokenKind::Shr),
    ("<=", TokenKind::Le),
    (">=", TokenKind::Ge),
    ("==", TokenKind::EqEq),
    ("!=", TokenKind::NotEq),
    ("&&", TokenKind::AndAnd),
    ("||", TokenKind::OrOr),
    ("+=", TokenKind::PlusEq),
    ("-=", TokenKind::MinusEq),
    ("*=", TokenKind::StarEq),
    ("/=", TokenKind::SlashEq),
    ("%=", TokenKind::PercentEq),
    ("&=", TokenKind::AmpEq),
    ("|=", TokenKind::PipeEq),
    ("^=", TokenKind::CaretEq),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("=", TokenKind::Eq),
    ("<", TokenKind::Lt),
    (">", TokenKind::Gt),
    ("!", TokenKind::Bang),
    ("&", TokenKind::Amp),
    ("|", TokenKind::Pipe),
    ("^", TokenKind::Caret),
    ("~", TokenKind::Tilde),
    (".", TokenKind::Dot),
    ("?", TokenKind::Question),
    (":", TokenKind::Colon),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    (";", TokenKind::Semicolon),
    (",", TokenKind::Comma),
];

/// Look up the keyword kind for an identifier-shaped word.
pub fn keyword_kind(word: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(text, _)| *text == word)
        .map(|(_, kind)| *kind)
}

/// A single lexeme with its verbatim text and position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub location: SourceLocation,
    /// Byte offset of the first character in the source.
    pub offset: usize,
}

impl Token {
    pub fn is_trivia(&self) -> bool {
        self.kind.is_trivia()
    }

    /// True for tokens the grammar looks at.
    pub fn is_significant(&self) -> bool {
        !self.kind.is_trivia()
    }

    /// Number of source lines this token's text spans beyond its first.
    pub fn extra_lines(&self) -> usize {
        self.text.matches('\n').count()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Ident
            | TokenKind::IntLiteral
            | TokenKind::FloatLiteral
            | TokenKind::StringLiteral
            | TokenKind::CharLiteral
            | TokenKind::Error => write!(f, "'{}'", self.text),
            kind => write!(f, "{kind}"),
        }
    }
}

/// Lexer for C source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    offset: usize,
    line: usize,
    column: usize,
    /// Only blanks seen since the last newline.
    at_line_start: bool,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            offset: 0,
            line: 1,
            column: 1,
            at_line_start: true,
        }
    }

    /// Tokenize the entire input, ending with exactly one [`TokenKind::Eof`].
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            tokens.push(self.next_token());
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            text: String::new(),
            location: self.current_location(),
            offset: self.offset,
        });
        tokens
    }

    fn next_token(&mut self) -> Token {
        let start = self.position;
        let start_offset = self.offset;
        let loc = self.current_location();
        let line_start = self.at_line_start;

        let kind = self.scan(line_start);

        // Anything but blanks ends the "start of line" state; a newline resets it.
        match kind {
            TokenKind::Newline => self.at_line_start = true,
            TokenKind::Whitespace => {}
            _ => self.at_line_start = false,
        }

        Token {
            kind,
            text: self.input[start..self.position].iter().collect(),
            location: loc,
            offset: start_offset,
        }
    }

    fn scan(&mut self, line_start: bool) -> TokenKind {
        let Some(ch) = self.peek() else {
            return TokenKind::Eof;
        };

        match ch {
            '\n' => {
                self.advance();
                TokenKind::Newline
            }
            ' ' | '\t' | '\r' | '\x0b' | '\x0c' => {
                while matches!(self.peek(), Some(' ' | '\t' | '\r' | '\x0b' | '\x0c')) {
                    self.advance();
                }
                TokenKind::Whitespace
            }
            '/' if self.peek_ahead(1) == Some('/') => self.line_comment(),
            '/' if self.peek_ahead(1) == Some('*') => self.block_comment(),
            '#' if line_start => self.preprocessor_directive(),
            '"' => self.quoted_literal('"', TokenKind::StringLiteral),
            '\'' => self.quoted_literal('\'', TokenKind::CharLiteral),
            '0'..='9' => self.number_literal(),
            '.' if matches!(self.peek_ahead(1), Some('0'..='9')) => self.number_literal(),
            'a'..='z' | 'A'..='Z' | '_' => self.identifier_or_keyword(),
            _ => self.punctuation(),
        }
    }

    fn line_comment(&mut self) -> TokenKind {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
        TokenKind::LineComment
    }

    fn block_comment(&mut self) -> TokenKind {
        self.advance(); // '/'
        self.advance(); // '*'
        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance();
                self.advance();
                return TokenKind::BlockComment;
            }
            self.advance();
        }
        TokenKind::Error
    }

    /// `#...` up to the newline, swallowing backslash-newline continuations.
    fn preprocessor_directive(&mut self) -> TokenKind {
        while let Some(ch) = self.peek() {
            match ch {
                '\n' => break,
                '\\' if self.peek_ahead(1) == Some('\n') => {
                    self.advance();
                    self.advance();
                }
                '\\' if self.peek_ahead(1) == Some('\r') && self.peek_ahead(2) == Some('\n') => {
                    self.advance();
                    self.advance();
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
        TokenKind::Preprocessor
    }

    /// String or character literal. Stops before a raw newline when unterminated.
    fn quoted_literal(&mut self, quote: char, kind: TokenKind) -> TokenKind {
        self.advance();
        while let Some(ch) = self.peek() {
            match ch {
                '\n' => return TokenKind::Error,
                '\\' => {
                    self.advance();
                    if self.peek().is_some() {
                        self.advance();
                    }
                }
                c if c == quote => {
                    self.advance();
                    return kind;
                }
                _ => {
                    self.advance();
                }
            }
        }
        TokenKind::Error
    }

    fn number_literal(&mut self) -> TokenKind {
        let mut is_float = false;

        if self.peek() == Some('0') && matches!(self.peek_ahead(1), Some('x' | 'X')) {
            self.advance();
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
                self.advance();
            }
        } else {
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
            if self.peek() == Some('.') {
                is_float = true;
                self.advance();
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
            }
            if matches!(self.peek(), Some('e' | 'E')) {
                let sign = matches!(self.peek_ahead(1), Some('+' | '-'));
                let digit_at = if sign { 2 } else { 1 };
                if matches!(self.peek_ahead(digit_at), Some(c) if c.is_ascii_digit()) {
                    is_float = true;
                    for _ in 0..digit_at {
                        self.advance();
                    }
                    while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                        self.advance();
                    }
                }
            }
        }

        // Suffixes: u, l, ul, ll, f ...
        while matches!(self.peek(), Some('u' | 'U' | 'l' | 'L' | 'f' | 'F')) {
            if matches!(self.peek(), Some('f' | 'F')) {
                is_float = true;
            }
            self.advance();
        }

        if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntLiteral
        }
    }

    fn identifier_or_keyword(&mut self) -> TokenKind {
        let start = self.position;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.advance();
        }
        let word: String = self.input[start..self.position].iter().collect();
        keyword_kind(&word).unwrap_or(TokenKind::Ident)
    }

    fn punctuation(&mut self) -> TokenKind {
        for (text, kind) in PUNCTUATION {
            if self.matches_text(text) {
                for _ in 0..text.len() {
                    self.advance();
                }
                return *kind;
            }
        }

        // Stray character: a single-character error token.
        self.advance();
        TokenKind::Error
    }

    fn matches_text(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, expected)| self.peek_ahead(i) == Some(expected))
    }

    // ===== Helper methods =====

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

/// Convenience wrapper around [`Lexer::tokenize`].
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_function_tokens() {
        let tokens = tokenize("int main(void)\n{\nreturn 0;\n}");

        assert_eq!(tokens.len(), 16);
        assert!(matches!(tokens[0].kind, TokenKind::Int));
        assert!(matches!(tokens[1].kind, TokenKind::Whitespace));
        assert!(matches!(tokens[2].kind, TokenKind::Ident) && tokens[2].text == "main");
        assert!(matches!(tokens[6].kind, TokenKind::Newline));
        assert!(matches!(tokens[11].kind, TokenKind::IntLiteral));
        assert!(matches!(tokens[15].kind, TokenKind::Eof));
        assert_eq!(tokens[9].location, SourceLocation::new(3, 1));
    }

    #[test]
    fn test_operators() {
        let got = kinds("++ -- += <<= >>= -> ... && ||");
        let significant: Vec<_> = got.into_iter().filter(|k| !k.is_trivia()).collect();
        assert_eq!(
            significant,
            vec![
                TokenKind::PlusPlus,
                TokenKind::MinusMinus,
                TokenKind::PlusEq,
                TokenKind::ShlEq,
                TokenKind::ShrEq,
                TokenKind::Arrow,
                TokenKind::Ellipsis,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments() {
        let tokens = tokenize("// line comment\n/* block comment */");
        assert!(matches!(tokens[0].kind, TokenKind::LineComment));
        assert_eq!(tokens[0].text, "// line comment");
        assert!(matches!(tokens[1].kind, TokenKind::Newline));
        assert!(matches!(tokens[2].kind, TokenKind::BlockComment));
    }

    #[test]
    fn test_preprocessor_directives() {
        let tokens = tokenize("#include <stdio.h>\n#define MAX 100");
        assert!(matches!(tokens[0].kind, TokenKind::Preprocessor));
        assert_eq!(tokens[0].text, "#include <stdio.h>");
        assert!(matches!(tokens[2].kind, TokenKind::Preprocessor));
        assert_eq!(tokens[2].text, "#define MAX 100");
    }

    #[test]
    fn test_preprocessor_continuation() {
        let source = "#define SWAP(a, b) \\\n\tdo { } while (0)\nint x;";
        let tokens = tokenize(source);
        assert!(matches!(tokens[0].kind, TokenKind::Preprocessor));
        assert_eq!(tokens[0].text, "#define SWAP(a, b) \\\n\tdo { } while (0)");
        assert_eq!(tokens[2].location.line, 3);
    }

    #[test]
    fn test_hash_mid_line_is_error() {
        let tokens = tokenize("x # y");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Error && t.text == "#"));
    }

    #[test]
    fn test_literals() {
        let got: Vec<_> = kinds("42 0x1F 3.14 1e10 2.5f 10UL 'a' \"s\\\"q\"")
            .into_iter()
            .filter(|k| !k.is_trivia())
            .collect();
        assert_eq!(
            got,
            vec![
                TokenKind::IntLiteral,
                TokenKind::IntLiteral,
                TokenKind::FloatLiteral,
                TokenKind::FloatLiteral,
                TokenKind::FloatLiteral,
                TokenKind::IntLiteral,
                TokenKind::CharLiteral,
                TokenKind::StringLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string_is_error_and_lossless() {
        let source = "char *s = \"oops\nint y;";
        let tokens = tokenize(source);
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Error));
        let rebuilt: String = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn test_offsets_track_multibyte_text() {
        let tokens = tokenize("/* é */ x");
        let x = tokens.iter().find(|t| t.kind == TokenKind::Ident).unwrap();
        assert_eq!(x.offset, "/* é */ ".len());
        assert_eq!(x.location.column, 9);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(keyword_kind("typedef"), Some(TokenKind::Typedef));
        assert_eq!(keyword_kind("inline"), Some(TokenKind::Inline));
        assert_eq!(keyword_kind("size_t"), None);
    }
}
