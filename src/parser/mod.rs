//! C source code parser
//!
//! This module transforms C source text into a syntax tree that keeps
//! everything a formatter needs to reprint the program:
//! - [`lexer`]: Lossless tokenization (source text → tokens, trivia included)
//! - [`parse`]: Parser infrastructure, recovery and the top-level loop
//! - [`symbols`]: Scoped symbol table for telling types from values
//! - [`ast`]: Syntax tree definitions
//!
//! # Supported C
//!
//! Declarations, definitions and statements of ordinary C, plus whole-line
//! preprocessor directives. Anything outside that (statement expressions,
//! K&R definitions, designated initializers, ...) is kept as verbatim
//! unparsed text, so parsing never fails.
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with precedence climbing for binary operators.
//! No external parser generator dependencies.

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;
pub mod symbols;

pub use parse::{ParseError, Parser};
