//! # Introduction
//!
//! crustfmt reformats C source files into a fixed house style (tabs, braces
//! on their own lines, `return (value);`, block comments only) without ever
//! losing text: whatever the parser cannot model is kept verbatim.
//!
//! ## Formatting pipeline
//!
//! ```text
//! Source → Lexer → Tokens → Parser (+ symbol table) → Tree → Formatter → Text
//! ```
//!
//! 1. [`parser::lexer`]: lossless tokenization; concatenating the token
//!    texts gives back the input.
//! 2. [`parser`]: recursive descent with local recovery. Constructs it
//!    cannot handle become [`parser::ast::NodeKind::Unparsed`] nodes holding
//!    the original text, so parsing never fails.
//! 3. [`parser::symbols`]: scoped typedef/variable bindings used to tell
//!    `foo_t *x;` (declaration) from `a * b;` (expression).
//! 4. [`formatter`]: prints the tree. Formatting its own output changes
//!    nothing.
//!
//! ## Quick start
//!
//! ```
//! use crustfmt::{config::FormatConfig, format_source};
//!
//! let outcome = format_source("int main(void){return 0;}", &FormatConfig::default());
//! assert_eq!(outcome.text, "int main(void)\n{\n\treturn (0);\n}\n");
//! assert_eq!(outcome.error_count, 0);
//! ```

pub mod config;
pub mod error;
pub mod formatter;
pub mod parser;

use config::FormatConfig;
use formatter::Formatter;
use parser::Parser;

/// Result of formatting one source text.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatOutcome {
    pub text: String,
    /// Regions kept verbatim because they could not be parsed.
    pub error_count: usize,
    /// Share of significant tokens inside those regions, from 0.0 to 1.0.
    pub unparsed_ratio: f64,
    /// 1-based output lines wider than the configured limit.
    pub overlong_lines: Vec<usize>,
}

/// Parse and format `source` in one call.
pub fn format_source(source: &str, config: &FormatConfig) -> FormatOutcome {
    let mut parser = Parser::new(source);
    let program = parser.parse_program();
    let formatted = Formatter::new(config).format_program(&program);

    FormatOutcome {
        text: formatted.text,
        error_count: parser.error_count(),
        unparsed_ratio: parser.unparsed_ratio(),
        overlong_lines: formatted.overlong_lines,
    }
}
