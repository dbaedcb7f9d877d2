//! Error types for the command-line tool
//!
//! Parsing itself never fails (broken regions are kept verbatim and counted),
//! so the only hard errors are file-system and usage problems. The parser's
//! per-region diagnostic, [`ParseError`], is re-exported here for callers
//! that want to report it.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub use crate::parser::ParseError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `--output` names one file, so it takes exactly one input.
    #[error("--output requires exactly one input file, got {0}")]
    OutputWithMultipleFiles(usize),

    #[error("cannot write to stdout: {0}")]
    Stdout(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_file() {
        let err = CliError::Read {
            path: PathBuf::from("src/main.c"),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        };
        assert_eq!(
            err.to_string(),
            "cannot read src/main.c: No such file or directory"
        );
        assert_eq!(
            CliError::OutputWithMultipleFiles(3).to_string(),
            "--output requires exactly one input file, got 3"
        );
    }
}
