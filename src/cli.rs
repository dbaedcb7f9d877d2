//! Command-line driver
//!
//! Formats each file independently. Modes are mutually exclusive: print to
//! stdout (default), rewrite in place, write a single output file, report
//! files that need formatting, or show a unified diff.
//!
//! A file whose unparsed share is above `--max-unparsed` is left alone.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use similar::TextDiff;

use crustfmt::config::{FormatConfig, DEFAULT_MAX_LINE_LENGTH, DEFAULT_TAB_WIDTH};
use crustfmt::error::CliError;
use crustfmt::format_source;
use crustfmt::parser::ast::dump_tree;
use crustfmt::parser::lexer::tokenize;
use crustfmt::parser::Parser as CParser;

/// Reformat C source files into a consistent tab-indented style
#[derive(Debug, Parser)]
#[command(name = "crustfmt", version, about, long_about = None)]
pub struct Args {
    /// C source files to format
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Rewrite files in place
    #[arg(short, long, conflicts_with_all = ["check", "diff", "output"])]
    pub in_place: bool,

    /// Write the formatted text to FILE (single input only)
    #[arg(short, long, value_name = "FILE", conflicts_with_all = ["check", "diff"])]
    pub output: Option<PathBuf>,

    /// Report files that need formatting and exit with status 1 if any do
    #[arg(short, long, conflicts_with = "diff")]
    pub check: bool,

    /// Show a unified diff of the changes instead of applying them
    #[arg(short, long)]
    pub diff: bool,

    /// Never colour diff output
    #[arg(long)]
    pub no_color: bool,

    /// Display width of a tab when measuring line length
    #[arg(long, default_value_t = DEFAULT_TAB_WIDTH)]
    pub tab_width: usize,

    /// Line length above which lines are reported
    #[arg(long, default_value_t = DEFAULT_MAX_LINE_LENGTH)]
    pub max_line_length: usize,

    /// Leave a file untouched when more than this share of it cannot be parsed
    #[arg(long, value_name = "RATIO", default_value_t = 0.5)]
    pub max_unparsed: f64,

    /// Print the token stream instead of formatting
    #[arg(long, conflicts_with = "dump_ast")]
    pub dump_tokens: bool,

    /// Print the syntax tree instead of formatting
    #[arg(long)]
    pub dump_ast: bool,

    /// More log output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Unchanged,
    Changed,
    /// Too much of the file was unparsable to format it.
    Skipped,
}

impl Args {
    fn config(&self) -> FormatConfig {
        FormatConfig {
            tab_width: self.tab_width,
            max_line_length: self.max_line_length,
        }
    }
}

/// How a whole run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    /// Check mode found files that would change.
    NeedsFormatting,
    /// This many files could not be read or written.
    Failed(usize),
}

/// Run the tool over every file. A file that fails is logged and the rest
/// are still processed.
pub fn run(args: &Args) -> Result<RunStatus, CliError> {
    if args.output.is_some() && args.files.len() != 1 {
        return Err(CliError::OutputWithMultipleFiles(args.files.len()));
    }

    let mut needs_formatting = false;
    let mut failures = 0;
    for path in &args.files {
        match process_file(path, args) {
            Ok(status) => needs_formatting |= args.check && status == FileStatus::Changed,
            Err(err) => {
                tracing::error!("{err}");
                failures += 1;
            }
        }
    }

    Ok(if failures > 0 {
        RunStatus::Failed(failures)
    } else if needs_formatting {
        RunStatus::NeedsFormatting
    } else {
        RunStatus::Success
    })
}

fn read_source(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, text: &str) -> Result<(), CliError> {
    fs::write(path, text).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
fn process_file(path: &Path, args: &Args) -> Result<FileStatus, CliError> {
    let source = read_source(path)?;
    let mut stdout = io::stdout().lock();

    if args.dump_tokens {
        write!(stdout, "{}", dump_tokens(&source))?;
        return Ok(FileStatus::Unchanged);
    }
    if args.dump_ast {
        let mut parser = CParser::new(&source);
        write!(stdout, "{}", dump_tree(&parser.parse_program()))?;
        return Ok(FileStatus::Unchanged);
    }

    let config = args.config();
    let outcome = format_source(&source, &config);
    let name = path.display();

    if outcome.unparsed_ratio > args.max_unparsed {
        tracing::warn!(
            "skipping {name}: {:.0}% of it could not be parsed",
            outcome.unparsed_ratio * 100.0
        );
        if let Some(output) = &args.output {
            write_file(output, &source)?;
        } else if !(args.check || args.diff || args.in_place) {
            write!(stdout, "{source}")?;
        }
        return Ok(FileStatus::Skipped);
    }

    if outcome.error_count > 0 {
        tracing::info!(
            regions = outcome.error_count,
            "{name}: kept unparsable regions verbatim"
        );
    }
    for line in &outcome.overlong_lines {
        tracing::warn!(
            "{name}:{line}: line exceeds {} columns",
            config.max_line_length
        );
    }

    let status = if outcome.text == source {
        FileStatus::Unchanged
    } else {
        FileStatus::Changed
    };

    if args.check {
        if status == FileStatus::Changed {
            writeln!(stdout, "{name} needs formatting")?;
        }
    } else if args.diff {
        if status == FileStatus::Changed {
            let color = !args.no_color && io::stdout().is_tty();
            write!(stdout, "{}", render_diff(&name.to_string(), &source, &outcome.text, color))?;
        }
    } else if args.in_place {
        if status == FileStatus::Changed {
            write_file(path, &outcome.text)?;
            writeln!(stdout, "Formatted {name}")?;
        }
    } else if let Some(output) = &args.output {
        write_file(output, &outcome.text)?;
    } else {
        write!(stdout, "{}", outcome.text)?;
    }

    tracing::debug!(?status, "done");
    Ok(status)
}

/// One token per line: index, kind, position and the escaped text.
pub fn dump_tokens(source: &str) -> String {
    let tokens = tokenize(source);
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        out.push_str(&format!(
            "[{:3}] {:<20}  line:{:<3} col:{:<3}  {:?}\n",
            i,
            token.kind.name(),
            token.location.line,
            token.location.column,
            token.text
        ));
    }
    out
}

/// Unified diff between the original and formatted text.
pub fn render_diff(name: &str, original: &str, formatted: &str, color: bool) -> String {
    let diff = TextDiff::from_lines(original, formatted);
    let text = diff
        .unified_diff()
        .header(&format!("{name} (original)"), &format!("{name} (formatted)"))
        .to_string();
    if !color {
        return text;
    }

    let mut out = String::new();
    for line in text.split_inclusive('\n') {
        let styled = if line.starts_with("---") || line.starts_with("+++") {
            line.bold().to_string()
        } else if line.starts_with("@@") {
            line.cyan().to_string()
        } else if line.starts_with('+') {
            line.green().to_string()
        } else if line.starts_with('-') {
            line.red().to_string()
        } else {
            line.to_string()
        };
        out.push_str(&styled);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_tokens_layout() {
        let dump = dump_tokens("x;\n");
        let lines: Vec<_> = dump.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "[  0] IDENTIFIER            line:1   col:1    \"x\""
        );
        assert!(lines[2].contains("\"\\n\""));
        assert!(lines[3].starts_with("[  3] EOF"));
    }

    #[test]
    fn test_plain_diff() {
        let diff = render_diff("a.c", "int  x;\n", "int x;\n", false);
        assert!(diff.contains("--- a.c (original)"));
        assert!(diff.contains("+++ a.c (formatted)"));
        assert!(diff.contains("-int  x;"));
        assert!(diff.contains("+int x;"));
    }

    #[test]
    fn test_output_needs_single_file() {
        let args = Args::parse_from(["crustfmt", "-o", "out.c", "a.c", "b.c"]);
        assert!(matches!(run(&args), Err(CliError::OutputWithMultipleFiles(2))));
    }

    #[test]
    fn test_unreadable_files_are_counted() {
        let args = Args::parse_from(["crustfmt", "--check", "/nonexistent/a.c", "/nonexistent/b.c"]);
        assert_eq!(run(&args).ok(), Some(RunStatus::Failed(2)));
    }

    #[test]
    fn test_modes_conflict() {
        assert!(Args::try_parse_from(["crustfmt", "-i", "-c", "a.c"]).is_err());
        assert!(Args::try_parse_from(["crustfmt", "--check", "--diff", "a.c"]).is_err());
        assert!(Args::try_parse_from(["crustfmt"]).is_err());
    }
}
