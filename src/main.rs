// crustfmt: a C source formatter that never loses text

mod cli;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Args, RunStatus};

fn main() -> ExitCode {
    let args = Args::parse();

    // `RUST_LOG` wins over -v
    let default_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();

    match cli::run(&args) {
        Ok(RunStatus::Success) => ExitCode::SUCCESS,
        Ok(RunStatus::NeedsFormatting) => ExitCode::from(1),
        Ok(RunStatus::Failed(_)) => ExitCode::from(2),
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(2)
        }
    }
}
