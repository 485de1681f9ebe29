//! CLI entry point (C8): parses argv, wires up logging, and drives the REPL
//! loop against the database file named on the command line.

#[macro_use]
mod errors;
mod repl;
mod sql;
mod storage;

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use errors::Error;

fn main() -> ExitCode {
    let db_path = match parse_args() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&db_path);

    match repl::run(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Exactly one positional argument is accepted: the database filename.
fn parse_args() -> Result<String, Error> {
    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .ok_or_else(|| Error::Usage("Must supply a db filename".to_string()))?;
    if args.next().is_some() {
        return Err(Error::Usage("Must supply a db filename".to_string()));
    }
    Ok(path)
}

/// Diagnostic tracing (pager opens/closes, allocations, splits, root
/// creation) never shares stdout with the REPL's transcript, so it is
/// written to a log file named after the database instead.
fn init_logging(db_path: &str) {
    let log_path = format!("{}.log", db_path);
    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(_) => return,
    };

    let _ = tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .try_init();
}
