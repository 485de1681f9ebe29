//! The read/evaluate/print loop (C8): drives a `Table` from line-oriented
//! stdin input. Reads are plain buffered lines — no raw terminal mode — so
//! the binary is drivable by piping lines into stdin, which is how the
//! integration tests exercise it.

pub mod history;

use std::io::{self, BufRead, Write};

use crate::err;
use crate::errors::Error;
use crate::sql::{self, MetaCommand, Statement};
use crate::storage::{Row, Table};

const PROMPT: &str = "db > ";
const HISTORY_FILE_NAME: &str = ".mysqlite_history";

/// Runs the REPL against the database at `db_path` until `.exit` or EOF.
pub fn run(db_path: &str) -> Result<(), Error> {
    let mut table = Table::open(db_path)?;

    // Best-effort: an unresolvable home directory, or a missing/unwritable
    // history file, never blocks startup — the session just runs without
    // history.
    let history_path = history::get_home_file(HISTORY_FILE_NAME.to_string());
    if let Some(path) = &history_path {
        let _ = history::ensure_history_file(path);
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{}", PROMPT);
        io::stdout().flush().map_err(|e| err!(IoWrite, "{}", e))?;

        let line = match lines.next() {
            Some(line) => line.map_err(|e| err!(IoRead, "{}", e))?,
            None => {
                table.close()?;
                return Ok(());
            }
        };

        if let Some(path) = &history_path {
            let _ = history::append_history(&line, path);
        }

        if line.starts_with('.') {
            handle_meta_command(&mut table, &line)?;
            continue;
        }

        handle_statement(&mut table, &line)?;
    }
}

fn handle_meta_command(table: &mut Table, line: &str) -> Result<(), Error> {
    match sql::parse_meta_command(line) {
        Ok(MetaCommand::Exit) => {
            table.close()?;
            std::process::exit(0);
        }
        Ok(MetaCommand::Btree) => table.debug_print_tree(&mut io::stdout()),
        Ok(MetaCommand::Constants) => Table::debug_print_constants(&mut io::stdout()),
        Err(e @ Error::PrepareUnrecognizedMeta(_)) => {
            println!("{}", e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn handle_statement(table: &mut Table, line: &str) -> Result<(), Error> {
    match sql::parse_statement(line) {
        Ok(Statement::Select) => execute_select(table),
        Ok(Statement::Insert { id, username, email }) => execute_insert(table, id, username, email),
        Err(e @ (Error::PrepareSyntax
        | Error::PrepareNegativeId
        | Error::PrepareStringTooLong
        | Error::PrepareUnrecognized(_))) => {
            println!("{}", e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn execute_select(table: &mut Table) -> Result<(), Error> {
    let mut rows = Vec::new();
    table.scan(|row| rows.push(row.clone()))?;
    for row in &rows {
        println!("{}", row);
    }
    println!("executed.");
    Ok(())
}

fn execute_insert(table: &mut Table, id: u32, username: String, email: String) -> Result<(), Error> {
    let row = Row::new(id, username, email)?;
    match table.insert(row) {
        Ok(()) => {
            println!("executed.");
            Ok(())
        }
        Err(Error::DuplicateKey) => {
            println!("error: duplicate key.");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
