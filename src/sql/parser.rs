//! Turns one line of REPL input into a `MetaCommand` or `Statement` (C8).
//!
//! This is intentionally tiny: the grammar is `.exit` / `.btree` /
//! `.constants`, `insert <id> <username> <email>`, or `select`. Anything
//! else is an error the REPL surfaces to the user and keeps looping past.

use super::statement::{MetaCommand, Statement};
use super::tokenizer;
use super::validator;
use crate::err;
use crate::errors::Error;

/// Parses a `.`-prefixed line. `line` includes the leading dot.
pub fn parse_meta_command(line: &str) -> Result<MetaCommand, Error> {
    match line {
        ".exit" => Ok(MetaCommand::Exit),
        ".btree" => Ok(MetaCommand::Btree),
        ".constants" => Ok(MetaCommand::Constants),
        _ => Err(err!(PrepareUnrecognizedMeta, "{}", line)),
    }
}

/// Parses a non-meta statement line.
pub fn parse_statement(line: &str) -> Result<Statement, Error> {
    let tokens = tokenizer::tokenize(line);
    match tokens.first().copied() {
        Some("insert") => parse_insert(&tokens),
        Some("select") => parse_select(&tokens),
        _ => Err(err!(PrepareUnrecognized, "{}", line)),
    }
}

fn parse_insert(tokens: &[&str]) -> Result<Statement, Error> {
    if tokens.len() != 4 {
        return Err(err!(PrepareSyntax));
    }
    let id = validator::validate_id(tokens[1])?;
    let username = validator::validate_username(tokens[2])?;
    let email = validator::validate_email(tokens[3])?;
    Ok(Statement::Insert { id, username, email })
}

fn parse_select(tokens: &[&str]) -> Result<Statement, Error> {
    if tokens.len() != 1 {
        return Err(err!(PrepareSyntax));
    }
    Ok(Statement::Select)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exit() {
        assert_eq!(parse_meta_command(".exit").unwrap(), MetaCommand::Exit);
    }

    #[test]
    fn rejects_unknown_meta_command() {
        let err = parse_meta_command(".frobnicate").unwrap_err();
        assert!(matches!(err, Error::PrepareUnrecognizedMeta(ref s) if s == ".frobnicate"));
    }

    #[test]
    fn parses_insert() {
        let stmt = parse_statement("insert 1 alice alice@example.com").unwrap();
        assert_eq!(
            stmt,
            Statement::Insert {
                id: 1,
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
            }
        );
    }

    #[test]
    fn rejects_insert_with_wrong_token_count() {
        let err = parse_statement("insert 1 alice").unwrap_err();
        assert!(matches!(err, Error::PrepareSyntax));
    }

    #[test]
    fn parses_select() {
        assert_eq!(parse_statement("select").unwrap(), Statement::Select);
    }

    #[test]
    fn rejects_select_with_trailing_tokens() {
        let err = parse_statement("select *").unwrap_err();
        assert!(matches!(err, Error::PrepareSyntax));
    }

    #[test]
    fn rejects_unrecognized_statement() {
        let err = parse_statement("delete 1").unwrap_err();
        assert!(matches!(err, Error::PrepareUnrecognized(ref s) if s == "delete 1"));
    }
}
