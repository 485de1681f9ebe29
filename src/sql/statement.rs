//! The statement grammar this REPL recognizes: a handful of `.`-prefixed
//! meta-commands, plus the two data statements (`insert`, `select`). There is
//! no general SQL here — one table, one fixed schema, one verb each way.

/// A `.`-prefixed directive, handled without touching the B+ tree at all
/// (besides `.btree`, which only reads it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaCommand {
    Exit,
    Btree,
    Constants,
}

/// A data statement, already validated against the fixed row schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Insert {
        id: u32,
        username: String,
        email: String,
    },
    Select,
}
