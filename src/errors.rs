use std::fmt;

/// The single error type returned from every fallible operation in this crate.
#[derive(Debug)]
pub enum Error {
    Usage(String),
    IoOpen(String),
    IoWrite(String),
    IoRead(String),
    IoSeek(String),
    CorruptPageAlignment,
    PageIndexOutOfRange(u32),
    PrepareSyntax,
    PrepareNegativeId,
    PrepareStringTooLong,
    PrepareUnrecognized(String),
    PrepareUnrecognizedMeta(String),
    DuplicateKey,
    /// Catch-all for engine-internal invariant violations that aren't one of
    /// the named kinds above (encode/decode size mismatches, tree corruption
    /// detected at runtime). Always fatal.
    Storage(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Usage(msg) => write!(f, "{}", msg),
            Error::IoOpen(msg) => write!(f, "unable to open file. {}", msg),
            Error::IoWrite(msg) => write!(f, "error writing file. {}", msg),
            Error::IoRead(msg) => write!(f, "error reading file. {}", msg),
            Error::IoSeek(msg) => write!(f, "error seeking file. {}", msg),
            Error::CorruptPageAlignment => {
                write!(f, "db file is not a whole number of pages, corrupt file.")
            }
            Error::PageIndexOutOfRange(n) => {
                write!(f, "tried to fetch page number out of bounds: {}", n)
            }
            Error::PrepareSyntax => write!(f, "syntax error"),
            Error::PrepareNegativeId => write!(f, "ID MUST BE POSITIVE"),
            Error::PrepareStringTooLong => write!(f, "string is too long"),
            Error::PrepareUnrecognized(text) => {
                write!(f, "unrecognized command at start of {}.", text)
            }
            Error::PrepareUnrecognizedMeta(text) => {
                write!(f, "unrecognized command '{}'", text)
            }
            Error::DuplicateKey => write!(f, "error: duplicate key."),
            Error::Storage(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoRead(e.to_string())
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(_: std::num::ParseIntError) -> Self {
        Error::PrepareSyntax
    }
}

/// Shorthand for constructing an `Error` variant, optionally with a formatted message.
///
/// `err!(IoWrite, "short write at page {}", n)` expands to
/// `Error::IoWrite(format!("short write at page {}", n))`.
#[macro_export]
macro_rules! err {
    ($variant:ident) => {
        $crate::errors::Error::$variant
    };
    ($variant:ident, $($arg:tt)*) => {
        $crate::errors::Error::$variant(format!($($arg)*))
    };
}
