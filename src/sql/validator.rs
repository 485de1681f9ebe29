//! Token-level validation for the `insert` statement's fixed three fields.
//!
//! Width limits are the row schema's, not arbitrary parser choices — see
//! `storage::row`.

use crate::err;
use crate::errors::Error;
use crate::storage::row::{EMAIL_MAX_LEN, USERNAME_MAX_LEN};

/// Parses and range-checks the id token. Anything that doesn't parse as a
/// non-negative value representable in `u32` is the same user-facing error
/// as a literal negative number — the REPL doesn't distinguish "not a
/// number" from "too small a number" for this field.
pub fn validate_id(token: &str) -> Result<u32, Error> {
    token
        .parse::<i64>()
        .ok()
        .filter(|id| (0..=u32::MAX as i64).contains(id))
        .map(|id| id as u32)
        .ok_or(err!(PrepareNegativeId))
}

pub fn validate_username(token: &str) -> Result<String, Error> {
    if token.len() > USERNAME_MAX_LEN {
        return Err(err!(PrepareStringTooLong));
    }
    Ok(token.to_string())
}

pub fn validate_email(token: &str) -> Result<String, Error> {
    if token.len() > EMAIL_MAX_LEN {
        return Err(err!(PrepareStringTooLong));
    }
    Ok(token.to_string())
}
