//! The fixed row schema this engine stores: `(id, username, email)`.
//!
//! There is exactly one table and exactly one schema; there is no column
//! catalog to consult. Encoding is a direct field-by-field write into a
//! fixed-size buffer, not a general serialization format.

use crate::errors::Error;

pub const USERNAME_MAX_LEN: usize = 32;
pub const EMAIL_MAX_LEN: usize = 255;

const ID_SIZE: usize = 4;
const USERNAME_FIELD_SIZE: usize = USERNAME_MAX_LEN + 1; // + NUL terminator
const EMAIL_FIELD_SIZE: usize = EMAIL_MAX_LEN + 1; // + NUL terminator

const ID_OFFSET: usize = 0;
const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_FIELD_SIZE;

/// Size in bytes of one encoded row, as stored in a leaf cell.
pub const ROW_SIZE: usize = ID_SIZE + USERNAME_FIELD_SIZE + EMAIL_FIELD_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: u32,
    pub username: String,
    pub email: String,
}

impl Row {
    pub fn new(id: u32, username: String, email: String) -> Result<Self, Error> {
        if username.len() > USERNAME_MAX_LEN || email.len() > EMAIL_MAX_LEN {
            return Err(Error::PrepareStringTooLong);
        }
        Ok(Row { id, username, email })
    }

    pub fn encode(&self) -> [u8; ROW_SIZE] {
        let mut buf = [0u8; ROW_SIZE];
        buf[ID_OFFSET..ID_OFFSET + ID_SIZE].copy_from_slice(&self.id.to_le_bytes());

        let uname = self.username.as_bytes();
        buf[USERNAME_OFFSET..USERNAME_OFFSET + uname.len()].copy_from_slice(uname);
        // Remaining bytes, including the NUL terminator slot, are already zero.

        let email = self.email.as_bytes();
        buf[EMAIL_OFFSET..EMAIL_OFFSET + email.len()].copy_from_slice(email);

        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() != ROW_SIZE {
            return Err(Error::Storage(format!(
                "row decode: expected {} bytes, got {}",
                ROW_SIZE,
                buf.len()
            )));
        }
        let id = u32::from_le_bytes(
            buf[ID_OFFSET..ID_OFFSET + ID_SIZE]
                .try_into()
                .expect("row decode: id slice is 4 bytes"),
        );
        let username = read_nul_terminated(&buf[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_FIELD_SIZE]);
        let email = read_nul_terminated(&buf[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_FIELD_SIZE]);
        Ok(Row { id, username, email })
    }
}

fn read_nul_terminated(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

impl std::fmt::Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_row() {
        let row = Row::new(7, "alice".into(), "alice@example.com".into()).unwrap();
        let encoded = row.encode();
        let decoded = Row::decode(&encoded).unwrap();
        assert_eq!(row, decoded);
    }

    #[test]
    fn rejects_overlong_username() {
        let long = "a".repeat(USERNAME_MAX_LEN + 1);
        let err = Row::new(1, long, "x@x".into()).unwrap_err();
        assert!(matches!(err, Error::PrepareStringTooLong));
    }

    #[test]
    fn empty_strings_round_trip_to_empty_strings() {
        let row = Row::new(1, String::new(), String::new()).unwrap();
        let decoded = Row::decode(&row.encode()).unwrap();
        assert_eq!(decoded.username, "");
        assert_eq!(decoded.email, "");
    }
}
