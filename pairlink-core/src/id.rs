//! Session identifiers.
//!
//! Channel ids are random v4 UUIDs in lowercase hyphenated form
//! (122 bits of entropy). The registry overwrites on insert, so collision
//! resistance here is what keeps two channels apart.
//!
//! Room names are chosen by the endpoints and must be typeable:
//! 8 to 64 characters of ASCII letters, digits and `-`.

use uuid::Uuid;

use crate::error::PairingError;

/// Length of a hyphenated UUID.
pub const CHANNEL_ID_LEN: usize = 36;

/// Minimum room name length.
pub const ROOM_NAME_MIN: usize = 8;

/// Maximum room name length.
pub const ROOM_NAME_MAX: usize = 64;

const HYPHENS: [usize; 4] = [8, 13, 18, 23];

/// Generate a fresh channel id.
pub fn new_channel_id() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

/// Check that `id` has exactly the shape produced by [`new_channel_id`].
pub fn is_channel_id(id: &str) -> bool {
    if id.len() != CHANNEL_ID_LEN {
        return false;
    }
    id.bytes().enumerate().all(|(i, b)| {
        if HYPHENS.contains(&i) {
            b == b'-'
        } else {
            b.is_ascii_digit() || (b'a'..=b'f').contains(&b)
        }
    })
}

/// Validate an externally chosen room name.
pub fn validate_room_name(name: &str) -> Result<&str, PairingError> {
    let len_ok = (ROOM_NAME_MIN..=ROOM_NAME_MAX).contains(&name.len());
    let charset_ok = name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-');
    if len_ok && charset_ok {
        Ok(name)
    } else {
        Err(PairingError::InvalidRoomName)
    }
}

/// Short prefix of an identifier, safe to put in logs.
pub fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
