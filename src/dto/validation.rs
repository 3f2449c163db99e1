//! Custom validation rules shared by the wire payloads.

use validator::ValidationError;

/// Alphabet room codes are drawn from. Ambiguous glyphs (I, L, O, 0, 1) are
/// left out so codes survive being read out loud.
pub const ROOM_CODE_CHARSET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Base length of a room code. Allocation may grow codes past this under
/// heavy collision pressure, so validation accepts longer ones too.
pub const ROOM_CODE_LEN: usize = 5;

/// A room code is at least five characters from the code alphabet.
pub fn room_code(code: &str) -> Result<(), ValidationError> {
    let valid = code.len() >= ROOM_CODE_LEN
        && code.len() <= 2 * ROOM_CODE_LEN
        && code.bytes().all(|b| ROOM_CODE_CHARSET.contains(&b));
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("room_code"))
    }
}

/// Display names are 2..=20 characters after trimming.
pub fn display_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if (2..=20).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::new("display_name"))
    }
}
