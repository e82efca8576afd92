//! ASCII to PETSCII-ish byte mapping.
//!
//! Only the printable ASCII range survives; anything else becomes `?`.

pub const SUBSTITUTE: u8 = b'?';

/// Mapping for program text: lowercase letters fold to uppercase.
pub fn fold(ch: char) -> u8 {
    passthrough(ch.to_ascii_uppercase())
}

/// Mapping for string literals and REM comments: case is preserved.
pub fn passthrough(ch: char) -> u8 {
    match ch {
        ' '..='~' => ch as u8,
        _ => SUBSTITUTE,
    }
}

/// Identifier characters for keyword boundary checks.
pub fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}
