//! Identifier text codec.
//!
//! Session, operation, and resource identifiers are 128-bit opaque values.
//! On the wire they travel as their canonical textual form: exactly 32 hex
//! digits, lowercase when produced by us, either case accepted on parse.

/// The "no operation" sentinel: the all-zero identifier.
pub const NO_OPERATION_ID: u128 = 0;

/// Error returned for identifier text that is not 32 hex digits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identifier {text:?}: expected 32 hex digits")]
pub struct IdParseError {
    /// The offending text, truncated for logging.
    pub text: String,
}

/// Render an identifier in canonical textual form.
pub fn format_id(id: u128) -> String {
    format!("{id:032x}")
}

/// Parse an identifier from its textual form.
pub fn parse_id(text: &str) -> Result<u128, IdParseError> {
    if text.len() != 32 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(IdParseError {
            text: text.chars().take(64).collect(),
        });
    }
    u128::from_str_radix(text, 16).map_err(|_| IdParseError {
        text: text.to_string(),
    })
}
