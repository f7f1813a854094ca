use core::fmt;

/// Errors surfaced by cursor and range operations.
///
/// These report misuse of a handle rather than runtime conditions: every
/// failing operation checks before it mutates, so the map is unchanged when
/// one of these is returned. Lookups for absent keys are not errors; they
/// return `None`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TreeError {
    /// The cursor's node has been removed from the map.
    StaleCursor,
    /// A positional insert was given a key outside the gap it targets.
    KeyOrderViolation,
    /// A range request whose start key orders after its end key.
    InvalidRange,
    /// `first`/`last` on a range already consumed by a destructive call.
    ConsumedRange,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            TreeError::StaleCursor => "cursor points at a removed entry",
            TreeError::KeyOrderViolation => "key is out of order for the targeted position",
            TreeError::InvalidRange => "range start is greater than range end",
            TreeError::ConsumedRange => "range has been consumed by a destructive operation",
        };
        f.write_str(message)
    }
}

impl core::error::Error for TreeError {}
