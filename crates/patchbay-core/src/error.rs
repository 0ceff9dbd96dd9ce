//! Construction-time error types.
//!
//! The channel I/O string is compiled into the plugin, so a malformed string
//! is an authoring defect: construction fails and no topology is formed.
//! Nothing on the audio path returns these errors.

use crate::types::Direction;

/// Failure to parse a channel I/O configuration string.
///
/// Parsing is deterministic: the same input always produces the same error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelIoError {
    /// The configuration string contained no configs at all.
    #[error("channel I/O string is empty")]
    Empty,

    /// A config token had no `-` separating inputs from outputs.
    #[error("channel I/O config {config:?} is missing the '-' separator")]
    MissingSeparator {
        /// The offending whitespace-separated config token.
        config: String,
    },

    /// A bus token was neither a non-negative integer nor the wildcard `*`.
    #[error("invalid channel count {token:?} in channel I/O config {config:?}")]
    InvalidChannelCount {
        /// The offending config token.
        config: String,
        /// The bus token that failed to parse.
        token: String,
    },

    /// More than one wildcard bus appeared in one direction of one config.
    #[error("more than one wildcard {direction:?} bus in channel I/O config {config:?}")]
    MultipleWildcards {
        /// The offending config token.
        config: String,
        /// The direction carrying the duplicate wildcard.
        direction: Direction,
    },

    /// A config declared more buses than the engine supports.
    #[error("channel I/O config {config:?} exceeds the {direction:?} bus limit")]
    TooManyBuses {
        /// The offending config token.
        config: String,
        /// The direction exceeding [`crate::MAX_BUSES`].
        direction: Direction,
    },

    /// A bus declared more channels than the engine supports.
    #[error("bus {token:?} in channel I/O config {config:?} exceeds the channel limit")]
    BusTooWide {
        /// The offending config token.
        config: String,
        /// The bus token exceeding [`crate::MAX_CHANNELS`].
        token: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_offender() {
        let err = ChannelIoError::InvalidChannelCount {
            config: "2-x".into(),
            token: "x".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("\"x\""));
        assert!(msg.contains("\"2-x\""));
    }
}
