//! Parsing inbound command lines.

use relay_core::DisplayName;
use thiserror::Error;

/// Kind token for a login line.
pub const LOGIN_KIND: &str = "1";

/// Kind token for a chat line.
pub const CHAT_KIND: &str = "2";

/// Separator between the kind token and the payload.
const COMMAND_DELIMITER: char = '|';

/// A chat body containing this substring anywhere is delivered to every
/// registered session instead of echoing back to the sender.
pub const BROADCAST_MARKER: &str = "[B]";

/// Who a chat message is delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryScope {
    /// Every registered session, the sender included.
    Broadcast,
    /// The sender only (the wire format carries no recipient field).
    Direct,
}

/// One parsed inbound line.
///
/// Constructed per received line and consumed immediately by the session's
/// dispatch step; never retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `1|<name>` - register under a display name.
    Login {
        /// Candidate name, trimmed of surrounding whitespace.
        name: DisplayName,
    },

    /// `2|<body>` - relay a chat message.
    Chat {
        /// Message body, delivered verbatim (the broadcast marker stays in).
        body: String,
        /// Scope derived from the presence of [`BROADCAST_MARKER`].
        scope: DeliveryScope,
    },
}

impl Command {
    /// Parses one line (already stripped of its terminator).
    ///
    /// Splits on the first delimiter only; the payload may itself contain
    /// `|`. Lines that don't parse are dropped by the caller, so the error
    /// carries enough to log and nothing more.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let (kind, payload) = line
            .split_once(COMMAND_DELIMITER)
            .ok_or(ParseError::MissingDelimiter)?;

        match kind {
            LOGIN_KIND => Ok(Command::Login {
                name: DisplayName::new(payload.trim()),
            }),
            CHAT_KIND => {
                let scope = if payload.contains(BROADCAST_MARKER) {
                    DeliveryScope::Broadcast
                } else {
                    DeliveryScope::Direct
                };
                Ok(Command::Chat {
                    body: payload.to_string(),
                    scope,
                })
            }
            other => Err(ParseError::UnknownKind(other.to_string())),
        }
    }
}

/// Why an inbound line could not be parsed.
///
/// Never fatal: the session logs the line away and keeps reading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The line has no `|` separating kind from payload.
    #[error("line has no command delimiter")]
    MissingDelimiter,

    /// The kind token is neither login nor chat.
    #[error("unknown command kind: {0:?}")]
    UnknownKind(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login() {
        let cmd = Command::parse("1|alice").unwrap();
        assert_eq!(
            cmd,
            Command::Login {
                name: DisplayName::new("alice")
            }
        );
    }

    #[test]
    fn test_parse_login_trims_whitespace() {
        let cmd = Command::parse("1|  alice \t").unwrap();
        assert_eq!(
            cmd,
            Command::Login {
                name: DisplayName::new("alice")
            }
        );
    }

    #[test]
    fn test_parse_chat_direct() {
        let cmd = Command::parse("2|hello").unwrap();
        assert_eq!(
            cmd,
            Command::Chat {
                body: "hello".to_string(),
                scope: DeliveryScope::Direct,
            }
        );
    }

    #[test]
    fn test_parse_chat_broadcast_marker_anywhere() {
        for line in ["2|[B] hi all", "2|hi [B] all", "2|hi all [B]"] {
            match Command::parse(line).unwrap() {
                Command::Chat { scope, body } => {
                    assert_eq!(scope, DeliveryScope::Broadcast, "line: {line}");
                    // The marker is part of the body, not stripped.
                    assert!(body.contains(BROADCAST_MARKER));
                }
                other => panic!("expected Chat, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_chat_body_keeps_later_delimiters() {
        // Only the first delimiter splits; the rest is payload.
        let cmd = Command::parse("2|a|b|c").unwrap();
        assert_eq!(
            cmd,
            Command::Chat {
                body: "a|b|c".to_string(),
                scope: DeliveryScope::Direct,
            }
        );
    }

    #[test]
    fn test_parse_chat_empty_body() {
        let cmd = Command::parse("2|").unwrap();
        assert_eq!(
            cmd,
            Command::Chat {
                body: String::new(),
                scope: DeliveryScope::Direct,
            }
        );
    }

    #[test]
    fn test_parse_missing_delimiter() {
        assert_eq!(Command::parse("hello"), Err(ParseError::MissingDelimiter));
        assert_eq!(Command::parse(""), Err(ParseError::MissingDelimiter));
    }

    #[test]
    fn test_parse_unknown_kind() {
        assert_eq!(
            Command::parse("3|whatever"),
            Err(ParseError::UnknownKind("3".to_string()))
        );
        assert_eq!(
            Command::parse("|payload"),
            Err(ParseError::UnknownKind(String::new()))
        );
    }

    #[test]
    fn test_parse_error_display() {
        assert_eq!(
            ParseError::MissingDelimiter.to_string(),
            "line has no command delimiter"
        );
        assert_eq!(
            ParseError::UnknownKind("9".to_string()).to_string(),
            "unknown command kind: \"9\""
        );
    }
}
