//! Session identity value objects.

use std::fmt;

// ============================================================================
// Type-Safe Identifiers
// ============================================================================

/// Unique identifier for one client connection.
///
/// Assigned by the acceptor from a monotonically increasing connection
/// counter. The id identifies the *connection*, not the login name: a client
/// that reconnects gets a fresh `SessionId` even if it reuses its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Creates a session id from a raw connection number.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw connection number.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SessionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Display name a session stands under before it has logged in.
pub const UNNAMED: &str = "unknown";

/// A client's display name.
///
/// Set once, at login. Uniqueness across logged-in sessions is enforced by
/// the registry, not here; this type does not validate its contents (the
/// wire protocol decides what a name is, including trimming).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayName(String);

impl DisplayName {
    /// Creates a display name from a string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The placeholder name a session carries before login.
    pub fn unnamed() -> Self {
        Self(UNNAMED.to_string())
    }

    /// Returns the underlying string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DisplayName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DisplayName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
