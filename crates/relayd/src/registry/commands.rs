//! Registry actor commands, entries, and errors.
//!
//! This module defines the message types for communicating with the
//! `RegistryActor`:
//! - `SessionEntry`: what the registry holds for one logged-in session
//! - `RegistryCommand`: commands sent to the actor
//! - `RegistryError`: errors that can occur during registry operations

use std::sync::Arc;

use relay_core::{DisplayName, SessionId};
use thiserror::Error;
use tokio::io::BufWriter;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{oneshot, Mutex};

/// Shared handle to a session's write half.
///
/// The read half is exclusively owned by the session task; the write half
/// is shared so the router can deliver messages on behalf of other
/// sessions. Writes go through the mutex; a write to a handle whose session
/// has terminated fails benignly.
pub type SessionWriter = Arc<Mutex<BufWriter<OwnedWriteHalf>>>;

/// The registry's view of one logged-in session.
#[derive(Clone)]
pub struct SessionEntry {
    /// Connection handle number, assigned by the acceptor.
    pub id: SessionId,

    /// Display name the session registered under.
    pub name: DisplayName,

    /// Shared writer for delivering messages to this session.
    pub writer: SessionWriter,
}

impl std::fmt::Debug for SessionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEntry")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Commands sent to the registry actor.
///
/// Each command uses a oneshot channel for the response, enabling
/// request-response patterns in async code without blocking.
#[derive(Debug)]
pub enum RegistryCommand {
    /// Atomically check name uniqueness and insert the entry.
    ///
    /// The check and the insert happen inside one command so no interleaved
    /// registration can slip between them.
    ///
    /// # Errors
    /// - `RegistryError::NameTaken` if a session already holds the name
    Register {
        /// The session entry to register
        entry: SessionEntry,
        /// Channel to send the result
        respond_to: oneshot::Sender<Result<(), RegistryError>>,
    },

    /// Remove the entry whose session id matches.
    ///
    /// Idempotent: removing an absent session is a no-op, and the id key
    /// guarantees a successor that re-registered the same name is never
    /// evicted by a stale removal.
    Remove {
        /// Id of the session to remove
        id: SessionId,
        /// Channel reporting whether an entry was present
        respond_to: oneshot::Sender<bool>,
    },

    /// Get a consistent point-in-time view of all entries.
    ///
    /// Broadcast iterates the returned snapshot, never live state, so
    /// concurrent logins and disconnects cannot invalidate the iteration.
    Snapshot {
        /// Channel to send the entries, sorted by session id
        respond_to: oneshot::Sender<Vec<SessionEntry>>,
    },
}

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// Another session is already logged in under this name.
    #[error("display name already taken: {0}")]
    NameTaken(DisplayName),

    /// The actor has shut down; the command or response channel is closed.
    #[error("registry channel closed")]
    ChannelClosed,
}
