//! Registry actor - owns all session state and processes commands.
//!
//! The `RegistryActor` is the single owner of the logged-in session set. It
//! receives commands via an mpsc channel and processes them sequentially,
//! which is what makes check-and-insert registration atomic: no other
//! mutation can interleave between the uniqueness check and the insert.

use std::collections::HashMap;

use relay_core::{DisplayName, SessionId};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::commands::{RegistryCommand, RegistryError, SessionEntry};

/// The registry actor - owns all session state.
///
/// # Ownership
///
/// The actor owns:
/// - `entries`: session entries keyed by display name (primary key)
/// - `names_by_id`: index for session-id → name lookups on removal
///
/// # Design: name as primary key, id as removal key
///
/// The uniqueness constraint is on display names, so the primary map is
/// keyed by name. Removal is keyed by session id through the index: a
/// disconnecting session can only ever evict its own entry, never a
/// successor that re-registered the same name.
///
/// # Thread Safety
///
/// The actor runs in a single task and processes commands sequentially.
/// All state mutations happen within this single task.
pub struct RegistryActor {
    /// Command receiver
    receiver: mpsc::Receiver<RegistryCommand>,

    /// Primary storage: display name → entry
    entries: HashMap<DisplayName, SessionEntry>,

    /// Index for session-id → name lookups
    names_by_id: HashMap<SessionId, DisplayName>,
}

impl RegistryActor {
    /// Creates a new registry actor reading commands from `receiver`.
    pub fn new(receiver: mpsc::Receiver<RegistryCommand>) -> Self {
        Self {
            receiver,
            entries: HashMap::new(),
            names_by_id: HashMap::new(),
        }
    }

    /// Runs the actor event loop.
    ///
    /// Processes commands until the channel closes (all senders dropped).
    /// This is the main entry point - call this in a spawned task.
    pub async fn run(mut self) {
        info!("registry actor starting");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!(sessions = self.entries.len(), "registry actor stopped");
    }

    /// Dispatches a command to the appropriate handler.
    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Register { entry, respond_to } => {
                let result = self.handle_register(entry);
                // Ignore send error - the session may have dropped the receiver
                let _ = respond_to.send(result);
            }
            RegistryCommand::Remove { id, respond_to } => {
                let removed = self.handle_remove(id);
                let _ = respond_to.send(removed);
            }
            RegistryCommand::Snapshot { respond_to } => {
                let _ = respond_to.send(self.handle_snapshot());
            }
        }
    }

    // ========================================================================
    // Command Handlers
    // ========================================================================

    /// Handles session registration.
    ///
    /// The uniqueness check is case-sensitive exact match, one-shot: a
    /// losing session is not offered a retry.
    fn handle_register(&mut self, entry: SessionEntry) -> Result<(), RegistryError> {
        if self.entries.contains_key(&entry.name) {
            debug!(
                session = %entry.id,
                name = %entry.name,
                "name already taken, rejecting registration"
            );
            return Err(RegistryError::NameTaken(entry.name));
        }

        let id = entry.id;
        let name = entry.name.clone();

        self.names_by_id.insert(id, name.clone());
        self.entries.insert(name.clone(), entry);

        info!(
            session = %id,
            name = %name,
            total_sessions = self.entries.len(),
            "session registered"
        );

        Ok(())
    }

    /// Handles removal by session id.
    ///
    /// Returns whether an entry was present. Removing an absent session is
    /// a no-op, so repeated error signals on the same session are harmless.
    fn handle_remove(&mut self, id: SessionId) -> bool {
        let name = match self.names_by_id.remove(&id) {
            Some(name) => name,
            None => {
                debug!(session = %id, "remove for unregistered session, ignoring");
                return false;
            }
        };

        self.entries.remove(&name);

        info!(
            session = %id,
            name = %name,
            remaining_sessions = self.entries.len(),
            "session removed"
        );

        true
    }

    /// Handles a snapshot request.
    ///
    /// Entries are sorted by session id so iteration order is stable
    /// regardless of hash-map internals.
    fn handle_snapshot(&self) -> Vec<SessionEntry> {
        let mut entries: Vec<SessionEntry> = self.entries.values().cloned().collect();
        entries.sort_by_key(|e| e.id);
        entries
    }

    // ========================================================================
    // Accessors (for testing)
    // ========================================================================

    /// Returns the number of sessions currently registered.
    #[cfg(test)]
    pub fn session_count(&self) -> usize {
        self.entries.len()
    }
}
