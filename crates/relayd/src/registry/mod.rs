//! Session registry using the actor pattern.
//!
//! The registry is the only shared mutable state in the daemon: the set of
//! currently logged-in sessions, keyed by unique display name. One actor
//! task owns the set and processes commands sequentially from an mpsc
//! channel, which makes check-and-insert registration atomic without any
//! lock discipline at the call sites.
//!
//! ```text
//! ┌────────────────┐   RegistryCommand    ┌────────────────┐
//! │ SessionHandler │─────────────────────▶│ RegistryActor  │
//! │  / Router      │    (mpsc channel)    │  (state owner) │
//! └────────────────┘ ◀──────────────────── └────────────────┘
//!                       oneshot replies
//! ```

use tokio::sync::mpsc;

mod actor;
mod commands;
mod handle;

pub use actor::RegistryActor;
pub use commands::{RegistryCommand, RegistryError, SessionEntry, SessionWriter};
pub use handle::RegistryHandle;

/// Command channel buffer size
const COMMAND_BUFFER: usize = 100;

/// Spawn the registry actor and return a handle for interaction.
///
/// Called once at process start; the registry lives until the process
/// exits (the actor stops when the last handle is dropped).
pub fn spawn_registry() -> RegistryHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);

    let actor = RegistryActor::new(cmd_rx);
    tokio::spawn(actor.run());

    RegistryHandle::new(cmd_tx)
}
