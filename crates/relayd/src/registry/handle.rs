//! Client interface for interacting with the `RegistryActor`.
//!
//! The `RegistryHandle` provides a cheap-to-clone interface for sending
//! commands to the registry actor. All methods are async and communicate
//! with the actor via channels; channel failures degrade to the safe
//! answer rather than panicking.

use relay_core::SessionId;
use tokio::sync::{mpsc, oneshot};

use super::commands::{RegistryCommand, RegistryError, SessionEntry};

/// Handle for interacting with the registry actor.
///
/// Clone freely: every session task and the router hold one.
#[derive(Clone)]
pub struct RegistryHandle {
    /// Command sender to the actor
    sender: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    /// Create a new registry handle over the actor's command channel.
    pub fn new(sender: mpsc::Sender<RegistryCommand>) -> Self {
        Self { sender }
    }

    /// Atomically register a session under its display name.
    ///
    /// # Errors
    ///
    /// - `RegistryError::NameTaken` if the name is already in use
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn try_register(&self, entry: SessionEntry) -> Result<(), RegistryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::Register {
                entry,
                respond_to: tx,
            })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)?
    }

    /// Remove the session with the given id, if present.
    ///
    /// Idempotent; returns whether an entry was removed. If the actor has
    /// shut down there is nothing left to remove and this returns `false`.
    pub async fn remove(&self, id: SessionId) -> bool {
        let (tx, rx) = oneshot::channel();

        if self
            .sender
            .send(RegistryCommand::Remove { id, respond_to: tx })
            .await
            .is_err()
        {
            return false;
        }

        rx.await.unwrap_or(false)
    }

    /// Get a consistent point-in-time view of all registered sessions,
    /// sorted by session id.
    ///
    /// Returns an empty vector if no sessions are registered or if
    /// communication with the actor fails.
    pub async fn snapshot(&self) -> Vec<SessionEntry> {
        let (tx, rx) = oneshot::channel();

        if self
            .sender
            .send(RegistryCommand::Snapshot { respond_to: tx })
            .await
            .is_err()
        {
            return Vec::new();
        }

        rx.await.unwrap_or_default()
    }

    /// Check if the actor is still running.
    ///
    /// Returns `true` if the command channel is still open.
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::DisplayName;
    use std::sync::Arc;
    use tokio::io::BufWriter;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::Mutex;

    fn create_test_handle() -> (RegistryHandle, mpsc::Receiver<RegistryCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        (RegistryHandle::new(cmd_tx), cmd_rx)
    }

    async fn test_entry(id: u64, name: &str) -> SessionEntry {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _peer = TcpStream::connect(addr).await.unwrap();
        let (stream, _) = listener.accept().await.unwrap();
        let (_read, write) = stream.into_split();
        SessionEntry {
            id: SessionId::new(id),
            name: DisplayName::new(name),
            writer: Arc::new(Mutex::new(BufWriter::new(write))),
        }
    }

    #[tokio::test]
    async fn test_handle_is_clone() {
        let (handle, _rx) = create_test_handle();
        let _cloned = handle.clone();
    }

    #[tokio::test]
    async fn test_try_register_sends_command() {
        let (handle, mut rx) = create_test_handle();

        let cmd_handler = tokio::spawn(async move {
            if let Some(RegistryCommand::Register { entry, respond_to }) = rx.recv().await {
                assert_eq!(entry.name.as_str(), "alice");
                let _ = respond_to.send(Ok(()));
                return true;
            }
            false
        });

        let result = handle.try_register(test_entry(1, "alice").await).await;
        assert!(result.is_ok());
        assert!(cmd_handler.await.unwrap());
    }

    #[tokio::test]
    async fn test_try_register_channel_closed_error() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        let result = handle.try_register(test_entry(1, "alice").await).await;
        assert!(matches!(result, Err(RegistryError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_remove_sends_command() {
        let (handle, mut rx) = create_test_handle();

        let cmd_handler = tokio::spawn(async move {
            if let Some(RegistryCommand::Remove { id, respond_to }) = rx.recv().await {
                assert_eq!(id, SessionId::new(7));
                let _ = respond_to.send(true);
                return true;
            }
            false
        });

        assert!(handle.remove(SessionId::new(7)).await);
        assert!(cmd_handler.await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_false_on_channel_close() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        assert!(!handle.remove(SessionId::new(1)).await);
    }

    #[tokio::test]
    async fn test_snapshot_empty_on_channel_close() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        assert!(handle.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_is_connected() {
        let (handle, rx) = create_test_handle();

        assert!(handle.is_connected());

        drop(rx);
        // Need to send to detect closure
        let _ = handle.remove(SessionId::new(1)).await;

        assert!(!handle.is_connected());
    }
}
