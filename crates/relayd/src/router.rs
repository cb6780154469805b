//! Message router - resolves delivery targets and performs the writes.
//!
//! Delivery is best-effort write-then-forget: no acknowledgment, no retry.
//! A failed write is local to its target - it is logged, the target is
//! evicted from the registry so later broadcasts skip it, and the sender's
//! session is never affected. The evicted session's own read loop observes
//! the dead socket and finishes its normal termination path.

use std::time::Duration;

use relay_core::DisplayName;
use relay_protocol::format_delivery;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;
use tracing::debug;

use crate::registry::{RegistryHandle, SessionEntry, SessionWriter};

/// Write timeout - a wedged peer must not stall a broadcast indefinitely.
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Routes chat messages to their target sessions.
///
/// Cheap to clone; every session handler holds one.
#[derive(Clone)]
pub struct Router {
    registry: RegistryHandle,
}

impl Router {
    /// Creates a router over the given registry.
    pub fn new(registry: RegistryHandle) -> Self {
        Self { registry }
    }

    /// Delivers one message to one target, formatted as `[<sender>] <body>`.
    ///
    /// Returns whether the write succeeded. On failure the target's
    /// registry entry is removed (a no-op if it was never registered or is
    /// already gone).
    pub async fn deliver_to_one(
        &self,
        target: &SessionEntry,
        sender: &DisplayName,
        body: &str,
    ) -> bool {
        let frame = format_delivery(sender, body);

        match write_frame(&target.writer, &frame).await {
            Ok(()) => {
                debug!(
                    target = %target.name,
                    sender = %sender,
                    bytes = frame.len(),
                    "message delivered"
                );
                true
            }
            Err(e) => {
                debug!(
                    target = %target.name,
                    session = %target.id,
                    error = %e,
                    "delivery failed, evicting target"
                );
                self.registry.remove(target.id).await;
                false
            }
        }
    }

    /// Delivers one message to every registered session, the sender
    /// included.
    ///
    /// Iterates a point-in-time registry snapshot; per-target failures are
    /// handled inside [`Self::deliver_to_one`] and never abort the loop.
    /// Returns the number of successful deliveries.
    pub async fn deliver_to_all(&self, sender: &DisplayName, body: &str) -> usize {
        let snapshot = self.registry.snapshot().await;
        let targets = snapshot.len();

        let mut delivered = 0;
        for entry in &snapshot {
            if self.deliver_to_one(entry, sender, body).await {
                delivered += 1;
            }
        }

        debug!(sender = %sender, delivered, targets, "broadcast complete");
        delivered
    }
}

/// Writes and flushes one frame under the write timeout.
async fn write_frame(writer: &SessionWriter, frame: &str) -> Result<(), DeliveryError> {
    let mut writer = writer.lock().await;

    match timeout(WRITE_TIMEOUT, async {
        writer.write_all(frame.as_bytes()).await?;
        writer.flush().await?;
        Ok::<(), std::io::Error>(())
    })
    .await
    {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(DeliveryError::Io(e.to_string())),
        Err(_) => Err(DeliveryError::Timeout),
    }
}

/// Why a single delivery failed.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("i/o error: {0}")]
    Io(String),

    #[error("write timed out")]
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::spawn_registry;
    use relay_core::SessionId;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, BufWriter};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::Mutex;

    /// One end of a loopback connection: the entry the router writes to and
    /// the client stream a test reads from.
    async fn test_pair(id: u64, name: &str) -> (SessionEntry, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (stream, _) = listener.accept().await.unwrap();
        let (_read, write) = stream.into_split();
        let entry = SessionEntry {
            id: SessionId::new(id),
            name: relay_core::DisplayName::new(name),
            writer: Arc::new(Mutex::new(BufWriter::new(write))),
        };
        (entry, client)
    }

    async fn read_exact_string(stream: &mut TcpStream, len: usize) -> String {
        let mut buf = vec![0u8; len];
        stream.read_exact(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_deliver_to_one_writes_frame() {
        let router = Router::new(spawn_registry());
        let (entry, mut client) = test_pair(1, "alice").await;

        let sender = relay_core::DisplayName::new("alice");
        assert!(router.deliver_to_one(&entry, &sender, "hello").await);

        let got = read_exact_string(&mut client, "[alice] hello".len()).await;
        assert_eq!(got, "[alice] hello");
    }

    #[tokio::test]
    async fn test_deliver_to_one_failure_evicts_target() {
        let registry = spawn_registry();
        let router = Router::new(registry.clone());

        let (entry, _client) = test_pair(1, "alice").await;
        registry.try_register(entry.clone()).await.unwrap();

        // Shut the write half down so every further write fails.
        entry.writer.lock().await.shutdown().await.unwrap();

        let sender = relay_core::DisplayName::new("bob");
        assert!(!router.deliver_to_one(&entry, &sender, "hi").await);

        assert!(registry.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_deliver_to_one_unregistered_target_is_benign() {
        let registry = spawn_registry();
        let router = Router::new(registry.clone());

        // Never registered; failure eviction must be a no-op.
        let (entry, _client) = test_pair(9, "ghost").await;
        entry.writer.lock().await.shutdown().await.unwrap();

        let sender = relay_core::DisplayName::new("ghost");
        assert!(!router.deliver_to_one(&entry, &sender, "hi").await);
        assert!(registry.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_deliver_to_all_includes_sender_and_survives_failures() {
        let registry = spawn_registry();
        let router = Router::new(registry.clone());

        let (alice, mut alice_client) = test_pair(1, "alice").await;
        let (bob, mut bob_client) = test_pair(2, "bob").await;
        let (carol, _carol_client) = test_pair(3, "carol").await;

        for entry in [&alice, &bob, &carol] {
            registry.try_register(entry.clone()).await.unwrap();
        }

        // Carol's socket is dead; alice and bob must still be reached.
        carol.writer.lock().await.shutdown().await.unwrap();

        let sender = relay_core::DisplayName::new("bob");
        let delivered = router.deliver_to_all(&sender, "[B] hi all").await;
        assert_eq!(delivered, 2);

        let expected = "[bob] [B] hi all";
        for client in [&mut alice_client, &mut bob_client] {
            let got = read_exact_string(client, expected.len()).await;
            assert_eq!(got, expected);
        }

        // Carol was evicted by the failed delivery.
        let names: Vec<String> = registry
            .snapshot()
            .await
            .iter()
            .map(|e| e.name.to_string())
            .collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_deliver_to_all_empty_registry() {
        let router = Router::new(spawn_registry());
        let sender = relay_core::DisplayName::new("alice");
        assert_eq!(router.deliver_to_all(&sender, "hi").await, 0);
    }
}
