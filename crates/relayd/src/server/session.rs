//! Session handler for individual client connections.
//!
//! Each connection gets its own `SessionHandler` that:
//! - Owns the read half and performs line-delimited parsing
//! - Dispatches parsed commands (login → registry, chat → router)
//! - Terminates on exactly one path, whatever ended the session
//!
//! The read is the session's only suspension point besides the shutdown
//! token: read → parse → dispatch → loop, with dispatch synchronous on the
//! read path. Shared state is only touched through the registry actor's
//! command channel.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader, BufWriter};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use relay_core::{DisplayName, SessionId, UNNAMED};
use relay_protocol::{Command, DeliveryScope};

use crate::registry::{RegistryError, RegistryHandle, SessionEntry, SessionWriter};
use crate::router::Router;

/// Session handler for a single client connection.
///
/// The handler owns the buffered read half outright; the write half sits
/// behind the shared [`SessionWriter`] so the router can deliver to this
/// session on behalf of others.
pub struct SessionHandler {
    /// Connection handle number assigned by the acceptor
    id: SessionId,

    /// Exclusively owned read half
    reader: BufReader<OwnedReadHalf>,

    /// Shared write half, cloned into the registry on login
    writer: SessionWriter,

    /// Handle to the session registry
    registry: RegistryHandle,

    /// Router for chat delivery
    router: Router,

    /// Shutdown token; sessions wind down cooperatively
    cancel_token: CancellationToken,

    /// Display name, set once on successful login
    name: Option<DisplayName>,
}

impl SessionHandler {
    /// Creates a handler for an accepted connection.
    pub fn new(
        id: SessionId,
        stream: TcpStream,
        registry: RegistryHandle,
        router: Router,
        cancel_token: CancellationToken,
    ) -> Self {
        let (read, write) = stream.into_split();
        Self {
            id,
            reader: BufReader::new(read),
            writer: Arc::new(Mutex::new(BufWriter::new(write))),
            registry,
            router,
            cancel_token,
            name: None,
        }
    }

    /// Runs the session until it terminates.
    ///
    /// This is the single termination path: whatever ends the loop - EOF,
    /// read error, duplicate-name rejection, shutdown - the session is
    /// deregistered (if it ever registered) and the connection halves are
    /// dropped here, closing the socket exactly once.
    pub async fn run(mut self) {
        match self.process_lines().await {
            Ok(()) => debug!(session = %self.id, "session wound down for shutdown"),
            Err(SessionError::Eof) => debug!(session = %self.id, "client closed connection"),
            Err(e) => debug!(session = %self.id, error = %e, "session ended"),
        }

        if self.name.is_some() {
            self.registry.remove(self.id).await;
        }

        info!(
            session = %self.id,
            name = self.name.as_ref().map(DisplayName::as_str).unwrap_or(UNNAMED),
            "client disconnected"
        );
    }

    /// Read-and-dispatch loop.
    ///
    /// Returns `Ok(())` only on graceful shutdown; every other exit is the
    /// typed reason the session ended.
    async fn process_lines(&mut self) -> Result<(), SessionError> {
        loop {
            let line = tokio::select! {
                _ = self.cancel_token.cancelled() => return Ok(()),
                result = read_line(&mut self.reader) => result?,
            };

            match Command::parse(&line) {
                Ok(cmd) => self.dispatch(cmd).await?,
                Err(e) => {
                    // Unrecognized lines are dropped; the session lives on.
                    debug!(session = %self.id, error = %e, "ignoring unparseable line");
                }
            }
        }
    }

    /// Handles a single parsed command.
    async fn dispatch(&mut self, cmd: Command) -> Result<(), SessionError> {
        match cmd {
            Command::Login { name } => self.handle_login(name).await,
            Command::Chat { body, scope } => {
                self.handle_chat(&body, scope).await;
                Ok(())
            }
        }
    }

    /// Handles a login attempt.
    ///
    /// On collision the session terminates immediately, before it ever
    /// became visible to other clients; nothing further is written to the
    /// peer. The name is set exactly once - repeated logins are ignored.
    async fn handle_login(&mut self, name: DisplayName) -> Result<(), SessionError> {
        if let Some(current) = &self.name {
            warn!(
                session = %self.id,
                current = %current,
                attempted = %name,
                "ignoring repeated login"
            );
            return Ok(());
        }

        let entry = SessionEntry {
            id: self.id,
            name: name.clone(),
            writer: Arc::clone(&self.writer),
        };

        match self.registry.try_register(entry).await {
            Ok(()) => {
                info!(session = %self.id, name = %name, "client logged in");
                self.name = Some(name);
                Ok(())
            }
            Err(RegistryError::NameTaken(name)) => {
                warn!(
                    session = %self.id,
                    name = %name,
                    "duplicate display name, dropping client"
                );
                Err(SessionError::DuplicateName(name))
            }
            Err(RegistryError::ChannelClosed) => Err(SessionError::RegistryClosed),
        }
    }

    /// Handles a chat message.
    ///
    /// Chat is not gated on login: an unregistered sender chats as
    /// `unknown`. Direct scope echoes to the sender - the wire format has
    /// no recipient field. Delivery failures are local to their target and
    /// never end this session.
    async fn handle_chat(&self, body: &str, scope: DeliveryScope) {
        let sender = self.name.clone().unwrap_or_else(DisplayName::unnamed);

        match scope {
            DeliveryScope::Broadcast => {
                let delivered = self.router.deliver_to_all(&sender, body).await;
                debug!(
                    session = %self.id,
                    sender = %sender,
                    delivered,
                    "broadcast relayed"
                );
            }
            DeliveryScope::Direct => {
                let target = SessionEntry {
                    id: self.id,
                    name: sender.clone(),
                    writer: Arc::clone(&self.writer),
                };
                self.router.deliver_to_one(&target, &sender, body).await;
            }
        }
    }
}

/// Reads one line, stripping the terminator.
///
/// EOF and read errors are the paths that end a session; both surface as
/// typed errors to the caller.
async fn read_line(reader: &mut BufReader<OwnedReadHalf>) -> Result<String, SessionError> {
    let mut line = String::new();

    let bytes_read = reader
        .read_line(&mut line)
        .await
        .map_err(|e| SessionError::Io(e.to_string()))?;

    if bytes_read == 0 {
        return Err(SessionError::Eof);
    }

    // Tolerate CRLF clients.
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }

    Ok(line)
}

/// Why a session ended.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("connection closed by peer")]
    Eof,

    #[error("i/o error: {0}")]
    Io(String),

    #[error("display name already taken: {0}")]
    DuplicateName(DisplayName),

    #[error("registry unavailable")]
    RegistryClosed,
}
