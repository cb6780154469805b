//! relayd - session registry and chat relay server.
//!
//! This crate provides the core infrastructure for the relay daemon:
//! - `registry` - session registry actor tracking logged-in clients
//! - `router` - message delivery (self-echo and broadcast)
//! - `server` - TCP acceptor and per-connection session handlers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   RelayServer   │
//! │  (TcpListener)  │
//! └───────┬─────────┘
//!         │ accept()
//!         ▼
//! ┌─────────────────┐  Register/Remove  ┌─────────────────┐
//! │ SessionHandler  │──────────────────▶│  RegistryActor  │
//! │  (per client)   │                   │  (state owner)  │
//! └───────┬─────────┘                   └─────────────────┘
//!         │ Chat                                ▲
//!         ▼                                     │ Snapshot
//! ┌─────────────────┐                           │
//! │     Router      │───────────────────────────┘
//! │ (write fan-out) │──▶ target SessionWriters
//! └─────────────────┘
//! ```
//!
//! The registry actor is the single owner of shared mutable state; sessions
//! and the router reach it only through its command channel. Connection
//! read halves are owned by their session; write halves are shared behind a
//! mutex so the router can deliver on behalf of other sessions.

pub mod registry;
pub mod router;
pub mod server;
