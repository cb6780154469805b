//! Core domain types for the relay chat daemon.
//!
//! This crate holds the value types shared by the wire protocol and the
//! daemon: session identifiers and display names. It deliberately contains
//! no I/O and no async code.

mod session;

pub use session::{DisplayName, SessionId, UNNAMED};
