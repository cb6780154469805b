//! Wire protocol for the relay chat daemon.
//!
//! The protocol is line-oriented plain text. Each inbound line is
//! `<kind>|<payload>` terminated by `\n`, where `<kind>` is `1` (login,
//! payload = display name) or `2` (chat, payload = message body). A chat
//! body containing the literal substring `[B]` anywhere is a broadcast;
//! any other chat echoes back to its sender only.
//!
//! Outbound deliveries are framed as `[<sender>] <body>` with no added
//! terminator.

mod command;
mod delivery;

pub use command::{Command, DeliveryScope, ParseError, BROADCAST_MARKER, CHAT_KIND, LOGIN_KIND};
pub use delivery::format_delivery;
