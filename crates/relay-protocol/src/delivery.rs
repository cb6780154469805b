//! Outbound delivery framing.

use relay_core::DisplayName;

/// Formats a chat message for delivery to a client.
///
/// The frame is `[<sender>] <body>` with no terminator appended, kept
/// byte-exact for compatibility with existing clients.
pub fn format_delivery(sender: &DisplayName, body: &str) -> String {
    let mut out = String::with_capacity(sender.as_str().len() + body.len() + 3);
    out.push('[');
    out.push_str(sender.as_str());
    out.push_str("] ");
    out.push_str(body);
    out
}
