//! Logging helpers for registry, filter and session events.
//!
//! Uses `tracing` when the `tracing` feature is on (default); otherwise falls back to
//! stderr so the library stays usable without a subscriber stack.

use crate::protocol::ProtocolKind;

/// Log a tool registration.
pub fn log_tool_registered(name: &str) {
    #[cfg(feature = "tracing")]
    tracing::debug!(tool = name, "tool registered");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] tool registered: {}", name);
}

/// Log a tool removal.
pub fn log_tool_unregistered(name: &str) {
    #[cfg(feature = "tracing")]
    tracing::debug!(tool = name, "tool unregistered");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] tool unregistered: {}", name);
}

/// Log the effect of a filter policy on a tool set.
pub fn log_policy_applied(policy: &str, before: usize, after: usize) {
    #[cfg(feature = "tracing")]
    tracing::debug!(policy = policy, before, after, "filter policy applied");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] filter {}: {} -> {} tools", policy, before, after);
}

/// Log a session leaving `Idle`.
pub fn log_session_opened(kind: ProtocolKind) {
    #[cfg(feature = "tracing")]
    tracing::debug!(protocol = %kind, "session opened");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] session opened: {}", kind);
}

/// Log a session reaching `Closed` after its terminal event.
pub fn log_session_closed(kind: ProtocolKind, rendered: usize) {
    #[cfg(feature = "tracing")]
    tracing::debug!(protocol = %kind, rendered, "session closed");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] session closed: {} ({} events)", kind, rendered);
}

/// Log a client disconnect detected before or during a render.
pub fn log_client_disconnected(kind: ProtocolKind) {
    #[cfg(feature = "tracing")]
    tracing::info!(protocol = %kind, "client disconnected; discarding remaining events");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[INFO] client disconnected: {}", kind);
}

/// Log an orchestration failure. `details` stays in the log and never reaches the wire.
pub fn log_orchestration_error(message: &str, details: Option<&str>) {
    #[cfg(feature = "tracing")]
    tracing::error!(message, details = ?details, "orchestration failed");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[ERROR] orchestration failed: {} {:?}", message, details);
}

/// Log an event that breaks the per-session ordering contract.
pub fn log_sequence_violation(reason: &str) {
    #[cfg(feature = "tracing")]
    tracing::warn!(reason, "lifecycle event out of sequence");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[WARN] lifecycle event out of sequence: {}", reason);
}

/// Log the gateway giving up on a session after a failed render.
pub fn log_render_stopped(reason: &str) {
    #[cfg(feature = "tracing")]
    tracing::debug!(reason, "render failed; stopping session");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] render failed; stopping session: {}", reason);
}
