//! Error types for parley.

use crate::gateway::MessageHandle;

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Errors surfaced by a chat gateway implementation.
///
/// Collector cleanup and other cosmetic operations (reply deletion,
/// component stripping, acknowledgement) swallow these at the point of
/// occurrence; they only propagate from operations whose result the
/// caller actually depends on, such as sending a prompt message.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Message not found: {handle}")]
    MessageNotFound { handle: MessageHandle },

    #[error("Permission denied for {action} on {handle}")]
    PermissionDenied {
        action: &'static str,
        handle: MessageHandle,
    },

    #[error("Interaction {id} already acknowledged or expired")]
    InteractionGone { id: u64 },

    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
}
