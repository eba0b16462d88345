//! Identifier and event types shared across the gateway seam.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A platform user identifier (snowflake).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

/// A platform channel identifier (snowflake).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

/// A platform message identifier (snowflake).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Addresses one message on the platform: the channel it lives in plus
/// its message id. Everything the gateway needs to edit or delete it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHandle {
    /// Channel the message was posted in.
    pub channel: ChannelId,
    /// The message's own identifier.
    pub message: MessageId,
}

impl fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel, self.message)
    }
}

/// A reaction key: a unicode emoji or a custom-emoji identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReactionId(pub String);

impl ReactionId {
    /// Create a reaction id from any string-like key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl From<&str> for ReactionId {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl fmt::Display for ReactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to one component activation (button press, menu selection).
///
/// Carries everything a caller needs to respond to the interaction:
/// the platform interaction id, the component's custom id, who clicked,
/// and which message the component was attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionRef {
    /// Platform-assigned interaction id.
    pub id: u64,
    /// The custom id the component was registered under.
    pub custom_id: String,
    /// User who activated the component.
    pub user: UserId,
    /// Message the component belongs to.
    pub message: MessageHandle,
}

/// A free-text message from a user in a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEvent {
    /// Author of the message.
    pub author: UserId,
    /// Raw message content.
    pub content: String,
    /// Handle to the message itself (used for reply deletion).
    pub handle: MessageHandle,
}

/// A reaction added by a user to a specific message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEvent {
    /// User who reacted.
    pub user: UserId,
    /// Which reaction was added.
    pub reaction: ReactionId,
    /// Message that was reacted to.
    pub message: MessageHandle,
}

/// The UI surface a collector session owns for its lifetime.
///
/// Created or adopted by the caller before the session starts. The session
/// mutates it only through the documented cleanup actions (delete, strip
/// components); on timeout/cancel outcomes disposal is the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prompt {
    /// The message backing this prompt.
    pub handle: MessageHandle,
}

impl Prompt {
    /// Adopt an existing message as a prompt surface.
    pub fn new(handle: MessageHandle) -> Self {
        Self { handle }
    }

    /// Channel the prompt lives in.
    pub fn channel(&self) -> ChannelId {
        self.handle.channel
    }
}
