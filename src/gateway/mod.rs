//! The chat-platform seam.
//!
//! The collector core never talks to a wire protocol. It drives a
//! [`ChatGateway`]: send/edit/delete operations on messages, interaction
//! acknowledgement, and listener registration returning [`EventSource`]s.
//! Production bots implement the trait over their platform client; tests
//! use the in-memory [`MockGateway`].

mod mock;
mod types;

pub use mock::{GatewayAction, MockGateway};
pub use types::{
    ChannelId, InteractionRef, MessageHandle, MessageId, Prompt, ReactionEvent, ReactionId,
    TextEvent, UserId,
};

use async_trait::async_trait;

use crate::collect::EventSource;
use crate::error::GatewayError;

/// Operations the collector core needs from the chat platform.
///
/// Listener registration is synchronous: implementations keep a local
/// registry fed by their gateway event pump, so registering is a matter of
/// inserting a channel sender. The returned [`EventSource`] unregisters the
/// listener when dropped.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Post a message to a channel, returning a handle to it.
    async fn send_message(
        &self,
        channel: ChannelId,
        content: &str,
    ) -> Result<MessageHandle, GatewayError>;

    /// Replace the content of an existing message.
    async fn edit_message(&self, handle: MessageHandle, content: &str)
    -> Result<(), GatewayError>;

    /// Delete a message.
    async fn delete_message(&self, handle: MessageHandle) -> Result<(), GatewayError>;

    /// Strip all interactive components from a message.
    async fn clear_components(&self, handle: MessageHandle) -> Result<(), GatewayError>;

    /// Acknowledge a component activation so the platform stops showing it
    /// as pending.
    async fn acknowledge(&self, interaction: &InteractionRef) -> Result<(), GatewayError>;

    /// Listen for text messages from `user` in `channel`.
    fn text_messages(&self, channel: ChannelId, user: UserId) -> EventSource;

    /// Listen for component activations by `user` on `message`.
    fn component_clicks(&self, message: MessageHandle, user: UserId) -> EventSource;

    /// Listen for reactions added by `user` to `message`.
    fn reactions(&self, message: MessageHandle, user: UserId) -> EventSource;
}
