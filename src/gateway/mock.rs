//! In-memory gateway for tests and local wiring.
//!
//! `MockGateway` keeps a registry of live listeners and a log of every
//! action the collector core performs against it. Tests script inbound
//! traffic with the `push_*` methods and assert on the action log and the
//! live-listener count (which is how cancellation is observable).

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::collect::{EventSource, ListenerGuard, RawEvent};
use crate::error::GatewayError;
use crate::gateway::{
    ChannelId, ChatGateway, InteractionRef, MessageHandle, MessageId, ReactionEvent, ReactionId,
    TextEvent, UserId,
};

/// One recorded gateway action, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayAction {
    Send {
        channel: ChannelId,
        content: String,
        handle: MessageHandle,
    },
    Edit {
        handle: MessageHandle,
        content: String,
    },
    Delete {
        handle: MessageHandle,
    },
    ClearComponents {
        handle: MessageHandle,
    },
    Acknowledge {
        interaction_id: u64,
    },
}

enum Filter {
    Text { channel: ChannelId, user: UserId },
    Component { message: MessageHandle, user: UserId },
    Reaction { message: MessageHandle, user: UserId },
}

impl Filter {
    fn matches(&self, event: &RawEvent) -> bool {
        match (self, event) {
            (Filter::Text { channel, user }, RawEvent::Text(ev)) => {
                ev.handle.channel == *channel && ev.author == *user
            }
            (Filter::Component { message, user }, RawEvent::Component(ir)) => {
                ir.message == *message && ir.user == *user
            }
            (Filter::Reaction { message, user }, RawEvent::Reaction(ev)) => {
                ev.message == *message && ev.user == *user
            }
            _ => false,
        }
    }
}

struct Listener {
    id: u64,
    filter: Filter,
    tx: mpsc::Sender<RawEvent>,
}

#[derive(Default)]
struct MockState {
    actions: Vec<GatewayAction>,
    listeners: Vec<Listener>,
    deleted: HashSet<MessageHandle>,
    next_snowflake: u64,
    next_listener_id: u64,
    deny_deletes: bool,
}

/// In-memory [`ChatGateway`] with scriptable inbound events.
#[derive(Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<MockState>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock gateway state poisoned")
    }

    fn next_snowflake(state: &mut MockState) -> u64 {
        state.next_snowflake += 1;
        state.next_snowflake
    }

    fn register(&self, filter: Filter) -> EventSource {
        let (tx, rx) = mpsc::channel(16);
        let mut state = self.lock();
        state.next_listener_id += 1;
        let id = state.next_listener_id;
        state.listeners.push(Listener { id, filter, tx });

        let registry = Arc::clone(&self.state);
        let guard = ListenerGuard::new(move || {
            if let Ok(mut state) = registry.lock() {
                state.listeners.retain(|l| l.id != id);
            }
        });
        EventSource::new(rx, guard)
    }

    fn dispatch(state: &MockState, event: RawEvent) {
        for listener in &state.listeners {
            if listener.filter.matches(&event) {
                // try_send: a retired consumer must not block the pump.
                let _ = listener.tx.try_send(event.clone());
            }
        }
    }

    /// Inject a text message from `user` into `channel`.
    pub fn push_text(&self, channel: ChannelId, user: UserId, content: &str) -> MessageHandle {
        let mut state = self.lock();
        let handle = MessageHandle {
            channel,
            message: MessageId(Self::next_snowflake(&mut state)),
        };
        let event = RawEvent::Text(TextEvent {
            author: user,
            content: content.to_string(),
            handle,
        });
        Self::dispatch(&state, event);
        handle
    }

    /// Inject a component activation by `user` on `message`.
    pub fn push_component(
        &self,
        message: MessageHandle,
        user: UserId,
        custom_id: &str,
    ) -> InteractionRef {
        let mut state = self.lock();
        let interaction = InteractionRef {
            id: Self::next_snowflake(&mut state),
            custom_id: custom_id.to_string(),
            user,
            message,
        };
        Self::dispatch(&state, RawEvent::Component(interaction.clone()));
        interaction
    }

    /// Inject a reaction by `user` on `message`.
    pub fn push_reaction(&self, message: MessageHandle, user: UserId, reaction: impl Into<ReactionId>) {
        let state = self.lock();
        let event = RawEvent::Reaction(ReactionEvent {
            user,
            reaction: reaction.into(),
            message,
        });
        Self::dispatch(&state, event);
    }

    /// Make all subsequent deletes fail with `PermissionDenied`.
    pub fn deny_deletes(&self, deny: bool) {
        self.lock().deny_deletes = deny;
    }

    /// Snapshot of every action performed so far, in call order.
    pub fn actions(&self) -> Vec<GatewayAction> {
        self.lock().actions.clone()
    }

    /// How many times `handle` has been deleted.
    pub fn delete_count(&self, handle: MessageHandle) -> usize {
        self.lock()
            .actions
            .iter()
            .filter(|a| matches!(a, GatewayAction::Delete { handle: h } if *h == handle))
            .count()
    }

    /// Number of listener registrations still live. Drops to zero once a
    /// session has torn down all of its sources.
    pub fn active_listeners(&self) -> usize {
        self.lock().listeners.len()
    }
}

#[async_trait]
impl ChatGateway for MockGateway {
    async fn send_message(
        &self,
        channel: ChannelId,
        content: &str,
    ) -> Result<MessageHandle, GatewayError> {
        let mut state = self.lock();
        let handle = MessageHandle {
            channel,
            message: MessageId(Self::next_snowflake(&mut state)),
        };
        state.actions.push(GatewayAction::Send {
            channel,
            content: content.to_string(),
            handle,
        });
        Ok(handle)
    }

    async fn edit_message(
        &self,
        handle: MessageHandle,
        content: &str,
    ) -> Result<(), GatewayError> {
        let mut state = self.lock();
        if state.deleted.contains(&handle) {
            return Err(GatewayError::MessageNotFound { handle });
        }
        state.actions.push(GatewayAction::Edit {
            handle,
            content: content.to_string(),
        });
        Ok(())
    }

    async fn delete_message(&self, handle: MessageHandle) -> Result<(), GatewayError> {
        let mut state = self.lock();
        if state.deny_deletes {
            return Err(GatewayError::PermissionDenied {
                action: "delete",
                handle,
            });
        }
        if !state.deleted.insert(handle) {
            return Err(GatewayError::MessageNotFound { handle });
        }
        state.actions.push(GatewayAction::Delete { handle });
        Ok(())
    }

    async fn clear_components(&self, handle: MessageHandle) -> Result<(), GatewayError> {
        let mut state = self.lock();
        if state.deleted.contains(&handle) {
            return Err(GatewayError::MessageNotFound { handle });
        }
        state.actions.push(GatewayAction::ClearComponents { handle });
        Ok(())
    }

    async fn acknowledge(&self, interaction: &InteractionRef) -> Result<(), GatewayError> {
        let mut state = self.lock();
        state.actions.push(GatewayAction::Acknowledge {
            interaction_id: interaction.id,
        });
        Ok(())
    }

    fn text_messages(&self, channel: ChannelId, user: UserId) -> EventSource {
        self.register(Filter::Text { channel, user })
    }

    fn component_clicks(&self, message: MessageHandle, user: UserId) -> EventSource {
        self.register(Filter::Component { message, user })
    }

    fn reactions(&self, message: MessageHandle, user: UserId) -> EventSource {
        self.register(Filter::Reaction { message, user })
    }
}
