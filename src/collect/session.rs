//! One-shot dual-source collection sessions.
//!
//! A [`CollectorSession`] races N event sources against a single deadline
//! and produces exactly one [`Outcome`]. The "double collector" case arms a
//! text source and a component source over the same prompt; the "single
//! collector" case arms just one. Whichever source delivers the first
//! qualifying event decides the outcome; every other source and the
//! deadline are canceled before the outcome is returned, and the session's
//! cleanup policy runs exactly once regardless of which branch won.

use std::fmt;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::{SelectAll, select_all};
use uuid::Uuid;

use crate::collect::{Deadline, EventSource, RawEvent};
use crate::gateway::{ChannelId, ChatGateway, InteractionRef, MessageHandle, Prompt, TextEvent, UserId};

/// Ownership token for one wizard session.
///
/// The wizard layer mints one token per active wizard and checks it before
/// starting another session for the same guild/user; the core itself holds
/// no global state and only carries the token through its log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(Uuid);

impl SessionToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable configuration for one collection session.
#[derive(Debug, Clone)]
pub struct CollectorSpec {
    /// The only user whose events qualify.
    pub user: UserId,
    /// Channel text replies are collected from.
    pub channel: ChannelId,
    /// Maximum session lifetime, relative to session start. Not extendable.
    pub duration: Duration,
    /// Text treated as cancellation when it matches case-insensitively.
    pub cancel_sentinel: Option<String>,
    /// Delete the user's winning reply after collecting it.
    pub delete_response_after_collect: bool,
    /// Delete the prompt once the session resolves.
    pub delete_base_on_complete: bool,
    /// Strip the prompt's components once the session resolves
    /// (only when the prompt itself is kept).
    pub clear_components_on_complete: bool,
    /// Acknowledge a winning component activation before returning it.
    pub acknowledge_immediately: bool,
    /// Ownership token carried through log fields.
    pub token: SessionToken,
}

impl CollectorSpec {
    /// Spec with the given target and duration; cleanup flags all off.
    pub fn new(user: UserId, channel: ChannelId, duration: Duration) -> Self {
        Self {
            user,
            channel,
            duration,
            cancel_sentinel: None,
            delete_response_after_collect: false,
            delete_base_on_complete: false,
            clear_components_on_complete: false,
            acknowledge_immediately: false,
            token: SessionToken::new(),
        }
    }

    /// Treat `sentinel` as cancellation (case-insensitive).
    pub fn with_cancel_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.cancel_sentinel = Some(sentinel.into());
        self
    }

    /// Delete the user's winning reply after collecting it.
    pub fn delete_response(mut self) -> Self {
        self.delete_response_after_collect = true;
        self
    }

    /// Delete the prompt once the session resolves.
    pub fn delete_base(mut self) -> Self {
        self.delete_base_on_complete = true;
        self
    }

    /// Strip the prompt's components once the session resolves.
    pub fn clear_components(mut self) -> Self {
        self.clear_components_on_complete = true;
        self
    }

    /// Acknowledge a winning component activation before returning it.
    pub fn acknowledge(mut self) -> Self {
        self.acknowledge_immediately = true;
        self
    }
}

/// Verdict of a caller-supplied validator over a winning text event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation<T> {
    /// The text parsed to a typed value; resolve `Value`.
    Accept(T),
    /// Not a match. The event is discarded and the session keeps listening
    /// on its remaining sources; the text source is not re-armed. The
    /// string names what was expected, for validation feedback.
    Reject(String),
    /// The text itself means "stop"; resolve `Canceled`.
    Cancel,
}

/// The single tagged result of a session. Exactly one is produced per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// A validator-accepted text reply.
    Value(T),
    /// A winning component activation, returned unvalidated.
    Choice(InteractionRef),
    /// The cancel sentinel (or a validator `Cancel`) was received.
    Canceled,
    /// The deadline expired before any qualifying event.
    TimedOut,
}

impl<T> Outcome<T> {
    /// Short tag for log fields.
    fn tag(&self) -> &'static str {
        match self {
            Outcome::Value(_) => "value",
            Outcome::Choice(_) => "choice",
            Outcome::Canceled => "canceled",
            Outcome::TimedOut => "timed_out",
        }
    }
}

/// Session lifecycle. The `Resolving → CleanedUp` transition is guarded to
/// fire at most once even if multiple sources fire near-simultaneously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Listening,
    Resolving,
    CleanedUp,
}

/// A one-shot collection session over a prompt.
///
/// Consumes itself on [`run`](Self::run), which enforces the single-shot
/// contract at the type level: one session, one outcome. Retrying on
/// invalid input is the retry loop's job, not this type's.
pub struct CollectorSession<'a> {
    gateway: &'a dyn ChatGateway,
    spec: &'a CollectorSpec,
    prompt: Prompt,
    state: SessionState,
}

impl<'a> CollectorSession<'a> {
    /// Bind a session to a gateway, spec, and the prompt it will own for
    /// its lifetime.
    pub fn new(gateway: &'a dyn ChatGateway, spec: &'a CollectorSpec, prompt: Prompt) -> Self {
        Self {
            gateway,
            spec,
            prompt,
            state: SessionState::Idle,
        }
    }

    /// Collect a raw text reply or component choice with no validation.
    pub async fn collect(self, sources: Vec<EventSource>) -> Outcome<String> {
        self.run(sources, |ev: &TextEvent| Validation::Accept(ev.content.clone()))
            .await
    }

    /// Race every supplied source against the deadline and resolve exactly
    /// one [`Outcome`].
    ///
    /// The text branch checks the cancel sentinel before the validator. A
    /// rejected text event is discarded — the session keeps listening on
    /// its remaining sources, but the text source has spent its one
    /// qualifying event and is retired. Cleanup runs exactly once after
    /// resolution; its gateway failures are logged and discarded.
    pub async fn run<T, V>(mut self, sources: Vec<EventSource>, mut validator: V) -> Outcome<T>
    where
        V: FnMut(&TextEvent) -> Validation<T>,
    {
        let token = self.spec.token;
        self.state = SessionState::Listening;
        tracing::debug!(
            %token,
            sources = sources.len(),
            duration_ms = self.spec.duration.as_millis() as u64,
            "collector session listening"
        );

        let mut deadline = Deadline::after(self.spec.duration);
        let mut events: SelectAll<EventSource> = select_all(sources);
        let mut sources_exhausted = events.is_empty();
        let mut text_retired = false;
        let mut winning_reply: Option<MessageHandle> = None;

        let outcome = loop {
            tokio::select! {
                _ = deadline.expired() => break Outcome::TimedOut,
                event = events.next(), if !sources_exhausted => match event {
                    // All feeding sides gone; only the deadline can resolve now.
                    None => sources_exhausted = true,
                    Some(RawEvent::Text(text)) => {
                        if text.author != self.spec.user || text_retired {
                            continue;
                        }
                        text_retired = true;

                        if let Some(sentinel) = self.spec.cancel_sentinel.as_deref()
                            && text.content.trim().eq_ignore_ascii_case(sentinel)
                        {
                            winning_reply = Some(text.handle);
                            break Outcome::Canceled;
                        }

                        match validator(&text) {
                            Validation::Accept(value) => {
                                winning_reply = Some(text.handle);
                                break Outcome::Value(value);
                            }
                            Validation::Cancel => {
                                winning_reply = Some(text.handle);
                                break Outcome::Canceled;
                            }
                            Validation::Reject(expected) => {
                                tracing::debug!(
                                    %token,
                                    expected,
                                    "text event rejected; text source retired"
                                );
                            }
                        }
                    }
                    Some(RawEvent::Component(interaction)) => {
                        if self.spec.acknowledge_immediately
                            && let Err(err) = self.gateway.acknowledge(&interaction).await
                        {
                            tracing::debug!(%token, %err, "acknowledge failed; ignoring");
                        }
                        break Outcome::Choice(interaction);
                    }
                    // Reactions are router traffic; a one-shot session ignores them.
                    Some(RawEvent::Reaction(_)) => {}
                },
            }
        };

        self.state = SessionState::Resolving;
        // Cancel every non-winning source and the deadline before the
        // outcome escapes: no further callback can be observed after this.
        drop(events);
        drop(deadline);

        self.cleanup(outcome.tag(), winning_reply).await;
        tracing::debug!(%token, outcome = outcome.tag(), "collector session resolved");
        outcome
    }

    /// Owner-configured cleanup, exactly once per session. Every gateway
    /// failure here is best-effort: the platform may have already removed
    /// the message or revoked permissions.
    async fn cleanup(&mut self, outcome: &'static str, winning_reply: Option<MessageHandle>) {
        if self.state == SessionState::CleanedUp {
            return;
        }
        self.state = SessionState::CleanedUp;
        let token = self.spec.token;

        if self.spec.delete_response_after_collect
            && let Some(reply) = winning_reply
            && let Err(err) = self.gateway.delete_message(reply).await
        {
            tracing::debug!(%token, %reply, %err, "reply deletion failed; ignoring");
        }

        if self.spec.delete_base_on_complete {
            if let Err(err) = self.gateway.delete_message(self.prompt.handle).await {
                tracing::debug!(%token, %err, outcome, "prompt deletion failed; ignoring");
            }
        } else if self.spec.clear_components_on_complete
            && let Err(err) = self.gateway.clear_components(self.prompt.handle).await
        {
            tracing::debug!(%token, %err, outcome, "component strip failed; ignoring");
        }
    }
}
