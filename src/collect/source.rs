//! Event sources and the shared session deadline.
//!
//! An [`EventSource`] is one cancellable listener registration on the
//! gateway: text messages from a user in a channel, component activations
//! on an owned prompt, or reactions on an owned message. Each source is
//! backed by a single-consumer channel fed by the gateway's push events;
//! dropping the source cancels the registration, so once a session drops
//! its non-winning sources no further event from them can be observed.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::gateway::{InteractionRef, ReactionEvent, TextEvent};

/// One inbound event from a source. Never shared between sessions.
#[derive(Debug, Clone)]
pub enum RawEvent {
    /// A free-text message from the target user.
    Text(TextEvent),
    /// A component activation (button press, menu selection).
    Component(InteractionRef),
    /// A reaction added to an owned message.
    Reaction(ReactionEvent),
}

/// Unregisters a gateway listener when dropped.
///
/// The gateway-side removal may complete asynchronously; the session's
/// single-resolution guard makes any straggler delivery unobservable.
pub struct ListenerGuard {
    unregister: Option<Box<dyn FnOnce() + Send>>,
}

impl ListenerGuard {
    /// Create a guard that runs `unregister` when dropped.
    pub fn new(unregister: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unregister: Some(Box::new(unregister)),
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(unregister) = self.unregister.take() {
            unregister();
        }
    }
}

impl std::fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerGuard").finish_non_exhaustive()
    }
}

/// A cancellable registration yielding events from one external channel.
///
/// Implements [`Stream`] so a session can race several sources in a single
/// `select_all`. Dropping the source drops its [`ListenerGuard`], which
/// unregisters the gateway listener.
#[derive(Debug)]
pub struct EventSource {
    inner: ReceiverStream<RawEvent>,
    _guard: Option<ListenerGuard>,
}

impl EventSource {
    /// Build a source from a receiver and its unregistration guard.
    pub fn new(rx: mpsc::Receiver<RawEvent>, guard: ListenerGuard) -> Self {
        Self {
            inner: ReceiverStream::new(rx),
            _guard: Some(guard),
        }
    }

    /// Build a source with no registration to tear down (tests, adapters
    /// that multiplex their own fan-out).
    pub fn unguarded(rx: mpsc::Receiver<RawEvent>) -> Self {
        Self {
            inner: ReceiverStream::new(rx),
            _guard: None,
        }
    }

    /// Receive the next event, or `None` once the feeding side is gone.
    pub async fn next_event(&mut self) -> Option<RawEvent> {
        self.inner.next().await
    }
}

impl Stream for EventSource {
    type Item = RawEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<RawEvent>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// The fixed, non-extendable timer shared by all sources in one session.
///
/// Armed relative to session start; expiry always yields `TimedOut` unless
/// another branch resolved first.
#[derive(Debug)]
pub struct Deadline {
    sleep: Pin<Box<tokio::time::Sleep>>,
}

impl Deadline {
    /// Arm a deadline `duration` from now.
    pub fn after(duration: Duration) -> Self {
        Self {
            sleep: Box::pin(tokio::time::sleep(duration)),
        }
    }

    /// Wait for the deadline to expire. Safe to poll from a select loop
    /// across iterations; it fires at most once per session.
    pub async fn expired(&mut self) {
        self.sleep.as_mut().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::gateway::{ChannelId, MessageHandle, MessageId, UserId};

    fn text_event(content: &str) -> RawEvent {
        RawEvent::Text(TextEvent {
            author: UserId(1),
            content: content.to_string(),
            handle: MessageHandle {
                channel: ChannelId(10),
                message: MessageId(100),
            },
        })
    }

    #[tokio::test]
    async fn test_source_yields_pushed_events() {
        let (tx, rx) = mpsc::channel(4);
        let mut source = EventSource::unguarded(rx);

        tx.send(text_event("hello")).await.unwrap();
        match source.next_event().await {
            Some(RawEvent::Text(ev)) => assert_eq!(ev.content, "hello"),
            other => panic!("expected text event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_source_ends_when_sender_dropped() {
        let (tx, rx) = mpsc::channel::<RawEvent>(4);
        let mut source = EventSource::unguarded(rx);
        drop(tx);
        assert!(source.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_guard_fires_on_drop() {
        let fired = Arc::new(AtomicBool::new(false));
        let (_tx, rx) = mpsc::channel::<RawEvent>(1);
        let source = EventSource::new(rx, {
            let fired = Arc::clone(&fired);
            ListenerGuard::new(move || fired.store(true, Ordering::SeqCst))
        });

        assert!(!fired.load(Ordering::SeqCst));
        drop(source);
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires_at_duration() {
        let mut deadline = Deadline::after(Duration::from_millis(1000));
        let start = tokio::time::Instant::now();
        deadline.expired().await;
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }
}
