//! Long-lived reaction/text routing over an owned prompt.
//!
//! Where a [`CollectorSession`](crate::collect::CollectorSession) resolves
//! once and tears down, a [`ReactionRouter`] keeps a persistent mapping
//! from reaction ids to handler callbacks and keeps dispatching until it is
//! explicitly stopped or its deadline elapses. It composes the same
//! single-stop-guard discipline: teardown happens exactly once, and a
//! second `stop()` is a no-op.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::select_all;
use tokio::sync::watch;

use crate::collect::{CollectorSpec, Deadline, EventSource, RawEvent};
use crate::gateway::{ChatGateway, Prompt, ReactionEvent, ReactionId, TextEvent};

/// Why a router stopped. Produced exactly once per router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// A handler or external caller requested the stop.
    Requested(String),
    /// The router's deadline elapsed.
    Deadline,
}

type TextHandler =
    Arc<dyn Fn(TextEvent, RouterHandle) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;
type ReactionHandler = Arc<
    dyn Fn(ReactionEvent, RouterHandle) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync,
>;
type StopCallback = Box<dyn FnOnce(StopReason) -> BoxFuture<'static, ()> + Send>;

/// Cloneable handle for requesting a stop from handlers or external code.
#[derive(Clone)]
pub struct RouterHandle {
    stop_tx: Arc<watch::Sender<Option<StopReason>>>,
}

impl RouterHandle {
    /// Request a stop. Returns `true` if this call won the stop (the
    /// router was still running); a second call changes nothing and
    /// returns `false`.
    pub fn stop(&self, reason: StopReason) -> bool {
        self.stop_tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        })
    }

    /// The stop reason, once one has been decided.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_tx.borrow().clone()
    }
}

/// Owner-side controller for a started router.
pub struct RouterController {
    handle: RouterHandle,
    task: tokio::task::JoinHandle<StopReason>,
}

impl RouterController {
    /// A cloneable handle for stopping the router.
    pub fn handle(&self) -> RouterHandle {
        self.handle.clone()
    }

    /// Request a stop; idempotent, see [`RouterHandle::stop`].
    pub fn stop(&self, reason: StopReason) -> bool {
        self.handle.stop(reason)
    }

    /// Wait for the router to finish and yield its stop reason.
    pub async fn stopped(self) -> StopReason {
        match self.task.await {
            Ok(reason) => reason,
            Err(err) => {
                tracing::warn!(%err, "router task failed");
                StopReason::Requested("router task failed".to_string())
            }
        }
    }
}

/// Builder for a multiplexed text/reaction dispatch loop. The builder is
/// the `NotStarted` state; [`start`](Self::start) moves to `Running`.
pub struct ReactionRouter {
    spec: CollectorSpec,
    prompt: Prompt,
    text_route: Option<TextHandler>,
    reaction_routes: HashMap<ReactionId, ReactionHandler>,
    on_stop: Option<StopCallback>,
}

impl ReactionRouter {
    /// A router over `prompt` with no routes yet.
    pub fn new(spec: CollectorSpec, prompt: Prompt) -> Self {
        Self {
            spec,
            prompt,
            text_route: None,
            reaction_routes: HashMap::new(),
            on_stop: None,
        }
    }

    /// Dispatch qualifying text messages to `handler`.
    pub fn on_text<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(TextEvent, RouterHandle) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.text_route = Some(Arc::new(move |ev, handle| Box::pin(handler(ev, handle))));
        self
    }

    /// Dispatch `reaction` events to `handler`. Unregistered reactions are
    /// ignored.
    pub fn route<F, Fut>(mut self, reaction: impl Into<ReactionId>, handler: F) -> Self
    where
        F: Fn(ReactionEvent, RouterHandle) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.reaction_routes.insert(
            reaction.into(),
            Arc::new(move |ev, handle| Box::pin(handler(ev, handle))),
        );
        self
    }

    /// Terminal callback, invoked exactly once with the stop reason.
    pub fn on_stop<F, Fut>(mut self, callback: F) -> Self
    where
        F: FnOnce(StopReason) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_stop = Some(Box::new(move |reason| Box::pin(callback(reason))));
        self
    }

    /// Register the underlying sources and start dispatching.
    pub fn start(self, gateway: &dyn ChatGateway) -> RouterController {
        let mut sources: Vec<EventSource> = Vec::new();
        if self.text_route.is_some() {
            sources.push(gateway.text_messages(self.spec.channel, self.spec.user));
        }
        if !self.reaction_routes.is_empty() {
            sources.push(gateway.reactions(self.prompt.handle, self.spec.user));
        }

        let (stop_tx, stop_rx) = watch::channel(None);
        let handle = RouterHandle {
            stop_tx: Arc::new(stop_tx),
        };
        let task = tokio::spawn(Self::dispatch_loop(
            self.spec,
            self.text_route,
            self.reaction_routes,
            self.on_stop,
            sources,
            handle.clone(),
            stop_rx,
        ));
        RouterController { handle, task }
    }

    async fn dispatch_loop(
        spec: CollectorSpec,
        text_route: Option<TextHandler>,
        reaction_routes: HashMap<ReactionId, ReactionHandler>,
        on_stop: Option<StopCallback>,
        sources: Vec<EventSource>,
        handle: RouterHandle,
        mut stop_rx: watch::Receiver<Option<StopReason>>,
    ) -> StopReason {
        let token = spec.token;
        tracing::debug!(
            %token,
            routes = reaction_routes.len(),
            has_text_route = text_route.is_some(),
            duration_ms = spec.duration.as_millis() as u64,
            "reaction router running"
        );

        let mut deadline = Deadline::after(spec.duration);
        let mut events = select_all(sources);
        let mut sources_exhausted = events.is_empty();

        let reason = loop {
            tokio::select! {
                _ = stop_rx.changed() => {}
                _ = deadline.expired() => {
                    handle.stop(StopReason::Deadline);
                }
                event = events.next(), if !sources_exhausted => match event {
                    None => sources_exhausted = true,
                    Some(RawEvent::Text(ev)) => {
                        if let Some(route) = &text_route
                            && ev.author == spec.user
                            && let Err(err) = route(ev, handle.clone()).await
                        {
                            tracing::warn!(%token, %err, "text route failed; router continues");
                        }
                    }
                    Some(RawEvent::Reaction(ev)) => {
                        if ev.user != spec.user {
                            continue;
                        }
                        match reaction_routes.get(&ev.reaction) {
                            Some(route) => {
                                if let Err(err) = route(ev, handle.clone()).await {
                                    tracing::warn!(
                                        %token,
                                        %err,
                                        "reaction route failed; router continues"
                                    );
                                }
                            }
                            None => {
                                tracing::debug!(%token, reaction = %ev.reaction, "unrouted reaction ignored");
                            }
                        }
                    }
                    // Component clicks are collector traffic, not router traffic.
                    Some(RawEvent::Component(_)) => {}
                },
            }

            // Handlers may have requested a stop mid-dispatch.
            if let Some(reason) = handle.stop_reason() {
                break reason;
            }
        };

        // Single teardown of every underlying source.
        drop(events);
        drop(deadline);

        if let Some(callback) = on_stop {
            callback(reason.clone()).await;
        }
        tracing::debug!(%token, ?reason, "reaction router stopped");
        reason
    }
}
