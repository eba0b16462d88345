//! Bounded-time input collectors for chat-bot configuration wizards.
//!
//! Wizard commands (role setup, section setup, quota editing) are long
//! chains of "ask the user for one value" steps. Every step rests on the
//! same mechanism: race a free-text reply against a component activation
//! from one specific user under one deadline, resolve to exactly one
//! [`Outcome`](collect::Outcome), cancel everything else, and clean up the
//! owned UI state exactly once. This crate is that mechanism:
//!
//! - [`collect::CollectorSession`] — the one-shot dual-source race;
//! - [`collect::RetryPrompt`] — the validate-and-reprompt loop with
//!   back/reset/quit sentinel controls;
//! - [`collect::ReactionRouter`] — the long-lived reaction-menu variant;
//! - [`gateway::ChatGateway`] — the seam to the chat platform, with an
//!   in-memory [`gateway::MockGateway`] for tests.
//!
//! The chat protocol, the persistence store, and the wizard flows
//! themselves are collaborators, not residents: callers hand the collector
//! a gateway and consume typed outcomes.

pub mod collect;
pub mod config;
pub mod error;
pub mod gateway;

pub use collect::{
    AskOutcome, CollectorSession, CollectorSpec, EventSource, Outcome, RawEvent, ReactionRouter,
    RetryPrompt, RouterController, RouterHandle, Sentinel, SessionToken, StopReason, Validation,
};
pub use config::CollectorConfig;
pub use error::{Error, GatewayError};
pub use gateway::{
    ChannelId, ChatGateway, InteractionRef, MessageHandle, MessageId, MockGateway, Prompt,
    ReactionEvent, ReactionId, TextEvent, UserId,
};
