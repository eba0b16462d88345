//! The collector family.
//!
//! Everything here is built from the same three pieces:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      CollectorSession                        │
//! │                                                              │
//! │   ┌────────────┐  ┌───────────────┐  ┌──────────┐           │
//! │   │ text source│  │component src  │  │ Deadline │           │
//! │   └─────┬──────┘  └──────┬────────┘  └────┬─────┘           │
//! │         └────────────────┴────────────────┘                  │
//! │                          │                                   │
//! │                  select (first wins)                         │
//! │                          │                                   │
//! │                          ▼                                   │
//! │            exactly one Outcome + one cleanup                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`RetryPrompt`] loops one-shot sessions into a validate-and-reprompt
//! "ask" primitive; [`ReactionRouter`] reuses the sources and the
//! single-stop guard for long-lived reaction menus.

pub mod parse;
mod retry;
mod router;
mod session;
mod source;

pub use retry::{AskOutcome, RetryPrompt, Sentinel, controls};
pub use router::{ReactionRouter, RouterController, RouterHandle, StopReason};
pub use session::{CollectorSession, CollectorSpec, Outcome, SessionToken, Validation};
pub use source::{Deadline, EventSource, ListenerGuard, RawEvent};
