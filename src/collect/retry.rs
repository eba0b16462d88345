//! The validate-and-reprompt loop used by "ask input" wizard steps.
//!
//! [`RetryPrompt::ask`] re-issues a prompt until the target user supplies a
//! value the caller's parser accepts, activates a recognized sentinel
//! control, cancels, or times out. Each attempt is one single-shot
//! [`CollectorSession`]; the loop owns per-attempt re-rendering and the
//! transient "invalid input" feedback. All domain-specific parsing lives in
//! the caller's `validate` closure (see [`crate::collect::parse`] for the
//! common ones); the loop itself is domain-agnostic.

use std::time::Duration;

use crate::collect::{CollectorSession, CollectorSpec, Outcome, Validation};
use crate::error::GatewayError;
use crate::gateway::{ChatGateway, Prompt, TextEvent};

/// Custom ids of the sentinel controls a retry prompt recognizes.
pub mod controls {
    /// Return to the previous wizard step.
    pub const BACK: &str = "back";
    /// Restart the wizard from its first step.
    pub const RESET: &str = "reset";
    /// Abandon the wizard.
    pub const QUIT: &str = "quit";
}

/// A reserved action that ended the loop instead of a data value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    /// The user pressed the "back" control.
    Back,
    /// The user pressed the "reset" control.
    Reset,
    /// The user pressed the "quit" control.
    Quit,
    /// The cancel sentinel text was received.
    Canceled,
    /// The deadline expired.
    TimedOut,
}

impl Sentinel {
    /// Map a component custom id to its sentinel, if recognized.
    pub fn from_control_id(custom_id: &str) -> Option<Self> {
        match custom_id {
            controls::BACK => Some(Sentinel::Back),
            controls::RESET => Some(Sentinel::Reset),
            controls::QUIT => Some(Sentinel::Quit),
            _ => None,
        }
    }
}

/// Terminal result of one [`RetryPrompt::ask`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome<T> {
    /// The user supplied a value the parser accepted.
    Value(T),
    /// A sentinel action ended the loop; on `Canceled`/`TimedOut` the
    /// caller is responsible for disposing the prompt.
    Sentinel(Sentinel),
}

/// Per-attempt verdict, carried through the session as its value type so a
/// rejection resolves the attempt instead of silently retiring the text
/// source (which is what direct `run` callers get).
enum Attempt<T> {
    Valid(T),
    Invalid(String),
}

/// A reprompting wrapper over one-shot collection sessions.
pub struct RetryPrompt<'a> {
    gateway: &'a dyn ChatGateway,
    spec: CollectorSpec,
    prompt: Prompt,
    notice_interval: Duration,
}

impl<'a> RetryPrompt<'a> {
    /// Wrap a prompt for repeated collection under `spec`.
    pub fn new(gateway: &'a dyn ChatGateway, spec: CollectorSpec, prompt: Prompt) -> Self {
        Self {
            gateway,
            spec,
            prompt,
            notice_interval: Duration::from_secs(4),
        }
    }

    /// How long the transient "invalid input" notice stays visible.
    pub fn with_notice_interval(mut self, interval: Duration) -> Self {
        self.notice_interval = interval;
        self
    }

    /// Ask until a valid value, a sentinel action, or a timeout.
    ///
    /// `render` is invoked exactly once per collection attempt (1-based)
    /// to draw or update the prompt; its gateway failures are cosmetic and
    /// are logged and swallowed. `validate` parses a raw text reply,
    /// returning the typed value or a short description of what was
    /// expected. Repeated invalid input never ends the loop on its own;
    /// only a value, a sentinel, or the per-attempt deadline does.
    pub async fn ask<T, R, V>(&self, mut render: R, mut validate: V) -> AskOutcome<T>
    where
        R: AsyncFnMut(u32) -> Result<(), GatewayError>,
        V: FnMut(&str) -> Result<T, String>,
    {
        let token = self.spec.token;
        // Intermediate attempts must leave the prompt alive; base cleanup
        // is applied once the loop itself is done.
        let mut attempt_spec = self.spec.clone();
        attempt_spec.delete_base_on_complete = false;
        attempt_spec.clear_components_on_complete = false;

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            if let Err(err) = render(attempt).await {
                tracing::debug!(%token, attempt, %err, "prompt render failed; collecting anyway");
            }

            let sources = vec![
                self.gateway.text_messages(self.spec.channel, self.spec.user),
                self.gateway.component_clicks(self.prompt.handle, self.spec.user),
            ];
            let session = CollectorSession::new(self.gateway, &attempt_spec, self.prompt);
            let outcome = session
                .run(sources, |ev: &TextEvent| match validate(&ev.content) {
                    Ok(value) => Validation::Accept(Attempt::Valid(value)),
                    Err(expected) => Validation::Accept(Attempt::Invalid(expected)),
                })
                .await;

            match outcome {
                Outcome::Value(Attempt::Valid(value)) => {
                    tracing::debug!(%token, attempt, "retry prompt accepted value");
                    self.finish_cleanup().await;
                    return AskOutcome::Value(value);
                }
                Outcome::Value(Attempt::Invalid(expected)) => {
                    tracing::debug!(%token, attempt, expected, "invalid input; reprompting");
                    self.show_invalid_notice(&expected).await;
                }
                Outcome::Choice(interaction) => {
                    let sentinel = Sentinel::from_control_id(&interaction.custom_id)
                        .unwrap_or(Sentinel::Quit);
                    tracing::debug!(
                        %token,
                        attempt,
                        custom_id = %interaction.custom_id,
                        ?sentinel,
                        "retry prompt ended by control"
                    );
                    return AskOutcome::Sentinel(sentinel);
                }
                Outcome::Canceled => return AskOutcome::Sentinel(Sentinel::Canceled),
                Outcome::TimedOut => return AskOutcome::Sentinel(Sentinel::TimedOut),
            }
        }
    }

    /// Post the self-expiring "invalid input" notice.
    async fn show_invalid_notice(&self, expected: &str) {
        let token = self.spec.token;
        let content = format!("Invalid input, expected: `{expected}`");
        match self.gateway.send_message(self.spec.channel, &content).await {
            Ok(notice) => {
                tokio::time::sleep(self.notice_interval).await;
                if let Err(err) = self.gateway.delete_message(notice).await {
                    tracing::debug!(%token, %err, "notice deletion failed; ignoring");
                }
            }
            Err(err) => {
                tracing::debug!(%token, %err, "notice send failed; ignoring");
            }
        }
    }

    /// Apply the spec's base cleanup once the loop has produced a value.
    /// Sentinel endings leave the prompt to the caller, which may still
    /// need it (e.g. "back" re-renders the previous step onto it).
    async fn finish_cleanup(&self) {
        let token = self.spec.token;
        if self.spec.delete_base_on_complete {
            if let Err(err) = self.gateway.delete_message(self.prompt.handle).await {
                tracing::debug!(%token, %err, "prompt deletion failed; ignoring");
            }
        } else if self.spec.clear_components_on_complete
            && let Err(err) = self.gateway.clear_components(self.prompt.handle).await
        {
            tracing::debug!(%token, %err, "component strip failed; ignoring");
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    use super::*;
    use crate::gateway::{ChannelId, GatewayAction, MockGateway, UserId};

    const USER: UserId = UserId(7);
    const CHANNEL: ChannelId = ChannelId(100);

    async fn prompt(gateway: &MockGateway) -> Prompt {
        let handle = gateway.send_message(CHANNEL, "how many?").await.unwrap();
        Prompt::new(handle)
    }

    fn spec() -> CollectorSpec {
        CollectorSpec::new(USER, CHANNEL, Duration::from_secs(60))
    }

    fn parse_int(raw: &str) -> Result<i64, String> {
        raw.trim().parse().map_err(|_| "integer".to_string())
    }

    /// Render closure that reports each attempt on a channel so the test
    /// can inject the next reply only after the prompt is listening again.
    fn counting_render(
        tx: mpsc::UnboundedSender<u32>,
    ) -> impl AsyncFnMut(u32) -> Result<(), GatewayError> {
        async move |attempt| {
            tx.send(attempt).expect("test listener gone");
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_rejects_then_accept_renders_four_times() {
        let gateway = MockGateway::new();
        let prompt = prompt(&gateway).await;
        let ask = RetryPrompt::new(&gateway, spec(), prompt)
            .with_notice_interval(Duration::from_millis(100));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let gw = gateway.clone();
        let pusher = tokio::spawn(async move {
            let replies = ["nope", "also nope", "still nope", "4"];
            let mut seen = 0u32;
            while let Some(attempt) = rx.recv().await {
                seen = attempt;
                gw.push_text(CHANNEL, USER, replies[(attempt - 1) as usize]);
                if attempt as usize == replies.len() {
                    break;
                }
            }
            seen
        });

        let outcome = ask.ask(counting_render(tx), parse_int).await;
        assert_eq!(outcome, AskOutcome::Value(4));
        assert_eq!(pusher.await.unwrap(), 4, "render ran exactly four times");
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_notice_is_sent_then_deleted() {
        let gateway = MockGateway::new();
        let prompt = prompt(&gateway).await;
        let ask = RetryPrompt::new(&gateway, spec(), prompt)
            .with_notice_interval(Duration::from_millis(100));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let gw = gateway.clone();
        tokio::spawn(async move {
            while let Some(attempt) = rx.recv().await {
                match attempt {
                    1 => {
                        gw.push_text(CHANNEL, USER, "garbage");
                    }
                    _ => {
                        gw.push_text(CHANNEL, USER, "9");
                        break;
                    }
                }
            }
        });

        let outcome = ask.ask(counting_render(tx), parse_int).await;
        assert_eq!(outcome, AskOutcome::Value(9));

        let actions = gateway.actions();
        let notice = actions.iter().find_map(|a| match a {
            GatewayAction::Send { content, handle, .. } if content.contains("integer") => {
                Some(*handle)
            }
            _ => None,
        });
        let notice = notice.expect("invalid-input notice was sent");
        assert_eq!(gateway.delete_count(notice), 1, "notice self-expired");
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_control_returns_back_without_value() {
        let gateway = MockGateway::new();
        let prompt = prompt(&gateway).await;
        let ask = RetryPrompt::new(&gateway, spec(), prompt);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let gw = gateway.clone();
        let handle = prompt.handle;
        tokio::spawn(async move {
            let _ = rx.recv().await;
            gw.push_component(handle, USER, controls::BACK);
        });

        let outcome = ask.ask(counting_render(tx), parse_int).await;
        assert_eq!(outcome, AskOutcome::Sentinel(Sentinel::Back));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrecognized_control_quits() {
        let gateway = MockGateway::new();
        let prompt = prompt(&gateway).await;
        let ask = RetryPrompt::new(&gateway, spec(), prompt);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let gw = gateway.clone();
        let handle = prompt.handle;
        tokio::spawn(async move {
            let _ = rx.recv().await;
            gw.push_component(handle, USER, "mystery");
        });

        let outcome = ask.ask(counting_render(tx), parse_int).await;
        assert_eq!(outcome, AskOutcome::Sentinel(Sentinel::Quit));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_sentinel_ends_loop() {
        let gateway = MockGateway::new();
        let prompt = prompt(&gateway).await;
        let ask = RetryPrompt::new(&gateway, spec().with_cancel_sentinel("cancel"), prompt);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let gw = gateway.clone();
        tokio::spawn(async move {
            let _ = rx.recv().await;
            gw.push_text(CHANNEL, USER, "CANCEL");
        });

        let outcome = ask.ask(counting_render(tx), parse_int).await;
        assert_eq!(outcome, AskOutcome::Sentinel(Sentinel::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_silence_times_out() {
        let gateway = MockGateway::new();
        let prompt = prompt(&gateway).await;
        let spec = CollectorSpec::new(USER, CHANNEL, Duration::from_millis(500));
        let ask = RetryPrompt::new(&gateway, spec, prompt);

        let outcome: AskOutcome<i64> = ask.ask(async |_| Ok(()), parse_int).await;
        assert_eq!(outcome, AskOutcome::Sentinel(Sentinel::TimedOut));
    }

    #[tokio::test(start_paused = true)]
    async fn test_value_applies_base_cleanup() {
        let gateway = MockGateway::new();
        let prompt = prompt(&gateway).await;
        let ask = RetryPrompt::new(&gateway, spec().clear_components(), prompt);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let gw = gateway.clone();
        tokio::spawn(async move {
            let _ = rx.recv().await;
            gw.push_text(CHANNEL, USER, "12");
        });

        let outcome = ask.ask(counting_render(tx), parse_int).await;
        assert_eq!(outcome, AskOutcome::Value(12));
        assert!(
            gateway
                .actions()
                .contains(&GatewayAction::ClearComponents { handle: prompt.handle }),
            "components stripped once the loop produced a value"
        );
    }
}
