//! Collector defaults shared by wizard layers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::collect::CollectorSpec;
use crate::gateway::{ChannelId, UserId};

/// Default knobs for building [`CollectorSpec`]s consistently across a bot's
/// wizard commands. Deserialized from the embedding bot's own config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Default session duration (milliseconds).
    pub default_duration_ms: u64,
    /// How long a transient "invalid input" notice stays visible (milliseconds).
    pub invalid_notice_ms: u64,
    /// Delete the user's winning reply after collecting it.
    pub delete_response_after_collect: bool,
    /// Delete the prompt message once the session resolves.
    pub delete_base_on_complete: bool,
    /// Strip interactive components from the prompt once the session resolves.
    pub clear_components_on_complete: bool,
    /// Acknowledge component activations before returning them.
    pub acknowledge_immediately: bool,
    /// Text that cancels a session when sent as a reply (case-insensitive).
    pub cancel_sentinel: Option<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: 60_000,
            invalid_notice_ms: 4_000,
            delete_response_after_collect: true,
            delete_base_on_complete: false,
            clear_components_on_complete: true,
            acknowledge_immediately: true,
            cancel_sentinel: Some("cancel".to_string()),
        }
    }
}

impl CollectorConfig {
    /// Build a [`CollectorSpec`] for one session from these defaults.
    pub fn spec(&self, user: UserId, channel: ChannelId) -> CollectorSpec {
        let mut spec = CollectorSpec::new(user, channel, self.default_duration());
        spec.cancel_sentinel = self.cancel_sentinel.clone();
        spec.delete_response_after_collect = self.delete_response_after_collect;
        spec.delete_base_on_complete = self.delete_base_on_complete;
        spec.clear_components_on_complete = self.clear_components_on_complete;
        spec.acknowledge_immediately = self.acknowledge_immediately;
        spec
    }

    /// Default session duration as a [`Duration`].
    pub fn default_duration(&self) -> Duration {
        Duration::from_millis(self.default_duration_ms)
    }

    /// Invalid-notice display interval as a [`Duration`].
    pub fn invalid_notice_interval(&self) -> Duration {
        Duration::from_millis(self.invalid_notice_ms)
    }
}
