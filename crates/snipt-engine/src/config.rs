use snipt_core::config::{Settings, TriggerKey};
use std::time::Duration;

/// Timings and switches the engine runs with, derived from [`Settings`]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub enabled: bool,
    pub trigger_key: TriggerKey,
    pub expand_on_input: bool,
    pub debounce: Duration,
    /// Wait after each strategy before verifying
    pub settle: Duration,
    /// Pause between simulated keystrokes
    pub keystroke_delay: Duration,
    pub rewrite_max_attempts: u32,
    pub rewrite_initial_backoff: Duration,
    pub rewrite_max_backoff: Duration,
    pub show_notifications: bool,
    pub notification_duration: Duration,
}

impl EngineConfig {
    /// Backoff before rewrite attempt `attempt + 1`, doubling from the initial delay
    pub fn rewrite_backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.rewrite_initial_backoff
            .saturating_mul(factor)
            .min(self.rewrite_max_backoff)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for EngineConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            enabled: settings.enabled,
            trigger_key: settings.trigger_key,
            expand_on_input: settings.expand_on_input,
            debounce: settings.debounce(),
            settle: Duration::from_millis(settings.settle_ms),
            keystroke_delay: Duration::from_millis(settings.keystroke_delay_ms),
            rewrite_max_attempts: settings.rewrite_max_attempts,
            rewrite_initial_backoff: Duration::from_millis(settings.rewrite_initial_backoff_ms),
            rewrite_max_backoff: Duration::from_millis(settings.rewrite_max_backoff_ms),
            show_notifications: settings.show_notifications,
            notification_duration: settings.notification_duration(),
        }
    }
}
