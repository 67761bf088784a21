//! Runtime configuration and environment loading.
use std::env;
use std::time::Duration;

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Period of automatic scheduler ticks. `None` means ticks only happen
    /// through [`crate::RuntimeHandle::tick`].
    pub tick_interval: Option<Duration>,
    pub command_buffer_size: usize,
    pub event_buffer_size: usize,
    /// Per-user outbox capacity of the message hub.
    pub outbox_capacity: usize,
    /// Seeds a deterministic dice stream instead of OS entropy.
    pub dice_seed: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval: Some(Duration::from_millis(1000)),
            command_buffer_size: 32,
            event_buffer_size: 100,
            outbox_capacity: 64,
            dice_seed: None,
        }
    }
}

impl RuntimeConfig {
    /// Default configuration with automatic ticking disabled.
    pub fn manual_ticks() -> Self {
        Self {
            tick_interval: None,
            ..Self::default()
        }
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `CAST_TICK_MS` - Scheduler tick period, `0` disables auto ticking (default: 1000)
    /// - `CAST_COMMAND_BUFFER` - Scheduler command queue size (default: 32)
    /// - `CAST_EVENT_BUFFER` - Event bus capacity per topic (default: 100)
    /// - `CAST_OUTBOX_CAPACITY` - Pending messages per connected user (default: 64)
    /// - `CAST_DICE_SEED` - Seed for deterministic dice (default: OS entropy)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(millis) = read_env::<u64>("CAST_TICK_MS") {
            config.tick_interval = (millis > 0).then(|| Duration::from_millis(millis));
        }

        if let Some(capacity) = read_env::<usize>("CAST_COMMAND_BUFFER") {
            config.command_buffer_size = capacity.max(1);
        }

        if let Some(capacity) = read_env::<usize>("CAST_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }

        if let Some(capacity) = read_env::<usize>("CAST_OUTBOX_CAPACITY") {
            config.outbox_capacity = capacity.max(1);
        }

        config.dice_seed = read_env::<u64>("CAST_DICE_SEED");

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.trim().parse().ok()
}
