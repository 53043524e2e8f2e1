//! Tunables of the chat core.

use std::time::Duration;

use thiserror::Error;

/// Title given to rooms the room directory does not know
pub const DEFAULT_TITLE: &str = "Chat";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Chat core configuration.
///
/// `inbound_queue_capacity` is the main throttle of the system: when a room's
/// queue is full, the inbound loops feeding it block (and stop reading their
/// sockets) until the broadcaster catches up. Nothing is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Capacity of each session's inbound queue
    pub inbound_queue_capacity: usize,
    /// Capacity of each connection's outbound queue
    pub outbound_queue_capacity: usize,
    /// How long a connection may stay silent (no pong) before it is dropped
    pub read_timeout: Duration,
    /// Upper bound for a single socket write
    pub write_timeout: Duration,
    /// Largest accepted inbound frame, in bytes
    pub max_message_size: usize,
    /// Title used when the room directory has none
    pub default_title: String,
    /// How long shutdown waits for sessions and connections to wind down
    pub shutdown_timeout: Duration,
}

impl ChatConfig {
    /// Keepalive period: nine tenths of the read timeout, so a probe always
    /// lands inside the peer's tolerance window.
    pub fn ping_period(&self) -> Duration {
        self.read_timeout * 9 / 10
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inbound_queue_capacity == 0 {
            return Err(ConfigError::Zero("inbound queue capacity"));
        }
        if self.outbound_queue_capacity == 0 {
            return Err(ConfigError::Zero("outbound queue capacity"));
        }
        if self.read_timeout.is_zero() {
            return Err(ConfigError::Zero("read timeout"));
        }
        if self.ping_period().is_zero() {
            return Err(ConfigError::Zero("ping period"));
        }
        if self.write_timeout.is_zero() {
            return Err(ConfigError::Zero("write timeout"));
        }
        if self.max_message_size == 0 {
            return Err(ConfigError::Zero("max message size"));
        }
        Ok(())
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            inbound_queue_capacity: 100,
            outbound_queue_capacity: 256,
            read_timeout: Duration::from_secs(60),
            write_timeout: Duration::from_secs(10),
            max_message_size: 10_000,
            default_title: DEFAULT_TITLE.to_string(),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_period_is_nine_tenths_of_read_timeout() {
        // テスト項目: ping 間隔は読み取りタイムアウトの 9/10 になる
        // given (前提条件):
        let config = ChatConfig::default();

        // when (操作):
        let period = config.ping_period();

        // then (期待する結果):
        assert_eq!(period, Duration::from_secs(54));
        assert!(period < config.read_timeout);
    }

    #[test]
    fn test_default_config_is_valid() {
        // テスト項目: デフォルト設定は検証を通る
        // given (前提条件):
        let config = ChatConfig::default();

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_read_timeout_too_short_for_ping_is_rejected() {
        // テスト項目: ping 間隔が 0 になるほど短い読み取りタイムアウトは設定エラーになる
        // given (前提条件):
        let config = ChatConfig {
            read_timeout: Duration::from_nanos(1),
            ..ChatConfig::default()
        };

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert_eq!(config.ping_period(), Duration::ZERO);
        assert_eq!(result, Err(ConfigError::Zero("ping period")));
    }

    #[test]
    fn test_zero_queue_capacity_is_rejected() {
        // テスト項目: キュー容量 0 は設定エラーになる
        // given (前提条件):
        let config = ChatConfig {
            inbound_queue_capacity: 0,
            ..ChatConfig::default()
        };

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert_eq!(result, Err(ConfigError::Zero("inbound queue capacity")));
    }
}
