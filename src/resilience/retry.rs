//! Retry policy implementation.
//!
//! A request moves through `Idle -> Dispatch -> (Retry -> Dispatch)* ->
//! Succeeded | Failed`. Whether a failed dispatch is retried is decided by
//! [`classify`] alone; the loop bound and the exhaustion check both read
//! [`RetryConfig::max_tries`].

use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::config::{DEFAULT_MAX_TRIES, DEFAULT_RETRY_TIMEOUT};
use crate::errors::{BridgeError, BridgeResult};
use crate::transport::TransportError;

/// Retry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included.
    pub max_tries: u32,
    /// Fixed delay before each retry.
    pub retry_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_tries: DEFAULT_MAX_TRIES,
            retry_timeout: DEFAULT_RETRY_TIMEOUT,
        }
    }
}

impl RetryConfig {
    /// Creates a new retry configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of attempts. Values below 1 are raised to 1.
    pub fn max_tries(mut self, tries: u32) -> Self {
        self.max_tries = tries.max(1);
        self
    }

    /// Sets the delay before each retry.
    pub fn retry_timeout(mut self, timeout: Duration) -> Self {
        self.retry_timeout = timeout;
        self
    }

    /// Creates a configuration with a single attempt.
    pub fn no_retries() -> Self {
        Self {
            max_tries: 1,
            ..Default::default()
        }
    }
}

/// Outcome of classifying a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after the configured delay.
    Retry,
    /// Give up immediately.
    Fail,
}

/// Decides whether a transport failure is worth another attempt.
///
/// Only low-level connection failures are; DNS, TLS, timeouts, malformed
/// requests and a closed pool are not.
pub fn classify(error: &TransportError) -> RetryDecision {
    if error.is_transient() {
        RetryDecision::Retry
    } else {
        RetryDecision::Fail
    }
}

/// Blocks the calling thread between attempts.
pub trait Sleeper: Send + Sync {
    /// Sleeps for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Sleeper backed by [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

enum AttemptState<T> {
    Idle,
    Dispatch { attempt: u32 },
    Retry { made: u32, error: TransportError },
    Succeeded(T),
    Failed(BridgeError),
}

/// Serial retry policy with a fixed delay.
pub struct RetryPolicy {
    config: RetryConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryPolicy {
    /// Creates a new retry policy that sleeps on the calling thread.
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// Replaces the sleeper.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> RetryConfig {
        self.config
    }

    /// Runs `dispatch` until it succeeds, fails terminally or runs out of
    /// attempts.
    ///
    /// `dispatch` receives the zero-based attempt number. Only a
    /// [`BridgeError::Transport`] whose source classifies as
    /// [`RetryDecision::Retry`] leads to another attempt; any other error is
    /// returned as is.
    #[instrument(skip(self, dispatch), fields(max_tries = self.config.max_tries))]
    pub fn execute<T, F>(&self, endpoint: &str, mut dispatch: F) -> BridgeResult<T>
    where
        F: FnMut(u32) -> BridgeResult<T>,
    {
        let max_tries = self.config.max_tries.max(1);
        let mut state = AttemptState::Idle;

        loop {
            state = match state {
                AttemptState::Idle => AttemptState::Dispatch { attempt: 0 },
                AttemptState::Dispatch { attempt } => match dispatch(attempt) {
                    Ok(value) => AttemptState::Succeeded(value),
                    Err(BridgeError::Transport { source }) => match classify(&source) {
                        RetryDecision::Retry => AttemptState::Retry {
                            made: attempt + 1,
                            error: source,
                        },
                        RetryDecision::Fail => {
                            AttemptState::Failed(BridgeError::Transport { source })
                        }
                    },
                    Err(err) => AttemptState::Failed(err),
                },
                AttemptState::Retry { made, error } if made >= max_tries => {
                    tracing::error!(attempts = made, error = %error, "Retries exhausted");
                    AttemptState::Failed(BridgeError::RetriesExhausted {
                        url: endpoint.to_string(),
                        attempts: made,
                        source: error,
                    })
                }
                AttemptState::Retry { made, error } => {
                    tracing::warn!(
                        attempt = made + 1,
                        max_tries,
                        delay_ms = self.config.retry_timeout.as_millis(),
                        error = %error,
                        "Connection failed, retrying"
                    );
                    self.sleeper.sleep(self.config.retry_timeout);
                    AttemptState::Dispatch { attempt: made }
                }
                AttemptState::Succeeded(value) => return Ok(value),
                AttemptState::Failed(err) => return Err(err),
            };
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("config", &self.config)
            .finish()
    }
}
