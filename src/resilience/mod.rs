//! Resilience layer for the bridge.
//!
//! The bridge retries exactly one failure class, low-level connection
//! failures, a bounded number of times with a fixed delay.

mod retry;

pub use retry::{
    classify, RetryConfig, RetryDecision, RetryPolicy, Sleeper, ThreadSleeper,
};
