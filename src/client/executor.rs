//! Request execution with bounded retries.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::headers::HeaderList;
use crate::errors::BridgeResult;
use crate::observability::{loggable_body, LogConfig};
use crate::resilience::{RetryConfig, RetryPolicy, Sleeper};
use crate::transport::{build_uri, HttpRequest, HttpResponse, HttpTransport};

const CONTENT_TYPE: &str = "Content-Type";
const APPLICATION_JSON: &str = "application/json";

/// POSTs request bodies to the bridge, retrying transient connection
/// failures.
///
/// Retry settings are read once at the start of each request, so changing
/// them never affects a request already in flight.
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    headers: Arc<HeaderList>,
    sleeper: Arc<dyn Sleeper>,
    max_tries: AtomicU32,
    retry_timeout_ms: AtomicU64,
    log_config: LogConfig,
}

impl RequestExecutor {
    /// Creates a new executor.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        headers: Arc<HeaderList>,
        sleeper: Arc<dyn Sleeper>,
        retry: RetryConfig,
        log_config: LogConfig,
    ) -> Self {
        let executor = Self {
            transport,
            headers,
            sleeper,
            max_tries: AtomicU32::new(1),
            retry_timeout_ms: AtomicU64::new(0),
            log_config,
        };
        executor.set_max_tries(retry.max_tries);
        executor.set_retry_timeout(retry.retry_timeout);
        executor
    }

    /// Current retry settings.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new()
            .max_tries(self.max_tries.load(Ordering::Relaxed))
            .retry_timeout(Duration::from_millis(
                self.retry_timeout_ms.load(Ordering::Relaxed),
            ))
    }

    /// Sets the maximum attempts per request. Values below 1 are raised to 1.
    pub fn set_max_tries(&self, max_tries: u32) {
        self.max_tries.store(max_tries.max(1), Ordering::Relaxed);
    }

    /// Sets the delay before each retry, at millisecond precision.
    pub fn set_retry_timeout(&self, timeout: Duration) {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.retry_timeout_ms.store(millis, Ordering::Relaxed);
    }

    /// Sends `body` to `endpoint`.
    ///
    /// Each attempt rebuilds the URI with its attempt number; the body and
    /// the header snapshot are shared by all attempts.
    pub fn post(
        &self,
        endpoint: &str,
        params: Option<&BTreeMap<String, String>>,
        body: &str,
    ) -> BridgeResult<HttpResponse> {
        let policy = RetryPolicy::new(self.retry_config()).with_sleeper(Arc::clone(&self.sleeper));
        let headers = self.headers.snapshot();

        if self.log_config.log_request_bodies {
            tracing::trace!(
                endpoint,
                body = %loggable_body(body, &self.log_config),
                "Request body"
            );
        }

        policy.execute(endpoint, |attempt| {
            let url = build_uri(endpoint, params, attempt).map_err(|err| {
                tracing::error!(endpoint, error = %err, "Invalid request, failing");
                err
            })?;

            let request = HttpRequest::post(url)
                .with_header(CONTENT_TYPE, APPLICATION_JSON)
                .with_headers(headers.iter())
                .with_body(body.as_bytes());

            tracing::debug!(endpoint, attempt, "Posting to bridge");
            Ok(self.transport.send(request)?)
        })
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("retry", &self.retry_config())
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}
