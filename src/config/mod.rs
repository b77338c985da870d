//! Configuration module for the bridge.
//!
//! Provides the client key, base URL, connection pool sizing, per-attempt
//! timeouts and retry settings.

use std::time::Duration;

use url::Url;

use crate::auth::ClientKey;
use crate::errors::{BridgeError, BridgeResult};
use crate::transport::Header;

/// Default delay applied before each retry (80 milliseconds).
pub const DEFAULT_RETRY_TIMEOUT: Duration = Duration::from_millis(80);

/// Default maximum number of attempts per request.
pub const DEFAULT_MAX_TRIES: u32 = 3;

/// Default maximum number of pooled connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 200;

/// Default maximum number of pooled connections per route.
pub const DEFAULT_MAX_CONNECTIONS_PER_ROUTE: usize = 100;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default socket (read) timeout.
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_secs(30);

const CLOUD_HOST: &str = "groupbycloud.com";
const CLOUD_PORT: u16 = 443;
const CLOUD_PATH: &str = "/api/v1";

/// Builds the base URL of the cloud-hosted bridge for a customer subdomain.
pub fn cloud_base_url(customer_id: &str) -> String {
    format!("https://{customer_id}.{CLOUD_HOST}:{CLOUD_PORT}{CLOUD_PATH}")
}

/// Checks that `base_url` is an absolute http(s) URL.
pub fn validate_base_url(base_url: &str) -> BridgeResult<()> {
    let url = Url::parse(base_url).map_err(|e| BridgeError::malformed(base_url, e))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(BridgeError::malformed(
            base_url,
            format!("unsupported scheme '{other}'"),
        )),
    }
}

/// Settings for the pooled HTTP client.
///
/// Timeouts apply per attempt, not per logical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Maximum connections across all routes.
    pub max_connections: usize,
    /// Maximum connections to a single route.
    pub max_connections_per_route: usize,
    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,
    /// How long to wait for a free pooled connection; `None` waits forever.
    pub connection_request_timeout: Option<Duration>,
    /// Timeout for the response of a single attempt.
    pub socket_timeout: Duration,
    /// Ask for compressed responses.
    pub compress_response: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_connections_per_route: DEFAULT_MAX_CONNECTIONS_PER_ROUTE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            connection_request_timeout: None,
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
            compress_response: true,
        }
    }
}

impl ConnectionConfig {
    /// Creates the default connection configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the maximum number of connections per route.
    pub fn max_connections_per_route(mut self, max: usize) -> Self {
        self.max_connections_per_route = max;
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the pooled connection wait timeout.
    pub fn connection_request_timeout(mut self, timeout: Duration) -> Self {
        self.connection_request_timeout = Some(timeout);
        self
    }

    /// Sets the socket timeout.
    pub fn socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = timeout;
        self
    }

    /// Enables or disables response compression.
    pub fn compress_response(mut self, compress: bool) -> Self {
        self.compress_response = compress;
        self
    }

    fn validate(&self) -> BridgeResult<()> {
        if self.max_connections == 0 || self.max_connections_per_route == 0 {
            return Err(BridgeError::configuration(
                "Connection pool limits must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Configuration for a bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Client key from the command center.
    pub(crate) client_key: ClientKey,
    /// Base URL the bridge is serving on.
    pub base_url: String,
    /// HTTP client settings.
    pub connection: ConnectionConfig,
    /// Delay before each retry.
    pub retry_timeout: Duration,
    /// Maximum attempts per request.
    pub max_tries: u32,
    /// Headers sent with every request.
    pub headers: Vec<Header>,
}

impl BridgeConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::new()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `GROUPBY_CLIENT_KEY` (required): client key
    /// - `GROUPBY_BASE_URL` or `GROUPBY_CUSTOMER_ID` (one required): explicit
    ///   base URL, or the cloud subdomain to derive it from
    /// - `GROUPBY_MAX_TRIES` (optional): maximum attempts per request
    /// - `GROUPBY_RETRY_TIMEOUT_MS` (optional): delay before each retry
    pub fn from_env() -> BridgeResult<Self> {
        let client_key = std::env::var("GROUPBY_CLIENT_KEY").map_err(|_| {
            BridgeError::configuration("GROUPBY_CLIENT_KEY environment variable not set")
        })?;

        let base_url = match std::env::var("GROUPBY_BASE_URL") {
            Ok(url) => url,
            Err(_) => std::env::var("GROUPBY_CUSTOMER_ID")
                .map(|id| cloud_base_url(&id))
                .map_err(|_| {
                    BridgeError::configuration(
                        "Either GROUPBY_BASE_URL or GROUPBY_CUSTOMER_ID must be set",
                    )
                })?,
        };

        let mut builder = BridgeConfigBuilder::new()
            .client_key(client_key)
            .base_url(base_url);

        if let Ok(tries) = std::env::var("GROUPBY_MAX_TRIES") {
            if let Ok(tries) = tries.parse::<u32>() {
                builder = builder.max_tries(tries);
            }
        }

        if let Ok(timeout) = std::env::var("GROUPBY_RETRY_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse::<u64>() {
                builder = builder.retry_timeout(Duration::from_millis(ms));
            }
        }

        builder.build()
    }

    /// Returns the client key.
    pub fn client_key(&self) -> &ClientKey {
        &self.client_key
    }
}

/// Builder for [`BridgeConfig`].
#[derive(Debug, Default)]
pub struct BridgeConfigBuilder {
    client_key: Option<ClientKey>,
    base_url: Option<String>,
    connection: Option<ConnectionConfig>,
    retry_timeout: Option<Duration>,
    max_tries: Option<u32>,
    headers: Vec<Header>,
}

impl BridgeConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the client key.
    pub fn client_key(mut self, key: impl Into<String>) -> Self {
        self.client_key = Some(ClientKey::new(key));
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Derives the base URL from a cloud customer ID.
    pub fn customer_id(mut self, customer_id: &str) -> Self {
        self.base_url = Some(cloud_base_url(customer_id));
        self
    }

    /// Sets the HTTP client settings.
    pub fn connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Sets the delay before each retry.
    pub fn retry_timeout(mut self, timeout: Duration) -> Self {
        self.retry_timeout = Some(timeout);
        self
    }

    /// Sets the maximum attempts per request.
    pub fn max_tries(mut self, tries: u32) -> Self {
        self.max_tries = Some(tries);
        self
    }

    /// Adds a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(Header::new(name, value));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> BridgeResult<BridgeConfig> {
        let client_key = self
            .client_key
            .ok_or_else(|| BridgeError::configuration("Client key is required"))?;
        client_key.validate()?;

        let base_url = self
            .base_url
            .ok_or_else(|| BridgeError::configuration("Base URL is required"))?;
        validate_base_url(&base_url)?;

        let connection = self.connection.unwrap_or_default();
        connection.validate()?;

        let max_tries = self.max_tries.unwrap_or(DEFAULT_MAX_TRIES);
        if max_tries == 0 {
            return Err(BridgeError::configuration("Max tries must be at least 1"));
        }

        Ok(BridgeConfig {
            client_key,
            base_url,
            connection,
            retry_timeout: self.retry_timeout.unwrap_or(DEFAULT_RETRY_TIMEOUT),
            max_tries,
            headers: self.headers,
        })
    }
}
