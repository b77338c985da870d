//! GroupBy bridge client.
//!
//! Provides the [`Bridge`] facade that posts queries to a bridge and decodes
//! its answers, plus the [`CloudBridge`] variant for cloud-hosted customers.

mod cloud;
mod executor;
mod headers;
mod response;

pub use cloud::{CloudBridge, SKIP_CACHING_HEADER};
pub use executor::RequestExecutor;
pub use headers::HeaderList;
pub use response::{decode, error_status, translate};

use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::auth::ClientKey;
use crate::config::{BridgeConfig, BridgeConfigBuilder, ConnectionConfig};
use crate::errors::BridgeResult;
use crate::observability::LogConfig;
use crate::resilience::{RetryConfig, Sleeper, ThreadSleeper};
use crate::transport::{Header, HttpTransport, HttpTransportImpl, ResponseBody};
use crate::types::query::BridgeQuery;
use crate::types::results::{ErrorCarrier, RefinementsResult, Results};

const SEARCH: &str = "/search";
const REFINEMENTS: &str = "/refinements";
const REFINEMENT_SEARCH: &str = "/refinement";
const CLUSTER: &str = "/cluster";

/// A client for a GroupBy bridge.
///
/// The bridge owns a pool of connections. It is `Send + Sync`; share one
/// instance between threads and call [`Bridge::shutdown`] when done.
///
/// # Example
///
/// ```rust,no_run
/// use groupby_bridge::{Bridge, Query};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let bridge = Bridge::new("my-client-key", "http://localhost:8080/api/v1")?;
///
///     let results = bridge.search(&Query::new().query("shoes").page_size(20))?;
///     println!("{} records", results.total_record_count);
///
///     bridge.shutdown();
///     Ok(())
/// }
/// ```
pub struct Bridge {
    client_key: ClientKey,
    base_url: String,
    search_url: String,
    refinements_url: String,
    refinement_search_url: String,
    cluster_url: String,
    headers: Arc<HeaderList>,
    executor: RequestExecutor,
    transport: Arc<dyn HttpTransport>,
}

impl Bridge {
    /// Creates a new bridge builder.
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::new()
    }

    /// Creates a bridge with default connection settings.
    pub fn new(client_key: impl Into<String>, base_url: impl Into<String>) -> BridgeResult<Self> {
        BridgeBuilder::new()
            .client_key(client_key)
            .base_url(base_url)
            .build()
    }

    /// Creates a bridge from a configuration.
    pub fn from_config(config: BridgeConfig) -> BridgeResult<Self> {
        BridgeBuilder::from_config(config).build()
    }

    /// Creates a bridge from environment variables.
    ///
    /// See [`BridgeConfig::from_env`] for the variables read.
    pub fn from_env() -> BridgeResult<Self> {
        Self::from_config(BridgeConfig::from_env()?)
    }

    /// Runs a search.
    #[instrument(skip(self, query), fields(endpoint = %self.search_url))]
    pub fn search<Q: BridgeQuery + ?Sized>(&self, query: &Q) -> BridgeResult<Results> {
        let body = query.bridge_json(self.client_key.expose())?;
        let binary = query.returns_binary();
        let stream = self.fire_request_as::<Results>(
            &self.search_url,
            Some(query.url_params()),
            &body,
            binary,
        )?;
        decode(stream, binary)
    }

    /// Fetches every refinement of `navigation_name` for a query.
    ///
    /// The service returns at most
    /// [`MAX_REFINEMENTS`](crate::types::results::MAX_REFINEMENTS) refinements.
    #[instrument(skip(self, query), fields(endpoint = %self.refinements_url))]
    pub fn refinements<Q: BridgeQuery + ?Sized>(
        &self,
        query: &Q,
        navigation_name: &str,
    ) -> BridgeResult<RefinementsResult> {
        let body = query.bridge_refinements_json(self.client_key.expose(), navigation_name)?;
        let binary = query.returns_binary();
        let stream = self.fire_request_as::<RefinementsResult>(
            &self.refinements_url,
            Some(query.url_params()),
            &body,
            binary,
        )?;
        decode(stream, binary)
    }

    /// Fetches cluster information.
    #[instrument(skip(self), fields(endpoint = %self.cluster_url))]
    pub fn cluster(&self) -> BridgeResult<serde_json::Value> {
        let body = serde_json::to_string(&serde_json::json!({
            "clientKey": self.client_key.expose(),
        }))?;
        let stream =
            self.fire_request_as::<serde_json::Value>(&self.cluster_url, None, &body, false)?;
        decode(stream, false)
    }

    /// Posts `body` to `url` and returns the unread body of a 200 response.
    ///
    /// Error bodies are decoded as JSON, or MessagePack when `binary` is set,
    /// to look for an `errors` field. The returned body keeps its pooled
    /// connection until dropped.
    #[instrument(skip(self, params, body))]
    pub fn fire_request(
        &self,
        url: &str,
        params: Option<&BTreeMap<String, String>>,
        body: &str,
        binary: bool,
    ) -> BridgeResult<ResponseBody> {
        self.fire_request_as::<serde_json::Value>(url, params, body, binary)
    }

    fn fire_request_as<T>(
        &self,
        url: &str,
        params: Option<&BTreeMap<String, String>>,
        body: &str,
        binary: bool,
    ) -> BridgeResult<ResponseBody>
    where
        T: DeserializeOwned + ErrorCarrier,
    {
        let response = self.executor.post(url, params, body)?;
        translate::<T>(response, binary)
    }

    /// Closes the connection pool. Later requests fail; calling this again
    /// does nothing.
    pub fn shutdown(&self) {
        tracing::debug!(base_url = %self.base_url, "Shutting down bridge");
        self.transport.shutdown();
    }

    /// Sets the delay before each retry of later requests.
    pub fn set_retry_timeout(&self, timeout: Duration) {
        self.executor.set_retry_timeout(timeout);
    }

    /// Delay before each retry.
    pub fn retry_timeout(&self) -> Duration {
        self.executor.retry_config().retry_timeout
    }

    /// Sets the maximum attempts of later requests. Values below 1 are
    /// raised to 1.
    pub fn set_max_tries(&self, max_tries: u32) {
        self.executor.set_max_tries(max_tries);
    }

    /// Maximum attempts per request.
    pub fn max_tries(&self) -> u32 {
        self.executor.retry_config().max_tries
    }

    /// Headers sent with every request.
    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    /// Replaces the headers sent with every request.
    pub fn set_headers(&self, headers: Vec<Header>) {
        self.headers.replace(headers);
    }

    /// The base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The search endpoint.
    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    /// The refinements endpoint.
    pub fn refinements_url(&self) -> &str {
        &self.refinements_url
    }

    /// The refinement search endpoint.
    pub fn refinement_search_url(&self) -> &str {
        &self.refinement_search_url
    }

    /// The cluster endpoint.
    pub fn cluster_url(&self) -> &str {
        &self.cluster_url
    }

    /// The client key.
    pub fn client_key(&self) -> &ClientKey {
        &self.client_key
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("base_url", &self.base_url)
            .field("client_key", &self.client_key)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Bridge`].
pub struct BridgeBuilder {
    config_builder: BridgeConfigBuilder,
    transport: Option<Arc<dyn HttpTransport>>,
    sleeper: Option<Arc<dyn Sleeper>>,
    log_config: LogConfig,
}

impl BridgeBuilder {
    /// Creates a new bridge builder.
    pub fn new() -> Self {
        Self {
            config_builder: BridgeConfigBuilder::new(),
            transport: None,
            sleeper: None,
            log_config: LogConfig::default(),
        }
    }

    /// Creates a builder from an existing configuration.
    pub fn from_config(config: BridgeConfig) -> Self {
        let mut config_builder = BridgeConfigBuilder::new()
            .client_key(config.client_key.expose())
            .base_url(config.base_url)
            .connection(config.connection)
            .retry_timeout(config.retry_timeout)
            .max_tries(config.max_tries);
        for header in config.headers {
            config_builder = config_builder.header(header.name, header.value);
        }

        Self {
            config_builder,
            ..Self::new()
        }
    }

    /// Sets the client key.
    pub fn client_key(mut self, client_key: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.client_key(client_key);
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.base_url(base_url);
        self
    }

    /// Derives the base URL from a cloud customer ID.
    pub fn customer_id(mut self, customer_id: &str) -> Self {
        self.config_builder = self.config_builder.customer_id(customer_id);
        self
    }

    /// Sets the HTTP client settings.
    pub fn connection(mut self, connection: ConnectionConfig) -> Self {
        self.config_builder = self.config_builder.connection(connection);
        self
    }

    /// Sets the delay before each retry.
    pub fn retry_timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.retry_timeout(timeout);
        self
    }

    /// Sets the maximum attempts per request.
    pub fn max_tries(mut self, tries: u32) -> Self {
        self.config_builder = self.config_builder.max_tries(tries);
        self
    }

    /// Adds a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.header(name, value);
        self
    }

    /// Sets a custom transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the sleeper used between retries.
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Sets the logging configuration.
    pub fn log_config(mut self, config: LogConfig) -> Self {
        self.log_config = config;
        self
    }

    /// Builds the bridge, validating the base URL and opening the pool.
    pub fn build(self) -> BridgeResult<Bridge> {
        let config = self.config_builder.build()?;

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransportImpl::new(&config.connection)?),
        };
        let sleeper = self
            .sleeper
            .unwrap_or_else(|| Arc::new(ThreadSleeper) as Arc<dyn Sleeper>);

        let headers = Arc::new(HeaderList::new(config.headers));
        let retry = RetryConfig::new()
            .max_tries(config.max_tries)
            .retry_timeout(config.retry_timeout);
        let executor = RequestExecutor::new(
            Arc::clone(&transport),
            Arc::clone(&headers),
            sleeper,
            retry,
            self.log_config,
        );

        let base_url = config.base_url;
        let search_url = format!("{base_url}{SEARCH}");
        let refinements_url = format!("{search_url}{REFINEMENTS}");
        let refinement_search_url = format!("{base_url}{REFINEMENT_SEARCH}");
        let cluster_url = format!("{base_url}{CLUSTER}");

        tracing::debug!(
            base_url = %base_url,
            client_key = %config.client_key.hint(),
            "Bridge created"
        );

        Ok(Bridge {
            client_key: config.client_key,
            base_url,
            search_url,
            refinements_url,
            refinement_search_url,
            cluster_url,
            headers,
            executor,
            transport,
        })
    }
}

impl Default for BridgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BridgeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeBuilder")
            .field("config_builder", &self.config_builder)
            .field("custom_transport", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}
