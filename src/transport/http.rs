//! HTTP transport implementation.

use reqwest::blocking::{Client, ClientBuilder};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::io::{self, Read};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::instrument;
use url::Url;

use super::{ConnectionPool, PoolPermit, TransportError};
use crate::config::ConnectionConfig;

/// A single request header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Header name.
    pub name: String,
    /// Header value.
    pub value: String,
}

impl Header {
    /// Creates a new header.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// HTTP POST request representation.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Fully built request URI.
    pub url: Url,
    /// Request headers, in send order.
    pub headers: Vec<Header>,
    /// Request body.
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Creates a new POST request.
    pub fn post(url: Url) -> Self {
        Self {
            url,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(Header::new(name, value));
        self
    }

    /// Adds several headers.
    pub fn with_headers<'a>(mut self, headers: impl IntoIterator<Item = &'a Header>) -> Self {
        self.headers.extend(headers.into_iter().cloned());
        self
    }

    /// Looks up a header value by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.is_named(name))
            .map(|h| h.value.as_str())
    }
}

/// A response body stream.
///
/// Bodies produced by [`HttpTransportImpl`] hold their pooled connection
/// until dropped.
pub struct ResponseBody(Box<dyn Read + Send>);

impl ResponseBody {
    /// Wraps a reader.
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self(Box::new(reader))
    }

    /// Creates an in-memory body.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(io::Cursor::new(bytes.into()))
    }

    /// Reads the remaining body into memory and releases the stream.
    pub fn drain(mut self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.0.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

impl Read for ResponseBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseBody").finish_non_exhaustive()
    }
}

/// HTTP response representation.
#[derive(Debug)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Status line, e.g. `HTTP/1.1 200 OK`.
    pub status_line: String,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Unread response body.
    pub body: ResponseBody,
}

impl HttpResponse {
    /// Returns true if the status is exactly 200.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// HTTP transport trait.
pub trait HttpTransport: Send + Sync {
    /// Sends a single POST attempt.
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Releases pooled connections. Must be safe to call more than once.
    fn shutdown(&self) {}
}

struct PooledBody {
    response: reqwest::blocking::Response,
    _permit: PoolPermit,
}

impl Read for PooledBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.response.read(buf)
    }
}

/// HTTP transport implementation using a pooled blocking `reqwest` client.
pub struct HttpTransportImpl {
    client: RwLock<Option<Client>>,
    pool: Arc<ConnectionPool>,
    connection_request_timeout: Option<Duration>,
    socket_timeout: Duration,
}

impl HttpTransportImpl {
    /// Creates a new HTTP transport sized by `config`.
    pub fn new(config: &ConnectionConfig) -> Result<Self, TransportError> {
        let client = ClientBuilder::new()
            .connect_timeout(config.connect_timeout)
            .timeout(config.socket_timeout)
            .pool_max_idle_per_host(config.max_connections_per_route)
            .tcp_keepalive(Duration::from_secs(60))
            .gzip(config.compress_response)
            .build()
            .map_err(|e| TransportError::InvalidRequest {
                message: e.to_string(),
            })?;

        Ok(Self {
            client: RwLock::new(Some(client)),
            pool: ConnectionPool::new(config.max_connections, config.max_connections_per_route),
            connection_request_timeout: config.connection_request_timeout,
            socket_timeout: config.socket_timeout,
        })
    }

    /// Returns the connection pool.
    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    fn client(&self) -> Result<Client, TransportError> {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(TransportError::Closed)
    }

    fn map_error(&self, err: &reqwest::Error) -> TransportError {
        classify_reqwest_error(err, self.socket_timeout)
    }
}

impl HttpTransport for HttpTransportImpl {
    #[instrument(skip(self, request), fields(url = %request.url))]
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let client = self.client()?;
        let route = request.url.origin().ascii_serialization();
        let permit = self.pool.acquire(&route, self.connection_request_timeout)?;

        let mut req_builder = client.post(request.url);
        for header in &request.headers {
            req_builder = req_builder.header(header.name.as_str(), header.value.as_str());
        }
        req_builder = req_builder.body(request.body);

        let response = req_builder.send().map_err(|e| self.map_error(&e))?;

        let status = response.status();
        let status_line = format!("{:?} {}", response.version(), status);
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();

        Ok(HttpResponse {
            status: status.as_u16(),
            status_line,
            headers,
            body: ResponseBody::new(PooledBody {
                response,
                _permit: permit,
            }),
        })
    }

    fn shutdown(&self) {
        let client = self
            .client
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let was_open = self.pool.close();
        if client.is_some() || was_open {
            tracing::debug!("Connection pool shut down");
        }
    }
}

impl std::fmt::Debug for HttpTransportImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransportImpl")
            .field("pool", &self.pool)
            .finish()
    }
}

/// Returns true for socket-level I/O failures worth another attempt.
pub(crate) fn is_transient_io(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}

/// What a failed reqwest call reports about itself, minus its own display
/// text. The top-level message embeds the request URL, so only the causes
/// are matched against.
#[derive(Debug, Default)]
struct FailureTraits<'a> {
    builder: bool,
    timeout: bool,
    connect: bool,
    request: bool,
    io_kind: Option<io::ErrorKind>,
    causes: &'a str,
}

fn classify_reqwest_error(err: &reqwest::Error, timeout: Duration) -> TransportError {
    let causes = err.source().map(error_chain).unwrap_or_default();
    let traits = FailureTraits {
        builder: err.is_builder(),
        timeout: err.is_timeout(),
        connect: err.is_connect(),
        request: err.is_request(),
        io_kind: io_error_kind(err),
        causes: &causes,
    };
    classify_failure(&traits, error_chain(err), timeout)
}

fn classify_failure(traits: &FailureTraits<'_>, message: String, timeout: Duration) -> TransportError {
    if traits.builder {
        return TransportError::InvalidRequest { message };
    }
    if traits.timeout {
        return TransportError::Timeout { timeout };
    }
    if traits.io_kind.is_some_and(is_transient_io) {
        return TransportError::Connection { message };
    }

    let causes = traits.causes.to_ascii_lowercase();
    if causes.contains("dns error") || causes.contains("failed to lookup address") {
        return TransportError::Dns { message };
    }
    if causes.contains("tls") || causes.contains("certificate") || causes.contains("ssl") {
        return TransportError::Tls { message };
    }
    if traits.connect || (traits.request && causes.contains("connection")) {
        return TransportError::Connection { message };
    }
    if traits.request {
        return TransportError::InvalidRequest { message };
    }
    TransportError::InvalidResponse { message }
}

fn io_error_kind(err: &(dyn StdError + 'static)) -> Option<io::ErrorKind> {
    let mut source = Some(err);
    while let Some(current) = source {
        if let Some(io_err) = current.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        source = current.source();
    }
    None
}

/// Joins an error with its causes, skipping a cause whose text is already
/// part of the message.
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(current) = source {
        let text = current.to_string();
        if !text.is_empty() && !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = current.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_io_kinds() {
        assert!(is_transient_io(io::ErrorKind::ConnectionRefused));
        assert!(is_transient_io(io::ErrorKind::ConnectionReset));
        assert!(is_transient_io(io::ErrorKind::BrokenPipe));
        assert!(!is_transient_io(io::ErrorKind::TimedOut));
        assert!(!is_transient_io(io::ErrorKind::InvalidData));
        assert!(!is_transient_io(io::ErrorKind::PermissionDenied));
    }

    #[test]
    fn test_io_error_kind_walks_sources() {
        #[derive(Debug)]
        struct Wrapper(io::Error);

        impl std::fmt::Display for Wrapper {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "wrapped")
            }
        }

        impl StdError for Wrapper {
            fn source(&self) -> Option<&(dyn StdError + 'static)> {
                Some(&self.0)
            }
        }

        let err = Wrapper(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"));
        assert_eq!(io_error_kind(&err), Some(io::ErrorKind::ConnectionReset));
        assert_eq!(error_chain(&err), "wrapped: reset by peer");
    }

    #[test]
    fn test_error_chain_skips_repeated_causes() {
        #[derive(Debug)]
        struct Echo(io::Error);

        impl std::fmt::Display for Echo {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "error sending request: {}", self.0)
            }
        }

        impl StdError for Echo {
            fn source(&self) -> Option<&(dyn StdError + 'static)> {
                Some(&self.0)
            }
        }

        let err = Echo(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"));
        assert_eq!(error_chain(&err), "error sending request: connection refused");
    }

    #[test]
    fn test_refused_connection_ignores_url_text() {
        let traits = FailureTraits {
            connect: true,
            request: true,
            io_kind: Some(io::ErrorKind::ConnectionRefused),
            causes: "tcp connect error: Connection refused (os error 111)",
            ..FailureTraits::default()
        };
        let message = "error sending request for url (http://127.0.0.1:1/search?feature=tls&retry=0)";

        let err = classify_failure(&traits, message.to_string(), Duration::from_secs(1));
        assert!(matches!(err, TransportError::Connection { .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn test_connect_failure_without_io_kind_is_transient() {
        let traits = FailureTraits {
            connect: true,
            causes: "connection closed before message completed",
            ..FailureTraits::default()
        };

        let err = classify_failure(&traits, "ssl-proxy.local".to_string(), Duration::from_secs(1));
        assert!(matches!(err, TransportError::Connection { .. }));
    }

    #[test]
    fn test_dns_and_tls_causes_are_terminal() {
        let dns = FailureTraits {
            connect: true,
            causes: "dns error: failed to lookup address information",
            ..FailureTraits::default()
        };
        let err = classify_failure(&dns, String::new(), Duration::from_secs(1));
        assert!(matches!(err, TransportError::Dns { .. }));
        assert!(!err.is_transient());

        let tls = FailureTraits {
            connect: true,
            io_kind: Some(io::ErrorKind::InvalidData),
            causes: "invalid peer certificate: UnknownIssuer",
            ..FailureTraits::default()
        };
        let err = classify_failure(&tls, String::new(), Duration::from_secs(1));
        assert!(matches!(err, TransportError::Tls { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_builder_and_timeout_take_precedence() {
        let builder = FailureTraits {
            builder: true,
            io_kind: Some(io::ErrorKind::ConnectionReset),
            ..FailureTraits::default()
        };
        let err = classify_failure(&builder, "bad header".to_string(), Duration::from_secs(1));
        assert!(matches!(err, TransportError::InvalidRequest { .. }));

        let timed_out = FailureTraits {
            timeout: true,
            request: true,
            ..FailureTraits::default()
        };
        let err = classify_failure(&timed_out, String::new(), Duration::from_secs(2));
        assert!(matches!(
            err,
            TransportError::Timeout { timeout } if timeout == Duration::from_secs(2)
        ));
    }

    #[test]
    fn test_request_header_lookup_ignores_case() {
        let url = Url::parse("http://localhost/search").unwrap();
        let request = HttpRequest::post(url)
            .with_header("Content-Type", "application/json")
            .with_body("{}");

        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.body, b"{}".to_vec());
    }

    #[test]
    fn test_response_body_drain() {
        let body = ResponseBody::from_bytes("hello");
        assert_eq!(body.drain().unwrap(), b"hello".to_vec());
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let transport = HttpTransportImpl::new(&ConnectionConfig::default()).unwrap();
        transport.shutdown();
        transport.shutdown();

        assert!(transport.pool().is_closed());
        let request = HttpRequest::post(Url::parse("http://localhost/search").unwrap());
        assert!(matches!(transport.send(request), Err(TransportError::Closed)));
    }
}
