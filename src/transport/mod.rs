//! HTTP transport layer for the bridge.
//!
//! Provides the transport abstraction, the pooled `reqwest` implementation,
//! the connection pool that bounds it and the request URI builder.

mod http;
mod pool;
mod uri;

pub use http::{
    Header, HttpRequest, HttpResponse, HttpTransport, HttpTransportImpl, ResponseBody,
};
pub use pool::{ConnectionPool, PoolPermit};
pub use uri::{build_uri, RETRY_PARAM};

use std::time::Duration;

/// Transport error types.
///
/// Only [`TransportError::Connection`] is transient; every other variant is
/// terminal for the request that produced it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Low-level connection or socket failure during send or receive.
    #[error("Connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// Connect or read timed out.
    #[error("Timeout after {timeout:?}")]
    Timeout {
        /// Timeout duration.
        timeout: Duration,
    },

    /// Host name resolution failed.
    #[error("DNS error: {message}")]
    Dns {
        /// Error message.
        message: String,
    },

    /// TLS error.
    #[error("TLS error: {message}")]
    Tls {
        /// Error message.
        message: String,
    },

    /// The request could not be built or sent as given.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Error message.
        message: String,
    },

    /// Invalid response.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Error message.
        message: String,
    },

    /// No pooled connection became free within the connection-request timeout.
    #[error("Timed out after {timeout:?} waiting for a pooled connection")]
    PoolTimeout {
        /// Time spent waiting.
        timeout: Duration,
    },

    /// The connection pool has been shut down.
    #[error("Connection pool is shut down")]
    Closed,
}

impl TransportError {
    /// Returns true for the low-level connection failures that are retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Connection { .. })
    }
}
