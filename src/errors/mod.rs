//! Error types for the bridge.
//!
//! Every failure surfaces to the caller as a [`BridgeError`]. Transport-level
//! faults are described by [`TransportError`], and only the low-level
//! connection class of those is ever retried.

use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Unified error type for bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration error (missing client key, bad pool sizing, etc.)
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// The base URL or a request URI could not be parsed.
    #[error("Invalid url: {url} ({message})")]
    MalformedEndpoint {
        /// The offending URL.
        url: String,
        /// Parser message.
        message: String,
    },

    /// A transport failure that is not retried.
    #[error("Transport error: {source}")]
    Transport {
        /// Underlying transport failure.
        #[from]
        source: TransportError,
    },

    /// Transient connection failures persisted through every attempt.
    #[error("Tried to connect {attempts} times to: {url}")]
    RetriesExhausted {
        /// Endpoint the request was aimed at.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// The last transient failure.
        #[source]
        source: TransportError,
    },

    /// The service answered with a status other than 200.
    #[error("Exception from bridge: {status_line}{detail}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Full status line, e.g. `HTTP/1.1 500 Internal Server Error`.
        status_line: String,
        /// Either `, <embedded error>` or `\nbody:\n<raw body>`.
        detail: String,
    },

    /// Request encoding or response decoding failed.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },
}

impl BridgeError {
    /// Returns true if this error would have been retried by the executor.
    ///
    /// Terminal errors, including [`BridgeError::RetriesExhausted`], are never
    /// retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BridgeError::Transport { source } if source.is_transient())
    }

    /// Returns the HTTP status code for [`BridgeError::RequestFailed`].
    pub fn status(&self) -> Option<u16> {
        match self {
            BridgeError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        BridgeError::Configuration {
            message: message.into(),
        }
    }

    /// Creates a malformed endpoint error.
    pub fn malformed(url: impl Into<String>, message: impl ToString) -> Self {
        BridgeError::MalformedEndpoint {
            url: url.into(),
            message: message.to_string(),
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<rmp_serde::decode::Error> for BridgeError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        BridgeError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failed_display() {
        let error = BridgeError::RequestFailed {
            status: 500,
            status_line: "HTTP/1.1 500 Internal Server Error".to_string(),
            detail: ", invalid token".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Exception from bridge: HTTP/1.1 500 Internal Server Error, invalid token"
        );
        assert_eq!(error.status(), Some(500));
    }

    #[test]
    fn test_retries_exhausted_keeps_source() {
        use std::error::Error as _;

        let error = BridgeError::RetriesExhausted {
            url: "http://localhost/search".to_string(),
            attempts: 3,
            source: TransportError::Connection {
                message: "connection reset".to_string(),
            },
        };

        assert!(error.to_string().contains("3 times"));
        assert!(error
            .source()
            .is_some_and(|s| s.to_string().contains("connection reset")));
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_only_connection_failures_are_retryable() {
        let transient: BridgeError = TransportError::Connection {
            message: "refused".to_string(),
        }
        .into();
        assert!(transient.is_retryable());

        let dns: BridgeError = TransportError::Dns {
            message: "no such host".to_string(),
        }
        .into();
        assert!(!dns.is_retryable());

        assert!(!BridgeError::malformed("::", "relative URL without a base").is_retryable());
    }

    #[test]
    fn test_serde_error_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: BridgeError = err.into();
        assert!(matches!(error, BridgeError::Serialization { .. }));
    }
}
