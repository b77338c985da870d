//! Client key handling.
//!
//! The bridge authenticates by embedding the client key from the command
//! center into every request body. The key is held as a secret and never
//! shows up in `Debug` output or logs.

use secrecy::{ExposeSecret, SecretString};

use crate::errors::{BridgeError, BridgeResult};

/// The client key used to authenticate against the bridge.
#[derive(Clone)]
pub struct ClientKey {
    key: SecretString,
}

impl ClientKey {
    /// Creates a client key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: SecretString::new(key.into()),
        }
    }

    /// Returns the key for embedding into a request body.
    pub fn expose(&self) -> &str {
        self.key.expose_secret()
    }

    /// Gets a hint of the key for debugging (last 4 characters).
    pub fn hint(&self) -> String {
        let key = self.key.expose_secret();
        let count = key.chars().count();
        if count > 4 {
            let tail: String = key.chars().skip(count - 4).collect();
            format!("...{tail}")
        } else {
            "****".to_string()
        }
    }

    /// Validates the key.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.key.expose_secret().trim().is_empty() {
            return Err(BridgeError::configuration("Client key cannot be empty"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientKey")
            .field("key", &"[REDACTED]")
            .field("hint", &self.hint())
            .finish()
    }
}
