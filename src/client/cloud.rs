//! Bridge bound to a cloud-hosted customer, with response caching control.

use std::ops::Deref;

use super::{Bridge, BridgeBuilder};
use crate::config::ConnectionConfig;
use crate::errors::BridgeResult;
use crate::transport::Header;

/// Header that asks the cloud service to bypass its response cache.
pub const SKIP_CACHING_HEADER: &str = "Skip-Caching";

/// A [`Bridge`] for a customer hosted on the GroupBy cloud.
///
/// The base URL is derived from the customer ID as
/// `https://{customer_id}.groupbycloud.com:443/api/v1`.
#[derive(Debug)]
pub struct CloudBridge {
    bridge: Bridge,
}

impl CloudBridge {
    /// Creates a cloud bridge with default connection settings.
    pub fn new(client_key: impl Into<String>, customer_id: &str) -> BridgeResult<Self> {
        Self::build(Bridge::builder().client_key(client_key), customer_id)
    }

    /// Creates a cloud bridge with custom connection settings.
    pub fn with_connection(
        client_key: impl Into<String>,
        customer_id: &str,
        connection: ConnectionConfig,
    ) -> BridgeResult<Self> {
        Self::build(
            Bridge::builder()
                .client_key(client_key)
                .connection(connection),
            customer_id,
        )
    }

    /// Builds a cloud bridge from a builder, overriding its base URL.
    pub fn build(builder: BridgeBuilder, customer_id: &str) -> BridgeResult<Self> {
        Ok(Self {
            bridge: builder.customer_id(customer_id).build()?,
        })
    }

    /// Turns the service's response cache on or off for later requests.
    pub fn set_caching_enabled(&self, enabled: bool) {
        if enabled {
            self.bridge.headers().remove(SKIP_CACHING_HEADER);
        } else {
            self.bridge
                .headers()
                .set(Header::new(SKIP_CACHING_HEADER, "true"));
        }
    }

    /// Returns false while the skip-caching header is set.
    pub fn is_caching_enabled(&self) -> bool {
        !self.bridge.headers().contains(SKIP_CACHING_HEADER)
    }

    /// Unwraps the underlying bridge.
    pub fn into_inner(self) -> Bridge {
        self.bridge
    }
}

impl Deref for CloudBridge {
    type Target = Bridge;

    fn deref(&self) -> &Bridge {
        &self.bridge
    }
}
