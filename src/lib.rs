//! GroupBy Search Bridge Client
//!
//! A blocking Rust client for the GroupBy search bridge. Sends searches and
//! refinement lookups over a pooled HTTP connection, retries dropped
//! connections and turns service-side failures into typed errors.
//!
//! # Features
//!
//! - **Search and refinements**: typed [`Query`] builder and decoded [`Results`]
//! - **Connection pooling**: bounded globally and per route, shared by all threads
//! - **Resilience**: bounded retries of low-level connection failures
//! - **Binary payloads**: MessagePack responses on request
//! - **Cloud hosting**: [`CloudBridge`] with response caching control
//! - **Observability**: `tracing` spans and events with client key redaction
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use groupby_bridge::{Bridge, Query, SelectedRefinement};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bridge = Bridge::builder()
//!         .client_key("my-client-key")
//!         .base_url("http://localhost:8080/api/v1")
//!         .build()?;
//!
//!     let query = Query::new()
//!         .query("boots")
//!         .refinement(SelectedRefinement::value("brand", "Acme"));
//!
//!     let results = bridge.search(&query)?;
//!     for record in &results.records {
//!         println!("{:?}", record.title);
//!     }
//!
//!     bridge.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! # Cloud Example
//!
//! ```rust,no_run
//! use groupby_bridge::{CloudBridge, Query};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bridge = CloudBridge::new("my-client-key", "mycustomer")?;
//!     bridge.set_caching_enabled(false);
//!
//!     let brands = bridge.refinements(&Query::new().query("boots"), "brand")?;
//!     if let Some(navigation) = brands.navigation {
//!         println!("{} brands", navigation.refinements.len());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod observability;
pub mod resilience;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use client::{Bridge, BridgeBuilder, CloudBridge, HeaderList};
pub use config::{BridgeConfig, ConnectionConfig};
pub use errors::{BridgeError, BridgeResult};
pub use transport::{Header, TransportError};

// Type re-exports
pub use types::biasing::{Bias, BiasStrength, Biasing};
pub use types::query::{BridgeQuery, Query, SelectedRefinement};
pub use types::results::{
    ErrorCarrier, Navigation, PageInfo, Record, Refinement, RefinementsResult, Results, Template,
};
pub use types::sort::{FieldSort, SortOrder};

/// Mock implementations for testing.
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
