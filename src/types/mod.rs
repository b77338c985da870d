//! Query and result types for the bridge.

pub mod biasing;
pub mod query;
pub mod results;
pub mod sort;
