//! Sort types.

use serde::{Deserialize, Serialize};

/// Field name the service sorts on for relevance.
pub const RELEVANCE_FIELD: &str = "_relevance";

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending order.
    #[default]
    Ascending,
    /// Descending order.
    Descending,
}

impl SortOrder {
    fn is_ascending(&self) -> bool {
        matches!(self, SortOrder::Ascending)
    }
}

/// Sort on a single field.
///
/// The order is only sent when it differs from ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSort {
    /// Source field name.
    pub field: String,

    /// Direction.
    #[serde(default, skip_serializing_if = "SortOrder::is_ascending")]
    pub order: SortOrder,
}

impl FieldSort {
    /// Ascending sort on `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Ascending,
        }
    }

    /// Relevance sort.
    pub fn relevance() -> Self {
        Self::new(RELEVANCE_FIELD)
    }

    /// Sets the direction.
    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Shorthand for a descending sort.
    pub fn descending(self) -> Self {
        self.order(SortOrder::Descending)
    }
}
