//! Result types returned by the bridge.
//!
//! Unknown fields are ignored so that additions on the service side do not
//! break decoding.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::query::SelectedRefinement;

/// Upper bound on the refinements the service returns for one navigation.
pub const MAX_REFINEMENTS: usize = 10_000;

/// A decoded payload that may carry an embedded error message.
pub trait ErrorCarrier {
    /// The embedded error message, if any.
    fn errors(&self) -> Option<&str>;
}

/// A refinement value returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Refinement {
    /// A single value.
    #[serde(rename_all = "camelCase")]
    Value {
        /// Refinement ID.
        #[serde(default)]
        id: Option<String>,
        /// The value.
        value: String,
        /// Number of matching records.
        #[serde(default)]
        count: u64,
        /// Whether this refinement is an exclusion.
        #[serde(default)]
        exclude: bool,
    },
    /// A range.
    #[serde(rename_all = "camelCase")]
    Range {
        /// Refinement ID.
        #[serde(default)]
        id: Option<String>,
        /// Lower bound.
        low: String,
        /// Upper bound.
        high: String,
        /// Number of matching records.
        #[serde(default)]
        count: u64,
        /// Whether this refinement is an exclusion.
        #[serde(default)]
        exclude: bool,
    },
}

impl Refinement {
    /// Number of records matching this refinement.
    pub fn count(&self) -> u64 {
        match self {
            Refinement::Value { count, .. } | Refinement::Range { count, .. } => *count,
        }
    }

    /// Builds the selection that applies this refinement to `navigation_name`.
    pub fn select(&self, navigation_name: &str) -> SelectedRefinement {
        let selected = match self {
            Refinement::Value { value, .. } => SelectedRefinement::value(navigation_name, value),
            Refinement::Range { low, high, .. } => {
                SelectedRefinement::range(navigation_name, low, high)
            }
        };
        match self {
            Refinement::Value { exclude: true, .. } | Refinement::Range { exclude: true, .. } => {
                selected.excluded()
            }
            _ => selected,
        }
    }
}

/// A navigation (facet) and its refinements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Navigation {
    /// Navigation ID.
    pub id: Option<String>,
    /// Field name.
    pub name: String,
    /// Display name from the command center.
    pub display_name: Option<String>,
    /// True for range navigations.
    pub range: bool,
    /// True if refinements combine with OR.
    pub or: bool,
    /// Navigation type, e.g. `String` or `Range_Integer`.
    #[serde(rename = "type")]
    pub navigation_type: Option<String>,
    /// Refinements.
    pub refinements: Vec<Refinement>,
    /// Extra metadata.
    pub metadata: Vec<Value>,
}

/// A single search record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Record {
    /// Record ID.
    #[serde(rename = "_id")]
    pub id: Option<String>,
    /// Record URL.
    #[serde(rename = "_u")]
    pub url: Option<String>,
    /// Record title.
    #[serde(rename = "_t")]
    pub title: Option<String>,
    /// Snippet.
    pub snippet: Option<String>,
    /// All requested fields.
    pub all_meta: Map<String, Value>,
}

/// Paging information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageInfo {
    /// Index of the first record.
    pub record_start: u64,
    /// Index of the last record.
    pub record_end: u64,
}

/// The rule-driven template chosen for the query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Template {
    /// Template ID.
    pub id: Option<String>,
    /// Template name.
    pub name: Option<String>,
    /// Rule that selected the template.
    pub rule_name: Option<String>,
    /// Template zones.
    pub zones: Map<String, Value>,
}

/// Search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Results {
    /// Response ID.
    pub id: Option<String>,
    /// Area searched.
    pub area: Option<String>,
    /// Query as executed.
    pub query: Option<String>,
    /// Query as sent.
    pub original_query: Option<String>,
    /// Spell corrected query.
    pub corrected_query: Option<String>,
    /// Total number of matching records.
    pub total_record_count: u64,
    /// Paging information.
    pub page_info: PageInfo,
    /// Records on this page.
    pub records: Vec<Record>,
    /// Navigations available for refining.
    pub available_navigation: Vec<Navigation>,
    /// Navigations already refined on.
    pub selected_navigation: Vec<Navigation>,
    /// Spelling suggestions.
    pub did_you_mean: Vec<String>,
    /// Related searches.
    pub related_queries: Vec<String>,
    /// Query rewrites applied.
    pub rewrites: Vec<String>,
    /// Redirect target, if a rule fired one.
    pub redirect: Option<String>,
    /// Template.
    pub template: Option<Template>,
    /// Biasing profile applied.
    pub biasing_profile: Option<String>,
    /// Service warnings.
    pub warnings: Vec<String>,
    /// Embedded error message.
    pub errors: Option<String>,
}

impl Results {
    /// Finds an available navigation by name.
    pub fn navigation(&self, name: &str) -> Option<&Navigation> {
        self.available_navigation.iter().find(|n| n.name == name)
    }
}

impl ErrorCarrier for Results {
    fn errors(&self) -> Option<&str> {
        self.errors.as_deref()
    }
}

/// Result of a refinements request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RefinementsResult {
    /// Response ID.
    pub id: Option<String>,
    /// The navigation with its full refinement list.
    pub navigation: Option<Navigation>,
    /// Embedded error message.
    pub errors: Option<String>,
}

impl ErrorCarrier for RefinementsResult {
    fn errors(&self) -> Option<&str> {
        self.errors.as_deref()
    }
}

impl ErrorCarrier for Value {
    fn errors(&self) -> Option<&str> {
        self.get("errors").and_then(Value::as_str)
    }
}
