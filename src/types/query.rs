//! Query types.
//!
//! A [`Query`] describes one search. The bridge only relies on the
//! [`BridgeQuery`] view of it: URL parameters, a request body that embeds the
//! client key, and whether the answer should come back binary encoded.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::biasing::Biasing;
use super::sort::FieldSort;
use crate::errors::BridgeResult;

/// Default number of records per page.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// What the bridge needs from a query.
pub trait BridgeQuery {
    /// Query parameters appended to the request URI.
    fn url_params(&self) -> &BTreeMap<String, String>;

    /// Serialized search request body.
    fn bridge_json(&self, client_key: &str) -> BridgeResult<String>;

    /// Serialized refinements request body for `navigation_name`.
    fn bridge_refinements_json(
        &self,
        client_key: &str,
        navigation_name: &str,
    ) -> BridgeResult<String>;

    /// True if the response is binary encoded rather than JSON.
    fn returns_binary(&self) -> bool;
}

/// A refinement selected by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SelectedRefinement {
    /// Match a single value.
    #[serde(rename_all = "camelCase")]
    Value {
        /// Navigation the value belongs to.
        navigation_name: String,
        /// The value.
        value: String,
        /// Exclude instead of include.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        exclude: bool,
    },
    /// Match a range.
    #[serde(rename_all = "camelCase")]
    Range {
        /// Navigation the range belongs to.
        navigation_name: String,
        /// Lower bound.
        low: String,
        /// Upper bound.
        high: String,
        /// Exclude instead of include.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        exclude: bool,
    },
}

impl SelectedRefinement {
    /// Creates a value refinement.
    pub fn value(navigation_name: impl Into<String>, value: impl Into<String>) -> Self {
        SelectedRefinement::Value {
            navigation_name: navigation_name.into(),
            value: value.into(),
            exclude: false,
        }
    }

    /// Creates a range refinement.
    pub fn range(
        navigation_name: impl Into<String>,
        low: impl Into<String>,
        high: impl Into<String>,
    ) -> Self {
        SelectedRefinement::Range {
            navigation_name: navigation_name.into(),
            low: low.into(),
            high: high.into(),
            exclude: false,
        }
    }

    /// Turns this refinement into an exclusion.
    pub fn excluded(mut self) -> Self {
        match &mut self {
            SelectedRefinement::Value { exclude, .. } | SelectedRefinement::Range { exclude, .. } => {
                *exclude = true;
            }
        }
        self
    }

    /// Name of the navigation this refinement applies to.
    pub fn navigation_name(&self) -> &str {
        match self {
            SelectedRefinement::Value {
                navigation_name, ..
            }
            | SelectedRefinement::Range {
                navigation_name, ..
            } => navigation_name,
        }
    }
}

/// Key/value pair forwarded to the service inside the request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomUrlParam {
    /// Parameter key.
    pub key: String,
    /// Parameter value.
    pub value: String,
}

/// Restricts the refinements returned for one navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictNavigation {
    /// Navigation name.
    pub name: String,
    /// Number of refinements to return.
    pub count: u32,
}

/// A search query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    /// Search terms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Area to search in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,

    /// Collection to search in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    /// Records to skip.
    #[serde(skip_serializing_if = "is_zero")]
    pub skip: u64,

    /// Records per page.
    pub page_size: u64,

    /// Command center biasing profile name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biasing_profile: Option<String>,

    /// Language hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Fields to return per record.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,

    /// Navigations that combine their refinements with OR.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub or_fields: Vec<String>,

    /// Sort order, most significant first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<FieldSort>,

    /// Selected refinements.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub refinements: Vec<SelectedRefinement>,

    /// Parameters forwarded inside the body.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_url_params: Vec<CustomUrlParam>,

    /// Drop navigations with a single refinement.
    pub prune_refinements: bool,

    /// Turn off spelling correction.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disable_autocorrection: bool,

    /// Enable wildcard matching.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub wildcard_search_enabled: bool,

    /// Ask for a binary encoded response.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub return_binary: bool,

    /// Query-time biasing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biasing: Option<Biasing>,

    /// Restrict the refinements returned for one navigation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restrict_navigation: Option<RestrictNavigation>,

    /// Query parameters appended to the request URI.
    #[serde(skip)]
    pub url_params: BTreeMap<String, String>,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl Default for Query {
    fn default() -> Self {
        Self {
            query: None,
            area: None,
            collection: None,
            skip: 0,
            page_size: DEFAULT_PAGE_SIZE,
            biasing_profile: None,
            language: None,
            fields: Vec::new(),
            or_fields: Vec::new(),
            sort: Vec::new(),
            refinements: Vec::new(),
            custom_url_params: Vec::new(),
            prune_refinements: true,
            disable_autocorrection: false,
            wildcard_search_enabled: false,
            return_binary: false,
            biasing: None,
            restrict_navigation: None,
            url_params: BTreeMap::new(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchBody<'a> {
    client_key: &'a str,
    #[serde(flatten)]
    query: &'a Query,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefinementsBody<'a> {
    original_query: SearchBody<'a>,
    navigation_name: &'a str,
}

impl Query {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search terms.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Sets the area.
    pub fn area(mut self, area: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self
    }

    /// Sets the collection.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Sets the number of records to skip.
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Sets the page size.
    pub fn page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the biasing profile name.
    pub fn biasing_profile(mut self, profile: impl Into<String>) -> Self {
        self.biasing_profile = Some(profile.into());
        self
    }

    /// Sets the language.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Adds fields to return.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Adds an OR navigation.
    pub fn or_field(mut self, field: impl Into<String>) -> Self {
        self.or_fields.push(field.into());
        self
    }

    /// Adds a sort.
    pub fn sort(mut self, sort: FieldSort) -> Self {
        self.sort.push(sort);
        self
    }

    /// Adds a selected refinement.
    pub fn refinement(mut self, refinement: SelectedRefinement) -> Self {
        self.refinements.push(refinement);
        self
    }

    /// Adds a body parameter.
    pub fn custom_url_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_url_params.push(CustomUrlParam {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Adds a URI query parameter.
    pub fn url_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.url_params.insert(name.into(), value.into());
        self
    }

    /// Sets whether single-refinement navigations are pruned.
    pub fn prune_refinements(mut self, prune: bool) -> Self {
        self.prune_refinements = prune;
        self
    }

    /// Turns spelling correction off.
    pub fn disable_autocorrection(mut self, disable: bool) -> Self {
        self.disable_autocorrection = disable;
        self
    }

    /// Enables wildcard search.
    pub fn wildcard_search_enabled(mut self, enabled: bool) -> Self {
        self.wildcard_search_enabled = enabled;
        self
    }

    /// Requests a binary encoded response.
    pub fn return_binary(mut self, binary: bool) -> Self {
        self.return_binary = binary;
        self
    }

    /// Sets query-time biasing.
    pub fn biasing(mut self, biasing: Biasing) -> Self {
        self.biasing = Some(biasing);
        self
    }

    /// Restricts one navigation to `count` refinements.
    pub fn restrict_navigation(mut self, name: impl Into<String>, count: u32) -> Self {
        self.restrict_navigation = Some(RestrictNavigation {
            name: name.into(),
            count,
        });
        self
    }
}

impl BridgeQuery for Query {
    fn url_params(&self) -> &BTreeMap<String, String> {
        &self.url_params
    }

    fn bridge_json(&self, client_key: &str) -> BridgeResult<String> {
        Ok(serde_json::to_string(&SearchBody {
            client_key,
            query: self,
        })?)
    }

    fn bridge_refinements_json(
        &self,
        client_key: &str,
        navigation_name: &str,
    ) -> BridgeResult<String> {
        Ok(serde_json::to_string(&RefinementsBody {
            original_query: SearchBody {
                client_key,
                query: self,
            },
            navigation_name,
        })?)
    }

    fn returns_binary(&self) -> bool {
        self.return_binary
    }
}
