//! Request URI construction.

use std::collections::BTreeMap;

use url::Url;

use crate::errors::{BridgeError, BridgeResult};

/// Name of the diagnostic query parameter carrying the attempt number.
pub const RETRY_PARAM: &str = "retry";

/// Builds the request URI for one attempt.
///
/// Every entry of `params` is appended as a query parameter, followed by
/// `retry=<attempt>`. Parameters already present on `endpoint` are kept.
pub fn build_uri(
    endpoint: &str,
    params: Option<&BTreeMap<String, String>>,
    attempt: u32,
) -> BridgeResult<Url> {
    let mut url = Url::parse(endpoint).map_err(|e| BridgeError::malformed(endpoint, e))?;
    if url.cannot_be_a_base() {
        return Err(BridgeError::malformed(endpoint, "not a hierarchical URL"));
    }

    {
        let mut query = url.query_pairs_mut();
        for (name, value) in params.into_iter().flatten() {
            query.append_pair(name, value);
        }
        query.append_pair(RETRY_PARAM, &attempt.to_string());
    }

    Ok(url)
}
