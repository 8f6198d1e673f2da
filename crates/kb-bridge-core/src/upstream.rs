//! Request plumbing shared by the upstream clients.
//!
//! Every helper here turns a failed call into a logged `None`; callers only
//! see whether the upstream accepted the request.

use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::error;

use crate::envelope::{normalize_records, parse_records};
use crate::error::{BridgeError, Result};

/// Build `{base_url}/{segments...}` with every segment percent-encoded on its
/// own, so ids cannot add path levels, a query or a fragment.
///
/// `Ok(None)` (logged) when a segment is empty or a dot segment, which the
/// URL parser would drop or resolve.
pub(crate) fn endpoint(context: &str, base_url: &str, segments: &[&str]) -> Result<Option<Url>> {
    if let Some(bad) = segments
        .iter()
        .find(|s| s.is_empty() || **s == "." || **s == "..")
    {
        error!("{} refused: invalid path segment {:?}", context, bad);
        return Ok(None);
    }

    let mut url = Url::parse(base_url)
        .map_err(|e| BridgeError::Configuration(format!("Invalid base URL {}: {}", base_url, e)))?;
    url.path_segments_mut()
        .map_err(|_| BridgeError::Configuration(format!("Invalid base URL {}", base_url)))?
        .pop_if_empty()
        .extend(segments);
    Ok(Some(url))
}

/// Send a request and keep the response only if its status is accepted.
pub(crate) async fn dispatch(
    context: &str,
    request: RequestBuilder,
    accepted: &[StatusCode],
) -> Option<Response> {
    let resp = match request.send().await {
        Ok(resp) => resp,
        Err(e) => {
            error!("{} failed: {}", context, e);
            return None;
        }
    };

    let status = resp.status();
    if accepted.contains(&status) {
        return Some(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    error!("{} failed: {} {}", context, status, body);
    None
}

/// Decode a JSON body.
pub(crate) async fn decode<T: DeserializeOwned>(context: &str, resp: Response) -> Option<T> {
    match resp.json::<T>().await {
        Ok(value) => Some(value),
        Err(e) => {
            error!("{} returned an unreadable body: {}", context, e);
            None
        }
    }
}

/// GET-style listing: 200 only, envelope normalized, records parsed.
pub(crate) async fn fetch_records<T: DeserializeOwned>(
    context: &str,
    request: RequestBuilder,
) -> Option<Vec<T>> {
    let resp = dispatch(context, request, &[StatusCode::OK]).await?;
    let body: Value = decode(context, resp).await?;
    Some(parse_records(normalize_records(body), context))
}
