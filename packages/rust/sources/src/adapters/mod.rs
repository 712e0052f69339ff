//! Source adapter trait and built-in adapters.
//!
//! Each adapter knows one external source's request and response shape and maps
//! it onto a uniform [`RawObservation`]. Failure modes become [`FetchStatus`]
//! values rather than errors.

mod duckduckgo;
mod wikipedia;

use accountplan_shared::{AccountPlanError, FetchStatus, RawObservation, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

pub use duckduckgo::DuckDuckGoAdapter;
pub use wikipedia::WikipediaAdapter;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A single external source of text about an entity.
///
/// Implementations perform at most one attempt per call; retry policy, if any,
/// belongs to the caller.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable identifier recorded on every observation and fact.
    fn id(&self) -> &str;

    /// Fetch text about `entity_name`. Never fails; see [`FetchStatus`].
    async fn fetch(&self, entity_name: &str) -> RawObservation;
}

// ---------------------------------------------------------------------------
// StaticSource
// ---------------------------------------------------------------------------

/// A source backed by text already in memory (analyst notes, fixtures).
///
/// Returns its text for any entity; blank text is reported as `not_found`.
#[derive(Debug, Clone)]
pub struct StaticSource {
    id: String,
    text: String,
}

impl StaticSource {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

#[async_trait]
impl SourceAdapter for StaticSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self, entity_name: &str) -> RawObservation {
        if self.text.trim().is_empty() {
            RawObservation::failed(&self.id, entity_name, FetchStatus::NotFound)
        } else {
            RawObservation::ok(&self.id, entity_name, self.text.clone())
        }
    }
}

// ---------------------------------------------------------------------------
// Status mapping
// ---------------------------------------------------------------------------

/// Parse and check an adapter's configured root URL.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url> {
    let url = Url::parse(base_url)
        .map_err(|e| AccountPlanError::config(format!("invalid source URL '{base_url}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(AccountPlanError::config(format!(
            "source URL '{base_url}' cannot be used as a base"
        )));
    }
    Ok(url)
}

/// Map a transport-level failure to a fetch status.
pub(crate) fn status_for_error(err: &reqwest::Error) -> FetchStatus {
    if err.is_timeout() {
        FetchStatus::Timeout
    } else {
        FetchStatus::Error
    }
}

/// Map a non-success HTTP status to a fetch status.
pub(crate) fn status_for_http(status: StatusCode) -> FetchStatus {
    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => FetchStatus::NotFound,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => FetchStatus::Timeout,
        _ => FetchStatus::Error,
    }
}

/// Build the final observation from an adapter's intermediate outcome.
pub(crate) fn into_observation(
    source_id: &str,
    entity_name: &str,
    outcome: std::result::Result<String, FetchStatus>,
) -> RawObservation {
    match outcome {
        Ok(text) if !text.trim().is_empty() => {
            RawObservation::ok(source_id, entity_name, text.trim())
        }
        Ok(_) => RawObservation::failed(source_id, entity_name, FetchStatus::NotFound),
        Err(status) => RawObservation::failed(source_id, entity_name, status),
    }
}
