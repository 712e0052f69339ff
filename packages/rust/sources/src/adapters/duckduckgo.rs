//! DuckDuckGo Instant Answer adapter.

use accountplan_shared::{FetchStatus, RawObservation, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::{SourceAdapter, into_observation, parse_base_url, status_for_error, status_for_http};

const SOURCE_ID: &str = "duckduckgo";

/// Queries the Instant Answer API and returns the abstract, falling back to
/// the first related topic.
pub struct DuckDuckGoAdapter {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct InstantAnswer {
    #[serde(default, rename = "Abstract")]
    abstract_text: String,
    #[serde(default, rename = "RelatedTopics")]
    related_topics: Vec<serde_json::Value>,
}

impl InstantAnswer {
    fn best_text(self) -> String {
        if !self.abstract_text.trim().is_empty() {
            return self.abstract_text;
        }
        // Topic groups ({"Name", "Topics"}) carry no top-level Text and are skipped.
        self.related_topics
            .first()
            .and_then(|topic| topic.get("Text"))
            .and_then(|text| text.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

impl DuckDuckGoAdapter {
    pub fn new(client: Client, base_url: &str) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;
        Ok(Self { client, base_url })
    }

    fn query_url(&self, entity_name: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("q", entity_name.trim())
            .append_pair("format", "json")
            .append_pair("no_html", "1")
            .append_pair("skip_disambig", "1");
        url
    }

    async fn fetch_text(&self, entity_name: &str) -> std::result::Result<String, FetchStatus> {
        let url = self.query_url(entity_name);
        debug!(%url, "requesting duckduckgo instant answer");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| status_for_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_for_http(status));
        }

        // The API labels JSON as application/x-javascript; decode from text.
        let body = response.text().await.map_err(|e| status_for_error(&e))?;
        let answer: InstantAnswer = serde_json::from_str(&body).map_err(|e| {
            debug!(error = %e, "undecodable instant answer");
            FetchStatus::Error
        })?;

        Ok(answer.best_text())
    }
}

#[async_trait]
impl SourceAdapter for DuckDuckGoAdapter {
    fn id(&self) -> &str {
        SOURCE_ID
    }

    #[instrument(skip(self), fields(source = SOURCE_ID))]
    async fn fetch(&self, entity_name: &str) -> RawObservation {
        let outcome = self.fetch_text(entity_name).await;
        into_observation(SOURCE_ID, entity_name, outcome)
    }
}
