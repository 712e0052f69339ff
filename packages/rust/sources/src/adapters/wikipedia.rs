//! Wikipedia REST summary adapter.

use accountplan_shared::{FetchStatus, RawObservation, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::{SourceAdapter, into_observation, parse_base_url, status_for_error, status_for_http};

const SOURCE_ID: &str = "wikipedia";

/// Fetches the lead-section extract from `{base}/page/summary/{title}`.
pub struct WikipediaAdapter {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    extract: String,
}

impl WikipediaAdapter {
    pub fn new(client: Client, base_url: &str) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;
        Ok(Self { client, base_url })
    }

    /// Page title form of an entity name: spaces become underscores.
    fn summary_url(&self, entity_name: &str) -> Option<Url> {
        let title = entity_name.trim().replace(' ', "_");
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(["page", "summary", title.as_str()]);
        Some(url)
    }

    async fn fetch_extract(&self, entity_name: &str) -> std::result::Result<String, FetchStatus> {
        let url = self.summary_url(entity_name).ok_or(FetchStatus::Error)?;
        debug!(%url, "requesting wikipedia summary");

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

        let summary: SummaryResponse = response.json().await.map_err(|e| status_for_error(&e))?;

        if summary.kind == "disambiguation" {
            debug!("wikipedia returned a disambiguation page");
            return Err(FetchStatus::NotFound);
        }

        Ok(summary.extract)
    }
}

#[async_trait]
impl SourceAdapter for WikipediaAdapter {
    fn id(&self) -> &str {
        SOURCE_ID
    }

    #[instrument(skip(self), fields(source = SOURCE_ID))]
    async fn fetch(&self, entity_name: &str) -> RawObservation {
        let outcome = self.fetch_extract(entity_name).await;
        into_observation(SOURCE_ID, entity_name, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accountplan_shared::AccountPlanError;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(timeout: Duration) -> Client {
        Client::builder().timeout(timeout).build().unwrap()
    }

    #[test]
    fn summary_url_encodes_title() {
        let adapter = WikipediaAdapter::new(
            client(Duration::from_secs(1)),
            "https://en.wikipedia.org/api/rest_v1/",
        )
        .unwrap();
        let url = adapter.summary_url("AT&T Inc/Labs").unwrap();
        assert_eq!(
            url.as_str(),
            "https://en.wikipedia.org/api/rest_v1/page/summary/AT&T_Inc%2FLabs"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        let result = WikipediaAdapter::new(client(Duration::from_secs(1)), "not a url");
        assert!(matches!(result, Err(AccountPlanError::Config { .. })));
    }

    #[tokio::test]
    async fn fetch_ok_returns_extract() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page/summary/Acme_Corporation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "type": "standard",
                "title": "Acme Corporation",
                "extract": "Acme Corporation is an American manufacturer founded in 1921."
            })))
            .mount(&server)
            .await;

        let adapter = WikipediaAdapter::new(client(Duration::from_secs(5)), &server.uri()).unwrap();
        let obs = adapter.fetch("Acme Corporation").await;

        assert_eq!(obs.fetch_status, FetchStatus::Ok);
        assert_eq!(obs.source_id, "wikipedia");
        assert!(obs.raw_text.contains("founded in 1921"));
    }

    #[tokio::test]
    async fn fetch_404_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let adapter = WikipediaAdapter::new(client(Duration::from_secs(5)), &server.uri()).unwrap();
        let obs = adapter.fetch("Nobody Inc").await;
        assert_eq!(obs.fetch_status, FetchStatus::NotFound);
        assert!(obs.raw_text.is_empty());
    }

    #[tokio::test]
    async fn disambiguation_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "type": "disambiguation",
                "extract": "Acme may refer to:"
            })))
            .mount(&server)
            .await;

        let adapter = WikipediaAdapter::new(client(Duration::from_secs(5)), &server.uri()).unwrap();
        assert_eq!(adapter.fetch("Acme").await.fetch_status, FetchStatus::NotFound);
    }

    #[tokio::test]
    async fn server_error_and_bad_json_are_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page/summary/Broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page/summary/Garbled"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let adapter = WikipediaAdapter::new(client(Duration::from_secs(5)), &server.uri()).unwrap();
        assert_eq!(adapter.fetch("Broken").await.fetch_status, FetchStatus::Error);
        assert_eq!(adapter.fetch("Garbled").await.fetch_status, FetchStatus::Error);
    }

    #[tokio::test]
    async fn slow_response_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"extract": "late"}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let adapter =
            WikipediaAdapter::new(client(Duration::from_millis(200)), &server.uri()).unwrap();
        assert_eq!(adapter.fetch("Acme").await.fetch_status, FetchStatus::Timeout);
    }

    #[tokio::test]
    async fn unreachable_host_is_error() {
        // Port 1 on loopback refuses connections.
        let adapter =
            WikipediaAdapter::new(client(Duration::from_secs(2)), "http://127.0.0.1:1").unwrap();
        let obs = adapter.fetch("Acme").await;
        assert!(matches!(obs.fetch_status, FetchStatus::Error | FetchStatus::Timeout));
    }
}
