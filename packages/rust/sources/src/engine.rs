//! Concurrent fetch engine over the registered source adapters.
//!
//! Every adapter runs as its own tokio task bounded by the per-source timeout.
//! Results come back in registration order regardless of which source
//! finishes first, so downstream output is reproducible.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use accountplan_shared::{AccountPlanError, FetchStatus, RawObservation, Result, SourcesConfig};

use crate::adapters::{DuckDuckGoAdapter, SourceAdapter, WikipediaAdapter};

/// User-Agent string for source requests.
pub const USER_AGENT: &str = concat!("AccountPlan/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow per request.
const MAX_REDIRECTS: usize = 3;

// ---------------------------------------------------------------------------
// SourceRegistry
// ---------------------------------------------------------------------------

/// Holds registered adapters in priority order.
pub struct SourceRegistry {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    timeout: Duration,
}

impl SourceRegistry {
    /// An empty registry whose fetches are each bounded by `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            adapters: Vec::new(),
            timeout,
        }
    }

    /// Build the built-in adapters enabled in `config`, sharing one HTTP client.
    pub fn from_config(config: &SourcesConfig) -> Result<Self> {
        let client = build_client(config)?;
        let mut registry = Self::new(Duration::from_secs(config.timeout_secs));

        if config.wikipedia.enabled {
            registry.register(WikipediaAdapter::new(
                client.clone(),
                &config.wikipedia.base_url,
            )?);
        }
        if config.duckduckgo.enabled {
            registry.register(DuckDuckGoAdapter::new(
                client.clone(),
                &config.duckduckgo.base_url,
            )?);
        }

        debug!(sources = ?registry.source_ids(), "source registry built");
        Ok(registry)
    }

    /// Append an adapter; later registrations come later in the output.
    pub fn register(&mut self, adapter: impl SourceAdapter + 'static) {
        self.adapters.push(Arc::new(adapter));
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_adapter(mut self, adapter: impl SourceAdapter + 'static) -> Self {
        self.register(adapter);
        self
    }

    pub fn source_ids(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch `entity_name` from every source concurrently.
    ///
    /// Returns exactly one observation per registered adapter, in registration
    /// order. A source that overruns the timeout yields `timeout`; a task that
    /// panics yields `error`. Neither affects the other sources.
    #[instrument(skip(self), fields(sources = self.adapters.len()))]
    pub async fn fetch_all(&self, entity_name: &str) -> Vec<RawObservation> {
        let handles: Vec<_> = self
            .adapters
            .iter()
            .map(|adapter| {
                let adapter = Arc::clone(adapter);
                let entity = entity_name.to_string();
                let timeout = self.timeout;
                let source_id = adapter.id().to_string();

                let handle = tokio::spawn(async move {
                    match tokio::time::timeout(timeout, adapter.fetch(&entity)).await {
                        Ok(observation) => observation,
                        Err(_) => {
                            RawObservation::failed(adapter.id(), &entity, FetchStatus::Timeout)
                        }
                    }
                });
                (source_id, handle)
            })
            .collect();

        let mut observations = Vec::with_capacity(handles.len());
        for (source_id, handle) in handles {
            let observation = match handle.await {
                Ok(observation) => observation,
                Err(e) => {
                    warn!(source = %source_id, error = %e, "source task failed");
                    RawObservation::failed(&source_id, entity_name, FetchStatus::Error)
                }
            };

            if observation.fetch_status.is_ok() {
                debug!(source = %source_id, bytes = observation.raw_text.len(), "source ok");
            } else {
                warn!(source = %source_id, status = %observation.fetch_status, "source degraded");
            }
            observations.push(observation);
        }

        let ok = observations.iter().filter(|o| o.fetch_status.is_ok()).count();
        info!(ok, total = observations.len(), "sources fetched");

        observations
    }
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Build the shared reqwest client for all HTTP adapters.
pub fn build_client(config: &SourcesConfig) -> Result<Client> {
    let user_agent = config.user_agent.as_deref().unwrap_or(USER_AGENT);
    Client::builder()
        .user_agent(user_agent)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| AccountPlanError::Network(format!("failed to build HTTP client: {e}")))
}
