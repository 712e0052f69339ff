//! End-to-end research pipeline: entity name → sources → facts → conflicts → report.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, instrument, warn};

use accountplan_shared::{
    AccountPlanError, AppConfig, ConflictReport, ExtractionRules, FetchStatus, RawObservation,
    Report, Result,
};
use accountplan_sources::SourceRegistry;

use crate::conflict::{detect, has_conflicts};
use crate::extract::FactExtractor;
use crate::synthesize::synthesize;

/// Per-source outcome of one research run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceStatus {
    pub source_id: String,
    pub fetch_status: FetchStatus,
    /// Number of facts extracted from this source.
    pub facts: usize,
}

/// Result of [`Researcher::research`].
#[derive(Debug, Clone, Serialize)]
pub struct ResearchOutcome {
    pub report: Report,
    pub conflicts: Vec<ConflictReport>,
    /// Per-source status, in registration order.
    pub sources: Vec<SourceStatus>,
    /// True when no source returned usable text.
    pub no_external_data: bool,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl ResearchOutcome {
    /// Split into the report and its conflict annotations.
    pub fn into_parts(self) -> (Report, Vec<ConflictReport>) {
        (self.report, self.conflicts)
    }

    pub fn has_conflicts(&self) -> bool {
        has_conflicts(&self.conflicts)
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once per source, in registration order, after all fetches settle.
    fn source_fetched(&self, observation: &RawObservation, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, outcome: &ResearchOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn source_fetched(&self, _observation: &RawObservation, _current: usize, _total: usize) {}
    fn done(&self, _outcome: &ResearchOutcome) {}
}

/// Runs the research pipeline against a fixed set of sources.
pub struct Researcher {
    registry: SourceRegistry,
    extractor: FactExtractor,
}

impl Researcher {
    pub fn new(registry: SourceRegistry, rules: ExtractionRules) -> Result<Self> {
        Ok(Self {
            registry,
            extractor: FactExtractor::new(rules)?,
        })
    }

    /// Built-in sources and extraction rules from the app config.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let registry = SourceRegistry::from_config(&config.sources)?;
        Self::new(registry, ExtractionRules::from(config))
    }

    pub async fn research(&self, entity_name: &str) -> Result<ResearchOutcome> {
        self.research_with_progress(entity_name, &SilentProgress).await
    }

    /// Run the full pipeline.
    ///
    /// 1. Fetch every source concurrently (each bounded by its timeout)
    /// 2. Extract facts per observation, in registration order
    /// 3. Detect conflicts across sources
    /// 4. Synthesize the seven-section report
    ///
    /// Unreachable sources only reduce the available facts; the only error is
    /// a blank entity name.
    #[instrument(skip_all, fields(entity = %entity_name))]
    pub async fn research_with_progress(
        &self,
        entity_name: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<ResearchOutcome> {
        let start = Instant::now();
        let entity = entity_name.trim();
        if entity.is_empty() {
            return Err(AccountPlanError::validation("entity name must not be blank"));
        }

        info!(entity, sources = self.registry.len(), "starting research");

        // --- Phase 1: Fetch ---
        progress.phase("Fetching sources");
        let observations = self.registry.fetch_all(entity).await;

        // --- Phase 2: Extract ---
        progress.phase("Extracting facts");
        let total = observations.len();
        let mut facts = Vec::new();
        let mut sources = Vec::with_capacity(total);
        for (i, observation) in observations.iter().enumerate() {
            progress.source_fetched(observation, i + 1, total);
            let extracted = self.extractor.extract(observation);
            sources.push(SourceStatus {
                source_id: observation.source_id.clone(),
                fetch_status: observation.fetch_status,
                facts: extracted.len(),
            });
            facts.extend(extracted);
        }

        // --- Phase 3: Conflicts ---
        progress.phase("Checking for conflicts");
        let conflicts = detect(&facts);
        for report in conflicts.iter().filter(|r| r.is_conflicting) {
            warn!(attribute = %report.attribute, values = %report.describe(), "sources disagree");
        }

        // --- Phase 4: Synthesis ---
        progress.phase("Synthesizing account plan");
        let report = synthesize(entity, &facts, &conflicts);

        let outcome = ResearchOutcome {
            report,
            no_external_data: !sources.iter().any(|s| s.fetch_status.is_ok()),
            conflicts,
            sources,
            elapsed: start.elapsed(),
        };

        info!(
            facts = facts.len(),
            conflicting = outcome.conflicts.iter().filter(|r| r.is_conflicting).count(),
            no_external_data = outcome.no_external_data,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "research complete"
        );

        progress.done(&outcome);
        Ok(outcome)
    }
}
