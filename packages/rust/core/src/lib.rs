//! Research and report logic for AccountPlan.
//!
//! This crate turns source observations into an account plan:
//! - [`extract`]: typed facts from raw source text
//! - [`conflict`]: cross-source agreement per attribute
//! - [`synthesize`]: the fixed seven-section report
//! - [`update`]: scoped single-section edits
//! - [`research`]: the end-to-end pipeline over a [`SourceRegistry`](accountplan_sources::SourceRegistry)

pub mod conflict;
pub mod extract;
pub mod research;
pub mod synthesize;
pub mod update;

pub use conflict::{detect, detect_attribute, has_conflicts};
pub use extract::FactExtractor;
pub use research::{ProgressReporter, ResearchOutcome, Researcher, SilentProgress, SourceStatus};
pub use synthesize::synthesize;
pub use update::{apply_update, apply_update_markdown, resolve_target, update};
