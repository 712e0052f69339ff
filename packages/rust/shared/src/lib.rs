//! Shared types, error model, and configuration for AccountPlan.
//!
//! This crate is the foundation depended on by all other AccountPlan crates.
//! It provides:
//! - [`AccountPlanError`]: the unified error type
//! - Domain types ([`RawObservation`], [`Fact`], [`ConflictReport`], [`Report`])
//! - Configuration ([`AppConfig`], [`SourcesConfig`], [`ExtractionRules`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DuckDuckGoConfig, ExtractionConfig, ExtractionRules, SourcesConfig,
    WikipediaConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{AccountPlanError, Result};
pub use types::{
    Attribute, ConflictReport, Fact, FactKey, FactValue, FetchStatus, PLACEHOLDER_BODY,
    RawObservation, Report, Section, SectionTitle, UpdateRequest, ValueSources,
};
