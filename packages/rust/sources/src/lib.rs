//! External text sources for company research.
//!
//! This crate provides:
//! - [`adapters`]: the [`SourceAdapter`] capability and one adapter per source
//! - [`SourceRegistry`]: runs every registered adapter concurrently, each bounded
//!   by its own timeout, and returns one [`RawObservation`] per source
//!
//! Adapters never fail: not-found, transport errors and timeouts are folded
//! into [`FetchStatus`] so downstream stages see a single uniform shape.
//!
//! [`RawObservation`]: accountplan_shared::RawObservation
//! [`FetchStatus`]: accountplan_shared::FetchStatus

pub mod adapters;
pub mod engine;

pub use adapters::{DuckDuckGoAdapter, SourceAdapter, StaticSource, WikipediaAdapter};
pub use engine::{SourceRegistry, USER_AGENT, build_client};
