//! Error types for AccountPlan.
//!
//! Library crates use [`AccountPlanError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Per-source fetch failures are deliberately absent: adapters fold them into
//! [`FetchStatus`](crate::FetchStatus) so they never surface as errors.

use std::path::PathBuf;

/// Top-level error type for all AccountPlan operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountPlanError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// HTTP client setup error (never a per-source fetch failure).
    #[error("network error: {0}")]
    Network(String),

    /// Report text or JSON could not be parsed.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid caller input (blank entity name, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// An update target matched zero or several canonical section titles.
    #[error("section not found: {target:?}{}", ambiguity_hint(.candidates))]
    SectionNotFound {
        target: String,
        /// Canonical titles that matched; empty when nothing matched.
        candidates: Vec<String>,
    },

    /// A report violates the fixed seven-section structure.
    #[error("malformed report: {message}")]
    MalformedReport { message: String },
}

fn ambiguity_hint(candidates: &[String]) -> String {
    if candidates.is_empty() {
        String::new()
    } else {
        format!(" (ambiguous: {})", candidates.join(", "))
    }
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AccountPlanError>;

impl AccountPlanError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a malformed-report error from any displayable message.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedReport {
            message: msg.into(),
        }
    }

    /// Create a section-not-found error for `target`.
    pub fn section_not_found(target: impl Into<String>, candidates: Vec<String>) -> Self {
        Self::SectionNotFound {
            target: target.into(),
            candidates,
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = AccountPlanError::config("missing base_url");
        assert_eq!(err.to_string(), "config error: missing base_url");

        let err = AccountPlanError::malformed("expected 7 sections, found 6");
        assert!(err.to_string().contains("found 6"));
    }

    #[test]
    fn section_not_found_lists_candidates() {
        let err = AccountPlanError::section_not_found("Nonexistent Section", vec![]);
        assert_eq!(err.to_string(), r#"section not found: "Nonexistent Section""#);

        let err = AccountPlanError::section_not_found(
            "company",
            vec!["Company Overview".into(), "Opportunities for Our Company".into()],
        );
        assert!(err.to_string().contains("ambiguous: Company Overview, Opportunities"));
    }
}
