//! Core domain types for AccountPlan research and reports.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AccountPlanError, Result};

/// Body used for any section without supporting facts.
pub const PLACEHOLDER_BODY: &str = "Insufficient data available.";

// ---------------------------------------------------------------------------
// RawObservation
// ---------------------------------------------------------------------------

/// Outcome of a single source fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Ok,
    NotFound,
    Error,
    Timeout,
}

impl FetchStatus {
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NotFound => "not_found",
            Self::Error => "error",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform text produced by one source for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawObservation {
    /// Adapter identifier (e.g., `wikipedia`).
    pub source_id: String,
    /// The entity name as requested.
    pub entity_name: String,
    /// Source text; empty unless `fetch_status` is `ok`.
    pub raw_text: String,
    pub fetch_status: FetchStatus,
}

impl RawObservation {
    /// A successful observation carrying `raw_text`.
    pub fn ok(
        source_id: impl Into<String>,
        entity_name: impl Into<String>,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            entity_name: entity_name.into(),
            raw_text: raw_text.into(),
            fetch_status: FetchStatus::Ok,
        }
    }

    /// A failed observation with no text.
    pub fn failed(
        source_id: impl Into<String>,
        entity_name: impl Into<String>,
        status: FetchStatus,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            entity_name: entity_name.into(),
            raw_text: String::new(),
            fetch_status: status,
        }
    }
}

// ---------------------------------------------------------------------------
// Fact
// ---------------------------------------------------------------------------

/// The kind of information a [`Fact`] asserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    FoundingYear,
    Summary,
}

impl Attribute {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FoundingYear => "founding_year",
            Self::Summary => "summary",
        }
    }

    /// Human-readable label for report text.
    pub fn label(self) -> &'static str {
        match self {
            Self::FoundingYear => "founding year",
            Self::Summary => "summary",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The asserted value of a fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Year(i32),
    Text(String),
}

/// Normalized comparison key for a [`FactValue`].
///
/// Years compare exactly; text compares trimmed and case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FactKey {
    Year(i32),
    Text(String),
}

impl FactValue {
    pub fn key(&self) -> FactKey {
        match self {
            Self::Year(year) => FactKey::Year(*year),
            Self::Text(text) => FactKey::Text(text.trim().to_lowercase()),
        }
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year(year) => write!(f, "{year}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// A single typed, sourced observation about an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub attribute: Attribute,
    pub value: FactValue,
    pub source_id: String,
    /// Substring of the source text supporting the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_span: Option<String>,
}

impl Fact {
    pub fn new(attribute: Attribute, value: FactValue, source_id: impl Into<String>) -> Self {
        Self {
            attribute,
            value,
            source_id: source_id.into(),
            raw_span: None,
        }
    }

    pub fn with_span(mut self, span: impl Into<String>) -> Self {
        self.raw_span = Some(span.into());
        self
    }
}

// ---------------------------------------------------------------------------
// ConflictReport
// ---------------------------------------------------------------------------

/// Sources that reported one distinct value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueSources {
    pub value: FactValue,
    pub source_ids: Vec<String>,
}

/// Agreement summary for one attribute across all sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub attribute: Attribute,
    /// Distinct values in first-seen order.
    pub values: Vec<FactValue>,
    pub is_conflicting: bool,
    /// One entry per element of `values`, same order.
    pub sources: Vec<ValueSources>,
}

impl ConflictReport {
    /// Sources that reported a value equal (after normalization) to `value`.
    pub fn sources_for(&self, value: &FactValue) -> Option<&[String]> {
        let key = value.key();
        self.sources
            .iter()
            .find(|entry| entry.value.key() == key)
            .map(|entry| entry.source_ids.as_slice())
    }

    /// One-line rendering such as `1975 (wikipedia); 1980 (duckduckgo)`.
    pub fn describe(&self) -> String {
        self.sources
            .iter()
            .map(|entry| format!("{} ({})", entry.value, entry.source_ids.join(", ")))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// The seven canonical report sections, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SectionTitle {
    #[serde(rename = "Company Overview")]
    CompanyOverview,
    #[serde(rename = "Key Products and Services")]
    KeyProductsAndServices,
    #[serde(rename = "Industry and Market Position")]
    IndustryAndMarketPosition,
    #[serde(rename = "Recent News and Strategic Moves")]
    RecentNewsAndStrategicMoves,
    #[serde(rename = "Key Challenges and Risks")]
    KeyChallengesAndRisks,
    #[serde(rename = "Opportunities for Our Company")]
    OpportunitiesForOurCompany,
    #[serde(rename = "Recommended Next Steps")]
    RecommendedNextSteps,
}

impl SectionTitle {
    pub const ALL: [SectionTitle; 7] = [
        Self::CompanyOverview,
        Self::KeyProductsAndServices,
        Self::IndustryAndMarketPosition,
        Self::RecentNewsAndStrategicMoves,
        Self::KeyChallengesAndRisks,
        Self::OpportunitiesForOurCompany,
        Self::RecommendedNextSteps,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CompanyOverview => "Company Overview",
            Self::KeyProductsAndServices => "Key Products and Services",
            Self::IndustryAndMarketPosition => "Industry and Market Position",
            Self::RecentNewsAndStrategicMoves => "Recent News and Strategic Moves",
            Self::KeyChallengesAndRisks => "Key Challenges and Risks",
            Self::OpportunitiesForOurCompany => "Opportunities for Our Company",
            Self::RecommendedNextSteps => "Recommended Next Steps",
        }
    }

    /// Position in the canonical order.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Case-insensitive exact match against the canonical titles.
    pub fn from_title(title: &str) -> Option<Self> {
        let wanted = title.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for SectionTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One titled unit within a [`Report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: SectionTitle,
    pub body: String,
}

impl Section {
    pub fn new(title: SectionTitle, body: impl Into<String>) -> Self {
        Self {
            title,
            body: body.into(),
        }
    }

    /// A section explicitly marked as having no data.
    pub fn placeholder(title: SectionTitle) -> Self {
        Self::new(title, PLACEHOLDER_BODY)
    }

    pub fn is_placeholder(&self) -> bool {
        self.body == PLACEHOLDER_BODY
    }
}

/// The fixed seven-section account plan for one entity.
///
/// Construction validates that exactly the canonical titles appear in
/// canonical order; there is no way to obtain a `Report` that violates this,
/// including through deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ReportRepr")]
pub struct Report {
    entity_name: String,
    sections: Vec<Section>,
}

#[derive(Deserialize)]
struct ReportRepr {
    entity_name: String,
    sections: Vec<Section>,
}

impl TryFrom<ReportRepr> for Report {
    type Error = AccountPlanError;

    fn try_from(repr: ReportRepr) -> Result<Self> {
        Report::new(repr.entity_name, repr.sections)
    }
}

impl Report {
    /// Build a report, rejecting any section list that is not the canonical sequence.
    pub fn new(entity_name: impl Into<String>, sections: Vec<Section>) -> Result<Self> {
        validate_sections(&sections)?;
        Ok(Self {
            entity_name: entity_name.into(),
            sections,
        })
    }

    /// Build a report by computing each canonical section's body in order.
    ///
    /// Infallible: the section list is generated from the canonical sequence.
    pub fn from_bodies(
        entity_name: impl Into<String>,
        mut body_for: impl FnMut(SectionTitle) -> String,
    ) -> Self {
        Self {
            entity_name: entity_name.into(),
            sections: SectionTitle::ALL
                .into_iter()
                .map(|title| Section::new(title, body_for(title)))
                .collect(),
        }
    }

    /// A report where every section carries the placeholder body.
    pub fn empty(entity_name: impl Into<String>) -> Self {
        Self::from_bodies(entity_name, |_| PLACEHOLDER_BODY.to_string())
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, title: SectionTitle) -> &Section {
        &self.sections[title.index()]
    }

    pub fn titles(&self) -> Vec<SectionTitle> {
        self.sections.iter().map(|s| s.title).collect()
    }

    /// Re-check the structural invariant.
    pub fn validate(&self) -> Result<()> {
        validate_sections(&self.sections)
    }

    /// Return a copy with one section body replaced; `self` is left untouched.
    pub fn with_section_body(&self, title: SectionTitle, body: impl Into<String>) -> Self {
        let mut sections = self.sections.clone();
        sections[title.index()].body = body.into();
        Self {
            entity_name: self.entity_name.clone(),
            sections,
        }
    }
}

fn validate_sections(sections: &[Section]) -> Result<()> {
    if sections.len() != SectionTitle::ALL.len() {
        return Err(AccountPlanError::malformed(format!(
            "expected {} sections, found {}",
            SectionTitle::ALL.len(),
            sections.len()
        )));
    }

    for (i, (section, expected)) in sections.iter().zip(SectionTitle::ALL).enumerate() {
        if section.title != expected {
            return Err(AccountPlanError::malformed(format!(
                "section {} is {:?}, expected {:?}",
                i + 1,
                section.title.as_str(),
                expected.as_str()
            )));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// UpdateRequest
// ---------------------------------------------------------------------------

/// A request to replace one section body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    /// Canonical title or an unambiguous alias/fragment of one.
    pub target: String,
    pub new_body: String,
}

impl UpdateRequest {
    pub fn new(target: impl Into<String>, new_body: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            new_body: new_body.into(),
        }
    }
}
