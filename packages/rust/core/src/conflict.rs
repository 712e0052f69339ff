//! Cross-source agreement checks.
//!
//! Groups facts by attribute, then by normalized value. An attribute is
//! conflicting when two or more distinct values were reported for it.

use std::collections::HashMap;

use tracing::{debug, instrument};

use accountplan_shared::{Attribute, ConflictReport, Fact, FactKey, ValueSources};

/// One [`ConflictReport`] per attribute present in `facts`, in the order each
/// attribute was first seen.
///
/// Values within a report are in first-seen order and compare by
/// [`FactValue::key`](accountplan_shared::FactValue::key), so `"Acme"` and
/// `" acme "` count as one value. The first spelling seen is kept.
#[instrument(skip_all, fields(facts = facts.len()))]
pub fn detect(facts: &[Fact]) -> Vec<ConflictReport> {
    let mut reports: Vec<ConflictReport> = Vec::new();
    let mut by_attribute: HashMap<Attribute, usize> = HashMap::new();
    let mut by_value: HashMap<(Attribute, FactKey), usize> = HashMap::new();

    for fact in facts {
        let report_idx = *by_attribute.entry(fact.attribute).or_insert_with(|| {
            reports.push(ConflictReport {
                attribute: fact.attribute,
                values: Vec::new(),
                is_conflicting: false,
                sources: Vec::new(),
            });
            reports.len() - 1
        });
        let report = &mut reports[report_idx];

        let value_idx = *by_value
            .entry((fact.attribute, fact.value.key()))
            .or_insert_with(|| {
                report.values.push(fact.value.clone());
                report.sources.push(ValueSources {
                    value: fact.value.clone(),
                    source_ids: Vec::new(),
                });
                report.values.len() - 1
            });

        let source_ids = &mut report.sources[value_idx].source_ids;
        if !source_ids.contains(&fact.source_id) {
            source_ids.push(fact.source_id.clone());
        }
    }

    for report in &mut reports {
        report.is_conflicting = report.values.len() >= 2;
        if report.is_conflicting {
            debug!(attribute = %report.attribute, values = report.values.len(), "sources disagree");
        }
    }

    reports
}

/// The report for a single attribute, if any fact carries it.
pub fn detect_attribute(facts: &[Fact], attribute: Attribute) -> Option<ConflictReport> {
    let matching: Vec<Fact> = facts
        .iter()
        .filter(|f| f.attribute == attribute)
        .cloned()
        .collect();
    detect(&matching).into_iter().next()
}

pub fn has_conflicts(reports: &[ConflictReport]) -> bool {
    reports.iter().any(|r| r.is_conflicting)
}
