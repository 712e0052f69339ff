//! Scoped section edits on an existing report.
//!
//! An edit names its target loosely ("risks", "## Next Steps", "competition")
//! and replaces exactly one section body. The input report is never touched;
//! every successful edit returns a new [`Report`].

use tracing::{debug, info, instrument};

use accountplan_shared::{
    AccountPlanError, PLACEHOLDER_BODY, Report, Result, SectionTitle, UpdateRequest,
};

/// Informal names that do not appear in any canonical title.
const ALIASES: &[(&str, SectionTitle)] = &[
    ("summary", SectionTitle::CompanyOverview),
    ("about", SectionTitle::CompanyOverview),
    ("background", SectionTitle::CompanyOverview),
    ("history", SectionTitle::CompanyOverview),
    ("offerings", SectionTitle::KeyProductsAndServices),
    ("portfolio", SectionTitle::KeyProductsAndServices),
    ("competition", SectionTitle::IndustryAndMarketPosition),
    ("competitors", SectionTitle::IndustryAndMarketPosition),
    ("competitive landscape", SectionTitle::IndustryAndMarketPosition),
    ("strategy", SectionTitle::RecentNewsAndStrategicMoves),
    ("developments", SectionTitle::RecentNewsAndStrategicMoves),
    ("threats", SectionTitle::KeyChallengesAndRisks),
    ("weaknesses", SectionTitle::KeyChallengesAndRisks),
    ("recommendations", SectionTitle::RecommendedNextSteps),
    ("action items", SectionTitle::RecommendedNextSteps),
    ("actions", SectionTitle::RecommendedNextSteps),
];

/// Resolve a loose section reference to one canonical title.
///
/// Tries a case-insensitive exact match first, then containment in either
/// direction plus the alias table. Zero or several matches yield
/// [`AccountPlanError::SectionNotFound`]; for several, the matching titles are
/// listed as candidates.
pub fn resolve_target(target: &str) -> Result<SectionTitle> {
    let wanted = normalize_target(target);
    if wanted.is_empty() {
        return Err(AccountPlanError::section_not_found(target, Vec::new()));
    }

    if let Some(title) = SectionTitle::from_title(&wanted) {
        return Ok(title);
    }

    let matches: Vec<SectionTitle> = SectionTitle::ALL
        .into_iter()
        .filter(|title| {
            let canonical = title.as_str().to_lowercase();
            canonical.contains(&wanted)
                || wanted.contains(&canonical)
                || ALIASES
                    .iter()
                    .any(|(alias, aliased)| aliased == title && *alias == wanted)
        })
        .collect();

    match matches.as_slice() {
        [single] => {
            debug!(requested = target, resolved = %single, "section target resolved");
            Ok(*single)
        }
        _ => Err(AccountPlanError::section_not_found(
            target,
            matches.iter().map(|t| t.as_str().to_string()).collect(),
        )),
    }
}

/// Lowercase, drop Markdown header marks and a trailing "section".
fn normalize_target(target: &str) -> String {
    let lowered = target.trim().trim_start_matches('#').trim().to_lowercase();
    let stripped = lowered.strip_suffix(" section").unwrap_or(&lowered);
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Replace the body of the section `request.target` resolves to.
///
/// Refuses to operate on a report that violates the seven-section structure.
/// The new body is trimmed; a blank body becomes the placeholder.
#[instrument(skip_all, fields(requested = %request.target))]
pub fn update(report: &Report, request: &UpdateRequest) -> Result<Report> {
    report.validate()?;
    let title = resolve_target(&request.target)?;

    let body = request.new_body.trim();
    let body = if body.is_empty() { PLACEHOLDER_BODY } else { body };

    info!(section = %title, "section updated");
    Ok(report.with_section_body(title, body))
}

/// Convenience form of [`update`].
pub fn apply_update(report: &Report, target: &str, new_body: &str) -> Result<Report> {
    update(report, &UpdateRequest::new(target, new_body))
}

/// Apply an edit to a report in its Markdown form.
pub fn apply_update_markdown(text: &str, target: &str, new_body: &str) -> Result<String> {
    let report = accountplan_markdown::parse(text)?;
    let updated = apply_update(&report, target, new_body)?;
    Ok(accountplan_markdown::render(&updated))
}
