//! Plan synthesis: facts and conflict reports in, seven-section [`Report`] out.
//!
//! Section bodies are built deterministically:
//! - Company Overview carries the founding year (or an explicit disagreement
//!   note) followed by each distinct summary with its sources.
//! - Themed sections collect summary sentences routed by a keyword table.
//! - Recommended Next Steps asks for verification of every conflicting
//!   non-summary attribute.
//!
//! Any section left without material gets [`PLACEHOLDER_BODY`].

use std::collections::HashSet;

use tracing::{debug, instrument};

use accountplan_shared::{
    Attribute, ConflictReport, Fact, PLACEHOLDER_BODY, Report, SectionTitle, ValueSources,
};

use crate::conflict::detect;

/// Stems routing summary sentences into themed sections.
///
/// A sentence token matches a stem when equal to it, or when the stem has at
/// least four characters and the token starts with it.
const PRODUCT_KEYWORDS: &[&str] = &[
    "product", "service", "software", "hardware", "platform", "brand", "device",
    "manufactur", "develop", "offer", "sell", "make", "makes", "produc", "solution", "cloud",
];

const INDUSTRY_KEYWORDS: &[&str] = &[
    "industry", "market", "leader", "leading", "largest", "biggest", "dominant", "sector",
    "compet", "rival", "share", "rank", "multinational", "worldwide", "global",
];

const NEWS_KEYWORDS: &[&str] = &[
    "announc", "acqui", "merger", "merged", "launch", "partner", "recent", "expan", "invest",
    "deal", "agreement", "spin", "ipo",
];

const CHALLENGE_KEYWORDS: &[&str] = &[
    "risk", "challeng", "lawsuit", "antitrust", "regulat", "fine", "fined", "decline", "loss",
    "losses", "controvers", "critic", "layoff", "debt", "investigat", "scandal", "bankrupt",
];

const OPPORTUNITY_KEYWORDS: &[&str] = &[
    "growth", "grow", "growing", "opportunit", "emerging", "innovat", "demand", "potential",
    "future", "transform", "digital", "ai", "artificial", "sustainab",
];

/// Build the canonical report for `entity_name`.
///
/// `conflicts` is normally the output of [`detect`](crate::detect) over the
/// same `facts`. An attribute present in `facts` but missing from `conflicts`
/// is grouped on the fly, so the report never drops evidence. Every section,
/// Recommended Next Steps included, reads the same merged reports.
#[instrument(skip(facts, conflicts), fields(facts = facts.len(), conflicts = conflicts.len()))]
pub fn synthesize(entity_name: &str, facts: &[Fact], conflicts: &[ConflictReport]) -> Report {
    let reports = merged_reports(facts, conflicts);
    let founding = reports.iter().find(|r| r.attribute == Attribute::FoundingYear);
    let summary_values = reports
        .iter()
        .find(|r| r.attribute == Attribute::Summary)
        .map(|r| r.sources.as_slice())
        .unwrap_or_default();

    let report = Report::from_bodies(entity_name.trim(), |title| {
        let body = match title {
            SectionTitle::CompanyOverview => overview(founding, summary_values),
            SectionTitle::KeyProductsAndServices => themed(summary_values, PRODUCT_KEYWORDS),
            SectionTitle::IndustryAndMarketPosition => themed(summary_values, INDUSTRY_KEYWORDS),
            SectionTitle::RecentNewsAndStrategicMoves => themed(summary_values, NEWS_KEYWORDS),
            SectionTitle::KeyChallengesAndRisks => themed(summary_values, CHALLENGE_KEYWORDS),
            SectionTitle::OpportunitiesForOurCompany => themed(summary_values, OPPORTUNITY_KEYWORDS),
            SectionTitle::RecommendedNextSteps => next_steps(&reports),
        };
        body.unwrap_or_else(|| PLACEHOLDER_BODY.to_string())
    });

    let filled = report.sections().iter().filter(|s| !s.is_placeholder()).count();
    debug!(filled, "report synthesized");
    report
}

/// Supplied reports first, then any attribute only present in `facts`.
fn merged_reports(facts: &[Fact], conflicts: &[ConflictReport]) -> Vec<ConflictReport> {
    let mut reports = conflicts.to_vec();
    for derived in detect(facts) {
        if !reports.iter().any(|r| r.attribute == derived.attribute) {
            reports.push(derived);
        }
    }
    reports
}

// ---------------------------------------------------------------------------
// Section bodies
// ---------------------------------------------------------------------------

fn overview(founding: Option<&ConflictReport>, summaries: &[ValueSources]) -> Option<String> {
    let mut paragraphs = Vec::new();

    if let Some(report) = founding.filter(|r| !r.sources.is_empty()) {
        if report.is_conflicting {
            paragraphs.push(format!(
                "**Note:** Sources disagree on the {}: {}.",
                Attribute::FoundingYear.label(),
                report.describe()
            ));
        } else {
            let entry = &report.sources[0];
            paragraphs.push(format!("Founded in {} {}.", entry.value, attribution(&entry.source_ids)));
        }
    }

    for entry in summaries {
        paragraphs.push(format!("{} {}", entry.value, attribution(&entry.source_ids)));
    }

    (!paragraphs.is_empty()).then(|| paragraphs.join("\n\n"))
}

fn themed(summaries: &[ValueSources], keywords: &[&str]) -> Option<String> {
    let mut seen = HashSet::new();
    let mut bullets = Vec::new();

    for entry in summaries {
        let text = entry.value.to_string();
        for sentence in sentences(&text) {
            if !mentions_any(sentence, keywords) {
                continue;
            }
            if seen.insert(sentence.to_lowercase()) {
                bullets.push(format!("- {sentence} {}", attribution(&entry.source_ids)));
            }
        }
    }

    (!bullets.is_empty()).then(|| bullets.join("\n"))
}

fn next_steps(conflicts: &[ConflictReport]) -> Option<String> {
    let bullets: Vec<String> = conflicts
        .iter()
        .filter(|r| r.is_conflicting && r.attribute != Attribute::Summary)
        .map(|r| {
            format!(
                "- Verify the {} with a primary source; reported values: {}.",
                r.attribute.label(),
                r.describe()
            )
        })
        .collect();

    (!bullets.is_empty()).then(|| bullets.join("\n"))
}

fn attribution(source_ids: &[String]) -> String {
    match source_ids {
        [single] => format!("(source: {single})"),
        many => format!("(sources: {})", many.join(", ")),
    }
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

/// Split prose at `.`, `!` or `?` followed by whitespace and an uppercase letter.
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let chars: Vec<(usize, char)> = text.char_indices().collect();

    for (pos, &(i, c)) in chars.iter().enumerate() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let mut next = pos + 1;
        while chars.get(next).is_some_and(|(_, ch)| ch.is_whitespace()) {
            next += 1;
        }
        let saw_space = next > pos + 1;
        let capital_follows = chars.get(next).is_some_and(|(_, ch)| ch.is_uppercase());
        if saw_space && capital_follows {
            let end = i + c.len_utf8();
            push_trimmed(&mut out, &text[start..end]);
            start = chars[next].0;
        }
    }

    push_trimmed(&mut out, &text[start..]);
    out
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, piece: &'a str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        out.push(piece);
    }
}

fn mentions_any(sentence: &str, keywords: &[&str]) -> bool {
    sentence
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .any(|token| {
            keywords
                .iter()
                .any(|k| token == *k || (k.len() >= 4 && token.starts_with(k)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::detect;
    use accountplan_shared::FactValue;

    fn year(value: i32, source: &str) -> Fact {
        Fact::new(Attribute::FoundingYear, FactValue::Year(value), source)
    }

    fn summary(text: &str, source: &str) -> Fact {
        Fact::new(Attribute::Summary, FactValue::Text(text.into()), source)
    }

    fn build(facts: &[Fact]) -> Report {
        synthesize("Acme", facts, &detect(facts))
    }

    #[test]
    fn no_facts_gives_all_placeholders() {
        let report = synthesize("Acme", &[], &[]);
        assert_eq!(report, Report::empty("Acme"));
        assert_eq!(report.titles(), SectionTitle::ALL.to_vec());
    }

    #[test]
    fn conflicting_years_are_named_with_sources() {
        let report = build(&[year(1975, "wikipedia"), year(1980, "duckduckgo")]);
        let overview = &report.section(SectionTitle::CompanyOverview).body;

        assert!(overview.contains("Sources disagree on the founding year"));
        assert!(overview.contains("1975 (wikipedia)"));
        assert!(overview.contains("1980 (duckduckgo)"));

        let next = &report.section(SectionTitle::RecommendedNextSteps).body;
        assert!(next.starts_with("- Verify the founding year"));
        assert!(next.contains("1975 (wikipedia); 1980 (duckduckgo)"));
    }

    #[test]
    fn agreeing_year_is_stated_once() {
        let report = build(&[year(1975, "wikipedia"), year(1975, "duckduckgo")]);
        let overview = &report.section(SectionTitle::CompanyOverview).body;
        assert_eq!(overview, "Founded in 1975 (sources: wikipedia, duckduckgo).");
        assert!(report.section(SectionTitle::RecommendedNextSteps).is_placeholder());
    }

    #[test]
    fn summaries_feed_overview_and_themed_sections() {
        let report = build(&[summary(
            "Acme Corporation is the largest anvil maker in the market. It sells products \
             worldwide. Acme recently announced the acquisition of Roadrunner Ltd. The firm \
             faces an antitrust lawsuit.",
            "wikipedia",
        )]);

        let overview = &report.section(SectionTitle::CompanyOverview).body;
        assert!(overview.starts_with("Acme Corporation is the largest"));
        assert!(overview.ends_with("(source: wikipedia)"));

        let products = &report.section(SectionTitle::KeyProductsAndServices).body;
        assert!(products.contains("- It sells products worldwide. (source: wikipedia)"));

        let industry = &report.section(SectionTitle::IndustryAndMarketPosition).body;
        assert!(industry.contains("largest anvil maker in the market"));

        let news = &report.section(SectionTitle::RecentNewsAndStrategicMoves).body;
        assert!(news.contains("acquisition of Roadrunner Ltd."));

        let risks = &report.section(SectionTitle::KeyChallengesAndRisks).body;
        assert_eq!(risks, "- The firm faces an antitrust lawsuit. (source: wikipedia)");

        assert!(report.section(SectionTitle::OpportunitiesForOurCompany).is_placeholder());
        assert!(report.section(SectionTitle::RecommendedNextSteps).is_placeholder());
    }

    #[test]
    fn themed_bullets_are_deduplicated() {
        let report = build(&[
            summary("Acme sells anvils. Acme is old.", "wikipedia"),
            summary("acme sells anvils. Acme is big.", "duckduckgo"),
        ]);
        let products = &report.section(SectionTitle::KeyProductsAndServices).body;
        assert_eq!(products.lines().count(), 1);
    }

    #[test]
    fn summary_disagreement_is_not_a_next_step() {
        let report = build(&[
            summary("Acme makes anvils.", "wikipedia"),
            summary("Acme makes rockets.", "duckduckgo"),
        ]);
        let overview = &report.section(SectionTitle::CompanyOverview).body;
        assert!(overview.contains("Acme makes anvils. (source: wikipedia)"));
        assert!(overview.contains("Acme makes rockets. (source: duckduckgo)"));
        assert!(report.section(SectionTitle::RecommendedNextSteps).is_placeholder());
    }

    #[test]
    fn missing_conflict_reports_are_derived_from_facts() {
        let facts = [year(1921, "notes")];
        let report = synthesize("Acme", &facts, &[]);
        assert_eq!(
            report.section(SectionTitle::CompanyOverview).body,
            "Founded in 1921 (source: notes)."
        );
    }

    #[test]
    fn next_steps_use_derived_reports_too() {
        let facts = [year(1975, "wikipedia"), year(1980, "duckduckgo")];
        let report = synthesize("Acme", &facts, &[]);

        assert!(
            report
                .section(SectionTitle::CompanyOverview)
                .body
                .starts_with("**Note:** Sources disagree")
        );
        let next = &report.section(SectionTitle::RecommendedNextSteps).body;
        assert!(next.starts_with("- Verify the founding year"), "{next}");
        assert!(next.contains("1975") && next.contains("1980"));
    }

    #[test]
    fn sentence_splitting() {
        assert_eq!(
            sentences("Acme Inc. was founded by J. Smith. It grew! Why? because."),
            vec!["Acme Inc. was founded by J.", "Smith.", "It grew!", "Why? because."]
        );
        assert!(sentences("   ").is_empty());
    }

    #[test]
    fn keyword_matching_uses_stems() {
        assert!(mentions_any("Leading manufacturer of widgets", PRODUCT_KEYWORDS));
        assert!(mentions_any("It invests in AI.", OPPORTUNITY_KEYWORDS));
        assert!(!mentions_any("Aim high.", OPPORTUNITY_KEYWORDS));
    }
}
