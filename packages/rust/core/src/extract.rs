//! Fact extraction from raw source text.
//!
//! Turns one [`RawObservation`] into zero or more typed [`Fact`]s:
//! - founding years: each founding keyword ("founded", "established", ...)
//!   claims the closer of its two neighbouring 4-digit tokens, if that token is
//!   in the configured range and close enough on the same line
//! - a summary: the first paragraph, whitespace-collapsed and length-bounded
//!
//! Every claimed year is emitted. Picking between candidates is the conflict
//! detector's job, not the extractor's.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Match, Regex};
use tracing::{debug, instrument};

use accountplan_shared::{
    AccountPlanError, Attribute, ExtractionRules, Fact, FactValue, RawObservation, Result,
};

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})\b").expect("valid regex"));

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").expect("valid regex"));

/// Extracts typed facts from observations according to [`ExtractionRules`].
#[derive(Debug, Clone)]
pub struct FactExtractor {
    rules: ExtractionRules,
    keyword_re: Regex,
}

impl FactExtractor {
    pub fn new(rules: ExtractionRules) -> Result<Self> {
        let alternatives: Vec<String> = rules
            .founding_keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();

        if alternatives.is_empty() {
            return Err(AccountPlanError::config("no founding keywords configured"));
        }

        let keyword_re = Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))
            .map_err(|e| AccountPlanError::config(format!("invalid founding keyword: {e}")))?;

        Ok(Self { rules, keyword_re })
    }

    /// Extract all facts from one observation.
    ///
    /// Observations that are not `ok`, or carry only whitespace, yield nothing.
    #[instrument(skip_all, fields(source = %observation.source_id, status = %observation.fetch_status))]
    pub fn extract(&self, observation: &RawObservation) -> Vec<Fact> {
        if !observation.fetch_status.is_ok() || observation.raw_text.trim().is_empty() {
            return Vec::new();
        }

        let mut facts = self.founding_years(&observation.raw_text, &observation.source_id);

        if let Some(summary) = self.summary(&observation.raw_text) {
            facts.push(Fact::new(
                Attribute::Summary,
                FactValue::Text(summary),
                &observation.source_id,
            ));
        }

        debug!(facts = facts.len(), "facts extracted");
        facts
    }

    // -----------------------------------------------------------------------
    // Founding year
    // -----------------------------------------------------------------------

    fn founding_years(&self, text: &str, source_id: &str) -> Vec<Fact> {
        let tokens: Vec<Match<'_>> = YEAR_RE
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .collect();
        if tokens.is_empty() {
            return Vec::new();
        }

        // A year sitting between a keyword and a farther year claims the keyword.
        let mut claimed: Vec<(Match<'_>, Match<'_>)> = Vec::new();
        for keyword in self.keyword_re.find_iter(text) {
            let split = tokens.partition_point(|t| t.start() < keyword.end());
            let before = split.checked_sub(1).map(|i| tokens[i]);
            let after = tokens.get(split).copied();

            let nearest = before
                .into_iter()
                .chain(after)
                .filter(|token| self.in_range(token))
                .filter_map(|token| self.gap(text, &keyword, &token).map(|g| (g, token)))
                .min_by_key(|(gap, _)| *gap);

            if let Some((_, token)) = nearest {
                claimed.push((token, keyword));
            }
        }
        claimed.sort_by_key(|(token, keyword)| (token.start(), keyword.start()));

        let mut seen = HashSet::new();
        let mut facts = Vec::new();
        for (token, keyword) in claimed {
            let Ok(year) = token.as_str().parse::<i32>() else {
                continue;
            };
            if seen.insert(year) {
                let start = keyword.start().min(token.start());
                let end = keyword.end().max(token.end());
                facts.push(
                    Fact::new(Attribute::FoundingYear, FactValue::Year(year), source_id)
                        .with_span(&text[start..end]),
                );
            }
        }

        facts
    }

    fn in_range(&self, token: &Match<'_>) -> bool {
        token
            .as_str()
            .parse::<i32>()
            .is_ok_and(|year| (self.rules.min_year..=self.rules.max_year).contains(&year))
    }

    /// Characters between keyword and year, if they are close enough and on
    /// the same line.
    fn gap(&self, text: &str, keyword: &Match<'_>, token: &Match<'_>) -> Option<usize> {
        let between = if keyword.end() <= token.start() {
            &text[keyword.end()..token.start()]
        } else if token.end() <= keyword.start() {
            &text[token.end()..keyword.start()]
        } else {
            return None;
        };

        if between.contains('\n') {
            return None;
        }

        let len = between.chars().count();
        (len <= self.rules.keyword_window).then_some(len)
    }

    // -----------------------------------------------------------------------
    // Summary
    // -----------------------------------------------------------------------

    fn summary(&self, text: &str) -> Option<String> {
        let paragraph = PARAGRAPH_BREAK
            .split(text)
            .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
            .find(|p| !p.is_empty())?;

        Some(truncate_summary(&paragraph, self.rules.summary_max_chars))
    }
}

/// Bound `text` to `max_chars`, preferring to cut after a full sentence.
fn truncate_summary(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };
    let head = &text[..cut];

    let mut sentence_end = None;
    let mut chars = head.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let next_is_space = match chars.peek() {
            Some((_, next)) => next.is_whitespace(),
            None => text[cut..].starts_with(char::is_whitespace),
        };
        if matches!(c, '.' | '!' | '?') && next_is_space {
            sentence_end = Some(i + c.len_utf8());
        }
    }

    if let Some(end) = sentence_end {
        return head[..end].to_string();
    }

    match head.rfind(char::is_whitespace) {
        Some(ws) if ws > 0 => format!("{}...", head[..ws].trim_end()),
        _ => format!("{head}..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accountplan_shared::FetchStatus;

    fn rules() -> ExtractionRules {
        ExtractionRules {
            min_year: 1600,
            max_year: 2025,
            keyword_window: 60,
            summary_max_chars: 600,
            founding_keywords: vec![
                "founded".into(),
                "established".into(),
                "incorporated".into(),
            ],
        }
    }

    fn extractor() -> FactExtractor {
        FactExtractor::new(rules()).expect("valid rules")
    }

    fn years(facts: &[Fact]) -> Vec<i32> {
        facts
            .iter()
            .filter_map(|f| match (&f.attribute, &f.value) {
                (Attribute::FoundingYear, FactValue::Year(y)) => Some(*y),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn extracts_year_near_keyword() {
        let obs = RawObservation::ok(
            "wikipedia",
            "Microsoft",
            "Microsoft Corporation is an American technology company. It was founded by \
             Bill Gates and Paul Allen on April 4, 1975, to develop BASIC interpreters.",
        );
        let facts = extractor().extract(&obs);

        assert_eq!(years(&facts), vec![1975]);
        let year_fact = &facts[0];
        assert_eq!(year_fact.source_id, "wikipedia");
        let span = year_fact.raw_span.as_deref().expect("span");
        assert!(span.starts_with("founded"));
        assert!(span.ends_with("1975"));
    }

    #[test]
    fn keyword_may_follow_the_year() {
        let obs = RawObservation::ok("notes", "Acme", "In 1921 the firm was incorporated in Delaware.");
        assert_eq!(years(&extractor().extract(&obs)), vec![1921]);
    }

    #[test]
    fn emits_every_qualifying_year_once() {
        let obs = RawObservation::ok(
            "duckduckgo",
            "Acme",
            "Acme was founded in 1975 and incorporated in 1981. Founded 1975, it grew fast.",
        );
        assert_eq!(years(&extractor().extract(&obs)), vec![1975, 1981]);
    }

    #[test]
    fn later_year_in_the_same_sentence_is_not_a_founding_year() {
        let obs = RawObservation::ok(
            "wikipedia",
            "Acme",
            "The company was founded in 1975 and went public in 1986.",
        );
        let facts = extractor().extract(&obs);
        assert_eq!(years(&facts), vec![1975]);
        let report = crate::conflict::detect_attribute(&facts, Attribute::FoundingYear)
            .expect("founding year reported");
        assert!(!report.is_conflicting);
    }

    #[test]
    fn keyword_claims_the_closer_neighbouring_year() {
        let obs = RawObservation::ok("notes", "Acme", "In 1970 the firm was founded in 1975.");
        assert_eq!(years(&extractor().extract(&obs)), vec![1975]);
    }

    #[test]
    fn ignores_years_out_of_range_or_far_from_keywords() {
        let obs = RawObservation::ok(
            "wikipedia",
            "Acme",
            "The town was founded in 1492 by settlers who came from across the sea seeking \
             fortune and farmland. The company's revenue passed a billion dollars in 2010.",
        );
        assert!(years(&extractor().extract(&obs)).is_empty());

        let obs = RawObservation::ok("wikipedia", "Acme", "Established in 2999 by time travellers.");
        assert!(years(&extractor().extract(&obs)).is_empty());
    }

    #[test]
    fn does_not_cross_line_breaks() {
        let obs = RawObservation::ok("notes", "Acme", "Founded by two engineers\n1999 was a good year");
        assert!(years(&extractor().extract(&obs)).is_empty());
    }

    #[test]
    fn keyword_match_is_case_insensitive_and_whole_word() {
        let obs = RawObservation::ok("notes", "Acme", "ESTABLISHED 1888 in Ohio.");
        assert_eq!(years(&extractor().extract(&obs)), vec![1888]);

        let obs = RawObservation::ok("notes", "Acme", "The unfounded rumour dates from 1950.");
        assert!(years(&extractor().extract(&obs)).is_empty());
    }

    #[test]
    fn summary_is_first_paragraph_collapsed() {
        let obs = RawObservation::ok(
            "wikipedia",
            "Acme",
            "\n\nAcme   Corporation makes\nanvils.\n\nSecond paragraph here.",
        );
        let facts = extractor().extract(&obs);
        let summary = facts
            .iter()
            .find(|f| f.attribute == Attribute::Summary)
            .expect("summary fact");
        assert_eq!(summary.value, FactValue::Text("Acme Corporation makes anvils.".into()));
        assert!(summary.raw_span.is_none());
    }

    #[test]
    fn failed_or_blank_observation_yields_nothing() {
        let failed = RawObservation::failed("wikipedia", "Acme", FetchStatus::Timeout);
        assert!(extractor().extract(&failed).is_empty());

        let blank = RawObservation::ok("wikipedia", "Acme", "   \n  ");
        assert!(extractor().extract(&blank).is_empty());
    }

    #[test]
    fn ok_observation_always_has_a_summary() {
        let obs = RawObservation::ok("duckduckgo", "Acme", "Acme is a company.");
        let facts = extractor().extract(&obs);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].attribute, Attribute::Summary);
    }

    #[test]
    fn truncation_prefers_sentence_boundary() {
        let text = "First sentence is here. Second sentence runs on for a while longer.";
        assert_eq!(truncate_summary(text, 40), "First sentence is here.");
        assert_eq!(truncate_summary("short", 40), "short");
    }

    #[test]
    fn truncation_falls_back_to_word_boundary() {
        let text = "one two three four five six seven";
        assert_eq!(truncate_summary(text, 12), "one two...");
    }

    #[test]
    fn truncation_respects_multibyte_chars() {
        let text = "Nestlé société anonyme fabrique des produits alimentaires";
        let out = truncate_summary(text, 10);
        assert_eq!(out, "Nestlé...");
    }

    #[test]
    fn rejects_empty_keyword_list() {
        let mut rules = rules();
        rules.founding_keywords = vec!["  ".into()];
        assert!(FactExtractor::new(rules).is_err());
    }
}
