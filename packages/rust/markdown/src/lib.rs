//! Canonical Markdown form of an account plan.
//!
//! A rendered report is an optional `# Account Plan: <entity>` line followed by
//! the seven `## <title>` headers in canonical order, each followed by its body.
//! [`parse`] reads that form back into a validated [`Report`], so a plan pasted
//! back in by a user goes through the same structural checks as a synthesized one.

mod cleanup;

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use accountplan_shared::{AccountPlanError, PLACEHOLDER_BODY, Report, Result, Section, SectionTitle};

pub use cleanup::normalize_body;

/// Prefix of the document title line.
const TITLE_PREFIX: &str = "Account Plan:";

static H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s+(.+?)\s*#*\s*$").expect("valid regex"));

static H2_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##\s+(.+?)\s*#*\s*$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render a report to its canonical Markdown text.
pub fn render(report: &Report) -> String {
    let mut out = String::new();

    if !report.entity_name().trim().is_empty() {
        out.push_str(&format!("# {TITLE_PREFIX} {}\n\n", report.entity_name().trim()));
    }

    let sections = report.sections();
    for (i, section) in sections.iter().enumerate() {
        out.push_str("## ");
        out.push_str(section.title.as_str());
        out.push('\n');
        out.push_str(&normalize_body(&section.body));
        out.push('\n');
        if i + 1 < sections.len() {
            out.push('\n');
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse canonical Markdown back into a [`Report`].
///
/// Text before the first `##` header other than the title line is ignored.
/// Any `##` header that is not a canonical title, or a header sequence that is
/// not exactly the canonical one, yields [`AccountPlanError::MalformedReport`].
/// Empty bodies are read as the placeholder body.
#[instrument(skip_all, fields(len = text.len()))]
pub fn parse(text: &str) -> Result<Report> {
    let mut entity_name = String::new();
    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<(SectionTitle, Vec<&str>)> = None;

    for (line_no, line) in text.lines().enumerate() {
        if let Some(caps) = H2_RE.captures(line) {
            let heading = &caps[1];
            let title = SectionTitle::from_title(heading).ok_or_else(|| {
                AccountPlanError::malformed(format!(
                    "line {}: unknown section header {heading:?}",
                    line_no + 1
                ))
            })?;

            if let Some((title, lines)) = current.take() {
                sections.push(finish_section(title, &lines));
            }
            current = Some((title, Vec::new()));
            continue;
        }

        match current.as_mut() {
            Some((_, lines)) => lines.push(line),
            None => {
                if let Some(caps) = H1_RE.captures(line) {
                    entity_name = entity_from_title(&caps[1]);
                } else if !line.trim().is_empty() {
                    debug!(line_no = line_no + 1, "ignoring preamble line");
                }
            }
        }
    }

    if let Some((title, lines)) = current.take() {
        sections.push(finish_section(title, &lines));
    }

    if sections.is_empty() {
        return Err(AccountPlanError::malformed("no section headers found"));
    }

    Report::new(entity_name, sections)
}

fn finish_section(title: SectionTitle, lines: &[&str]) -> Section {
    let body = lines.join("\n");
    let body = body.trim();
    if body.is_empty() {
        Section::new(title, PLACEHOLDER_BODY)
    } else {
        Section::new(title, body)
    }
}

fn entity_from_title(title: &str) -> String {
    title
        .strip_prefix(TITLE_PREFIX)
        .unwrap_or(title)
        .trim()
        .to_string()
}
