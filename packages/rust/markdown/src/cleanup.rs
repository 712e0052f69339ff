//! Cleanup passes applied to section bodies before rendering.
//!
//! Each cleanup pass is a function `&str -> String` applied in sequence.
//! The result never contains a line that would parse as a report header.

use std::sync::LazyLock;

use regex::Regex;

/// Normalize a section body for embedding under a `##` header.
pub fn normalize_body(body: &str) -> String {
    let mut result = body.to_string();

    result = strip_trailing_whitespace(&result);
    result = demote_headings(&result);
    result = clean_blank_lines(&result);

    result.trim().to_string()
}

// ---------------------------------------------------------------------------
// Pass 1: Trailing whitespace
// ---------------------------------------------------------------------------

fn strip_trailing_whitespace(md: &str) -> String {
    md.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}

// ---------------------------------------------------------------------------
// Pass 2: Demote H1/H2
// ---------------------------------------------------------------------------

/// Body headings must sit below the section header level.
fn demote_headings(md: &str) -> String {
    static TOP_HEADING_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^#{1,2}\s+(.*)$").expect("valid regex"));

    md.lines()
        .map(|line| match TOP_HEADING_RE.captures(line) {
            Some(caps) => format!("### {}", &caps[1]),
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Pass 3: Blank lines
// ---------------------------------------------------------------------------

/// Collapse runs of blank lines to a single blank line.
fn clean_blank_lines(md: &str) -> String {
    static MULTI_BLANK: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    MULTI_BLANK.replace_all(md, "\n\n").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demotes_top_level_headings() {
        assert_eq!(demote_headings("# Title\n## Sub\n### Keep"), "### Title\n### Sub\n### Keep");
        assert_eq!(demote_headings("#hashtag stays"), "#hashtag stays");
    }

    #[test]
    fn collapses_blank_runs() {
        assert_eq!(clean_blank_lines("a\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn normalize_is_stable() {
        let body = "  Intro line   \n\n\n\n## Heading\n- bullet  \n";
        let once = normalize_body(body);
        assert_eq!(once, "Intro line\n\n### Heading\n- bullet");
        assert_eq!(normalize_body(&once), once);
    }
}
