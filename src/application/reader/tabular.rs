//! Line heuristic for plain-text (ASCII) list reports.
//!
//! List exports such as "List of Accounts" arrive as formatted text, not
//! XML. The rules below recover one name per line and are tied to the
//! gateway's current report layout:
//!
//! - blank lines are skipped
//! - lines starting with `List of`, `Page`, `Total`, `-` or `=` are
//!   headers, footers or rules and are skipped
//! - period headers (`From 1-Apr-2024`, `To 31-Mar-2025`) are skipped
//! - single-character and purely numeric lines are skipped
//! - a trailing amount (`  1234.56`, `  -500.00`, `  1,25,430.50`) is stripped
//! - what remains must be longer than two characters
//! - duplicates collapse, first occurrence wins

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

const SKIP_PREFIXES: [&str; 5] = ["List of", "Page", "Total", "-", "="];

/// Words that open a period header; matched as whole words only.
const PERIOD_WORDS: [&str; 2] = ["From", "To"];

fn strip_trailing_amount(line: &str) -> Cow<'_, str> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    match RE.get_or_init(|| Regex::new(r"\s+[\d,.-]+\s*$").ok()) {
        Some(re) => re.replace(line, ""),
        None => Cow::Borrowed(line),
    }
}

fn is_numeric(line: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    match RE.get_or_init(|| Regex::new(r"^-?[\d,]+(\.\d+)?$").ok()) {
        Some(re) => re.is_match(line),
        None => line.chars().all(|c| c.is_ascii_digit()),
    }
}

fn is_period_header(line: &str) -> bool {
    PERIOD_WORDS.iter().any(|word| {
        line.strip_prefix(word)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t', ':']))
    })
}

/// Extract entry names from a plain-text list report.
#[must_use]
pub fn parse_report_lines(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty()
            || SKIP_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
            || is_period_header(line)
            || line.chars().count() <= 1
            || is_numeric(line)
        {
            continue;
        }

        let name = strip_trailing_amount(line);
        let name = name.trim();
        if name.chars().count() <= 2 {
            continue;
        }
        if seen.insert(name.to_string()) {
            names.push(name.to_string());
        }
    }

    names
}
