//! Candidate location extraction from free-form model answers.
//!
//! The vision model is asked to answer with a JSON array, but in practice it
//! returns anything from a clean array literal to quoted lists or plain
//! prose. Extraction runs a cascade of strategies ordered by reliability;
//! the first strategy yielding any candidate wins and the rest are skipped.
//! An answer surviving no strategy yields an empty list, which callers treat
//! as "no usable location" rather than an error.

use regex::Regex;
use tracing::debug;

/// Substrings marking an entry as a non-answer rather than a place name.
const EXCLUDED_MARKERS: &[&str] = &["unknown", "insufficient"];

/// Words that make a free-text line look like an address or landmark.
const LOCATION_KEYWORDS: &[&str] = &[
    "street",
    "avenue",
    "road",
    "boulevard",
    "plaza",
    "square",
    "tower",
    "building",
    "mall",
    "center",
    "park",
    "bridge",
];

/// Ordered extraction strategies; first non-empty result wins.
const STRATEGIES: &[(&str, fn(&str) -> Vec<String>)] = &[
    ("json_array", parse_json_array),
    ("bracketed_list", parse_bracketed_list),
    ("quoted_strings", parse_quoted_strings),
    ("keyword_lines", parse_keyword_lines),
];

/// Extract candidate location strings from a raw model answer.
///
/// The returned order reflects extraction confidence (which strategy
/// matched, and position within it), not geographic confidence.
pub fn extract_candidates(raw: &str) -> Vec<String> {
    for (name, strategy) in STRATEGIES {
        let candidates = strategy(raw);
        if !candidates.is_empty() {
            debug!("extracted {} candidate(s) via {}", candidates.len(), name);
            return candidates;
        }
    }
    debug!("no candidates extracted from answer");
    Vec::new()
}

/// Shared entry filter: minimum length plus the non-answer markers.
fn keep(entry: &str, min_len: usize) -> bool {
    let lower = entry.to_lowercase();
    entry.len() > min_len && !EXCLUDED_MARKERS.iter().any(|m| lower.contains(m))
}

/// Strategy 1: the whole answer parses as a JSON array of strings.
fn parse_json_array(raw: &str) -> Vec<String> {
    let Ok(serde_json::Value::Array(entries)) = serde_json::from_str(raw.trim()) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| keep(s, 1))
        .collect()
}

/// Strategy 2: a bracketed list embedded somewhere in the text, split on
/// commas. Entries that themselves contain commas get fragmented here; the
/// JSON strategy above catches well-formed answers before it comes to that.
fn parse_bracketed_list(raw: &str) -> Vec<String> {
    let bracket = Regex::new(r"(?s)\[(.*?)\]").unwrap();
    let Some(capture) = bracket.captures(raw).and_then(|c| c.get(1)) else {
        return Vec::new();
    };

    capture
        .as_str()
        .split(',')
        .map(|s| s.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|s| keep(s, 1))
        .collect()
}

/// Strategy 3: quoted substrings anywhere in the text. Double quotes take
/// priority; single quotes are only consulted when no double-quoted entry
/// survives the filters.
fn parse_quoted_strings(raw: &str) -> Vec<String> {
    let double_quoted = Regex::new(r#""([^"]+)""#).unwrap();
    let single_quoted = Regex::new(r"'([^']+)'").unwrap();

    for pattern in [&double_quoted, &single_quoted] {
        let found: Vec<String> = pattern
            .captures_iter(raw)
            .map(|c| c[1].trim().to_string())
            .filter(|s| keep(s, 2))
            .collect();
        if !found.is_empty() {
            return found;
        }
    }

    Vec::new()
}

/// Strategy 4: heuristic line scan. Keeps lines that look like addresses or
/// landmarks: a location keyword, a digit, or two adjacent capitalized
/// words. The selection rules are an approximation inherited from field use
/// and both under- and over-match on unusual prose.
fn parse_keyword_lines(raw: &str) -> Vec<String> {
    let proper_case = Regex::new(r"[A-Z][a-z]+ [A-Z][a-z]+").unwrap();

    raw.lines()
        .map(str::trim)
        .filter(|line| {
            let lower = line.to_lowercase();
            line.len() > 5
                && !lower.contains("analysis")
                && !lower.contains("cannot")
                && !EXCLUDED_MARKERS.iter().any(|m| lower.contains(m))
                && (LOCATION_KEYWORDS.iter().any(|k| lower.contains(k))
                    || line.chars().any(|c| c.is_ascii_digit())
                    || proper_case.is_match(line))
        })
        .take(3)
        .map(str::to_string)
        .collect()
}
