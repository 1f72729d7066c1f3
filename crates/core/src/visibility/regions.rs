//! Region identity normalization.
//!
//! Upstream providers disagree about region identifiers: legacy aliases
//! (`uk` for `gb`), Eurostat-style codes (`el` for Greece), and
//! geopolitically-contested territories reported under either of two codes.
//! Metrics filed under any of these must land in one canonical bucket, or
//! the same real-world region shows up twice on the dashboard with split
//! numbers.

/// Alias pairs collapsing known-equivalent raw codes into one canonical
/// code. Static configuration: extend the table, never compute it.
const REGION_ALIASES: &[(&str, &str)] = &[
    // Legacy / provider-specific aliases.
    ("uk", "gb"),
    ("gbr", "gb"),
    ("el", "gr"),
    ("usa", "us"),
    // Contested territories reported under either code collapse to a single
    // combined bucket so neither bucket undercounts.
    ("il", "il_ps"),
    ("ps", "il_ps"),
    ("isr", "il_ps"),
    ("pse", "il_ps"),
];

/// Sentinel codes providers emit when a request could not be attributed to
/// any region. These rows are unusable and get dropped by callers.
const UNATTRIBUTABLE: &[&str] = &["zzz", "xx", "unknown"];

/// Map a raw region code to its canonical form.
///
/// Matching is case-insensitive and ignores surrounding whitespace. Returns
/// `None` for empty, sentinel, or malformed input; the caller must skip the
/// record rather than guess a bucket for it.
pub fn normalize(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_lowercase();
    if code.is_empty() || UNATTRIBUTABLE.contains(&code.as_str()) {
        return None;
    }

    if let Some((_, canonical)) = REGION_ALIASES.iter().find(|(alias, _)| *alias == code) {
        return Some((*canonical).to_string());
    }

    // Plain ISO-style codes (two or three ASCII letters) are already
    // canonical. Anything else is malformed.
    if matches!(code.len(), 2 | 3) && code.bytes().all(|b| b.is_ascii_lowercase()) {
        return Some(code);
    }

    None
}
