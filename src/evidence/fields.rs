//! Tolerant field extraction for upstream records with inconsistent naming.
//!
//! Upstream exports disagree on column names and value formatting, so every
//! extraction in the core goes through these small combinators instead of ad
//! hoc chained fallbacks.

use chrono::{DateTime, NaiveDate};
use std::collections::BTreeMap;

/// First non-empty value among several candidate field names.
pub fn first_present<'a>(fields: &'a BTreeMap<String, String>, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .filter_map(|name| fields.get(*name))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}

pub fn first_present_or<'a>(
    fields: &'a BTreeMap<String, String>,
    names: &[&str],
    default: &'a str,
) -> &'a str {
    first_present(fields, names).unwrap_or(default)
}

/// Parse a number out of messy upstream text.
///
/// Strips currency symbols, thousands separators, percent signs, and interior
/// whitespace; a parenthesized value is treated as negative. Returns `None`
/// when nothing numeric remains, so the caller can substitute a default and
/// record the condition.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let negated = trimmed.starts_with('(') && trimmed.ends_with(')');
    let inner = if negated {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    let cleaned: String = inner
        .chars()
        .filter(|ch| !matches!(ch, '$' | '€' | '£' | '¥' | ',' | '%' | ' '))
        .collect();

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(|value| if negated { -value } else { value })
}

/// Parse a calendar date from the formats seen in upstream exports.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    None
}

/// Normalize an upstream header or key into the canonical field-bag form.
pub fn normalize_key(raw: &str) -> String {
    raw.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}
