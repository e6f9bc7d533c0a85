//! Fuzzy header resolution.
//!
//! Source spreadsheets name the same column differently across files and
//! vendors ("dealer_code" vs "code" vs "DealerCode"). A [`HeaderRule`] lists
//! candidate spellings for a logical field; this module scores every
//! (header, candidate) pair and resolves each logical field to the
//! best-matching actual header.
//!
//! Resolution never fails here: a `required` rule that matched nothing is
//! simply absent from the returned map, and strict callers (the engine, the
//! CLI) decide fatality. The visual configurator wants partial maps.

use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;

use crate::config::HeaderRule;

/// Match quality between a header and a candidate.
///
/// - 3: case-insensitive, trimmed equality
/// - 2: equality after stripping everything outside `[a-z0-9]`
/// - 1: substring containment either direction, on the normalized or
///   compacted forms
/// - 0: no match
pub fn match_score(header: &str, candidate: &str) -> u8 {
    let h_norm = normalize(header);
    let c_norm = normalize(candidate);
    if c_norm.is_empty() {
        return 0;
    }
    if h_norm == c_norm {
        return 3;
    }

    let h_compact = compact(header);
    let c_compact = compact(candidate);
    if !h_compact.is_empty() && h_compact == c_compact {
        return 2;
    }

    if contains_either(&h_norm, &c_norm) || contains_either(&h_compact, &c_compact) {
        return 1;
    }
    0
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn compact(value: &str) -> String {
    normalize(value)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn contains_either(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(b) || b.contains(a)
}

/// Mapping from logical field name to the resolved header, plus the value
/// lookup that keeps the grouping engine agnostic of header spelling.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    map: HashMap<String, String>,
}

impl HeaderMap {
    /// The header a logical field resolved to, if any candidate matched.
    pub fn resolve(&self, logical: &str) -> Option<&str> {
        self.map.get(logical).map(String::as_str)
    }

    pub fn contains(&self, logical: &str) -> bool {
        self.map.contains_key(logical)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Read a row's value for a logical field: resolve to the actual header,
    /// coerce the cell to a string, trim. Unmapped fields read as "".
    pub fn value(&self, row: &Value, logical: &str) -> String {
        let Some(header) = self.map.get(logical) else {
            return String::new();
        };
        match row.get(header) {
            Some(cell) => cell_to_string(cell).trim().to_string(),
            None => String::new(),
        }
    }
}

/// Stringify a scalar cell. Integral floats render without a trailing `.0`,
/// matching what spreadsheet parsers hand us for whole-number cells.
fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => {
                        format!("{}", f as i64)
                    }
                    Some(f) => f.to_string(),
                    None => String::new(),
                }
            }
        }
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Resolve a header mapping against an explicit, ordered header list.
///
/// Per logical field the highest score wins; ties break to the first header
/// in `headers` order, then the first candidate in its listed order. A
/// score-3 match stops the search for that field.
pub fn resolve_headers_from(
    headers: &[String],
    mapping: &IndexMap<String, HeaderRule>,
) -> HeaderMap {
    let mut map = HashMap::new();

    for (logical, rule) in mapping {
        let mut best_header: Option<&String> = None;
        let mut best_score = 0u8;

        'headers: for header in headers {
            for candidate in &rule.candidates {
                let score = match_score(header, candidate);
                if score > best_score {
                    best_score = score;
                    best_header = Some(header);
                    if score == 3 {
                        break 'headers;
                    }
                }
            }
        }

        if let Some(header) = best_header {
            map.insert(logical.clone(), header.clone());
        }
    }

    HeaderMap { map }
}

/// Resolve a header mapping using the first row's keys as the header
/// universe. With empty `rows` this returns an empty map; callers treat
/// that as the empty-input case, not an error.
pub fn resolve_headers(rows: &[Value], mapping: &IndexMap<String, HeaderRule>) -> HeaderMap {
    let headers: Vec<String> = rows
        .first()
        .and_then(|row| row.as_object())
        .map(|obj| obj.keys().cloned().collect())
        .unwrap_or_default();
    resolve_headers_from(&headers, mapping)
}
