//! Config-driven grouping engine.
//!
//! Folds rows into a flat list or a nested tree:
//!
//! ```text
//! Rows (flat)                        Tree (grouped by province, city)
//! ┌──────────────────────────┐       ┌───────────────────────────────┐
//! │ prov: A, city: X, d: 1   │       │ A ─ cities: [ X ─ dealers:    │
//! │ prov: A, city: X, d: 2   │  →    │                 [1, 2] ]      │
//! │ prov: B, city: Y, d: 3   │       │ B ─ cities: [ Y ─ dealers:    │
//! └──────────────────────────┘       │                 [3] ]         │
//!                                    └───────────────────────────────┘
//! ```
//!
//! The build pass folds rows into insertion-ordered maps of [`GroupNode`]s;
//! a separate linearization pass converts every map into a plain array,
//! preserving first-seen key order. Build-time state (the child maps, the
//! dedupe sets) never appears in the emitted records.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

use super::headers::{resolve_headers, HeaderMap};
use crate::config::{GroupLevel, TransformConfig};
use crate::error::{TransformError, TransformResult};

/// Aggregate statistics for one transform run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformStats {
    /// Rows in the input.
    pub total_rows: usize,
    /// Rows that passed grouping (every level key non-empty).
    pub used_rows: usize,
    /// Rows excluded because a group key was empty.
    pub skipped_rows: usize,
    /// Group nodes per level, outermost first. Empty in flat mode.
    pub group_counts: Vec<usize>,
    /// Leaf records present in the output.
    pub leaf_count: usize,
}

impl TransformStats {
    fn empty() -> Self {
        Self {
            total_rows: 0,
            used_rows: 0,
            skipped_rows: 0,
            group_counts: Vec::new(),
            leaf_count: 0,
        }
    }
}

/// Transformed data plus its statistics.
#[derive(Debug, Clone, Serialize)]
pub struct TransformOutput {
    /// Flat array of leaf records, or nested array-of-objects tree.
    pub data: Value,
    pub stats: TransformStats,
}

/// Build-time group node. Owned exclusively by the engine for the duration
/// of one call; linearization consumes it into the output tree.
struct GroupNode {
    /// name/code/extra outputs, in configured insertion order.
    fields: Map<String, Value>,
    body: NodeBody,
}

enum NodeBody {
    /// Non-terminal level: insertion-ordered children keyed by group value.
    Branch(IndexMap<String, GroupNode>),
    /// Deepest level: leaf records plus the transient dedupe set.
    Terminal {
        leaves: Vec<Value>,
        seen: Option<HashSet<String>>,
    },
}

impl GroupNode {
    fn new(terminal: bool, dedupe: bool) -> Self {
        let body = if terminal {
            NodeBody::Terminal {
                leaves: Vec::new(),
                seen: dedupe.then(HashSet::new),
            }
        } else {
            NodeBody::Branch(IndexMap::new())
        };
        Self { fields: Map::new(), body }
    }
}

/// Run the transform described by `config` over `rows`.
///
/// Empty `rows` is not an error: header resolution is skipped entirely and
/// an empty result with all-zero stats comes back. A `required` logical
/// field with no matching header fails with a descriptive
/// [`TransformError::HeaderNotFound`]; the error is catchable and leaves no
/// state behind, so callers can keep processing other sheets.
pub fn transform(
    rows: &[Value],
    config: &TransformConfig,
) -> TransformResult<TransformOutput> {
    if rows.is_empty() {
        return Ok(TransformOutput {
            data: Value::Array(Vec::new()),
            stats: TransformStats::empty(),
        });
    }

    let header_map = resolve_headers(rows, &config.header_mapping);
    check_required(rows, config, &header_map)?;

    if config.is_flat() {
        Ok(transform_flat(rows, config, &header_map))
    } else {
        Ok(transform_grouped(rows, config, &header_map))
    }
}

fn check_required(
    rows: &[Value],
    config: &TransformConfig,
    header_map: &HeaderMap,
) -> TransformResult<()> {
    for (field, rule) in config.required_fields() {
        if !header_map.contains(field) {
            let headers = rows
                .first()
                .and_then(|row| row.as_object())
                .map(|obj| obj.keys().cloned().collect())
                .unwrap_or_default();
            return Err(TransformError::HeaderNotFound {
                field: field.to_string(),
                candidates: rule.candidates.clone(),
                headers,
            });
        }
    }
    Ok(())
}

fn transform_flat(rows: &[Value], config: &TransformConfig, headers: &HeaderMap) -> TransformOutput {
    let list: Vec<Value> = rows
        .iter()
        .map(|row| build_leaf(row, config, headers))
        .collect();

    let stats = TransformStats {
        total_rows: rows.len(),
        used_rows: rows.len(),
        skipped_rows: 0,
        group_counts: Vec::new(),
        leaf_count: list.len(),
    };
    TransformOutput { data: Value::Array(list), stats }
}

fn transform_grouped(
    rows: &[Value],
    config: &TransformConfig,
    headers: &HeaderMap,
) -> TransformOutput {
    let levels = &config.group_levels;
    let mut root: IndexMap<String, GroupNode> = IndexMap::new();
    let mut used_rows = 0;
    let mut skipped_rows = 0;

    for row in rows {
        if insert_row(&mut root, row, levels, config, headers) {
            used_rows += 1;
        } else {
            skipped_rows += 1;
        }
    }

    let mut group_counts = vec![0usize; levels.len()];
    let mut leaf_count = 0usize;
    let tree = linearize(root, levels, 0, config, &mut group_counts, &mut leaf_count);

    let stats = TransformStats {
        total_rows: rows.len(),
        used_rows,
        skipped_rows,
        group_counts,
        leaf_count,
    };
    TransformOutput { data: Value::Array(tree), stats }
}

/// Walk the row down the level hierarchy, creating or reusing one node per
/// level, and append its leaf record at the terminal node. Returns false if
/// a level key is empty; nodes created for the valid prefix remain (partial
/// grouping is visible).
fn insert_row(
    root: &mut IndexMap<String, GroupNode>,
    row: &Value,
    levels: &[GroupLevel],
    config: &TransformConfig,
    headers: &HeaderMap,
) -> bool {
    let last = levels.len() - 1;
    let mut current = root;

    for (i, level) in levels.iter().enumerate() {
        let key = headers.value(row, &level.key_field);
        if key.is_empty() {
            return false;
        }

        let node = current
            .entry(key)
            .or_insert_with(|| GroupNode::new(i == last, config.leaf.dedupe_by.is_some()));
        backfill(node, level, row, headers);

        match &mut node.body {
            NodeBody::Branch(children) => current = children,
            NodeBody::Terminal { leaves, seen } => {
                if let (Some(dedupe_field), Some(seen)) = (&config.leaf.dedupe_by, seen.as_mut()) {
                    let dedupe_key = headers.value(row, dedupe_field);
                    if !seen.insert(dedupe_key) {
                        // duplicate leaf dropped; the row still counts as used
                        return true;
                    }
                }
                leaves.push(build_leaf(row, config, headers));
                // Terminal nodes exist only at the last level, so this is
                // always the final iteration; returning here is equivalent to
                // falling through to the trailing `true`.
                return true;
            }
        }
    }
    true
}

/// First-non-empty-wins population of name/code/extra outputs, applied on
/// every visit so later rows fill what earlier rows left blank.
fn backfill(node: &mut GroupNode, level: &GroupLevel, row: &Value, headers: &HeaderMap) {
    if let Some(name_field) = &level.name_field {
        fill_if_empty(&mut node.fields, &level.name_key, headers.value(row, name_field));
    }
    if let Some(code_field) = &level.code_field {
        fill_if_empty(&mut node.fields, &level.code_key, headers.value(row, code_field));
    }
    for extra in &level.extra_fields {
        fill_if_empty(&mut node.fields, &extra.to, headers.value(row, &extra.from));
    }
}

fn fill_if_empty(fields: &mut Map<String, Value>, key: &str, value: String) {
    let is_empty = match fields.get(key) {
        None => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    };
    if is_empty {
        fields.insert(key.to_string(), Value::String(value));
    }
}

fn build_leaf(row: &Value, config: &TransformConfig, headers: &HeaderMap) -> Value {
    let mut obj = Map::new();
    for field in &config.leaf.fields {
        obj.insert(field.to.clone(), Value::String(headers.value(row, &field.from)));
    }
    Value::Object(obj)
}

/// Convert every child-map into an array of node objects in insertion
/// order, depth-first, accumulating per-level node counts and the leaf
/// total. Dedupe sets are dropped here, never emitted.
fn linearize(
    map: IndexMap<String, GroupNode>,
    levels: &[GroupLevel],
    level_index: usize,
    config: &TransformConfig,
    group_counts: &mut Vec<usize>,
    leaf_count: &mut usize,
) -> Vec<Value> {
    let mut arr = Vec::with_capacity(map.len());

    for (_, node) in map {
        group_counts[level_index] += 1;
        let mut obj = node.fields;

        match node.body {
            NodeBody::Branch(children) => {
                let child_arr =
                    linearize(children, levels, level_index + 1, config, group_counts, leaf_count);
                obj.insert(
                    levels[level_index].children_key.clone(),
                    Value::Array(child_arr),
                );
            }
            NodeBody::Terminal { leaves, .. } => {
                *leaf_count += leaves.len();
                obj.insert(config.leaf.output_key.clone(), Value::Array(leaves));
            }
        }

        arr.push(Value::Object(obj));
    }
    arr
}
