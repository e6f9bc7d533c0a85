//! User-facing configuration and its adaptation to the executable config.
//!
//! Interactive configurators speak in columns ("group by the Province
//! column"), not in logical fields. [`ui_to_transform_config`] translates
//! that shape into a [`TransformConfig`]: it synthesizes stable logical
//! field names, generates header candidates from the literal column name,
//! and wires the last tier's children key to the leaf array.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::GroupLevel as ConfigGroupLevel;
use super::{FieldMap, HeaderRule, LeafConfig, TransformConfig};

/// Output shape selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiMode {
    /// Flat list, groups ignored.
    Flat,
    /// Guided hierarchy.
    Tree,
    /// Hierarchy with per-level key overrides.
    Pro,
}

/// One hierarchy tier, named by columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiGroupLevel {
    /// Human label for the tier.
    #[serde(default)]
    pub name: String,

    /// Column whose value partitions rows at this tier.
    pub key_column: String,

    /// Column copied onto the node as its display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_column: Option<String>,

    /// Column copied onto the node as its code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_column: Option<String>,

    /// Output key holding the child array; defaulted when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_field: Option<String>,

    /// Output key for the name copy (default "name").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_key: Option<String>,

    /// Output key for the code copy (default "code").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_key: Option<String>,

    /// Additional per-group column copies.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_fields: Vec<UiExtraField>,
}

/// An additional column copied once per group node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiExtraField {
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_key: Option<String>,
}

/// One leaf column copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiLeafField {
    pub column: String,
    pub output_key: String,
}

/// Leaf record definition, named by columns and output keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiLeafConfig {
    /// Output key of the leaf array on the deepest tier.
    #[serde(default)]
    pub array_field: String,

    /// Output key whose values must be unique per group-array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedupe_by: Option<String>,

    #[serde(default)]
    pub fields: Vec<UiLeafField>,
}

/// The configuration an interactive surface produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ts_export_name: String,
    pub mode: UiMode,
    #[serde(default)]
    pub groups: Vec<UiGroupLevel>,
    pub leaf: UiLeafConfig,
}

static SLUG_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9]+").unwrap());

fn slugify(value: &str, fallback: &str) -> String {
    let slug = SLUG_SEPARATORS
        .replace_all(value, "_")
        .trim_matches('_')
        .to_lowercase();
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// Candidates generated from a literal column name: the name itself plus
/// its upper/lower-cased variants, de-duplicated, empties dropped.
fn build_candidates(column: &str) -> Vec<String> {
    let mut out = Vec::new();
    for variant in [column.to_string(), column.to_uppercase(), column.to_lowercase()] {
        if !variant.is_empty() && !out.contains(&variant) {
            out.push(variant);
        }
    }
    out
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Column -> logical-name registry with deterministic collision handling.
#[derive(Default)]
struct LogicalRegistry {
    header_mapping: IndexMap<String, HeaderRule>,
    column_to_logical: HashMap<String, String>,
    slug_counter: HashMap<String, usize>,
}

impl LogicalRegistry {
    fn next_logical(&mut self, base: &str) -> String {
        let count = self.slug_counter.entry(base.to_string()).or_insert(0);
        let logical = if *count == 0 {
            base.to_string()
        } else {
            format!("{}_{}", base, count)
        };
        *count += 1;
        logical
    }

    fn register(&mut self, logical: &str, column: &str, required: bool) -> String {
        if !self.header_mapping.contains_key(logical) {
            self.header_mapping.insert(
                logical.to_string(),
                HeaderRule { candidates: build_candidates(column), required },
            );
        }
        self.column_to_logical
            .insert(column.to_string(), logical.to_string());
        logical.to_string()
    }

    /// A column yields the same logical name once registered; otherwise a
    /// new slugified name (disambiguated `_1`, `_2`, …) is minted.
    fn ensure_logical_for_column(&mut self, column: &str, hint: &str, required: bool) -> String {
        if let Some(existing) = self.column_to_logical.get(column) {
            return existing.clone();
        }
        let base = slugify(if hint.is_empty() { column } else { hint }, "col");
        let logical = self.next_logical(&base);
        self.register(&logical, column, required)
    }
}

/// Translate a [`UiConfig`] into the executable [`TransformConfig`].
///
/// `headers` is the sheet's header list; it is only consulted for the
/// flat-mode fallback that keeps degenerate configurations resolvable.
pub fn ui_to_transform_config(ui: &UiConfig, headers: &[String]) -> TransformConfig {
    let mut registry = LogicalRegistry::default();
    let mut output_key_to_logical: HashMap<String, String> = HashMap::new();

    let used_groups: &[UiGroupLevel] = if ui.mode == UiMode::Flat { &[] } else { &ui.groups };
    let leaf_array = if ui.leaf.array_field.is_empty() {
        "items".to_string()
    } else {
        ui.leaf.array_field.clone()
    };

    let group_levels: Vec<ConfigGroupLevel> = used_groups
        .iter()
        .enumerate()
        .map(|(index, group)| {
            let key_field =
                registry.register(&format!("level{}Key", index + 1), &group.key_column, true);
            let name_field = non_empty(&group.label_column)
                .map(|col| registry.register(&format!("level{}Name", index + 1), col, false));
            let code_field = non_empty(&group.code_column)
                .map(|col| registry.register(&format!("level{}Code", index + 1), col, false));

            let children_key = non_empty(&group.children_field)
                .map(String::from)
                .unwrap_or_else(|| {
                    if index == used_groups.len() - 1 {
                        leaf_array.clone()
                    } else {
                        "children".to_string()
                    }
                });

            let extra_fields = group
                .extra_fields
                .iter()
                .enumerate()
                .map(|(extra_index, field)| {
                    let hint = non_empty(&field.output_key)
                        .map(String::from)
                        .or_else(|| {
                            (!field.column.is_empty()).then(|| field.column.clone())
                        })
                        .unwrap_or_else(|| format!("extra_{}", extra_index + 1));
                    let logical = registry.ensure_logical_for_column(
                        &field.column,
                        &format!("level{}_{}", index + 1, hint),
                        true,
                    );
                    FieldMap { from: logical, to: hint }
                })
                .collect();

            ConfigGroupLevel {
                key_field,
                name_field,
                code_field,
                name_key: group.name_key.clone().unwrap_or_else(|| "name".to_string()),
                code_key: group.code_key.clone().unwrap_or_else(|| "code".to_string()),
                children_key,
                node_name: if group.name.is_empty() {
                    format!("Level {}", index + 1)
                } else {
                    group.name.clone()
                },
                extra_fields,
            }
        })
        .collect();

    let leaf_fields: Vec<FieldMap> = ui
        .leaf
        .fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let hint = if !field.output_key.is_empty() {
                field.output_key.clone()
            } else if !field.column.is_empty() {
                field.column.clone()
            } else {
                format!("leaf{}", index + 1)
            };
            let logical = registry.ensure_logical_for_column(
                &field.column,
                &format!("leaf_{}", hint),
                true,
            );
            output_key_to_logical.insert(field.output_key.clone(), logical.clone());
            FieldMap { from: logical, to: field.output_key.clone() }
        })
        .collect();

    let dedupe_by = ui
        .leaf
        .dedupe_by
        .as_ref()
        .and_then(|output_key| output_key_to_logical.get(output_key))
        .cloned();

    // Degenerate flat configs still need candidates for header resolution
    if ui.mode == UiMode::Flat && !headers.is_empty() && registry.header_mapping.is_empty() {
        for (index, header) in headers.iter().enumerate() {
            registry.ensure_logical_for_column(header, &format!("col_{}", index), false);
        }
    }

    TransformConfig {
        name: if ui.name.is_empty() { "output".to_string() } else { ui.name.clone() },
        ts_export_name: if ui.ts_export_name.is_empty() {
            "data".to_string()
        } else {
            ui.ts_export_name.clone()
        },
        header_mapping: registry.header_mapping,
        group_levels,
        leaf: LeafConfig {
            output_key: leaf_array,
            dedupe_by,
            fields: leaf_fields,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ui_leaf_field(column: &str, output_key: &str) -> UiLeafField {
        UiLeafField { column: column.into(), output_key: output_key.into() }
    }

    fn tree_ui() -> UiConfig {
        UiConfig {
            name: "dealers".into(),
            ts_export_name: "dealers".into(),
            mode: UiMode::Tree,
            groups: vec![
                UiGroupLevel {
                    name: "Province".into(),
                    key_column: "Province".into(),
                    label_column: Some("Province Name".into()),
                    code_column: None,
                    children_field: None,
                    name_key: None,
                    code_key: None,
                    extra_fields: vec![],
                },
                UiGroupLevel {
                    name: "City".into(),
                    key_column: "City".into(),
                    label_column: None,
                    code_column: None,
                    children_field: None,
                    name_key: None,
                    code_key: None,
                    extra_fields: vec![],
                },
            ],
            leaf: UiLeafConfig {
                array_field: "dealers".into(),
                dedupe_by: Some("code".into()),
                fields: vec![
                    ui_leaf_field("Dealer Code", "code"),
                    ui_leaf_field("Dealer Name", "name"),
                ],
            },
        }
    }

    #[test]
    fn test_group_levels_get_stable_logical_names() {
        let config = ui_to_transform_config(&tree_ui(), &[]);
        assert_eq!(config.group_levels[0].key_field, "level1Key");
        assert_eq!(config.group_levels[0].name_field.as_deref(), Some("level1Name"));
        assert_eq!(config.group_levels[1].key_field, "level2Key");
        assert!(config.header_mapping["level1Key"].required);
        assert!(!config.header_mapping["level1Name"].required);
    }

    #[test]
    fn test_last_level_children_key_defaults_to_leaf_array() {
        let config = ui_to_transform_config(&tree_ui(), &[]);
        assert_eq!(config.group_levels[0].children_key, "children");
        assert_eq!(config.group_levels[1].children_key, "dealers");
    }

    #[test]
    fn test_candidates_cover_case_variants() {
        let config = ui_to_transform_config(&tree_ui(), &[]);
        let candidates = &config.header_mapping["level1Key"].candidates;
        assert_eq!(candidates, &vec![
            "Province".to_string(),
            "PROVINCE".to_string(),
            "province".to_string(),
        ]);
    }

    #[test]
    fn test_dedupe_by_resolves_output_key_to_logical() {
        let config = ui_to_transform_config(&tree_ui(), &[]);
        assert_eq!(config.leaf.dedupe_by.as_deref(), Some("leaf_code"));
        // the same logical feeds the leaf field
        assert_eq!(config.leaf.fields[0].from, "leaf_code");
        assert_eq!(config.leaf.fields[0].to, "code");
    }

    #[test]
    fn test_column_registered_once_is_reused() {
        let mut ui = tree_ui();
        // leaf references the level-2 key column again
        ui.leaf.fields.push(ui_leaf_field("City", "city"));
        let config = ui_to_transform_config(&ui, &[]);
        let reused = &config.leaf.fields[2];
        assert_eq!(reused.from, "level2Key");
        assert!(config.header_mapping.get("leaf_city").is_none());
    }

    #[test]
    fn test_slug_collision_gets_numeric_suffix() {
        let mut ui = tree_ui();
        ui.leaf.fields = vec![
            ui_leaf_field("Phone (office)", "phone"),
            ui_leaf_field("Phone (mobile)", "phone"),
        ];
        ui.leaf.dedupe_by = None;
        let config = ui_to_transform_config(&ui, &[]);
        assert_eq!(config.leaf.fields[0].from, "leaf_phone");
        assert_eq!(config.leaf.fields[1].from, "leaf_phone_1");
    }

    #[test]
    fn test_flat_mode_ignores_groups() {
        let mut ui = tree_ui();
        ui.mode = UiMode::Flat;
        let config = ui_to_transform_config(&ui, &[]);
        assert!(config.group_levels.is_empty());
        assert!(config.header_mapping.get("level1Key").is_none());
    }

    #[test]
    fn test_flat_fallback_synthesizes_permissive_rules() {
        let ui = UiConfig {
            name: String::new(),
            ts_export_name: String::new(),
            mode: UiMode::Flat,
            groups: vec![],
            leaf: UiLeafConfig { array_field: String::new(), dedupe_by: None, fields: vec![] },
        };
        let headers = vec!["Region".to_string(), "Dealer".to_string()];
        let config = ui_to_transform_config(&ui, &headers);

        assert_eq!(config.header_mapping.len(), 2);
        assert!(config.header_mapping.values().all(|rule| !rule.required));
        assert_eq!(config.name, "output");
        assert_eq!(config.ts_export_name, "data");
        assert_eq!(config.leaf.output_key, "items");
    }

    #[test]
    fn test_extra_fields_map_to_output_keys() {
        let mut ui = tree_ui();
        ui.groups[0].extra_fields = vec![UiExtraField {
            column: "Region Zone".into(),
            output_key: Some("zone".into()),
        }];
        let config = ui_to_transform_config(&ui, &[]);
        let extra = &config.group_levels[0].extra_fields[0];
        assert_eq!(extra.to, "zone");
        assert_eq!(extra.from, "level1_zone");
        assert!(config.header_mapping.contains_key("level1_zone"));
    }
}
