//! Transform configuration definition.
//!
//! A [`TransformConfig`] declares how rows from a spreadsheet become a flat
//! list or a nested tree: which logical fields exist and which header
//! candidates resolve them, how rows are grouped level by level, and which
//! columns end up in each leaf record.

pub mod codegen;
pub mod ui;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};

/// Declares that a logical field resolves to whichever header best matches
/// one of `candidates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderRule {
    /// Literal header strings (or close variants) to try, in order.
    pub candidates: Vec<String>,

    /// Whether resolution failure is fatal for strict callers.
    #[serde(default)]
    pub required: bool,
}

impl HeaderRule {
    pub fn new(candidates: Vec<String>) -> Self {
        Self { candidates, required: false }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Copies one logical field's value to an output key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMap {
    /// Logical field to read.
    pub from: String,
    /// Output key to write.
    pub to: String,
}

impl FieldMap {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { from: from.into(), to: to.into() }
    }
}

/// One tier of the output hierarchy, keyed by a logical field's value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupLevel {
    /// Logical field whose value partitions rows at this level.
    /// Rows with an empty value here are excluded from the tree.
    pub key_field: String,

    /// Logical field copied onto the group node under `name_key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_field: Option<String>,

    /// Logical field copied onto the group node under `code_key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_field: Option<String>,

    /// Output key for the name copy.
    #[serde(default = "default_name_key")]
    pub name_key: String,

    /// Output key for the code copy.
    #[serde(default = "default_code_key")]
    pub code_key: String,

    /// Output key holding the child-level array. Irrelevant on the last level.
    #[serde(default = "default_children_key")]
    pub children_key: String,

    /// Human label used in statistics output, not part of the data.
    #[serde(default)]
    pub node_name: String,

    /// Additional logical-field copies applied once per group,
    /// first-non-empty-wins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_fields: Vec<FieldMap>,
}

fn default_name_key() -> String {
    "name".to_string()
}

fn default_code_key() -> String {
    "code".to_string()
}

fn default_children_key() -> String {
    "children".to_string()
}

impl GroupLevel {
    /// Create a level keyed by a logical field, with defaults everywhere else.
    pub fn new(key_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            name_field: None,
            code_field: None,
            name_key: default_name_key(),
            code_key: default_code_key(),
            children_key: default_children_key(),
            node_name: String::new(),
            extra_fields: Vec::new(),
        }
    }

    pub fn with_name_field(mut self, field: impl Into<String>) -> Self {
        self.name_field = Some(field.into());
        self
    }

    pub fn with_code_field(mut self, field: impl Into<String>) -> Self {
        self.code_field = Some(field.into());
        self
    }

    pub fn with_children_key(mut self, key: impl Into<String>) -> Self {
        self.children_key = key.into();
        self
    }

    pub fn with_node_name(mut self, name: impl Into<String>) -> Self {
        self.node_name = name.into();
        self
    }

    pub fn with_extra_field(mut self, field: FieldMap) -> Self {
        self.extra_fields.push(field);
        self
    }
}

/// Describes the leaf records attached to the deepest group node
/// (or, in flat mode, the whole result).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafConfig {
    /// Output key naming the leaf array on the terminal node.
    /// Unused in flat mode.
    pub output_key: String,

    /// Logical field whose value must be unique per group-array;
    /// duplicates are dropped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedupe_by: Option<String>,

    /// Field copies producing each leaf record.
    #[serde(default)]
    pub fields: Vec<FieldMap>,
}

impl LeafConfig {
    pub fn new(output_key: impl Into<String>) -> Self {
        Self { output_key: output_key.into(), dedupe_by: None, fields: Vec::new() }
    }

    pub fn with_dedupe_by(mut self, field: impl Into<String>) -> Self {
        self.dedupe_by = Some(field.into());
        self
    }

    pub fn with_field(mut self, field: FieldMap) -> Self {
        self.fields.push(field);
        self
    }
}

/// The executable configuration the transform engine consumes.
///
/// Constructed once per run and immutable afterwards; regenerating it from
/// upstream state is idempotent reconstruction, never mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformConfig {
    /// Base name used for output files.
    #[serde(default = "default_name")]
    pub name: String,

    /// Export identifier used in generated TypeScript data modules.
    #[serde(default = "default_export_name")]
    pub ts_export_name: String,

    /// Logical field name -> header resolution rule.
    #[serde(default)]
    pub header_mapping: IndexMap<String, HeaderRule>,

    /// Hierarchy tiers, outermost first. Empty means flat mode.
    #[serde(default)]
    pub group_levels: Vec<GroupLevel>,

    /// Leaf record definition.
    pub leaf: LeafConfig,
}

fn default_name() -> String {
    "output".to_string()
}

fn default_export_name() -> String {
    "data".to_string()
}

impl TransformConfig {
    /// Parse a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a config from a JSON value.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    /// Serialize to a pretty JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Whether the engine runs in flat mode (no grouping).
    pub fn is_flat(&self) -> bool {
        self.group_levels.is_empty()
    }

    /// Logical fields declared `required` in the header mapping.
    pub fn required_fields(&self) -> impl Iterator<Item = (&str, &HeaderRule)> {
        self.header_mapping
            .iter()
            .filter(|(_, rule)| rule.required)
            .map(|(field, rule)| (field.as_str(), rule))
    }
}

/// Load a [`TransformConfig`] from a JSON file.
pub fn load_config(path: &Path) -> ConfigResult<TransformConfig> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => {
            let content = std::fs::read_to_string(path)?;
            Ok(TransformConfig::from_json(&content)?)
        }
        other => Err(ConfigError::UnsupportedExtension(
            other.unwrap_or("").to_string(),
        )),
    }
}

/// Generate an example configuration: a dealer network grouped
/// province -> city -> dealers.
pub fn example_config() -> TransformConfig {
    let mut header_mapping = IndexMap::new();
    header_mapping.insert(
        "level1Key".to_string(),
        HeaderRule::new(vec!["province".into(), "prov".into()]).required(),
    );
    header_mapping.insert(
        "level1Name".to_string(),
        HeaderRule::new(vec!["province_name".into(), "province name".into()]),
    );
    header_mapping.insert(
        "level2Key".to_string(),
        HeaderRule::new(vec!["city".into()]).required(),
    );
    header_mapping.insert(
        "dealerCode".to_string(),
        HeaderRule::new(vec!["dealer_code".into(), "code".into()]).required(),
    );
    header_mapping.insert(
        "dealerName".to_string(),
        HeaderRule::new(vec!["dealer_name".into(), "name".into()]),
    );

    TransformConfig {
        name: "dealers".to_string(),
        ts_export_name: "dealers".to_string(),
        header_mapping,
        group_levels: vec![
            GroupLevel::new("level1Key")
                .with_name_field("level1Name")
                .with_children_key("cities")
                .with_node_name("Province"),
            GroupLevel::new("level2Key")
                .with_name_field("level2Key")
                .with_children_key("dealers")
                .with_node_name("City"),
        ],
        leaf: LeafConfig::new("dealers")
            .with_dedupe_by("dealerCode")
            .with_field(FieldMap::new("dealerCode", "code"))
            .with_field(FieldMap::new("dealerName", "name")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization_round_trip() {
        let config = example_config();
        let json = config.to_json().unwrap();
        let parsed = TransformConfig::from_json(&json).unwrap();
        assert_eq!(parsed.name, config.name);
        assert_eq!(parsed.group_levels.len(), 2);
        assert_eq!(parsed.leaf.dedupe_by.as_deref(), Some("dealerCode"));
    }

    #[test]
    fn test_defaults_applied() {
        let json = r#"{
            "headerMapping": { "k": { "candidates": ["key"] } },
            "groupLevels": [ { "keyField": "k" } ],
            "leaf": { "outputKey": "items", "fields": [] }
        }"#;
        let config = TransformConfig::from_json(json).unwrap();
        assert_eq!(config.name, "output");
        assert_eq!(config.ts_export_name, "data");
        let level = &config.group_levels[0];
        assert_eq!(level.name_key, "name");
        assert_eq!(level.code_key, "code");
        assert_eq!(level.children_key, "children");
        assert!(!config.header_mapping["k"].required);
    }

    #[test]
    fn test_required_fields() {
        let config = example_config();
        let required: Vec<&str> = config.required_fields().map(|(f, _)| f).collect();
        assert_eq!(required, vec!["level1Key", "level2Key", "dealerCode"]);
    }

    #[test]
    fn test_camel_case_wire_format() {
        let config = example_config();
        let json = config.to_json().unwrap();
        assert!(json.contains("\"keyField\""));
        assert!(json.contains("\"childrenKey\""));
        assert!(json.contains("\"tsExportName\""));
        assert!(json.contains("\"outputKey\""));
        assert!(!json.contains("\"key_field\""));
    }

    #[test]
    fn test_load_config_rejects_unknown_extension() {
        let err = load_config(Path::new("config.yaml")).unwrap_err();
        assert!(err.to_string().contains("yaml"));
    }
}
