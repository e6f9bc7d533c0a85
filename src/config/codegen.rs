//! Config-as-code and data-module emission.
//!
//! A [`TransformConfig`] can be serialized into a textual CommonJS module;
//! that text is the contract the batch CLI consumes alongside plain JSON.
//! Processed sheets can additionally be emitted as TypeScript data modules
//! (`export const <name> = <data> as const;`).

use serde_json::Value;

use super::TransformConfig;

/// Render a configuration as a `module.exports = {…}` module.
pub fn config_module_source(config: &TransformConfig) -> String {
    let header_mapping = config
        .header_mapping
        .iter()
        .map(|(logical, rule)| {
            format!(
                "    {}: {{ candidates: {}, required: {} }}",
                logical,
                json_inline(&rule.candidates),
                rule.required
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");

    let group_levels = config
        .group_levels
        .iter()
        .map(|level| {
            let name_field = level
                .name_field
                .as_ref()
                .map(|f| format!("nameField: \"{}\", ", f))
                .unwrap_or_default();
            let code_field = level
                .code_field
                .as_ref()
                .map(|f| format!("codeField: \"{}\", ", f))
                .unwrap_or_default();
            format!(
                "    {{ keyField: \"{}\", {}{}childrenKey: \"{}\", nodeName: \"{}\" }}",
                level.key_field, name_field, code_field, level.children_key, level.node_name
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");

    let leaf_fields = config
        .leaf
        .fields
        .iter()
        .map(|field| format!("      {{ from: \"{}\", to: \"{}\" }}", field.from, field.to))
        .collect::<Vec<_>>()
        .join(",\n");

    let dedupe_by = config
        .leaf
        .dedupe_by
        .as_ref()
        .map(|field| format!("dedupeBy: \"{}\",", field))
        .unwrap_or_default();

    format!(
        "module.exports = {{\n  name: \"{name}\",\n  tsExportName: \"{export_name}\",\n  \n  headerMapping: {{\n{header_mapping}\n  }},\n  \n  groupLevels: [\n{group_levels}\n  ],\n  \n  leaf: {{\n    outputKey: \"{output_key}\",\n    {dedupe_by}\n    fields: [\n{leaf_fields}\n    ]\n  }}\n}};",
        name = config.name,
        export_name = config.ts_export_name,
        header_mapping = header_mapping,
        group_levels = group_levels,
        output_key = config.leaf.output_key,
        dedupe_by = dedupe_by,
        leaf_fields = leaf_fields,
    )
}

/// Render transformed data as a TypeScript module.
pub fn data_module_source(export_name: &str, data: &Value) -> String {
    let json = serde_json::to_string_pretty(data).unwrap_or_else(|_| "null".to_string());
    format!("export const {} = {} as const;\n", export_name, json)
}

fn json_inline<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::example_config;
    use serde_json::json;

    #[test]
    fn test_config_module_shape() {
        let source = config_module_source(&example_config());

        assert!(source.starts_with("module.exports = {"));
        assert!(source.contains("name: \"dealers\""));
        assert!(source.contains("level1Key: { candidates: [\"province\",\"prov\"], required: true }"));
        assert!(source.contains("keyField: \"level1Key\", nameField: \"level1Name\", childrenKey: \"cities\""));
        assert!(source.contains("outputKey: \"dealers\""));
        assert!(source.contains("dedupeBy: \"dealerCode\","));
        assert!(source.contains("{ from: \"dealerCode\", to: \"code\" }"));
        assert!(source.trim_end().ends_with("};"));
    }

    #[test]
    fn test_config_module_omits_absent_options() {
        let mut config = example_config();
        config.leaf.dedupe_by = None;
        config.group_levels[0].name_field = None;
        let source = config_module_source(&config);

        assert!(!source.contains("dedupeBy"));
        assert!(!source.contains("nameField: \"level1Name\""));
    }

    #[test]
    fn test_data_module_source() {
        let data = json!([{"code": "1"}]);
        let source = data_module_source("dealers", &data);
        assert!(source.starts_with("export const dealers = "));
        assert!(source.trim_end().ends_with("as const;"));
        assert!(source.contains("\"code\": \"1\""));
    }
}
