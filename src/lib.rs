//! # tabfold - config-driven tabular-to-tree transformation
//!
//! tabfold turns spreadsheet/CSV rows into a flat list or a multi-level
//! tree, driven entirely by a declarative configuration instead of
//! hard-coded column names.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ XLSX / CSV  │────▶│   Parser     │────▶│  Transform   │────▶│  JSON / TS   │
//! │  (sheets)   │     │ (auto-enc)   │     │ (headers +   │     │ (per sheet)  │
//! └─────────────┘     └──────────────┘     │  grouping)   │     └──────────────┘
//!                                          └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use tabfold::{example_config, transform};
//!
//! let rows = vec![
//!     json!({"province": "A", "city": "X", "dealer_code": "1", "dealer_name": "One"}),
//!     json!({"province": "A", "city": "X", "dealer_code": "2", "dealer_name": "Two"}),
//! ];
//! let out = transform(&rows, &example_config()).unwrap();
//! assert_eq!(out.stats.used_rows, 2);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Executable config, UI-config adaptation, config-as-code
//! - [`transform`] - Header resolution and the grouping engine
//! - [`parser`] - CSV/workbook input
//! - [`logs`] - Leveled stderr logging for the batch pipeline

// Core modules
pub mod error;
pub mod logs;

// Configuration
pub mod config;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CliError, CliResult, ConfigError, ConfigResult, ParseError, TransformError,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{
    example_config, load_config, FieldMap, GroupLevel, HeaderRule, LeafConfig, TransformConfig,
};

pub use config::ui::{
    ui_to_transform_config, UiConfig, UiExtraField, UiGroupLevel, UiLeafConfig, UiLeafField, UiMode,
};

pub use config::codegen::{config_module_source, data_module_source};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    match_score, resolve_headers, resolve_headers_from, transform, HeaderMap, TransformOutput,
    TransformStats,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{parse_csv, parse_csv_bytes_auto, parse_csv_file_auto, CsvTable};

pub use parser::workbook::{load_workbook, resolve_sheets, SheetTable, Workbook};

// =============================================================================
// Re-exports - Logging
// =============================================================================

pub use logs::{
    log_error, log_info, log_info_indent, log_success, log_warning, LogEntry, LogLevel, LOG_SINK,
};
