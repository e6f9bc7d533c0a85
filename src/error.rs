//! Error types for the tabfold transformation pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`ParseError`] - tabular input (CSV/workbook) errors
//! - [`ConfigError`] - configuration loading errors
//! - [`TransformError`] - transform engine errors
//! - [`CliError`] - top-level CLI orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Tabular Input Errors
// =============================================================================

/// Errors while reading CSV or workbook input.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV record.
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Workbook-level failure (XLSX/XLS/ODS).
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// Empty file.
    #[error("Input file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in input")]
    NoHeaders,

    /// Extension the reader does not handle.
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading a transform configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid JSON in the config file.
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file extension the loader does not handle.
    #[error("Unsupported config extension '{0}' (expected .json)")]
    UnsupportedExtension(String),
}

// =============================================================================
// Transform Errors
// =============================================================================

/// Errors raised by the transform engine.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A required logical field matched no header.
    #[error(
        "No header matches required field '{field}' (candidates: {candidates:?}; headers: {headers:?})"
    )]
    HeaderNotFound {
        field: String,
        candidates: Vec<String>,
        headers: Vec<String>,
    },
}

// =============================================================================
// CLI Errors (top-level)
// =============================================================================

/// Top-level CLI orchestration errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Input parsing error.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Transform error.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// IO error while writing output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Output serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for input parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for transform operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // ParseError -> CliError
        let parse_err = ParseError::EmptyFile;
        let cli_err: CliError = parse_err.into();
        assert!(cli_err.to_string().contains("empty"));

        // TransformError -> CliError
        let transform_err = TransformError::HeaderNotFound {
            field: "provinceKey".into(),
            candidates: vec!["province".into()],
            headers: vec!["city".into()],
        };
        let cli_err: CliError = transform_err.into();
        assert!(cli_err.to_string().contains("provinceKey"));
    }

    #[test]
    fn test_header_not_found_names_everything() {
        let err = TransformError::HeaderNotFound {
            field: "dealerCode".into(),
            candidates: vec!["dealer_code".into(), "code".into()],
            headers: vec!["Province".into(), "City".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("dealerCode"));
        assert!(msg.contains("dealer_code"));
        assert!(msg.contains("Province"));
    }
}
