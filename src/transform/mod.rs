//! Transformation module.
//!
//! - Headers: fuzzy logical-field to header resolution
//! - Engine: grouping/flat transform with linearization and statistics

pub mod engine;
pub mod headers;

pub use engine::{transform, TransformOutput, TransformStats};
pub use headers::{match_score, resolve_headers, resolve_headers_from, HeaderMap};
