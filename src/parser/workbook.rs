//! Workbook loading and sheet selection.
//!
//! XLSX/XLS/ODS files open through calamine; CSV files surface as a single
//! sheet named `Sheet1`. Each sheet's first row is the header row and every
//! following non-blank row becomes a JSON object with `""` defaults, the
//! same row shape the CSV parser emits.

use calamine::{open_workbook_auto, Data, Range, Reader};
use serde_json::{Map, Number, Value};
use std::path::Path;

use super::parse_csv_file_auto;
use crate::error::{ParseError, ParseResult};
use crate::logs::log_warning;

/// One sheet's header list and rows.
#[derive(Debug, Clone)]
pub struct SheetTable {
    pub name: String,
    /// Headers in sheet order, empty cells dropped.
    pub headers: Vec<String>,
    /// Rows as JSON objects keyed by header.
    pub rows: Vec<Value>,
}

/// All sheets of one input file, in workbook order.
#[derive(Debug, Clone)]
pub struct Workbook {
    pub sheets: Vec<SheetTable>,
}

impl Workbook {
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetTable> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

/// Load a workbook, dispatching on the file extension.
pub fn load_workbook(path: &Path) -> ParseResult<Workbook> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => {
            let table = parse_csv_file_auto(path)?;
            Ok(Workbook {
                sheets: vec![SheetTable {
                    name: "Sheet1".to_string(),
                    headers: table.headers,
                    rows: table.records,
                }],
            })
        }
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_spreadsheet(path),
        other => Err(ParseError::UnsupportedFormat(other.to_string())),
    }
}

fn load_spreadsheet(path: &Path) -> ParseResult<Workbook> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names().to_vec();

    if sheet_names.is_empty() {
        return Err(ParseError::EmptyFile);
    }

    let mut sheets = Vec::new();
    for name in &sheet_names {
        let range = workbook.worksheet_range(name)?;
        sheets.push(sheet_from_range(name, &range));
    }

    Ok(Workbook { sheets })
}

fn sheet_from_range(name: &str, range: &Range<Data>) -> SheetTable {
    let mut rows_iter = range.rows();

    // (column index, header) pairs; empty header cells carry no name a
    // configuration could target
    let header_cols: Vec<(usize, String)> = rows_iter
        .next()
        .map(|header_row| {
            header_row
                .iter()
                .enumerate()
                .filter_map(|(i, cell)| {
                    let header = cell_to_string(cell).trim().to_string();
                    (!header.is_empty()).then_some((i, header))
                })
                .collect()
        })
        .unwrap_or_default();

    let mut rows = Vec::new();
    for row in rows_iter {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        let mut obj = Map::new();
        for (i, header) in &header_cols {
            obj.insert(header.clone(), row.get(*i).map(cell_to_value).unwrap_or_else(|| Value::String(String::new())));
        }
        rows.push(Value::Object(obj));
    }

    SheetTable {
        name: name.to_string(),
        headers: header_cols.into_iter().map(|(_, h)| h).collect(),
        rows,
    }
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::String(String::new()),
        Data::String(s) => Value::String(s.clone()),
        Data::Float(f) => Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(String::new())),
        Data::Int(i) => Value::Number((*i).into()),
        Data::Bool(b) => Value::Bool(*b),
        Data::Error(_) => Value::String(String::new()),
        Data::DateTime(dt) => Number::from_f64(dt.as_f64())
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(String::new())),
        Data::DateTimeIso(s) => Value::String(s.clone()),
        Data::DurationIso(s) => Value::String(s.clone()),
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Resolve a `--sheet` selector against the workbook's sheet names.
///
/// `None` or `"all"` selects every sheet. Otherwise the selector is a
/// comma-separated list of sheet names and/or 1-based indexes; unknown
/// names warn and are ignored, duplicates collapse to first mention.
pub fn resolve_sheets(names: &[String], selector: Option<&str>) -> Vec<String> {
    let selector = match selector {
        None => return names.to_vec(),
        Some("all") => return names.to_vec(),
        Some(s) => s,
    };

    let mut selected: Vec<String> = Vec::new();
    let mut push_unique = |selected: &mut Vec<String>, name: &str| {
        if !selected.iter().any(|s| s == name) {
            selected.push(name.to_string());
        }
    };

    for token in selector.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if names.iter().any(|n| n == token) {
            push_unique(&mut selected, token);
        } else if token.chars().all(|c| c.is_ascii_digit()) {
            match token.parse::<usize>() {
                Ok(index) if index >= 1 && index <= names.len() => {
                    log_warning(format!("Using sheet #{}: {}", token, names[index - 1]));
                    push_unique(&mut selected, &names[index - 1]);
                }
                _ => {}
            }
        } else {
            log_warning(format!("Sheet not found: {}", token));
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_all_by_default() {
        let all = names(&["2024", "2025"]);
        assert_eq!(resolve_sheets(&all, None), all);
        assert_eq!(resolve_sheets(&all, Some("all")), all);
    }

    #[test]
    fn test_resolve_by_name_and_index() {
        let all = names(&["2024", "archive", "totals"]);
        assert_eq!(resolve_sheets(&all, Some("archive")), names(&["archive"]));
        assert_eq!(resolve_sheets(&all, Some("3")), names(&["totals"]));
        assert_eq!(
            resolve_sheets(&all, Some("1,totals")),
            names(&["2024", "totals"])
        );
    }

    #[test]
    fn test_resolve_ignores_unknown_and_duplicates() {
        let all = names(&["2024", "totals"]);
        assert_eq!(
            resolve_sheets(&all, Some("nope,2024,2024,0,99")),
            names(&["2024"])
        );
    }

    #[test]
    fn test_load_workbook_csv_is_single_sheet() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "province;dealer\nA;1\nB;2").unwrap();

        let workbook = load_workbook(file.path()).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Sheet1"]);
        let sheet = workbook.sheet("Sheet1").unwrap();
        assert_eq!(sheet.headers, vec!["province", "dealer"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[1]["dealer"], "2");
    }

    #[test]
    fn test_load_workbook_rejects_unknown_extension() {
        let err = load_workbook(Path::new("input.pdf")).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedFormat(ext) if ext == "pdf"));
    }

    #[test]
    fn test_csv_sheet_feeds_the_engine() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(
            file,
            "province;city;dealer_code;dealer_name\nA;X;1;One\nA;X;1;Dup\nA;Y;2;Two"
        )
        .unwrap();

        let workbook = load_workbook(file.path()).unwrap();
        let sheet = workbook.sheet("Sheet1").unwrap();
        let out = crate::transform::transform(&sheet.rows, &crate::config::example_config()).unwrap();

        assert_eq!(out.stats.total_rows, 3);
        assert_eq!(out.stats.used_rows, 3);
        assert_eq!(out.stats.group_counts, vec![1, 2]);
        // the duplicate dealer code collapses
        assert_eq!(out.stats.leaf_count, 2);
        assert_eq!(out.data[0]["cities"][0]["dealers"][0]["code"], "1");
    }

    #[test]
    fn test_cell_to_value_scalars() {
        assert_eq!(cell_to_value(&Data::String("x".into())), Value::String("x".into()));
        assert_eq!(cell_to_value(&Data::Int(7)), serde_json::json!(7));
        assert_eq!(cell_to_value(&Data::Bool(true)), Value::Bool(true));
        assert_eq!(cell_to_value(&Data::Empty), Value::String(String::new()));
    }
}
