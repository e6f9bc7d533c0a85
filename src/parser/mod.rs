//! CSV input with encoding and delimiter auto-detection.
//!
//! Converts CSV rows into JSON objects keyed by header. Nothing here knows
//! about configurations or grouping; the output is the row collection the
//! transform engine consumes.

pub mod workbook;

use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{ParseError, ParseResult};

/// Parsed CSV with detection metadata.
#[derive(Debug, Clone)]
pub struct CsvTable {
    /// Rows as JSON objects.
    pub records: Vec<Value>,
    /// Detected encoding.
    pub encoding: String,
    /// Detected delimiter.
    pub delimiter: char,
    /// Column headers, in file order, empty names dropped.
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let (charset, _, _) = chardet::detect(bytes);

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the detected encoding label.
/// Unknown labels fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).to_string(),
        label => match encoding_rs::Encoding::for_label(label.as_bytes()) {
            Some(enc) => enc.decode(bytes).0.to_string(),
            None => String::from_utf8_lossy(bytes).to_string(),
        },
    }
}

/// Detect the delimiter by counting occurrences in the first line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ';';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV content with an explicit delimiter.
///
/// Returns the header list (file order, empty names dropped) and one JSON
/// object per non-blank record; cells missing from short records read "".
pub fn parse_csv(content: &str, delimiter: char) -> ParseResult<(Vec<String>, Vec<Value>)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let header_row: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if header_row.iter().all(|h| h.is_empty()) {
        return Err(ParseError::NoHeaders);
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let mut obj = Map::new();
        for (i, header) in header_row.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = record.get(i).unwrap_or("").trim();
            obj.insert(header.clone(), Value::String(value.to_string()));
        }
        records.push(Value::Object(obj));
    }

    let headers = header_row.into_iter().filter(|h| !h.is_empty()).collect();
    Ok((headers, records))
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_csv_bytes_auto(bytes: &[u8]) -> ParseResult<CsvTable> {
    if bytes.is_empty() {
        return Err(ParseError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    let (headers, records) = parse_csv(&content, delimiter)?;

    Ok(CsvTable { records, encoding, delimiter, headers })
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> ParseResult<CsvTable> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_csv_bytes_auto(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let (headers, rows) = parse_csv("name;age\nAlice;30\nBob;25", ';').unwrap();
        assert_eq!(headers, vec!["name", "age"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "Alice");
        assert_eq!(rows[0]["age"], "30");
        assert_eq!(rows[1]["name"], "Bob");
    }

    #[test]
    fn test_quoted_values_keep_delimiters() {
        let (_, rows) = parse_csv("name,notes\nAlice,\"hello, world\"", ',').unwrap();
        assert_eq!(rows[0]["notes"], "hello, world");
    }

    #[test]
    fn test_blank_records_skipped() {
        let (_, rows) = parse_csv("a;b\n1;2\n;\n3;4\n", ';').unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_short_records_fill_empty() {
        let (_, rows) = parse_csv("a;b;c\n1", ';').unwrap();
        assert_eq!(rows[0]["a"], "1");
        assert_eq!(rows[0]["b"], "");
        assert_eq!(rows[0]["c"], "");
    }

    #[test]
    fn test_empty_header_columns_dropped() {
        let (headers, rows) = parse_csv("a;;c\n1;2;3", ';').unwrap();
        assert_eq!(headers, vec!["a", "c"]);
        assert!(rows[0].get("").is_none());
        assert_eq!(rows[0]["c"], "3");
    }

    #[test]
    fn test_empty_input_errors() {
        assert!(matches!(
            parse_csv_bytes_auto(b""),
            Err(ParseError::EmptyFile)
        ));
    }

    #[test]
    fn test_detect_delimiter_variants() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("a|b|c"), '|');
    }

    #[test]
    fn test_auto_parse_detects_and_orders_headers() {
        let table = parse_csv_bytes_auto(b"name;age\nAlice;30").unwrap();
        assert_eq!(table.delimiter, ';');
        assert_eq!(table.encoding, "utf-8");
        assert_eq!(table.headers, vec!["name", "age"]);
        assert_eq!(table.records.len(), 1);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }
}
