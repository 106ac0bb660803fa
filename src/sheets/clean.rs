//! Column name normalization and cell value coercion.

use crate::error::SheetsError;
use crate::models::CellValue;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::debug;

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

fn invalid_name_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9_]").expect("valid regex"))
}

fn integer_literal() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?\d+$").expect("valid regex"))
}

fn float_literal() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.\d*|\.\d+|\d+)([eE][+-]?\d+)?$").expect("valid regex")
    })
}

/// Normalize a column header: trim, lower-case, whitespace runs to `_`,
/// then drop anything outside `[a-z0-9_]`. Idempotent.
pub fn clean_column_name(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let underscored = whitespace_run().replace_all(&lowered, "_");
    invalid_name_chars()
        .replace_all(&underscored, "")
        .into_owned()
}

/// Coerce a text cell.
///
/// `TRUE`/`FALSE` (any case) become booleans, integer and decimal literals
/// become numbers, blank cells become null. Anything else is returned
/// unchanged.
pub fn coerce_str(raw: &str) -> CellValue {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return CellValue::Null;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return CellValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return CellValue::Bool(false);
    }
    if integer_literal().is_match(trimmed) {
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Int(i);
        }
    }
    if float_literal().is_match(trimmed) {
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return CellValue::Float(f);
            }
        }
    }

    CellValue::String(raw.to_string())
}

/// Convert one API cell to a [`CellValue`].
pub fn coerce_value(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Bool(b) => CellValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => CellValue::Int(i),
            None => n.as_f64().map(CellValue::Float).unwrap_or(CellValue::Null),
        },
        Value::String(s) => coerce_str(&s),
        Value::Array(items) => CellValue::List(items.into_iter().map(coerce_value).collect()),
        Value::Object(map) => CellValue::Map(
            map.into_iter()
                .map(|(k, v)| (k, coerce_value(v)))
                .collect(),
        ),
    }
}

/// Clean a header row, filling blanks and disambiguating repeats.
pub fn clean_headers(raw: &[Value]) -> Vec<String> {
    let mut seen = HashSet::new();

    raw.iter()
        .enumerate()
        .map(|(i, cell)| {
            let text = match cell {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            let mut name = clean_column_name(&text);
            if name.is_empty() {
                name = format!("column_{}", i + 1);
            }

            let base = name.clone();
            let mut suffix = 2;
            while !seen.insert(name.clone()) {
                name = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            name
        })
        .collect()
}

/// Turn raw rows (header first) into cleaned records, one
/// [`CellValue::Map`] per non-empty row.
pub fn rows_to_records(range: &str, rows: Vec<Vec<Value>>) -> Result<Vec<CellValue>, SheetsError> {
    let mut rows = rows.into_iter();
    let headers = match rows.next() {
        Some(header_row) if header_row.iter().any(|c| !coerce_value(c.clone()).is_empty()) => {
            clean_headers(&header_row)
        }
        _ => return Err(SheetsError::MissingHeader(range.to_string())),
    };

    let mut records = Vec::new();
    let mut dropped = 0usize;
    let mut overflow = 0usize;

    for row in rows {
        let mut cells = row.into_iter();
        let entries: Vec<(String, CellValue)> = headers
            .iter()
            .map(|h| (h.clone(), cells.next().map(coerce_value).unwrap_or(CellValue::Null)))
            .collect();
        overflow += cells.map(coerce_value).filter(|v| !v.is_empty()).count();

        if entries.iter().all(|(_, v)| v.is_empty()) {
            dropped += 1;
            continue;
        }
        records.push(CellValue::Map(entries));
    }

    debug!(
        "Range {}: {} columns, {} records, {} empty rows dropped",
        range,
        headers.len(),
        records.len(),
        dropped
    );
    if overflow > 0 {
        debug!(
            "Range {}: {} cells beyond the header width ignored",
            range, overflow
        );
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_column_name() {
        assert_eq!(clean_column_name("  System Name "), "system_name");
        assert_eq!(clean_column_name("Radius (LY)"), "radius_ly");
        assert_eq!(clean_column_name("Pop.\tCount"), "pop_count");
        assert_eq!(clean_column_name("Is   Colony?"), "is_colony");
        assert_eq!(clean_column_name("already_clean_1"), "already_clean_1");
    }

    #[test]
    fn test_clean_column_name_idempotent() {
        for raw in ["  System Name ", "Radius (LY)", "a - b", "ÉTAT civil", "__x__", "", "A\n\nB"] {
            let once = clean_column_name(raw);
            assert_eq!(clean_column_name(&once), once, "raw {raw:?}");
        }
    }

    #[test]
    fn test_coerce_str() {
        assert_eq!(coerce_str("TRUE"), CellValue::Bool(true));
        assert_eq!(coerce_str("FALSE"), CellValue::Bool(false));
        assert_eq!(coerce_str("true"), CellValue::Bool(true));
        assert_eq!(coerce_str("42"), CellValue::Int(42));
        assert_eq!(coerce_str("-7"), CellValue::Int(-7));
        assert_eq!(coerce_str("3.5"), CellValue::Float(3.5));
        assert_eq!(coerce_str("1e3"), CellValue::Float(1000.0));
        assert_eq!(coerce_str("hello"), CellValue::String("hello".to_string()));
        assert_eq!(coerce_str(""), CellValue::Null);
        assert_eq!(coerce_str("   "), CellValue::Null);
    }

    #[test]
    fn test_coerce_str_leaves_non_numbers_alone() {
        for raw in ["inf", "NaN", "1,234", "12ly", "v1.2.3", " spaced "] {
            assert_eq!(coerce_str(raw), CellValue::String(raw.to_string()), "raw {raw:?}");
        }
    }

    #[test]
    fn test_coerce_integer_overflow_falls_back_to_float() {
        assert_eq!(
            coerce_str("99999999999999999999"),
            CellValue::Float(99999999999999999999.0)
        );
    }

    #[test]
    fn test_coerce_value_kinds() {
        assert_eq!(coerce_value(json!(null)), CellValue::Null);
        assert_eq!(coerce_value(json!(true)), CellValue::Bool(true));
        assert_eq!(coerce_value(json!(12)), CellValue::Int(12));
        assert_eq!(coerce_value(json!(0.25)), CellValue::Float(0.25));
        assert_eq!(
            coerce_value(json!(["1", "x"])),
            CellValue::List(vec![CellValue::Int(1), CellValue::String("x".to_string())])
        );
    }

    #[test]
    fn test_clean_headers_fills_and_disambiguates() {
        let headers = clean_headers(&[json!("Name"), json!(""), json!("name"), json!("NAME")]);
        assert_eq!(headers, vec!["name", "column_2", "name_2", "name_3"]);
    }

    #[test]
    fn test_rows_to_records() {
        let rows = vec![
            vec![json!("System Name"), json!("Colonised"), json!("Distance (LY)")],
            vec![json!("Sol"), json!("TRUE"), json!("0")],
            vec![json!(""), json!(""), json!("")],
            vec![json!("Maia")],
            vec![],
        ];

        let records = rows_to_records("Systems", rows).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            CellValue::Map(vec![
                ("system_name".to_string(), CellValue::String("Sol".to_string())),
                ("colonised".to_string(), CellValue::Bool(true)),
                ("distance_ly".to_string(), CellValue::Int(0)),
            ])
        );
        assert_eq!(
            records[1],
            CellValue::Map(vec![
                ("system_name".to_string(), CellValue::String("Maia".to_string())),
                ("colonised".to_string(), CellValue::Null),
                ("distance_ly".to_string(), CellValue::Null),
            ])
        );
    }

    #[test]
    fn test_rows_to_records_requires_header() {
        assert!(matches!(
            rows_to_records("Empty", vec![]),
            Err(SheetsError::MissingHeader(_))
        ));
        assert!(matches!(
            rows_to_records("Blank", vec![vec![json!(""), json!("")]]),
            Err(SheetsError::MissingHeader(_))
        ));
    }

    #[test]
    fn test_rows_to_records_ignores_cells_past_header() {
        let rows = vec![
            vec![json!("Name"), json!("Pop")],
            vec![json!("Sol"), json!("10"), json!("note"), json!("")],
            vec![json!(""), json!(""), json!("orphan")],
        ];

        let records = rows_to_records("Systems", rows).unwrap();
        assert_eq!(
            records,
            vec![CellValue::Map(vec![
                ("name".to_string(), CellValue::String("Sol".to_string())),
                ("pop".to_string(), CellValue::Int(10)),
            ])]
        );
    }
}
