//! Cell classification and coercion
//!
//! The same literal rules decide a column's type during inference and convert
//! cells during import.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

use super::types::ColumnType;

// Integer or decimal, optional exponent. Rejects NaN/inf spellings that f64 parsing accepts.
static NUMBER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").unwrap());

const TRUE_LITERALS: [&str; 2] = ["true", "yes"];
const FALSE_LITERALS: [&str; 2] = ["false", "no"];

/// Date-only formats, tried in order (day-first wins for ambiguous slashes)
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse an integer or decimal literal
pub fn parse_number(value: &str) -> Option<Number> {
    let value = value.trim();
    if !NUMBER_REGEX.is_match(value) {
        return None;
    }
    if let Ok(i) = value.parse::<i64>() {
        return Some(Number::from(i));
    }
    value.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Parse a boolean literal (case-insensitive)
pub fn parse_boolean(value: &str) -> Option<bool> {
    let value = value.trim();
    if TRUE_LITERALS.iter().any(|l| value.eq_ignore_ascii_case(l)) {
        Some(true)
    } else if FALSE_LITERALS.iter().any(|l| value.eq_ignore_ascii_case(l)) {
        Some(false)
    } else {
        None
    }
}

/// Parse a date or date-time, returning its ISO 8601 form
///
/// Dates become `YYYY-MM-DD`; zoned date-times keep their RFC 3339 form and
/// naive date-times become `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_date(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.to_rfc3339());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.format("%Y-%m-%dT%H:%M:%S").to_string());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, format) {
            return Some(d.format("%Y-%m-%d").to_string());
        }
    }
    None
}

/// Whether a non-empty cell parses under a column type
pub fn matches_type(value: &str, column_type: ColumnType) -> bool {
    match column_type {
        ColumnType::Number => parse_number(value).is_some(),
        ColumnType::Boolean => parse_boolean(value).is_some(),
        ColumnType::Date => parse_date(value).is_some(),
        ColumnType::String => true,
    }
}

/// Classify a single cell by priority: number, boolean, date, string
///
/// Returns `None` for empty cells.
pub fn classify(value: &str) -> Option<ColumnType> {
    if value.trim().is_empty() {
        return None;
    }
    ColumnType::SPECIFIC
        .into_iter()
        .find(|t| matches_type(value, *t))
        .or(Some(ColumnType::String))
}

/// Outcome of converting one cell to its column type
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    /// Parsed successfully
    Value(Value),
    /// The cell was empty
    Empty,
    /// The cell did not parse; stored as null
    Failed,
}

impl Coerced {
    /// The JSON value to store for this cell
    pub fn into_value(self) -> Value {
        match self {
            Coerced::Value(v) => v,
            Coerced::Empty | Coerced::Failed => Value::Null,
        }
    }
}

/// Convert a raw cell to a JSON value of the given column type
pub fn coerce(value: &str, column_type: ColumnType) -> Coerced {
    if value.trim().is_empty() {
        return Coerced::Empty;
    }
    let parsed = match column_type {
        ColumnType::String => Some(Value::String(value.to_string())),
        ColumnType::Number => parse_number(value).map(Value::Number),
        ColumnType::Boolean => parse_boolean(value).map(Value::Bool),
        ColumnType::Date => parse_date(value).map(Value::String),
    };
    parsed.map_or(Coerced::Failed, Coerced::Value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("10"), Some(Number::from(10)));
        assert_eq!(parse_number(" -42 "), Some(Number::from(-42)));
        assert_eq!(parse_number("+7"), Some(Number::from(7)));
        assert_eq!(parse_number("3.25").and_then(|n| n.as_f64()), Some(3.25));
        assert_eq!(parse_number(".5").and_then(|n| n.as_f64()), Some(0.5));
        assert_eq!(parse_number("1e3").and_then(|n| n.as_f64()), Some(1000.0));
        assert!(parse_number("NaN").is_none());
        assert!(parse_number("inf").is_none());
        assert!(parse_number("1,000").is_none());
        assert!(parse_number("12abc").is_none());
        assert!(parse_number("").is_none());
    }

    #[test]
    fn test_parse_number_beyond_i64() {
        let n = parse_number("99999999999999999999").unwrap();
        assert!(n.is_f64());
    }

    #[test]
    fn test_parse_boolean() {
        assert_eq!(parse_boolean("true"), Some(true));
        assert_eq!(parse_boolean("FALSE"), Some(false));
        assert_eq!(parse_boolean("Yes"), Some(true));
        assert_eq!(parse_boolean("no"), Some(false));
        assert_eq!(parse_boolean("1"), None);
        assert_eq!(parse_boolean("maybe"), None);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-01-15"), Some("2024-01-15".to_string()));
        assert_eq!(parse_date("2024/01/15"), Some("2024-01-15".to_string()));
        assert_eq!(parse_date("15/01/2024"), Some("2024-01-15".to_string()));
        assert_eq!(parse_date("01/31/2024"), Some("2024-01-31".to_string()));
        assert_eq!(parse_date("15.01.2024"), Some("2024-01-15".to_string()));
        assert_eq!(
            parse_date("2024-01-15 10:30:00"),
            Some("2024-01-15T10:30:00".to_string())
        );
        assert_eq!(
            parse_date("2024-01-15T10:30:00Z"),
            Some("2024-01-15T10:30:00+00:00".to_string())
        );
        assert!(parse_date("2024-13-45").is_none());
        assert!(parse_date("yesterday").is_none());
    }

    #[test]
    fn test_classify_priority() {
        assert_eq!(classify("10"), Some(ColumnType::Number));
        assert_eq!(classify("true"), Some(ColumnType::Boolean));
        assert_eq!(classify("2024-01-15"), Some(ColumnType::Date));
        assert_eq!(classify("hello"), Some(ColumnType::String));
        assert_eq!(classify("   "), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn test_coerce() {
        assert_eq!(coerce("10", ColumnType::Number), Coerced::Value(json!(10)));
        assert_eq!(coerce("yes", ColumnType::Boolean), Coerced::Value(json!(true)));
        assert_eq!(
            coerce("2024-01-15", ColumnType::Date),
            Coerced::Value(json!("2024-01-15"))
        );
        assert_eq!(coerce("10", ColumnType::String), Coerced::Value(json!("10")));
        assert_eq!(coerce("", ColumnType::Number), Coerced::Empty);
        assert_eq!(coerce("ten", ColumnType::Number), Coerced::Failed);
        assert_eq!(coerce("ten", ColumnType::Number).into_value(), Value::Null);
    }
}
