//! Inferred schema types

use serde::{Deserialize, Serialize};

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Number,
    Boolean,
    Date,
}

impl ColumnType {
    /// Specific types in classification priority order (most specific first)
    pub const SPECIFIC: [ColumnType; 3] =
        [ColumnType::Number, ColumnType::Boolean, ColumnType::Date];

    /// Type name as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Number => "number",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(ColumnType::String),
            "number" => Ok(ColumnType::Number),
            "boolean" => Ok(ColumnType::Boolean),
            "date" => Ok(ColumnType::Date),
            _ => Err(format!(
                "Unknown column type: {s}. Expected: string, number, boolean, date"
            )),
        }
    }
}

/// Inferred type of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnGuess {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Distinct non-empty values seen in the sample
    pub sample_values: Vec<String>,
    /// Fraction of sampled non-empty cells matching `column_type`
    pub confidence: f64,
}

/// Schema inferred from a source sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferredSchema {
    pub columns: Vec<ColumnGuess>,
    /// Data rows read (header excluded)
    pub sampled_rows: usize,
    /// Rows in the sample that could not be parsed
    pub skipped_rows: usize,
    /// Field delimiter used to read the sample
    pub delimiter: char,
}

impl InferredSchema {
    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnGuess> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_round_trip_names() {
        for t in [
            ColumnType::String,
            ColumnType::Number,
            ColumnType::Boolean,
            ColumnType::Date,
        ] {
            assert_eq!(t.as_str().parse::<ColumnType>().unwrap(), t);
            assert_eq!(serde_json::to_value(t).unwrap(), t.as_str());
        }
        assert!("integer".parse::<ColumnType>().is_err());
    }

    #[test]
    fn test_column_guess_wire_format() {
        let guess = ColumnGuess {
            name: "amount".to_string(),
            column_type: ColumnType::Number,
            sample_values: vec!["10".to_string()],
            confidence: 1.0,
        };
        let json = serde_json::to_value(&guess).unwrap();
        assert_eq!(json["type"], "number");
        assert_eq!(json["sampleValues"][0], "10");
        assert_eq!(json["confidence"], 1.0);
    }
}
