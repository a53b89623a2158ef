//! Confirmed schemas
//!
//! A [`ConfirmedSchema`] is the caller-approved version of an inferred schema.
//! It is validated on the way in and persisted through a [`SchemaStore`], so the
//! import that follows reads with exactly the column types the caller agreed to.

mod error;
mod store;

pub use error::SchemaError;
pub use store::{FileSchemaStore, MemorySchemaStore, SchemaStore};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::inference::{ColumnType, InferredSchema};

/// One confirmed column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ConfirmedColumn {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Caller-approved column names and types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedSchema {
    pub columns: Vec<ConfirmedColumn>,
}

impl ConfirmedSchema {
    /// Build and validate a schema from columns
    pub fn new(columns: Vec<ConfirmedColumn>) -> Result<Self, SchemaError> {
        let schema = Self { columns };
        schema.validate()?;
        Ok(schema)
    }

    /// Parse and validate caller-supplied JSON
    ///
    /// Accepts either `{"columns": [...]}` or a bare column array. Extra fields
    /// on columns (such as `sampleValues` from inference) are ignored.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Wrapped { columns: Vec<ConfirmedColumn> },
            Bare(Vec<ConfirmedColumn>),
        }

        let wire: Wire = serde_json::from_str(json).map_err(|e| {
            SchemaError::InvalidSchema(format!(
                "expected a list of {{name, type}} columns with type one of \
                 string, number, boolean, date: {e}"
            ))
        })?;
        let columns = match wire {
            Wire::Wrapped { columns } | Wire::Bare(columns) => columns,
        };
        Self::new(columns)
    }

    /// Accept an inferred schema as-is
    pub fn from_inferred(inferred: &InferredSchema) -> Result<Self, SchemaError> {
        Self::new(
            inferred
                .columns
                .iter()
                .map(|c| ConfirmedColumn::new(c.name.clone(), c.column_type))
                .collect(),
        )
    }

    /// Check names are non-blank and unique and at least one column exists
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.columns.is_empty() {
            return Err(SchemaError::InvalidSchema(
                "schema has no columns".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for (i, column) in self.columns.iter().enumerate() {
            if column.name.trim().is_empty() {
                return Err(SchemaError::InvalidSchema(format!(
                    "column {} has a blank name",
                    i + 1
                )));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(SchemaError::InvalidSchema(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }
        Ok(())
    }

    /// Column types in positional order
    pub fn column_types(&self) -> Vec<ColumnType> {
        self.columns.iter().map(|c| c.column_type).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_wrapped_and_bare() {
        let wrapped = ConfirmedSchema::from_json(
            r#"{"columns": [{"name": "name", "type": "string"}, {"name": "amount", "type": "number"}]}"#,
        )
        .unwrap();
        let bare = ConfirmedSchema::from_json(
            r#"[{"name": "name", "type": "string"}, {"name": "amount", "type": "number"}]"#,
        )
        .unwrap();
        assert_eq!(wrapped, bare);
        assert_eq!(
            wrapped.column_types(),
            vec![ColumnType::String, ColumnType::Number]
        );
    }

    #[test]
    fn test_from_json_ignores_inference_extras() {
        let schema = ConfirmedSchema::from_json(
            r#"[{"name": "amount", "type": "number", "sampleValues": ["10"], "confidence": 1.0}]"#,
        )
        .unwrap();
        assert_eq!(schema.len(), 1);
    }

    #[test]
    fn test_unknown_type_is_invalid() {
        let err = ConfirmedSchema::from_json(r#"[{"name": "a", "type": "integer"}]"#).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidSchema(_)));
    }

    #[test]
    fn test_malformed_json_is_invalid() {
        let err = ConfirmedSchema::from_json("{not json").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidSchema(_)));
    }

    #[test]
    fn test_duplicate_names_are_invalid() {
        let err = ConfirmedSchema::new(vec![
            ConfirmedColumn::new("a", ColumnType::String),
            ConfirmedColumn::new("a", ColumnType::Number),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_blank_and_empty_are_invalid() {
        assert!(ConfirmedSchema::new(vec![]).is_err());
        assert!(ConfirmedSchema::new(vec![ConfirmedColumn::new("  ", ColumnType::Date)]).is_err());
    }
}
