//! Persistence for the confirmed schema

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::{ConfirmedSchema, SchemaError};

/// Holds the single current confirmed schema
///
/// Callers serialize writes; implementations only need to make each call atomic.
pub trait SchemaStore: Send + Sync {
    /// Validate and persist a schema, replacing any previous one
    fn save(&self, schema: &ConfirmedSchema) -> Result<(), SchemaError>;

    /// Load the current schema
    fn load(&self) -> Result<ConfirmedSchema, SchemaError>;

    /// Remove the current schema, if any
    fn clear(&self) -> Result<(), SchemaError>;
}

/// Schema store backed by a JSON file
///
/// Writes go to a sibling temporary file that is then renamed over the target,
/// so a crash never leaves a half-written schema behind.
#[derive(Debug, Clone)]
pub struct FileSchemaStore {
    path: PathBuf,
}

impl FileSchemaStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SchemaError {
        SchemaError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl SchemaStore for FileSchemaStore {
    fn save(&self, schema: &ConfirmedSchema) -> Result<(), SchemaError> {
        schema.validate()?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let content = serde_json::to_string_pretty(schema)
            .map_err(|e| SchemaError::InvalidSchema(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        tracing::info!(
            path = %self.path.display(),
            columns = schema.len(),
            "Saved confirmed schema"
        );
        Ok(())
    }

    fn load(&self) -> Result<ConfirmedSchema, SchemaError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SchemaError::NotFound);
            }
            Err(e) => return Err(self.io_error(e)),
        };
        ConfirmedSchema::from_json(&content)
    }

    fn clear(&self) -> Result<(), SchemaError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// In-memory schema store
#[derive(Debug, Default)]
pub struct MemorySchemaStore {
    current: Mutex<Option<ConfirmedSchema>>,
}

impl MemorySchemaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchemaStore for MemorySchemaStore {
    fn save(&self, schema: &ConfirmedSchema) -> Result<(), SchemaError> {
        schema.validate()?;
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(schema.clone());
        Ok(())
    }

    fn load(&self) -> Result<ConfirmedSchema, SchemaError> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(SchemaError::NotFound)
    }

    fn clear(&self) -> Result<(), SchemaError> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::ColumnType;
    use crate::schema::ConfirmedColumn;
    use tempfile::TempDir;

    fn sample_schema() -> ConfirmedSchema {
        ConfirmedSchema::new(vec![
            ConfirmedColumn::new("name", ColumnType::String),
            ConfirmedColumn::new("amount", ColumnType::Number),
        ])
        .unwrap()
    }

    #[test]
    fn test_file_store_round_trip_survives_new_instance() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("schema.json");

        FileSchemaStore::new(&path).save(&sample_schema()).unwrap();

        // A fresh instance stands in for a restart
        let reopened = FileSchemaStore::new(&path);
        assert_eq!(reopened.load().unwrap(), sample_schema());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_store_load_missing() {
        let dir = TempDir::new().unwrap();
        let store = FileSchemaStore::new(dir.path().join("schema.json"));
        assert!(matches!(store.load(), Err(SchemaError::NotFound)));
    }

    #[test]
    fn test_file_store_clear() {
        let dir = TempDir::new().unwrap();
        let store = FileSchemaStore::new(dir.path().join("schema.json"));
        store.clear().unwrap(); // nothing saved yet

        store.save(&sample_schema()).unwrap();
        store.clear().unwrap();
        assert!(matches!(store.load(), Err(SchemaError::NotFound)));
    }

    #[test]
    fn test_save_rejects_invalid_schema() {
        let store = MemorySchemaStore::new();
        let invalid = ConfirmedSchema {
            columns: vec![
                ConfirmedColumn::new("a", ColumnType::String),
                ConfirmedColumn::new("a", ColumnType::String),
            ],
        };
        assert!(matches!(
            store.save(&invalid),
            Err(SchemaError::InvalidSchema(_))
        ));
        assert!(matches!(store.load(), Err(SchemaError::NotFound)));
    }

    #[test]
    fn test_memory_store_overwrites() {
        let store = MemorySchemaStore::new();
        store.save(&sample_schema()).unwrap();

        let replacement =
            ConfirmedSchema::new(vec![ConfirmedColumn::new("x", ColumnType::Boolean)]).unwrap();
        store.save(&replacement).unwrap();
        assert_eq!(store.load().unwrap(), replacement);
    }
}
