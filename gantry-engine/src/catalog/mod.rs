// Data Catalog
// A declarative registry of named, typed data locations. Steps read and
// write values through catalog keys instead of hard-coding storage paths
// and formats.

pub mod csv;
pub mod format;
pub mod json;

pub use self::csv::CsvFormat;
pub use self::format::{DatasetFormat, FormatParams, FormatRegistry, CSV_FORMAT, JSON_FORMAT};
pub use self::json::JsonFormat;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EngineError, EngineResult};

/// One catalog entry from configuration: a type tag, a storage path, and
/// optional read/write parameters. Read-only during execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "FormatParams::is_empty")]
    pub read_params: FormatParams,
    #[serde(default, skip_serializing_if = "FormatParams::is_empty")]
    pub write_params: FormatParams,
}

/// Catalog key -> entry, resolved against a [`FormatRegistry`].
///
/// Lookup failures (unknown key, unregistered type tag) are reported before
/// any I/O is attempted.
#[derive(Debug, Clone)]
pub struct DataCatalog {
    entries: HashMap<String, CatalogEntry>,
    formats: FormatRegistry,
}

impl DataCatalog {
    pub fn new(entries: HashMap<String, CatalogEntry>, formats: FormatRegistry) -> Self {
        Self { entries, formats }
    }

    pub fn entry(&self, key: &str) -> EngineResult<&CatalogEntry> {
        self.entries
            .get(key)
            .ok_or_else(|| EngineError::CatalogKey(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &CatalogEntry)> {
        self.entries.iter()
    }

    /// Read the value behind a catalog key.
    pub fn read(&self, key: &str) -> EngineResult<Value> {
        let entry = self.entry(key)?;
        let format = self.format_for(key, entry)?;
        format.read(&entry.path, &entry.read_params)
    }

    /// Persist a value behind a catalog key.
    pub fn write(&self, key: &str, value: &Value) -> EngineResult<()> {
        let entry = self.entry(key)?;
        let format = self.format_for(key, entry)?;
        format.write(&entry.path, value, &entry.write_params)
    }

    fn format_for(&self, key: &str, entry: &CatalogEntry) -> EngineResult<Arc<dyn DatasetFormat>> {
        self.formats
            .get(&entry.kind)
            .ok_or_else(|| EngineError::CatalogType {
                key: key.to_string(),
                kind: entry.kind.clone(),
            })
    }
}
