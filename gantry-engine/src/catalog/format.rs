// Dataset formats
// A format is a reader/writer capability registered under a type tag. The
// registry is extensible before a run; re-registering a tag overwrites it.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::error::EngineResult;

/// Optional read/write parameters from a catalog entry
pub type FormatParams = serde_json::Map<String, Value>;

/// Type tag of the built-in opaque blob format
pub const JSON_FORMAT: &str = "json";
/// Type tag of the built-in tabular format
pub const CSV_FORMAT: &str = "csv";

/// Reader/writer capability for one storage format.
pub trait DatasetFormat {
    fn read(&self, path: &Path, params: &FormatParams) -> EngineResult<Value>;

    fn write(&self, path: &Path, value: &Value, params: &FormatParams) -> EngineResult<()>;
}

/// Type tag -> format capability.
///
/// Last registration wins; there is no duplicate-tag diagnostic.
#[derive(Clone)]
pub struct FormatRegistry {
    formats: HashMap<String, Arc<dyn DatasetFormat>>,
}

impl FormatRegistry {
    /// A registry with no formats at all.
    pub fn empty() -> Self {
        Self {
            formats: HashMap::new(),
        }
    }

    /// A registry holding the built-in `json` and `csv` formats.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(JSON_FORMAT, Arc::new(super::json::JsonFormat));
        registry.register(CSV_FORMAT, Arc::new(super::csv::CsvFormat));
        registry
    }

    pub fn register(&mut self, tag: impl Into<String>, format: Arc<dyn DatasetFormat>) {
        self.formats.insert(tag.into(), format);
    }

    pub fn get(&self, tag: &str) -> Option<Arc<dyn DatasetFormat>> {
        self.formats.get(tag).cloned()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.formats.contains_key(tag)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<_> = self.formats.keys().collect();
        tags.sort();
        f.debug_struct("FormatRegistry").field("tags", &tags).finish()
    }
}

/// Create missing parent directories before a write.
pub(crate) fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
