// Reference tags and resolution
// A string argument may carry one of three prefixes that turn it into a
// reference: `ref::` (another step's output), `data::` (a catalog entry),
// `obj::` (a pre-built registry object). Everything else passes through.

use serde_json::Value;

use crate::catalog::DataCatalog;
use crate::error::{EngineError, EngineResult};
use crate::registry::{ObjectRegistry, StepArgs, StepOutputMap};

/// Prefix marking a reference to another step's output
pub const STEP_OUTPUT_PREFIX: &str = "ref::";
/// Prefix marking a reference to a data catalog entry
pub const CATALOG_DATA_PREFIX: &str = "data::";
/// Prefix marking a reference to an object registry entry
pub const REGISTRY_OBJECT_PREFIX: &str = "obj::";

/// A classified reference, parsed once from a raw string value.
///
/// The three prefixes are mutually exclusive; only the first matching one is
/// honored, checked in the order step output, catalog data, registry object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    StepOutput(String),
    CatalogData(String),
    RegistryObject(String),
}

impl Reference {
    /// Classify a raw string. Returns `None` for plain values that carry no
    /// recognized prefix. Whitespace around the tag and the identifier is
    /// trimmed.
    pub fn parse(raw: &str) -> Option<Reference> {
        let trimmed = raw.trim();
        if let Some(rest) = trimmed.strip_prefix(STEP_OUTPUT_PREFIX) {
            return Some(Reference::StepOutput(rest.trim().to_string()));
        }
        if let Some(rest) = trimmed.strip_prefix(CATALOG_DATA_PREFIX) {
            return Some(Reference::CatalogData(rest.trim().to_string()));
        }
        if let Some(rest) = trimmed.strip_prefix(REGISTRY_OBJECT_PREFIX) {
            return Some(Reference::RegistryObject(rest.trim().to_string()));
        }
        None
    }
}

/// Resolves argument values against the three reference namespaces.
///
/// Borrowed per invocation by the executor; a missing target is an error,
/// never a silent default.
pub struct Resolver<'a> {
    pub outputs: &'a StepOutputMap,
    pub catalog: &'a DataCatalog,
    pub objects: &'a ObjectRegistry,
}

impl Resolver<'_> {
    /// Resolve a full arguments mapping. Nested mappings are resolved
    /// recursively, matching the graph builder's dependency scan.
    pub fn resolve_args(&self, args: &StepArgs) -> EngineResult<StepArgs> {
        args.iter()
            .map(|(key, value)| Ok((key.clone(), self.resolve_value(value)?)))
            .collect()
    }

    /// Resolve a single value: strings are classified and substituted,
    /// mappings recurse, everything else is returned unchanged.
    pub fn resolve_value(&self, value: &Value) -> EngineResult<Value> {
        match value {
            Value::String(raw) => match Reference::parse(raw) {
                Some(Reference::StepOutput(name)) => self
                    .outputs
                    .get(&name)
                    .cloned()
                    .ok_or(EngineError::UnresolvedStepOutput(name)),
                Some(Reference::CatalogData(key)) => self.catalog.read(&key),
                Some(Reference::RegistryObject(key)) => self
                    .objects
                    .get(&key)
                    .cloned()
                    .ok_or(EngineError::UnresolvedObject(key)),
                None => Ok(value.clone()),
            },
            Value::Object(map) => {
                let mut resolved = serde_json::Map::with_capacity(map.len());
                for (key, nested) in map {
                    resolved.insert(key.clone(), self.resolve_value(nested)?);
                }
                Ok(Value::Object(resolved))
            }
            other => Ok(other.clone()),
        }
    }
}
