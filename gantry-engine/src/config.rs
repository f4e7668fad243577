// Project configuration
// Loads the parsed mapping that drives a run: the pipeline definition(s),
// the step modules to load, the data catalog, and the experiment output
// directory. File format is dispatched on extension (yaml/yml/json).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;
use crate::error::{EngineError, EngineResult};
use crate::registry::StepArgs;

/// Ordered mapping step name -> arguments mapping. Key order drives
/// dependency-discovery order and therefore execution determinism.
pub type PipelineDefinition = IndexMap<String, StepArgs>;

/// Either one flat pipeline definition or a named collection of them.
///
/// The named form is tried first during deserialization; a flat definition
/// in which every argument value is itself a mapping is indistinguishable
/// from the named form and must be written as a named pipeline explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PipelineDefinitions {
    Named(IndexMap<String, PipelineDefinition>),
    Single(PipelineDefinition),
}

/// Display name used for the flat, unnamed form
pub const DEFAULT_PIPELINE_NAME: &str = "default";

impl PipelineDefinitions {
    /// Select a pipeline to run. With `None`, the flat form (or a named form
    /// holding exactly one pipeline) is used; with `Some(name)`, the named
    /// form is required.
    pub fn select(&self, name: Option<&str>) -> EngineResult<(&str, &PipelineDefinition)> {
        match (self, name) {
            (PipelineDefinitions::Single(definition), None) => {
                Ok((DEFAULT_PIPELINE_NAME, definition))
            }
            (PipelineDefinitions::Single(_), Some(requested)) => Err(EngineError::Config(format!(
                "config defines a single unnamed pipeline; cannot select `{requested}`"
            ))),
            (PipelineDefinitions::Named(pipelines), Some(requested)) => pipelines
                .get_key_value(requested)
                .map(|(name, definition)| (name.as_str(), definition))
                .ok_or_else(|| {
                    EngineError::Config(format!("pipeline `{requested}` is not defined"))
                }),
            (PipelineDefinitions::Named(pipelines), None) => match pipelines.first() {
                Some((name, definition)) if pipelines.len() == 1 => {
                    Ok((name.as_str(), definition))
                }
                _ => Err(EngineError::Config(format!(
                    "config defines {} pipelines; select one by name",
                    pipelines.len()
                ))),
            },
        }
    }

    /// Names of all defined pipelines, in declaration order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            PipelineDefinitions::Single(_) => vec![DEFAULT_PIPELINE_NAME],
            PipelineDefinitions::Named(pipelines) => {
                pipelines.keys().map(String::as_str).collect()
            }
        }
    }
}

/// The full parsed configuration for a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub pipeline_definition: PipelineDefinitions,
    /// Step modules to load, in order, before graph building
    pub step_implementation_modules: Vec<String>,
    #[serde(default)]
    pub data_catalog: HashMap<String, CatalogEntry>,
    #[serde(default)]
    pub experiment_output_dir: Option<PathBuf>,
}

impl ProjectConfig {
    /// Load a configuration file, dispatching the parser on the extension.
    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EngineError::ConfigNotFound(path.to_path_buf()));
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        let content = fs::read_to_string(path)?;
        match extension {
            "yaml" | "yml" => Self::from_yaml_str(&content),
            "json" => Self::from_json_str(&content),
            other => Err(EngineError::UnsupportedConfigFormat(format!(".{other}"))),
        }
    }

    pub fn from_yaml_str(content: &str) -> EngineResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FLAT_CONFIG: &str = r#"
pipeline_definition:
  load: {}
  clean:
    df: "ref::load"
  save:
    df: "ref::clean"
step_implementation_modules:
  - steps
data_catalog:
  out:
    type: csv
    path: out.csv
"#;

    #[test]
    fn test_parse_flat_definition() {
        let config = ProjectConfig::from_yaml_str(FLAT_CONFIG).unwrap();
        let (name, definition) = config.pipeline_definition.select(None).unwrap();

        assert_eq!(name, DEFAULT_PIPELINE_NAME);
        assert_eq!(
            definition.keys().collect::<Vec<_>>(),
            vec!["load", "clean", "save"]
        );
        assert_eq!(
            definition.get("clean").unwrap().get("df"),
            Some(&json!("ref::load"))
        );
        assert_eq!(config.step_implementation_modules, vec!["steps"]);
        assert!(config.data_catalog.contains_key("out"));
    }

    #[test]
    fn test_parse_named_definitions() {
        let config = ProjectConfig::from_yaml_str(
            r#"
pipeline_definition:
  training:
    load:
      path: "data::raw"
    fit:
      df: "ref::load"
  scoring:
    score:
      model: "obj::model"
step_implementation_modules: [steps]
"#,
        )
        .unwrap();

        assert_eq!(
            config.pipeline_definition.names(),
            vec!["training", "scoring"]
        );

        let (name, definition) = config.pipeline_definition.select(Some("scoring")).unwrap();
        assert_eq!(name, "scoring");
        assert!(definition.contains_key("score"));

        // Ambiguous selection across several pipelines is an error.
        assert!(config.pipeline_definition.select(None).is_err());
        assert!(config.pipeline_definition.select(Some("missing")).is_err());
    }

    #[test]
    fn test_parse_json_config() {
        let config = ProjectConfig::from_json_str(
            r#"{
                "pipeline_definition": {"only": {"x": 1}},
                "step_implementation_modules": ["steps"]
            }"#,
        )
        .unwrap();
        let (_, definition) = config.pipeline_definition.select(None).unwrap();
        assert_eq!(definition.get("only").unwrap().get("x"), Some(&json!(1)));
    }

    #[test]
    fn test_missing_file_and_unsupported_extension() {
        let err = ProjectConfig::from_file("/no/such/config.yaml").unwrap_err();
        assert!(matches!(err, EngineError::ConfigNotFound(_)));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "x = 1").unwrap();
        let err = ProjectConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedConfigFormat(ext) if ext == ".toml"));
    }

    #[test]
    fn test_missing_required_key_is_an_error() {
        let err = ProjectConfig::from_yaml_str("pipeline_definition: {}").unwrap_err();
        assert!(matches!(err, EngineError::Yaml(_)));
    }

    #[test]
    fn test_single_entry_named_form_selects_without_name() {
        let config = ProjectConfig::from_yaml_str(
            r#"
pipeline_definition:
  main:
    load:
      path: "raw.csv"
step_implementation_modules: []
"#,
        )
        .unwrap();
        let (name, _) = config.pipeline_definition.select(None).unwrap();
        assert_eq!(name, "main");
    }
}
