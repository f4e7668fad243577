// Engine error types
// One typed channel for everything that can go wrong during a run; the
// engine never terminates the process, callers decide what is fatal.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the engine
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("config path `{0}` does not exist")]
    ConfigNotFound(PathBuf),

    #[error("config file type `{0}` is not supported")]
    UnsupportedConfigFormat(String),

    #[error("config error: {0}")]
    Config(String),

    // Data catalog errors
    #[error("data catalog key `{0}` is not defined")]
    CatalogKey(String),

    #[error("data type `{kind}` of catalog entry `{key}` is not registered")]
    CatalogType { key: String, kind: String },

    #[error("tabular data error: {0}")]
    Tabular(String),

    // Reference resolution errors
    #[error("cannot resolve `ref::{0}`: no output recorded for that step")]
    UnresolvedStepOutput(String),

    #[error("cannot resolve `obj::{0}`: no registered object with that key")]
    UnresolvedObject(String),

    // Graph construction errors
    #[error("step `{step}` depends on unknown step `{dependency}`")]
    UnknownDependency { step: String, dependency: String },

    #[error("step `{0}` has no registered implementation")]
    UnregisteredStep(String),

    #[error("circular dependency involving steps: {0}")]
    Cycle(String),

    // Step module errors
    #[error("cannot load step module `{0}`: not present in the module set")]
    ModuleLoad(String),

    // Step execution errors
    #[error("step failed: {0}")]
    StepFailed(String),

    // Experiment tracker errors
    #[error("experiment run `{0}` already exists")]
    RunExists(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl EngineError {
    /// Convenience constructor for failures inside step callables
    pub fn step(message: impl Into<String>) -> Self {
        EngineError::StepFailed(message.into())
    }
}
