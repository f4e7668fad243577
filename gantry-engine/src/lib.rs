// Gantry Engine Library
// Configuration-driven execution engine for small data-processing pipelines:
// named steps, reference-tagged arguments, a typed data catalog, and
// memoized dependency-first execution with per-step timing.

pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod graph;
pub mod reference;
pub mod registry;
pub mod runner;
pub mod stats;
pub mod tracker;

// Re-export commonly used types
pub use error::{EngineError, EngineResult};

// Re-export configuration types
pub use config::{PipelineDefinition, PipelineDefinitions, ProjectConfig, DEFAULT_PIPELINE_NAME};

// Re-export catalog types
pub use catalog::{
    CatalogEntry, CsvFormat, DataCatalog, DatasetFormat, FormatParams, FormatRegistry, JsonFormat,
    CSV_FORMAT, JSON_FORMAT,
};

// Re-export graph and execution types
pub use context::StepContext;
pub use executor::{ExecutionEvent, Executor, ProgressFn};
pub use graph::{EdgeCounter, ExecutionGraph, ExecutionNode, GraphInfo};
pub use reference::{
    Reference, Resolver, CATALOG_DATA_PREFIX, REGISTRY_OBJECT_PREFIX, STEP_OUTPUT_PREFIX,
};
pub use registry::{
    ModuleSet, ObjectRegistry, StepArgs, StepFn, StepModule, StepOutputMap, StepRegistry,
};
pub use runner::PipelineRunner;
pub use stats::{RunReport, StatsRecord};
pub use tracker::ExperimentTracker;
