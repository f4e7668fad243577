// Pipeline Runner
// The explicit per-run orchestrator: owns the step registry, object
// registry, module set, and format registry, and wires a configuration
// through graph building into execution. One runner per run; concurrent
// runs in one process each need their own runner.

use std::cell::RefCell;

use serde_json::Value;

use crate::catalog::{DataCatalog, DatasetFormat, FormatRegistry};
use crate::config::ProjectConfig;
use crate::error::EngineResult;
use crate::executor::{Executor, ProgressFn};
use crate::graph::ExecutionGraph;
use crate::registry::{ModuleSet, ObjectRegistry, StepModule, StepRegistry};
use crate::stats::RunReport;
use crate::tracker::ExperimentTracker;

pub struct PipelineRunner {
    steps: StepRegistry,
    objects: ObjectRegistry,
    modules: ModuleSet,
    formats: FormatRegistry,
    run_name: Option<String>,
    progress: Option<ProgressFn>,
}

impl PipelineRunner {
    pub fn new() -> Self {
        Self {
            steps: StepRegistry::new(),
            objects: ObjectRegistry::new(),
            modules: ModuleSet::new(),
            formats: FormatRegistry::with_defaults(),
            run_name: None,
            progress: None,
        }
    }

    /// Make a step module loadable through the configuration's
    /// `step_implementation_modules` list.
    pub fn register_module(&mut self, module: Box<dyn StepModule>) {
        self.modules.insert(module);
    }

    /// Register a step module from a plain closure.
    pub fn register_module_fn<F>(&mut self, name: impl Into<String>, register: F)
    where
        F: Fn(&mut StepRegistry) + 'static,
    {
        self.modules.insert_fn(name, register);
    }

    /// Pre-register an object injectable through `obj::` references.
    pub fn register_object(&mut self, key: impl Into<String>, value: Value) {
        self.objects.insert(key, value);
    }

    /// Register a dataset format under a type tag (last registration wins).
    pub fn register_format(
        &mut self,
        tag: impl Into<String>,
        format: std::sync::Arc<dyn DatasetFormat>,
    ) {
        self.formats.register(tag, format);
    }

    pub fn steps_mut(&mut self) -> &mut StepRegistry {
        &mut self.steps
    }

    /// Name the experiment run instead of the timestamp default.
    pub fn with_run_name(mut self, run_name: impl Into<String>) -> Self {
        self.run_name = Some(run_name.into());
        self
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Execute a pipeline from the configuration. `pipeline` selects one of
    /// several named pipelines; pass `None` for a flat definition.
    ///
    /// Loads the configured step modules, assembles the data catalog,
    /// builds the graph (failing fast on unknown dependencies, unbound
    /// steps, and cycles), runs it to completion, then commits any values
    /// the steps tracked.
    pub fn run(
        &mut self,
        config: &ProjectConfig,
        pipeline: Option<&str>,
    ) -> EngineResult<RunReport> {
        let (name, definition) = config.pipeline_definition.select(pipeline)?;
        let name = name.to_string();

        self.modules
            .load_into(&config.step_implementation_modules, &mut self.steps)?;

        let catalog = DataCatalog::new(config.data_catalog.clone(), self.formats.clone());
        let mut graph = ExecutionGraph::build(definition, &self.steps)?;

        let mut tracker = ExperimentTracker::new();
        if let Some(run_name) = &self.run_name {
            tracker = tracker.with_run_name(run_name.clone());
        }
        if let Some(dir) = &config.experiment_output_dir {
            tracker = tracker.with_experiment_dir(dir.clone());
        }
        let tracker = RefCell::new(tracker);

        let mut executor = Executor::new(&catalog, &self.objects, &tracker);
        if let Some(progress) = &self.progress {
            executor = executor.with_progress(progress);
        }
        let mut report = executor.run(&name, &mut graph)?;
        report.experiment = tracker.borrow().commit()?;
        Ok(report)
    }
}

impl Default for PipelineRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_run_loads_modules_and_executes() {
        let config = ProjectConfig::from_yaml_str(
            r#"
pipeline_definition:
  load: {}
  double:
    value: "ref::load"
step_implementation_modules:
  - math
"#,
        )
        .unwrap();

        let mut runner = PipelineRunner::new();
        runner.register_module_fn("math", |registry| {
            registry.register("load", |_ctx, _args| Ok(json!(21)));
            registry.register("double", |_ctx, args| {
                let value = args.get("value").and_then(Value::as_i64).unwrap_or(0);
                Ok(json!(value * 2))
            });
        });

        let report = runner.run(&config, None).unwrap();
        assert_eq!(report.completed(), vec!["load", "double"]);
        assert_eq!(report.experiment, None);
    }

    #[test]
    fn test_undeclared_module_fails_before_execution() {
        let config = ProjectConfig::from_yaml_str(
            r#"
pipeline_definition:
  load: {}
step_implementation_modules:
  - missing
"#,
        )
        .unwrap();

        let mut runner = PipelineRunner::new();
        let err = runner.run(&config, None).unwrap_err();
        assert!(matches!(err, crate::EngineError::ModuleLoad(name) if name == "missing"));
    }

    #[test]
    fn test_named_pipeline_selection() {
        let config = ProjectConfig::from_yaml_str(
            r#"
pipeline_definition:
  first:
    a: {}
  second:
    b: {}
step_implementation_modules: [steps]
"#,
        )
        .unwrap();

        let mut runner = PipelineRunner::new();
        runner.register_module_fn("steps", |registry| {
            registry.register("a", |_ctx, _args| Ok(json!("a")));
            registry.register("b", |_ctx, _args| Ok(json!("b")));
        });

        let report = runner.run(&config, Some("second")).unwrap();
        assert_eq!(report.pipeline, "second");
        assert_eq!(report.completed(), vec!["b"]);
    }

    #[test]
    fn test_tracked_values_commit_to_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProjectConfig::from_yaml_str(&format!(
            r#"
pipeline_definition:
  evaluate: {{}}
step_implementation_modules: [steps]
experiment_output_dir: {}
"#,
            dir.path().display()
        ))
        .unwrap();

        let mut runner = PipelineRunner::new().with_run_name("trial-7");
        runner.register_module_fn("steps", |registry| {
            registry.register("evaluate", |ctx, _args| {
                ctx.track("accuracy", json!(0.87));
                Ok(Value::Null)
            });
        });

        let report = runner.run(&config, None).unwrap();
        let path = report.experiment.unwrap();
        assert!(path.ends_with("trial-7/experiment.json"));
        assert!(path.exists());
    }
}
