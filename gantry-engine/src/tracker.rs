// Experiment Tracker
// Accumulates key/value pairs during a run and commits them as one JSON
// blob under a run-scoped directory. A run directory is never overwritten.

use std::fs::{self, File};
use std::path::PathBuf;

use serde_json::Value;

use crate::error::{EngineError, EngineResult};

/// File name of the committed blob inside a run directory
pub const EXPERIMENT_FILENAME: &str = "experiment.json";

/// Default experiment root: `~/.gantry/experiments`
pub fn default_experiment_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".gantry")
        .join("experiments")
}

/// Tracks experiment values for one run.
///
/// `track` may be called any number of times; re-tracking a key overwrites
/// it. `commit` writes nothing for an empty tracker.
#[derive(Debug, Default)]
pub struct ExperimentTracker {
    run_name: Option<String>,
    experiment_dir: Option<PathBuf>,
    values: serde_json::Map<String, Value>,
}

impl ExperimentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the run explicitly instead of the timestamp default.
    pub fn with_run_name(mut self, run_name: impl Into<String>) -> Self {
        self.run_name = Some(run_name.into());
        self
    }

    /// Store runs under this directory instead of the home-based default.
    pub fn with_experiment_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.experiment_dir = Some(dir.into());
        self
    }

    pub fn track(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Write all tracked pairs to `<dir>/<run>/experiment.json` and return
    /// the path, or `None` if nothing was tracked. Fails if the run
    /// directory already exists.
    pub fn commit(&self) -> EngineResult<Option<PathBuf>> {
        if self.values.is_empty() {
            return Ok(None);
        }

        let run_name = self.run_name.clone().unwrap_or_else(|| {
            chrono::Local::now()
                .format("run-%Y-%m-%d-%H-%M-%S")
                .to_string()
        });
        let experiment_dir = self
            .experiment_dir
            .clone()
            .unwrap_or_else(default_experiment_dir);

        fs::create_dir_all(&experiment_dir)?;
        let run_dir = experiment_dir.join(&run_name);
        if run_dir.exists() {
            return Err(EngineError::RunExists(run_name));
        }
        fs::create_dir(&run_dir)?;

        let path = run_dir.join(EXPERIMENT_FILENAME);
        let file = File::create(&path)?;
        serde_json::to_writer_pretty(file, &self.values)?;
        Ok(Some(path))
    }
}
