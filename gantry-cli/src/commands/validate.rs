use crate::output;

use std::path::PathBuf;

use clap::Args;
use color_eyre::Result;

use gantry_engine::{
    FormatRegistry, GraphInfo, PipelineDefinition, PipelineDefinitions, ProjectConfig,
    DEFAULT_PIPELINE_NAME,
};

/// Validate a pipeline configuration file
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the configuration file (yaml/yml/json)
    pub config: PathBuf,

    /// Validate only this pipeline (default: all defined pipelines)
    #[arg(long, value_name = "NAME")]
    pub pipeline: Option<String>,
}

/// All pipelines a command should operate on.
pub fn selected_pipelines<'a>(
    config: &'a ProjectConfig,
    pipeline: Option<&str>,
) -> Result<Vec<(&'a str, &'a PipelineDefinition)>> {
    match (&config.pipeline_definition, pipeline) {
        (definitions, Some(name)) => {
            let pair = definitions
                .select(Some(name))
                .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;
            Ok(vec![pair])
        }
        (PipelineDefinitions::Single(definition), None) => {
            Ok(vec![(DEFAULT_PIPELINE_NAME, definition)])
        }
        (PipelineDefinitions::Named(pipelines), None) => Ok(pipelines
            .iter()
            .map(|(name, definition)| (name.as_str(), definition))
            .collect()),
    }
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    output::status("Validating", &args.config.display().to_string());

    let config = match ProjectConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            output::error(&e.to_string());
            std::process::exit(1);
        }
    };
    output::check("config parsed");

    let pipelines = match selected_pipelines(&config, args.pipeline.as_deref()) {
        Ok(pipelines) => pipelines,
        Err(e) => {
            output::error(&e.to_string());
            std::process::exit(1);
        }
    };

    let mut failed = false;
    for (name, definition) in &pipelines {
        match GraphInfo::analyze(definition) {
            Ok(info) => {
                output::check(&format!(
                    "pipeline `{}`: {} steps, {} edges, {} sink(s)",
                    name,
                    definition.len(),
                    info.edge_count(),
                    info.sinks().len(),
                ));
            }
            Err(e) => {
                output::error(&format!("pipeline `{}`: {}", name, e));
                failed = true;
            }
        }
    }

    // Catalog entries are checked against the built-in formats; embedding
    // applications may register more tags, so unknown ones only warn here.
    let formats = FormatRegistry::with_defaults();
    for (key, entry) in &config.data_catalog {
        if formats.contains(&entry.kind) {
            output::check(&format!("catalog `{}`: type `{}`", key, entry.kind));
        } else {
            output::warning(&format!(
                "catalog `{}` uses type `{}`, which is not a built-in format",
                key, entry.kind
            ));
        }
    }

    if !config.step_implementation_modules.is_empty() {
        output::detail(&format!(
            "step modules: {}",
            config.step_implementation_modules.join(", ")
        ));
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
