use crate::commands::validate::selected_pipelines;
use crate::output;

use std::path::PathBuf;

use clap::Args;
use color_eyre::Result;

use gantry_engine::{GraphInfo, ProjectConfig};

/// Print the deterministic execution order of each pipeline
#[derive(Args, Debug)]
pub struct OrderArgs {
    /// Path to the configuration file (yaml/yml/json)
    pub config: PathBuf,

    /// Show only this pipeline
    #[arg(long, value_name = "NAME")]
    pub pipeline: Option<String>,
}

pub fn execute(args: OrderArgs) -> Result<()> {
    let config = match ProjectConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            output::error(&e.to_string());
            std::process::exit(1);
        }
    };

    let pipelines = match selected_pipelines(&config, args.pipeline.as_deref()) {
        Ok(pipelines) => pipelines,
        Err(e) => {
            output::error(&e.to_string());
            std::process::exit(1);
        }
    };

    for (name, definition) in pipelines {
        let info = match GraphInfo::analyze(definition) {
            Ok(info) => info,
            Err(e) => {
                output::error(&format!("pipeline `{}`: {}", name, e));
                std::process::exit(1);
            }
        };

        output::header(&format!("Pipeline `{}`", name));
        for (position, step) in info.execution_order().iter().enumerate() {
            let deps = info
                .dependencies
                .get(*step)
                .map(|deps| deps.join(", "))
                .unwrap_or_default();
            if deps.is_empty() {
                println!("{:3}. {}", position + 1, step);
            } else {
                println!("{:3}. {}  (after: {})", position + 1, step, deps);
            }
        }
    }
    Ok(())
}
