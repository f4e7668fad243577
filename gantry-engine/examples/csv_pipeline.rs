use gantry_engine::{EngineError, ExecutionEvent, PipelineRunner, ProjectConfig};
use serde_json::{json, Value};

fn main() -> gantry_engine::EngineResult<()> {
    let yaml = r#"
pipeline_definition:
  load: {}
  clean:
    df: "ref::load"
    min_population: 1000
  save:
    df: "ref::clean"
step_implementation_modules:
  - demo_steps
data_catalog:
  out:
    type: csv
    path: demo_data/out.csv
    write_params:
      index: false
"#;

    let config = ProjectConfig::from_yaml_str(yaml)?;

    let mut runner = PipelineRunner::new().with_progress(Box::new(|event| match event {
        ExecutionEvent::PipelineStarted {
            pipeline,
            total_steps,
        } => println!("==> Pipeline `{}` ({} steps)", pipeline, total_steps),
        ExecutionEvent::StepStarted { step } => println!("  Executing `{}`...", step),
        ExecutionEvent::StepCompleted { step, duration } => {
            println!("  Completed `{}` in {:.3?}", step, duration)
        }
        ExecutionEvent::PipelineCompleted {
            executed_steps,
            duration,
            ..
        } => println!("==> Done: {} steps in {:.3?}", executed_steps, duration),
    }));

    runner.register_module_fn("demo_steps", |registry| {
        registry.register("load", |_ctx, _args| {
            Ok(json!([
                {"city": "Pavia", "population": 71_000},
                {"city": "Ghost Town", "population": 12},
                {"city": "Ulm", "population": 126_000},
            ]))
        });

        registry.register("clean", |_ctx, args| {
            let min = args
                .get("min_population")
                .and_then(Value::as_i64)
                .unwrap_or(0);
            let rows = args
                .get("df")
                .and_then(Value::as_array)
                .ok_or_else(|| EngineError::step("clean expects a table in `df`"))?;
            let kept: Vec<Value> = rows
                .iter()
                .filter(|row| {
                    row.get("population").and_then(Value::as_i64).unwrap_or(0) >= min
                })
                .cloned()
                .collect();
            Ok(Value::Array(kept))
        });

        registry.register("save", |ctx, args| {
            let df = args
                .get("df")
                .cloned()
                .ok_or_else(|| EngineError::step("save expects `df`"))?;
            ctx.write_data("out", &df)?;
            ctx.track("rows_written", json!(df.as_array().map(Vec::len).unwrap_or(0)));
            Ok(df)
        });
    });

    let report = runner.run(&config, None)?;
    println!("\n{}", report.render());
    println!("Wrote demo_data/out.csv");
    if let Some(path) = &report.experiment {
        println!("Experiment committed to {}", path.display());
    }
    Ok(())
}
