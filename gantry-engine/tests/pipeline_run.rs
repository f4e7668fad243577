// End-to-end runs through the public API: config in, catalog files out.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{json, Value};

use gantry_engine::{CsvFormat, DatasetFormat, EngineError, PipelineRunner, ProjectConfig};

fn cleaned_rows() -> Value {
    json!([
        {"city": "Pavia", "population": 71_000},
        {"city": "Ulm", "population": 126_000},
    ])
}

/// load -> clean -> save, with save writing through the catalog.
fn register_table_steps(runner: &mut PipelineRunner) {
    runner.register_module_fn("table_steps", |registry| {
        registry.register("load", |_ctx, _args| {
            Ok(json!([
                {"city": "Pavia", "population": 71_000},
                {"city": "Ghost Town", "population": 0},
                {"city": "Ulm", "population": 126_000},
            ]))
        });
        registry.register("clean", |_ctx, args| {
            let rows = args
                .get("df")
                .and_then(Value::as_array)
                .ok_or_else(|| EngineError::step("clean expects a table in `df`"))?;
            let kept: Vec<Value> = rows
                .iter()
                .filter(|row| row.get("population") != Some(&json!(0)))
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
            Ok(df)
        });
    });
}

#[test]
fn test_catalog_example_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("out.csv");
    let config = ProjectConfig::from_yaml_str(&format!(
        r#"
pipeline_definition:
  load: {{}}
  clean:
    df: "ref::load"
  save:
    df: "ref::clean"
step_implementation_modules:
  - table_steps
data_catalog:
  out:
    type: csv
    path: {}
    write_params:
      index: false
"#,
        out_path.display()
    ))
    .unwrap();

    let mut runner = PipelineRunner::new();
    register_table_steps(&mut runner);

    let report = runner.run(&config, None).unwrap();

    // Exactly three records, in completion order, save last.
    assert_eq!(report.completed(), vec!["load", "clean", "save"]);
    assert_eq!(report.records[2].dependencies, vec!["clean"]);

    // One out.csv with exactly the cleaned rows.
    assert!(out_path.exists());
    let written = CsvFormat
        .read(&out_path, &gantry_engine::FormatParams::new())
        .unwrap();
    assert_eq!(written, cleaned_rows());
}

#[test]
fn test_catalog_reference_feeds_a_step() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("out.csv");

    // Seed the file through the same format the catalog entry declares.
    CsvFormat
        .write(
            &out_path,
            &cleaned_rows(),
            json!({"index": false}).as_object().unwrap(),
        )
        .unwrap();

    let config = ProjectConfig::from_yaml_str(&format!(
        r#"
pipeline_definition:
  audit:
    df: "data::out"
step_implementation_modules: [audit_steps]
data_catalog:
  out:
    type: csv
    path: {}
"#,
        out_path.display()
    ))
    .unwrap();

    let seen = Rc::new(RefCell::new(Value::Null));
    let mut runner = PipelineRunner::new();
    let seen_in_step = Rc::clone(&seen);
    runner.register_module_fn("audit_steps", move |registry| {
        let seen = Rc::clone(&seen_in_step);
        registry.register("audit", move |_ctx, args| {
            *seen.borrow_mut() = args.get("df").cloned().unwrap_or(Value::Null);
            Ok(Value::Null)
        });
    });

    runner.run(&config, None).unwrap();
    assert_eq!(*seen.borrow(), cleaned_rows());
}

#[test]
fn test_diamond_runs_each_step_once() {
    let config = ProjectConfig::from_yaml_str(
        r#"
pipeline_definition:
  source: {}
  left:
    df: "ref::source"
  right:
    df: "ref::source"
  merge:
    a: "ref::left"
    b: "ref::right"
step_implementation_modules: [counting]
"#,
    )
    .unwrap();

    let invocations: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let mut runner = PipelineRunner::new();
    let log = Rc::clone(&invocations);
    runner.register_module_fn("counting", move |registry| {
        for name in ["source", "left", "right", "merge"] {
            let log = Rc::clone(&log);
            registry.register(name, move |_ctx, _args| {
                log.borrow_mut().push(name.to_string());
                Ok(json!(name))
            });
        }
    });

    let report = runner.run(&config, None).unwrap();

    assert_eq!(
        *invocations.borrow(),
        vec!["source", "left", "right", "merge"]
    );
    assert_eq!(report.completed(), vec!["source", "left", "right", "merge"]);
}

#[test]
fn test_missing_catalog_key_fails_the_run() {
    let config = ProjectConfig::from_yaml_str(
        r#"
pipeline_definition:
  load:
    df: "data::nope"
step_implementation_modules: [steps]
"#,
    )
    .unwrap();

    let mut runner = PipelineRunner::new();
    runner.register_module_fn("steps", |registry| {
        registry.register("load", |_ctx, _args| Ok(Value::Null));
    });

    let err = runner.run(&config, None).unwrap_err();
    assert!(matches!(err, EngineError::CatalogKey(key) if key == "nope"));
}

#[test]
fn test_cycle_fails_before_any_step_runs() {
    let config = ProjectConfig::from_yaml_str(
        r#"
pipeline_definition:
  a:
    x: "ref::b"
  b:
    x: "ref::a"
step_implementation_modules: [steps]
"#,
    )
    .unwrap();

    let ran = Rc::new(RefCell::new(false));
    let mut runner = PipelineRunner::new();
    let ran_flag = Rc::clone(&ran);
    runner.register_module_fn("steps", move |registry| {
        for name in ["a", "b"] {
            let ran = Rc::clone(&ran_flag);
            registry.register(name, move |_ctx, _args| {
                *ran.borrow_mut() = true;
                Ok(Value::Null)
            });
        }
    });

    let err = runner.run(&config, None).unwrap_err();
    assert!(matches!(err, EngineError::Cycle(_)));
    assert!(!*ran.borrow());
}
