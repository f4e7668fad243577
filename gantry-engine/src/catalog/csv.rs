// Tabular format
// Row-oriented data with named columns, represented in the value plane as an
// array of records (one object per row). The writer mirrors the original
// engine's dataframe writer: by default it prepends a positional index
// column under an empty header; `write_params: {index: false}` omits it.
//
// A plain read treats the first row as the header and yields rows in file
// order, so a write with `index: false` followed by a default read restores
// the original row count and order. If the index column was written, a
// default read surfaces it as a data column named "".

use std::path::Path;

use serde_json::{Map, Number, Value};

use super::format::{ensure_parent_dir, DatasetFormat, FormatParams};
use crate::error::{EngineError, EngineResult};

pub struct CsvFormat;

impl DatasetFormat for CsvFormat {
    fn read(&self, path: &Path, params: &FormatParams) -> EngineResult<Value> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter(params)?)
            .from_path(path)?;

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row = Map::with_capacity(headers.len());
            for (header, cell) in headers.iter().zip(record.iter()) {
                row.insert(header.clone(), infer_cell(cell));
            }
            rows.push(Value::Object(row));
        }
        Ok(Value::Array(rows))
    }

    fn write(&self, path: &Path, value: &Value, params: &FormatParams) -> EngineResult<()> {
        let rows = as_records(value)?;
        let columns = column_order(&rows);
        let with_index = params
            .get("index")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        ensure_parent_dir(path)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter(params)?)
            .from_path(path)?;

        let mut header: Vec<&str> = Vec::with_capacity(columns.len() + 1);
        if with_index {
            header.push("");
        }
        header.extend(columns.iter().map(String::as_str));
        writer.write_record(&header)?;

        for (position, row) in rows.iter().enumerate() {
            let mut record: Vec<String> = Vec::with_capacity(columns.len() + 1);
            if with_index {
                record.push(position.to_string());
            }
            for column in &columns {
                record.push(render_cell(row.get(column).unwrap_or(&Value::Null))?);
            }
            writer.write_record(&record)?;
        }
        writer.flush().map_err(EngineError::Io)?;
        Ok(())
    }
}

fn as_records(value: &Value) -> EngineResult<Vec<&Map<String, Value>>> {
    let rows = value
        .as_array()
        .ok_or_else(|| EngineError::Tabular("expected an array of records".to_string()))?;
    rows.iter()
        .map(|row| {
            row.as_object().ok_or_else(|| {
                EngineError::Tabular(format!("expected a record per row, got `{row}`"))
            })
        })
        .collect()
}

/// Column order: first occurrence across rows.
fn column_order(rows: &[&Map<String, Value>]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn render_cell(value: &Value) -> EngineResult<String> {
    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // Nested collections are stored as compact JSON text.
        nested => serde_json::to_string(nested)?,
    })
}

/// Best-effort cell typing: integer, float, boolean, empty as null,
/// everything else stays a string.
fn infer_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(n) = cell.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(f) = cell.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    match cell {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(cell.to_string()),
    }
}

fn delimiter(params: &FormatParams) -> EngineResult<u8> {
    match params.get("delimiter").and_then(Value::as_str) {
        None => Ok(b','),
        Some(d) if d.len() == 1 => Ok(d.as_bytes()[0]),
        Some(d) => Err(EngineError::Tabular(format!(
            "delimiter must be a single character, got `{d}`"
        ))),
    }
}
