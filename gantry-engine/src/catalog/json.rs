// Opaque blob format
// Serializes any in-memory value to JSON on disk; round-trips losslessly.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::Value;

use super::format::{ensure_parent_dir, DatasetFormat, FormatParams};
use crate::error::EngineResult;

pub struct JsonFormat;

impl DatasetFormat for JsonFormat {
    fn read(&self, path: &Path, _params: &FormatParams) -> EngineResult<Value> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    fn write(&self, path: &Path, value: &Value, _params: &FormatParams) -> EngineResult<()> {
        ensure_parent_dir(path)?;
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.json");
        let value = json!({
            "name": "model",
            "weights": [0.1, 0.2, 0.3],
            "nested": {"epochs": 10, "shuffle": true, "note": null}
        });

        let format = JsonFormat;
        format.write(&path, &value, &FormatParams::new()).unwrap();
        let read_back = format.read(&path, &FormatParams::new()).unwrap();

        assert_eq!(read_back, value);
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("blob.json");

        JsonFormat
            .write(&path, &json!(1), &FormatParams::new())
            .unwrap();
        assert!(path.exists());
    }
}
