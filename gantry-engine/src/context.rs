// Step Context
// The explicit handle passed to every step callable: catalog reads and
// writes, object lookup, and experiment tracking, all scoped to one run.
// No process-wide state is reachable from step code.

use std::cell::RefCell;

use serde_json::Value;

use crate::catalog::DataCatalog;
use crate::error::EngineResult;
use crate::registry::ObjectRegistry;
use crate::tracker::ExperimentTracker;

pub struct StepContext<'a> {
    catalog: &'a DataCatalog,
    objects: &'a ObjectRegistry,
    tracker: &'a RefCell<ExperimentTracker>,
}

impl<'a> StepContext<'a> {
    pub fn new(
        catalog: &'a DataCatalog,
        objects: &'a ObjectRegistry,
        tracker: &'a RefCell<ExperimentTracker>,
    ) -> Self {
        Self {
            catalog,
            objects,
            tracker,
        }
    }

    pub fn catalog(&self) -> &DataCatalog {
        self.catalog
    }

    /// Read the value behind a catalog key.
    pub fn read_data(&self, key: &str) -> EngineResult<Value> {
        self.catalog.read(key)
    }

    /// Persist a value behind a catalog key.
    pub fn write_data(&self, key: &str, value: &Value) -> EngineResult<()> {
        self.catalog.write(key, value)
    }

    /// Look up a pre-registered object.
    pub fn object(&self, key: &str) -> Option<&Value> {
        self.objects.get(key)
    }

    /// Track an experiment value for this run. Re-tracking a key
    /// overwrites it; the runner commits tracked values after the run.
    pub fn track(&self, key: impl Into<String>, value: Value) {
        self.tracker.borrow_mut().track(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FormatRegistry;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_context_exposes_objects_and_tracking() {
        let catalog = DataCatalog::new(HashMap::new(), FormatRegistry::with_defaults());
        let mut objects = ObjectRegistry::new();
        objects.insert("model", json!("linear"));
        let tracker = RefCell::new(ExperimentTracker::new());

        let ctx = StepContext::new(&catalog, &objects, &tracker);
        assert_eq!(ctx.object("model"), Some(&json!("linear")));
        assert_eq!(ctx.object("missing"), None);

        ctx.track("accuracy", json!(0.9));
        assert!(!tracker.borrow().is_empty());
    }
}
