// Step and object registries
// Binds step names to callables and holds pre-built objects injectable via
// `obj::` references. Step modules bundle registrations under a name so a
// config can declare which bundles to load before graph building.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::context::StepContext;
use crate::error::{EngineError, EngineResult};

/// A step's arguments mapping, insertion order preserved
pub type StepArgs = IndexMap<String, Value>;

/// A bound step callable: resolved arguments in, output value out. The
/// context gives steps catalog access and experiment tracking without any
/// process-wide state.
pub type StepFn = Arc<dyn Fn(&StepContext<'_>, StepArgs) -> EngineResult<Value>>;

/// Step name -> most recent return value, written once per step per run
pub type StepOutputMap = HashMap<String, Value>;

/// Registry binding step names to callables.
///
/// Re-registering a name silently overwrites the previous binding; the last
/// registration wins. The executor, not the callable, captures return values
/// into the [`StepOutputMap`].
#[derive(Default, Clone)]
pub struct StepRegistry {
    steps: HashMap<String, StepFn>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&StepContext<'_>, StepArgs) -> EngineResult<Value> + 'static,
    {
        self.steps.insert(name.into(), Arc::new(func));
    }

    pub fn get(&self, name: &str) -> Option<StepFn> {
        self.steps.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl std::fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.steps.keys().collect();
        names.sort();
        f.debug_struct("StepRegistry").field("steps", &names).finish()
    }
}

/// Pre-built values injectable into steps through `obj::` references.
///
/// Populated before a run, read-only during execution. Inserting an existing
/// key overwrites it.
#[derive(Debug, Default, Clone)]
pub struct ObjectRegistry {
    objects: HashMap<String, Value>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.objects.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.objects.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }
}

/// A named bundle of step registrations.
///
/// The configuration's `step_implementation_modules` list names modules to
/// apply, in order, before graph building.
pub trait StepModule {
    fn name(&self) -> &str;

    fn register(&self, registry: &mut StepRegistry);
}

struct FnModule<F> {
    name: String,
    register: F,
}

impl<F> StepModule for FnModule<F>
where
    F: Fn(&mut StepRegistry),
{
    fn name(&self) -> &str {
        &self.name
    }

    fn register(&self, registry: &mut StepRegistry) {
        (self.register)(registry)
    }
}

/// The set of step modules known to a runner, keyed by module name.
#[derive(Default)]
pub struct ModuleSet {
    modules: HashMap<String, Box<dyn StepModule>>,
}

impl ModuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module: Box<dyn StepModule>) {
        self.modules.insert(module.name().to_string(), module);
    }

    /// Register a module from a plain closure.
    pub fn insert_fn<F>(&mut self, name: impl Into<String>, register: F)
    where
        F: Fn(&mut StepRegistry) + 'static,
    {
        self.insert(Box::new(FnModule {
            name: name.into(),
            register,
        }));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Apply the named modules to a registry, in declared order. Fails with
    /// [`EngineError::ModuleLoad`] on the first unknown name, before any
    /// graph building can start.
    pub fn load_into(&self, names: &[String], registry: &mut StepRegistry) -> EngineResult<()> {
        for name in names {
            let module = self
                .modules
                .get(name)
                .ok_or_else(|| EngineError::ModuleLoad(name.clone()))?;
            module.register(registry);
        }
        Ok(())
    }
}
