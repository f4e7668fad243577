// Execution Graph Builder
// Derives the dependency graph from a pipeline definition: scans each
// step's arguments (including nested mappings) for `ref::` tokens, counts
// in/out edges, and binds each step to its registered callable. Unknown
// dependencies, unbound steps, and cycles fail here, before any execution.

use std::collections::{HashMap, VecDeque};

use indexmap::IndexMap;
use serde_json::Value;

use crate::config::PipelineDefinition;
use crate::error::{EngineError, EngineResult};
use crate::reference::Reference;
use crate::registry::{StepArgs, StepFn, StepRegistry};

/// Per-step edge counts. A step with `outgoing == 0` is a sink: nothing
/// depends on it, and it is a valid traversal start point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeCounter {
    /// How many steps this step depends on
    pub incoming: usize,
    /// How many steps depend on this step
    pub outgoing: usize,
}

/// Structure-only view of a pipeline definition: dependency lists and edge
/// counters, no callable bindings. Used by tooling that validates or
/// inspects a configuration without executing it.
#[derive(Debug, Clone)]
pub struct GraphInfo {
    /// Step name -> dependency names in discovery order
    pub dependencies: IndexMap<String, Vec<String>>,
    pub counters: HashMap<String, EdgeCounter>,
}

impl GraphInfo {
    /// Scan a definition for dependencies and validate its shape.
    pub fn analyze(definition: &PipelineDefinition) -> EngineResult<Self> {
        let mut counters: HashMap<String, EdgeCounter> = definition
            .keys()
            .map(|name| (name.clone(), EdgeCounter::default()))
            .collect();

        let mut dependencies = IndexMap::with_capacity(definition.len());
        for (name, args) in definition {
            let mut deps = Vec::new();
            scan_args(args, &mut deps);

            for dep in &deps {
                if !definition.contains_key(dep) {
                    return Err(EngineError::UnknownDependency {
                        step: name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }

            if let Some(counter) = counters.get_mut(name) {
                counter.incoming = deps.len();
            }
            for dep in &deps {
                if let Some(counter) = counters.get_mut(dep) {
                    counter.outgoing += 1;
                }
            }
            dependencies.insert(name.clone(), deps);
        }

        let info = Self {
            dependencies,
            counters,
        };
        info.check_acyclic()?;
        Ok(info)
    }

    /// Sink steps (out-degree zero) in definition order.
    pub fn sinks(&self) -> Vec<&str> {
        self.dependencies
            .keys()
            .filter(|name| {
                self.counters
                    .get(name.as_str())
                    .map(|c| c.outgoing == 0)
                    .unwrap_or(false)
            })
            .map(String::as_str)
            .collect()
    }

    /// Total number of dependency edges.
    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(Vec::len).sum()
    }

    /// The deterministic order in which the executor will complete steps:
    /// dependency-first from each sink, memoized across shared dependencies.
    pub fn execution_order(&self) -> Vec<&str> {
        let mut order = Vec::with_capacity(self.dependencies.len());
        let mut visited: HashMap<&str, bool> = HashMap::new();

        for sink in self.sinks() {
            let mut stack: Vec<(&str, bool)> = vec![(sink, false)];
            while let Some((name, expanded)) = stack.pop() {
                if visited.get(name).copied().unwrap_or(false) {
                    continue;
                }
                if expanded {
                    visited.insert(name, true);
                    order.push(name);
                } else {
                    stack.push((name, true));
                    if let Some(deps) = self.dependencies.get(name) {
                        for dep in deps.iter().rev() {
                            stack.push((dep.as_str(), false));
                        }
                    }
                }
            }
        }
        order
    }

    /// Kahn's algorithm over the precomputed in-degrees: every step must
    /// reach in-degree zero, otherwise the leftover steps form a cycle.
    fn check_acyclic(&self) -> EngineResult<()> {
        let mut remaining: HashMap<&str, usize> = self
            .counters
            .iter()
            .map(|(name, counter)| (name.as_str(), counter.incoming))
            .collect();

        // dependency -> dependents, for decrementing as steps settle
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
        for (step, deps) in &self.dependencies {
            for dep in deps {
                dependents.entry(dep.as_str()).or_default().push(step.as_str());
            }
        }

        let mut queue: VecDeque<&str> = self
            .dependencies
            .keys()
            .filter(|name| remaining.get(name.as_str()) == Some(&0))
            .map(String::as_str)
            .collect();

        let mut settled = 0;
        while let Some(name) = queue.pop_front() {
            settled += 1;
            if let Some(steps) = dependents.get(name) {
                for &step in steps {
                    if let Some(degree) = remaining.get_mut(step) {
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push_back(step);
                        }
                    }
                }
            }
        }

        if settled == self.dependencies.len() {
            Ok(())
        } else {
            let mut stuck: Vec<&str> = self
                .dependencies
                .keys()
                .map(String::as_str)
                .filter(|name| remaining.get(name).map(|d| *d > 0).unwrap_or(false))
                .collect();
            stuck.sort_unstable();
            Err(EngineError::Cycle(stuck.join(", ")))
        }
    }
}

/// Collect `ref::` targets from an arguments mapping, descending into
/// nested mappings, in key order. Repeats of the same target collapse to
/// their first occurrence.
fn scan_args(args: &StepArgs, deps: &mut Vec<String>) {
    for value in args.values() {
        scan_value(value, deps);
    }
}

fn scan_value(value: &Value, deps: &mut Vec<String>) {
    match value {
        Value::String(raw) => {
            if let Some(Reference::StepOutput(name)) = Reference::parse(raw) {
                if !deps.contains(&name) {
                    deps.push(name);
                }
            }
        }
        Value::Object(map) => {
            for nested in map.values() {
                scan_value(nested, deps);
            }
        }
        _ => {}
    }
}

/// One step bound for execution: its callable, raw arguments, dependency
/// list, and the executed flag the executor flips after invocation.
pub struct ExecutionNode {
    pub(crate) func: StepFn,
    pub args: StepArgs,
    pub dependencies: Vec<String>,
    pub(crate) executed: bool,
}

impl ExecutionNode {
    pub fn executed(&self) -> bool {
        self.executed
    }
}

impl std::fmt::Debug for ExecutionNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionNode")
            .field("args", &self.args)
            .field("dependencies", &self.dependencies)
            .field("executed", &self.executed)
            .finish_non_exhaustive()
    }
}

/// The bound execution graph for one run: nodes in definition order plus
/// the edge counter table. Built once per run and discarded afterwards.
pub struct ExecutionGraph {
    pub(crate) nodes: IndexMap<String, ExecutionNode>,
    counters: HashMap<String, EdgeCounter>,
}

impl std::fmt::Debug for ExecutionGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionGraph")
            .field("nodes", &self.nodes)
            .field("counters", &self.counters)
            .finish()
    }
}

impl ExecutionGraph {
    /// Build the graph from a definition and an already-populated step
    /// registry. Fails fast: unknown dependency targets, steps without a
    /// registered callable, and cycles are all reported here.
    pub fn build(
        definition: &PipelineDefinition,
        registry: &StepRegistry,
    ) -> EngineResult<Self> {
        let info = GraphInfo::analyze(definition)?;

        let mut nodes = IndexMap::with_capacity(definition.len());
        for (name, args) in definition {
            let func = registry
                .get(name)
                .ok_or_else(|| EngineError::UnregisteredStep(name.clone()))?;
            let dependencies = info
                .dependencies
                .get(name)
                .cloned()
                .unwrap_or_default();
            nodes.insert(
                name.clone(),
                ExecutionNode {
                    func,
                    args: args.clone(),
                    dependencies,
                    executed: false,
                },
            );
        }

        Ok(Self {
            nodes,
            counters: info.counters,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, name: &str) -> Option<&ExecutionNode> {
        self.nodes.get(name)
    }

    pub fn counter(&self, name: &str) -> Option<EdgeCounter> {
        self.counters.get(name).copied()
    }

    /// Sink steps (out-degree zero) in definition order.
    pub fn sinks(&self) -> Vec<String> {
        self.nodes
            .keys()
            .filter(|name| {
                self.counters
                    .get(name.as_str())
                    .map(|c| c.outgoing == 0)
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }
}
