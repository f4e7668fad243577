// Topological Executor
// Walks the bound graph dependency-first from its sinks, memoized on each
// node's executed flag, resolving arguments at invocation time. Uses an
// explicit worklist instead of native recursion, so traversal depth is
// bounded by memory, not the call stack.

use std::cell::RefCell;
use std::time::{Duration, Instant};

use crate::catalog::DataCatalog;
use crate::context::StepContext;
use crate::error::EngineResult;
use crate::graph::ExecutionGraph;
use crate::reference::Resolver;
use crate::registry::{ObjectRegistry, StepOutputMap};
use crate::stats::{RunReport, StatsRecord};
use crate::tracker::ExperimentTracker;

/// Events emitted while a pipeline executes
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    PipelineStarted {
        pipeline: String,
        total_steps: usize,
    },
    StepStarted {
        step: String,
    },
    StepCompleted {
        step: String,
        duration: Duration,
    },
    PipelineCompleted {
        pipeline: String,
        executed_steps: usize,
        duration: Duration,
    },
}

/// Observer callback for execution progress
pub type ProgressFn = Box<dyn Fn(ExecutionEvent)>;

/// Executes one bound graph against a catalog, object registry, and
/// experiment tracker.
pub struct Executor<'a> {
    catalog: &'a DataCatalog,
    objects: &'a ObjectRegistry,
    tracker: &'a RefCell<ExperimentTracker>,
    progress: Option<&'a ProgressFn>,
}

impl<'a> Executor<'a> {
    pub fn new(
        catalog: &'a DataCatalog,
        objects: &'a ObjectRegistry,
        tracker: &'a RefCell<ExperimentTracker>,
    ) -> Self {
        Self {
            catalog,
            objects,
            tracker,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: &'a ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(progress) = self.progress {
            progress(event);
        }
    }

    /// Run every step reachable from the graph's sinks, exactly once each.
    ///
    /// For every dependency edge, the dependency's completion strictly
    /// precedes the dependent's invocation. Sinks start in definition
    /// order and dependencies are visited in discovery order, so the
    /// completion order is deterministic for a fixed definition.
    pub fn run(&self, pipeline: &str, graph: &mut ExecutionGraph) -> EngineResult<RunReport> {
        let started = Instant::now();
        self.emit(ExecutionEvent::PipelineStarted {
            pipeline: pipeline.to_string(),
            total_steps: graph.len(),
        });

        let mut outputs = StepOutputMap::new();
        let mut records = Vec::with_capacity(graph.len());
        for sink in graph.sinks() {
            self.visit(&sink, graph, &mut outputs, &mut records)?;
        }

        let report = RunReport {
            pipeline: pipeline.to_string(),
            records,
            total: started.elapsed(),
            experiment: None,
        };
        self.emit(ExecutionEvent::PipelineCompleted {
            pipeline: pipeline.to_string(),
            executed_steps: report.len(),
            duration: report.total,
        });
        Ok(report)
    }

    /// Post-order traversal from one sink. A frame is pushed unexpanded,
    /// re-pushed expanded once its dependencies are on the stack, and
    /// executed when it pops expanded. The executed flag makes shared
    /// dependencies (diamonds) run exactly once.
    fn visit(
        &self,
        sink: &str,
        graph: &mut ExecutionGraph,
        outputs: &mut StepOutputMap,
        records: &mut Vec<StatsRecord>,
    ) -> EngineResult<()> {
        let mut stack: Vec<(String, bool)> = vec![(sink.to_string(), false)];

        while let Some((name, expanded)) = stack.pop() {
            let Some(node) = graph.nodes.get(&name) else {
                // Build-time validation guarantees membership.
                continue;
            };
            if node.executed {
                continue;
            }

            if !expanded {
                stack.push((name.clone(), true));
                for dep in node.dependencies.iter().rev() {
                    stack.push((dep.clone(), false));
                }
                continue;
            }

            let func = node.func.clone();
            let args = node.args.clone();
            let dependencies = node.dependencies.clone();

            let resolver = Resolver {
                outputs: &*outputs,
                catalog: self.catalog,
                objects: self.objects,
            };
            let resolved = resolver.resolve_args(&args)?;

            self.emit(ExecutionEvent::StepStarted { step: name.clone() });
            let ctx = StepContext::new(self.catalog, self.objects, self.tracker);
            let tic = Instant::now();
            let value = (*func)(&ctx, resolved)?;
            let duration = tic.elapsed();

            outputs.insert(name.clone(), value);
            if let Some(node) = graph.nodes.get_mut(&name) {
                node.executed = true;
            }
            self.emit(ExecutionEvent::StepCompleted {
                step: name.clone(),
                duration,
            });
            records.push(StatsRecord {
                step: name,
                dependencies,
                duration,
            });
        }
        Ok(())
    }
}
