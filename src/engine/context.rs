use std::collections::HashMap;

use crate::graph::{JobGraph, JobNode};
use crate::traits::{DataMap, JobInputs};

/// Per-job bookkeeping within one task execution.
struct JobState {
    inputs_so_far: JobInputs,
    fired: bool,
}

/// Execution state for one (task, graph) pair.
///
/// Input buffers fill monotonically as predecessors complete; `fired` flips
/// exactly when a job's `run` is scheduled, guarding the fire-once rule.
/// A context is owned by the single task execution that created it and is
/// discarded once the task's result has been produced.
pub struct ExecutionContext {
    states: HashMap<String, JobState>,
}

impl ExecutionContext {
    pub fn new(graph: &JobGraph) -> Self {
        let states = graph
            .names()
            .map(|name| {
                (
                    name.clone(),
                    JobState {
                        inputs_so_far: JobInputs::new(),
                        fired: false,
                    },
                )
            })
            .collect();
        Self { states }
    }

    /// Record `output` produced by `from` as an input of `job`. Arrival
    /// order is irrelevant; only key membership feeds the firing rule.
    pub fn record_input(&mut self, job: &str, from: &str, output: DataMap) {
        if let Some(state) = self.states.get_mut(job) {
            state.inputs_so_far.insert(from.to_string(), output);
        }
    }

    /// Apply the firing rule: a job fires iff every expected input has
    /// arrived and it has not fired before. On fire, returns the complete
    /// input mapping to hand to `run`.
    pub fn try_fire(&mut self, name: &str, node: &JobNode) -> Option<JobInputs> {
        let state = self.states.get_mut(name)?;
        if state.fired {
            return None;
        }
        let ready = node
            .expected_inputs
            .iter()
            .all(|dep| state.inputs_so_far.contains_key(dep));
        if !ready {
            return None;
        }
        state.fired = true;
        Some(state.inputs_so_far.clone())
    }

    #[cfg(test)]
    pub(crate) fn has_fired(&self, job: &str) -> bool {
        self.states.get(job).map(|s| s.fired).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DependencyGraph;
    use crate::jobs::ValueJob;
    use std::sync::Arc;

    fn two_into_one() -> JobGraph {
        let mut graph = DependencyGraph::new();
        graph.add_successors("head".into(), vec!["left".into(), "right".into()]);
        graph.add_successors("left".into(), vec!["join".into()]);
        graph.add_successors("right".into(), vec!["join".into()]);
        graph.add_successors("join".into(), vec![]);

        let registry = ["head", "left", "right", "join"]
            .into_iter()
            .map(|n| {
                (
                    n.to_string(),
                    Arc::new(ValueJob::named(n, n)) as Arc<dyn crate::traits::Job>,
                )
            })
            .collect();
        JobGraph::build(&graph, registry).unwrap()
    }

    #[test]
    fn fan_in_waits_for_all_predecessors() {
        let graph = two_into_one();
        let mut context = ExecutionContext::new(&graph);
        let join = graph.node("join").unwrap();

        context.record_input("join", "left", DataMap::new());
        assert!(context.try_fire("join", join).is_none());

        context.record_input("join", "right", DataMap::new());
        let inputs = context.try_fire("join", join).unwrap();
        assert_eq!(inputs.len(), 2);
        assert!(inputs.contains_key("left") && inputs.contains_key("right"));
    }

    #[test]
    fn firing_is_guarded_once() {
        let graph = two_into_one();
        let mut context = ExecutionContext::new(&graph);
        let join = graph.node("join").unwrap();

        context.record_input("join", "left", DataMap::new());
        context.record_input("join", "right", DataMap::new());
        assert!(context.try_fire("join", join).is_some());
        assert!(context.try_fire("join", join).is_none());
        assert!(context.has_fired("join"));
    }

    #[test]
    fn head_fires_with_no_expected_inputs() {
        let graph = two_into_one();
        let mut context = ExecutionContext::new(&graph);
        let head = graph.node("head").unwrap();
        assert!(context.try_fire("head", head).is_some());
    }
}
