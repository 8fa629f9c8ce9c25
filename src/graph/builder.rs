// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::errors::GraphError;
use crate::graph::DependencyGraph;
use crate::traits::Job;

/// One wired node of a job graph: the job instance plus its ordered
/// successors and the set of predecessor names whose outputs must arrive
/// before it may fire.
pub struct JobNode {
    pub job: Arc<dyn Job>,
    pub next_jobs: Vec<String>,
    pub expected_inputs: HashSet<String>,
}

/// An immutable, fully wired graph of jobs with a single head.
///
/// The graph owns its jobs; wiring lives here rather than on the job
/// instances so the same `Arc<dyn Job>` stays immutable and shareable while
/// every task executed through the graph reads the same structure.
pub struct JobGraph {
    nodes: HashMap<String, JobNode>,
    head: String,
}

impl JobGraph {
    /// Wire a precedence mapping against a name -> job registry.
    ///
    /// Every name in the mapping must resolve to an instance; the mapping
    /// must be acyclic and have exactly one job with no predecessors, which
    /// becomes the head.
    pub fn build(
        graph: &DependencyGraph,
        mut registry: HashMap<String, Arc<dyn Job>>,
    ) -> Result<Self, GraphError> {
        if let Some(cycle) = graph.find_cycle() {
            return Err(GraphError::Cycle(cycle));
        }

        let counts = graph.build_predecessor_counts();
        let mut heads: Vec<String> = counts
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(job, _)| job.clone())
            .collect();
        heads.sort();
        if heads.len() != 1 {
            return Err(GraphError::NoSingleHead(heads.len(), heads));
        }
        let head = heads.remove(0);

        let predecessors = graph.build_predecessors();
        let mut nodes = HashMap::with_capacity(graph.len());
        for (name, successors) in graph.iter() {
            let job = registry
                .remove(name)
                .ok_or_else(|| GraphError::UndefinedJob(name.clone()))?;
            let expected_inputs = predecessors
                .get(name)
                .map(|preds| preds.iter().cloned().collect())
                .unwrap_or_default();
            nodes.insert(
                name.clone(),
                JobNode {
                    job,
                    next_jobs: successors.clone(),
                    expected_inputs,
                },
            );
        }

        Ok(Self { nodes, head })
    }

    /// Name of the unique source job; it consumes the task payload.
    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn node(&self, name: &str) -> Option<&JobNode> {
        self.nodes.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.nodes.keys()
    }

    /// Jobs with no successors; their outputs form the task result.
    pub fn sinks(&self) -> impl Iterator<Item = &String> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.next_jobs.is_empty())
            .map(|(name, _)| name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Reconstruct the forward adjacency this graph was wired from.
    pub fn adjacency(&self) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for (name, node) in &self.nodes {
            graph.add_successors(name.clone(), node.next_jobs.clone());
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{DataMap, JobInputs};
    use async_trait::async_trait;

    struct NamedStub(String);

    #[async_trait]
    impl Job for NamedStub {
        fn name(&self) -> &str {
            &self.0
        }

        async fn run(&self, _inputs: &JobInputs) -> anyhow::Result<DataMap> {
            Ok(DataMap::new())
        }
    }

    fn registry(names: &[&str]) -> HashMap<String, Arc<dyn Job>> {
        names
            .iter()
            .map(|n| {
                (
                    n.to_string(),
                    Arc::new(NamedStub(n.to_string())) as Arc<dyn Job>,
                )
            })
            .collect()
    }

    fn diamond() -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        graph.add_successors("a".into(), vec!["b".into(), "c".into()]);
        graph.add_successors("b".into(), vec!["d".into()]);
        graph.add_successors("c".into(), vec!["d".into()]);
        graph.add_successors("d".into(), vec![]);
        graph
    }

    #[test]
    fn wires_successors_and_expected_inputs() {
        let graph = JobGraph::build(&diamond(), registry(&["a", "b", "c", "d"])).unwrap();

        assert_eq!(graph.head(), "a");
        assert_eq!(graph.node("a").unwrap().next_jobs, vec!["b", "c"]);
        assert!(graph.node("a").unwrap().expected_inputs.is_empty());

        let d = graph.node("d").unwrap();
        assert!(d.next_jobs.is_empty());
        assert_eq!(
            d.expected_inputs,
            ["b".to_string(), "c".to_string()].into_iter().collect()
        );
    }

    #[test]
    fn sinks_are_reported() {
        let graph = JobGraph::build(&diamond(), registry(&["a", "b", "c", "d"])).unwrap();
        let sinks: Vec<&String> = graph.sinks().collect();
        assert_eq!(sinks, vec!["d"]);
    }

    #[test]
    fn zero_heads_is_rejected() {
        let mut cyclic = DependencyGraph::new();
        cyclic.add_successors("a".into(), vec!["b".into()]);
        cyclic.add_successors("b".into(), vec!["a".into()]);

        // the cycle is reported first; it is also the reason there is no head
        assert!(matches!(
            JobGraph::build(&cyclic, registry(&["a", "b"])),
            Err(GraphError::Cycle(_))
        ));
    }

    #[test]
    fn two_heads_are_rejected() {
        let mut graph = DependencyGraph::new();
        graph.add_successors("a".into(), vec!["c".into()]);
        graph.add_successors("b".into(), vec!["c".into()]);
        graph.add_successors("c".into(), vec![]);

        match JobGraph::build(&graph, registry(&["a", "b", "c"])) {
            Err(GraphError::NoSingleHead(2, heads)) => {
                assert_eq!(heads, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected NoSingleHead, got {:?}", other.err()),
        }
    }

    #[test]
    fn missing_instance_is_rejected() {
        let result = JobGraph::build(&diamond(), registry(&["a", "b", "c"]));
        assert!(matches!(result, Err(GraphError::UndefinedJob(name)) if name == "d"));
    }

    #[test]
    fn adjacency_round_trip() {
        let source = diamond();
        let graph = JobGraph::build(&source, registry(&["a", "b", "c", "d"])).unwrap();
        assert_eq!(graph.adjacency(), source);
    }
}
