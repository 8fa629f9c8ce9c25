// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use crate::dsl::Node;
use crate::errors::GraphError;
use crate::graph::{DependencyGraph, JobGraph};
use crate::traits::Job;

/// The leaves of a subexpression that touch the outside world: `entry` jobs
/// consume inputs from outside the subexpression, `terminal` jobs deliver
/// outputs outside it.
struct Frontier {
    entry: Vec<String>,
    terminal: Vec<String>,
}

/// Lower a composition expression into a precedence graph.
///
/// Serial composition connects every terminal of one component to every
/// entry of the next; parallel composition unions frontiers. Added edges are
/// deduplicated and successor order follows declaration order.
pub fn compile(node: &Node) -> Result<DependencyGraph, GraphError> {
    Ok(compile_with_jobs(node)?.0)
}

/// Compile an expression and wire the job instances it holds into a ready
/// [`JobGraph`].
pub fn build_graph(node: &Node) -> Result<JobGraph, GraphError> {
    let (graph, jobs) = compile_with_jobs(node)?;
    JobGraph::build(&graph, jobs)
}

fn compile_with_jobs(
    node: &Node,
) -> Result<(DependencyGraph, HashMap<String, Arc<dyn Job>>), GraphError> {
    let mut edges: HashMap<String, Vec<String>> = HashMap::new();
    let mut jobs: HashMap<String, Arc<dyn Job>> = HashMap::new();
    visit(node, &mut edges, &mut jobs)?;

    let graph = DependencyGraph::from(edges);
    // The operator algebra cannot form a cycle; assert anyway so a bug here
    // cannot hang the engine.
    if let Some(cycle) = graph.find_cycle() {
        return Err(GraphError::Cycle(cycle));
    }
    Ok((graph, jobs))
}

fn visit(
    node: &Node,
    edges: &mut HashMap<String, Vec<String>>,
    jobs: &mut HashMap<String, Arc<dyn Job>>,
) -> Result<Frontier, GraphError> {
    match node {
        Node::Leaf(job) => {
            let name = job.name().to_string();
            if jobs.insert(name.clone(), job.clone()).is_some() {
                return Err(GraphError::DuplicateName(name));
            }
            edges.entry(name.clone()).or_default();
            Ok(Frontier {
                entry: vec![name.clone()],
                terminal: vec![name],
            })
        }
        Node::Parallel(children) => {
            if children.is_empty() {
                return Err(GraphError::EmptyComposition("parallel"));
            }
            let mut entry = Vec::new();
            let mut terminal = Vec::new();
            for child in children {
                let frontier = visit(child, edges, jobs)?;
                entry.extend(frontier.entry);
                terminal.extend(frontier.terminal);
            }
            Ok(Frontier { entry, terminal })
        }
        Node::Serial(children) => {
            let mut iter = children.iter();
            let Some(first_child) = iter.next() else {
                return Err(GraphError::EmptyComposition("serial"));
            };
            let first = visit(first_child, edges, jobs)?;
            let entry = first.entry;
            let mut terminal = first.terminal;
            for child in iter {
                let frontier = visit(child, edges, jobs)?;
                for from in &terminal {
                    let successors = edges.entry(from.clone()).or_default();
                    for to in &frontier.entry {
                        if !successors.contains(to) {
                            successors.push(to.clone());
                        }
                    }
                }
                terminal = frontier.terminal;
            }
            Ok(Frontier { entry, terminal })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::{p, parallel, s, serial, wrap};

    fn successors(graph: &DependencyGraph, job: &str) -> Vec<String> {
        graph.successors(job).cloned().unwrap_or_default()
    }

    #[test]
    fn single_leaf() {
        let graph = compile(&wrap("A")).unwrap();
        assert_eq!(graph.len(), 1);
        assert!(successors(&graph, "A").is_empty());
    }

    #[test]
    fn serial_then_parallel_then_join() {
        // s(A, p(B, C), D) => A -> [B, C], B -> D, C -> D
        let expr = s([wrap("A"), p([wrap("B"), wrap("C")]), wrap("D")]);
        let graph = compile(&expr).unwrap();

        assert_eq!(successors(&graph, "A"), vec!["B", "C"]);
        assert_eq!(successors(&graph, "B"), vec!["D"]);
        assert_eq!(successors(&graph, "C"), vec!["D"]);
        assert!(successors(&graph, "D").is_empty());
    }

    #[test]
    fn association_does_not_change_the_graph() {
        let left = compile(&((wrap("a") | wrap("b")) | wrap("c"))).unwrap();
        let right = compile(&(wrap("a") | (wrap("b") | wrap("c")))).unwrap();
        let flat = compile(&parallel([wrap("a"), wrap("b"), wrap("c")])).unwrap();
        assert_eq!(left, right);
        assert_eq!(left, flat);

        let serial_left = compile(&((wrap("a") >> wrap("b")) >> wrap("c"))).unwrap();
        let serial_flat = compile(&serial([wrap("a"), wrap("b"), wrap("c")])).unwrap();
        assert_eq!(serial_left, serial_flat);
    }

    #[test]
    fn fan_out_fan_in_edges_are_complete() {
        // (a | b) >> (c | d): every terminal connects to every entry
        let expr = (wrap("a") | wrap("b")) >> (wrap("c") | wrap("d"));
        let graph = compile(&expr).unwrap();
        assert_eq!(successors(&graph, "a"), vec!["c", "d"]);
        assert_eq!(successors(&graph, "b"), vec!["c", "d"]);
    }

    #[test]
    fn nested_serial_frontiers() {
        // a >> (b | (c >> d)) >> e: terminals of the middle are {b, d}
        let expr = wrap("a") >> (wrap("b") | (wrap("c") >> wrap("d"))) >> wrap("e");
        let graph = compile(&expr).unwrap();
        assert_eq!(successors(&graph, "a"), vec!["b", "c"]);
        assert_eq!(successors(&graph, "b"), vec!["e"]);
        assert_eq!(successors(&graph, "c"), vec!["d"]);
        assert_eq!(successors(&graph, "d"), vec!["e"]);
    }

    #[test]
    fn empty_composition_is_rejected() {
        assert!(matches!(
            compile(&serial([])),
            Err(GraphError::EmptyComposition("serial"))
        ));
        assert!(matches!(
            compile(&parallel([])),
            Err(GraphError::EmptyComposition("parallel"))
        ));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let expr = wrap("same") >> wrap("same");
        assert!(matches!(
            compile(&expr),
            Err(GraphError::DuplicateName(name)) if name == "same"
        ));
    }

    #[test]
    fn wired_graph_round_trips_to_the_same_adjacency() {
        let expr = s([wrap("A"), p([wrap("B"), wrap("C")]), wrap("D")]);
        let adjacency = compile(&expr).unwrap();
        let graph = build_graph(&expr).unwrap();

        assert_eq!(graph.head(), "A");
        assert_eq!(graph.adjacency(), adjacency);
    }
}
