// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Graph composition algebra.
//!
//! Compositions are built from two operators over [`Node`] values:
//! `|` runs both sides in parallel, `>>` runs the left side strictly before
//! the right. [`wrap`] lifts jobs and plain values into nodes, and
//! [`compile`](compiler::compile) lowers a finished expression into a
//! [`DependencyGraph`](crate::graph::DependencyGraph).
//!
//! ```
//! use jobgraph::dsl::{compile, serial, parallel, wrap};
//!
//! let expr = serial([wrap("extract"), parallel([wrap("score"), wrap("tag")]), wrap("store")]);
//! let graph = compile(&expr).unwrap();
//! assert_eq!(graph.successors("extract").unwrap(), &vec!["score".to_string(), "tag".to_string()]);
//! ```

mod compiler;

pub use compiler::{build_graph, compile};

use std::ops::{BitOr, Shr};
use std::sync::Arc;

use crate::jobs::{NamedJob, ValueJob};
use crate::traits::Job;

/// A node of a composition expression tree.
///
/// Composites never nest a variant directly inside itself: the operators
/// splice same-kind operands flat, so `a | b | c` is one `Parallel` with
/// three children.
pub enum Node {
    Leaf(Arc<dyn Job>),
    Parallel(Vec<Node>),
    Serial(Vec<Node>),
}

impl Node {
    pub fn leaf(job: Arc<dyn Job>) -> Self {
        Node::Leaf(job)
    }
}

/// Values that can appear as composition operands.
///
/// Lifting is idempotent: a `Node` lifts to itself, so `wrap(wrap(x))`
/// equals `wrap(x)`.
pub trait IntoNode {
    fn into_node(self) -> Node;
}

impl IntoNode for Node {
    fn into_node(self) -> Node {
        self
    }
}

impl IntoNode for Arc<dyn Job> {
    fn into_node(self) -> Node {
        Node::Leaf(self)
    }
}

impl<J: Job + 'static> IntoNode for J {
    fn into_node(self) -> Node {
        Node::Leaf(Arc::new(self))
    }
}

impl IntoNode for &str {
    fn into_node(self) -> Node {
        Node::Leaf(Arc::new(ValueJob::new(self)))
    }
}

impl IntoNode for String {
    fn into_node(self) -> Node {
        Node::Leaf(Arc::new(ValueJob::new(self)))
    }
}

impl IntoNode for i64 {
    fn into_node(self) -> Node {
        Node::Leaf(Arc::new(ValueJob::new(self)))
    }
}

impl IntoNode for bool {
    fn into_node(self) -> Node {
        Node::Leaf(Arc::new(ValueJob::new(self)))
    }
}

/// Lift a job or plain value into a composition node.
pub fn wrap(value: impl IntoNode) -> Node {
    value.into_node()
}

/// Lift a value into a node under an explicit name; the name becomes the
/// node's identity in the compiled graph. Composites pass through unchanged.
pub fn wrap_named(name: impl Into<String>, value: impl IntoNode) -> Node {
    match value.into_node() {
        Node::Leaf(job) => Node::Leaf(Arc::new(NamedJob::new(name, job))),
        composite => composite,
    }
}

impl BitOr for Node {
    type Output = Node;

    /// Parallel composition; `Parallel` operands on either side are spliced
    /// flat.
    fn bitor(self, rhs: Node) -> Node {
        let mut children = match self {
            Node::Parallel(children) => children,
            other => vec![other],
        };
        match rhs {
            Node::Parallel(more) => children.extend(more),
            other => children.push(other),
        }
        Node::Parallel(children)
    }
}

impl Shr for Node {
    type Output = Node;

    /// Serial composition; `Serial` operands on either side are spliced
    /// flat, anything else becomes a single child.
    fn shr(self, rhs: Node) -> Node {
        let mut children = match self {
            Node::Serial(children) => children,
            other => vec![other],
        };
        match rhs {
            Node::Serial(more) => children.extend(more),
            other => children.push(other),
        }
        Node::Serial(children)
    }
}

/// Parallel composition of many nodes; equivalent to folding `|`.
pub fn parallel(nodes: impl IntoIterator<Item = Node>) -> Node {
    let mut iter = nodes.into_iter();
    match iter.next() {
        None => Node::Parallel(Vec::new()),
        Some(first) => match iter.next() {
            None => first,
            Some(second) => iter.fold(first | second, |acc, node| acc | node),
        },
    }
}

/// Serial composition of many nodes; equivalent to folding `>>`.
pub fn serial(nodes: impl IntoIterator<Item = Node>) -> Node {
    let mut iter = nodes.into_iter();
    match iter.next() {
        None => Node::Serial(Vec::new()),
        Some(first) => match iter.next() {
            None => first,
            Some(second) => iter.fold(first >> second, |acc, node| acc >> node),
        },
    }
}

/// Shorthand for [`parallel`].
pub fn p(nodes: impl IntoIterator<Item = Node>) -> Node {
    parallel(nodes)
}

/// Shorthand for [`serial`].
pub fn s(nodes: impl IntoIterator<Item = Node>) -> Node {
    serial(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(node: &Node) -> Vec<String> {
        match node {
            Node::Leaf(job) => vec![job.name().to_string()],
            Node::Parallel(children) | Node::Serial(children) => {
                children.iter().flat_map(names).collect()
            }
        }
    }

    #[test]
    fn parallel_splices_both_sides() {
        let left = wrap("a") | wrap("b");
        let right = wrap("c") | wrap("d");
        match left | right {
            Node::Parallel(children) => {
                assert_eq!(children.len(), 4);
                assert!(children
                    .iter()
                    .all(|c| matches!(c, Node::Leaf(_))));
            }
            _ => panic!("expected flat Parallel"),
        }
    }

    #[test]
    fn serial_splices_both_sides() {
        let left = wrap("a") >> wrap("b");
        let right = wrap("c") >> wrap("d");
        match left >> right {
            Node::Serial(children) => assert_eq!(children.len(), 4),
            _ => panic!("expected flat Serial"),
        }
    }

    #[test]
    fn mixed_composition_nests_the_other_side() {
        let expr = (wrap("a") | wrap("b")) >> wrap("c");
        match &expr {
            Node::Serial(children) => {
                assert_eq!(children.len(), 2);
                assert!(matches!(children[0], Node::Parallel(_)));
                assert!(matches!(children[1], Node::Leaf(_)));
            }
            _ => panic!("expected Serial with two children"),
        }
    }

    #[test]
    fn parallel_helper_matches_operator_fold() {
        let via_helper = parallel([wrap("a"), wrap("b"), wrap("c")]);
        let via_ops = wrap("a") | wrap("b") | wrap("c");
        assert_eq!(names(&via_helper), names(&via_ops));
        assert!(matches!(via_helper, Node::Parallel(ref c) if c.len() == 3));
    }

    #[test]
    fn singleton_helper_returns_the_node_itself() {
        assert!(matches!(serial([wrap("a")]), Node::Leaf(_)));
        assert!(matches!(parallel([wrap("a")]), Node::Leaf(_)));
    }

    #[test]
    fn wrap_is_idempotent() {
        let once = wrap("a");
        let twice = wrap(once);
        assert!(matches!(twice, Node::Leaf(ref job) if job.name() == "a"));
    }

    #[test]
    fn wrap_named_renames_leaves() {
        let node = wrap_named("alias", "payload");
        assert!(matches!(node, Node::Leaf(ref job) if job.name() == "alias"));
    }

    #[test]
    fn wrap_named_leaves_composites_untouched() {
        let node = wrap_named("alias", wrap("a") | wrap("b"));
        assert!(matches!(node, Node::Parallel(_)));
    }
}
