// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised while compiling a composition expression or wiring a job
/// graph. All of these surface synchronously at construction time, with one
/// exception: `SinkKeyConflict` can only be observed while merging sink
/// outputs for a task, so it reaches callers wrapped in an execution error.
#[derive(Error, Debug)]
pub enum GraphError {
    /// A composite node was declared with no children.
    #[error("empty {0} composition")]
    EmptyComposition(&'static str),

    /// Two nodes in one graph share a name.
    #[error("duplicate job name '{0}' in graph")]
    DuplicateName(String),

    /// The precedence mapping contains a dependency cycle.
    #[error("dependency cycle detected: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    /// A graph must have exactly one job with no predecessors.
    #[error("expected exactly one head job, found {0} candidates: {1:?}")]
    NoSingleHead(usize, Vec<String>),

    /// The precedence mapping names a job with no supplied instance.
    #[error("job '{0}' appears in the graph but no instance was supplied")]
    UndefinedJob(String),

    /// Two sink jobs produced the same output key for one task.
    #[error("sink job '{job}' produced conflicting result key '{key}'")]
    SinkKeyConflict { job: String, key: String },
}
