// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::errors::GraphError;

/// Errors raised while executing a single task through a graph.
///
/// An execution error is scoped to one task: the engine drops that task's
/// context and carries on with other tasks. The pipeline logs these and
/// emits no result for the failed task.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// A job's `run` returned an error.
    #[error("job '{job}' failed for task {task_id}: {cause}")]
    JobFailed {
        task_id: String,
        job: String,
        cause: anyhow::Error,
    },

    /// A graph-level violation observed while collecting this task's result.
    #[error("task {task_id}: {source}")]
    Graph {
        task_id: String,
        #[source]
        source: GraphError,
    },

    /// Scheduler-internal inconsistency. Indicates a bug, not bad input.
    #[error("internal scheduler error: {0}")]
    Internal(String),
}
