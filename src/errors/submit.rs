// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised to the caller of `TaskPipeline::submit`.
#[derive(Error, Debug)]
pub enum SubmitError {
    /// The payload cannot form a task. Null in particular is rejected: it is
    /// the reserved end-of-stream sentinel.
    #[error("invalid task: {0}")]
    InvalidTask(String),

    /// More than one graph is loaded and the task names none of them.
    #[error("multiple graphs are loaded; pass a graph name to submit() or set the 'graph_name' payload field")]
    MissingGraphName,

    #[error("unknown graph '{name}'; available graphs: {available:?}")]
    UnknownGraph { name: String, available: Vec<String> },

    /// The worker is gone; the pipeline can accept no further tasks.
    #[error("pipeline worker has stopped; task not accepted")]
    WorkerCrashed,
}
