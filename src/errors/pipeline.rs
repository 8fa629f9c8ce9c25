// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised by the task pipeline itself, outside of any one task.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Parallel result delivery needs a sink that can cross threads; a
    /// caller-thread-only sink was supplied. Use serial processing instead.
    #[error("result sink cannot be moved to the result processor thread; use serial processing or supply a shared sink")]
    NotSerializable,

    #[error("pipeline worker exited abnormally")]
    WorkerCrashed,
}
