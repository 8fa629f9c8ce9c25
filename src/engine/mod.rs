// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fan-in/fan-out execution engine.
//!
//! One [`GraphExecutor`] serves a single graph and any number of concurrent
//! task executions through it. Per-task state lives in an
//! [`ExecutionContext`] keyed by task id; job instances stay stateless and
//! shared.

mod context;
mod executor;


pub use context::ExecutionContext;
pub use executor::GraphExecutor;

/// Key under which the original task payload is echoed into every result.
pub const TASK_PASS_THROUGH_KEY: &str = "task_pass_through";
