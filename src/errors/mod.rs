// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod execution;
mod graph;
mod pipeline;
mod submit;

pub use config::ConfigError;
pub use execution::ExecutionError;
pub use graph::GraphError;
pub use pipeline::PipelineError;
pub use submit::SubmitError;
