// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::errors::GraphError;

/// Errors raised while loading, validating, or instantiating configuration.
///
/// All variants surface synchronously, before any task is accepted.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed yaml: {0}")]
    BadYaml(#[from] serde_yaml::Error),

    /// A `next` entry points at a job that is not part of the graph.
    #[error("job '{job}' referenced in 'next' field of job '{referenced_by}' in graph '{graph}' is not defined")]
    MissingJob {
        graph: String,
        referenced_by: String,
        job: String,
    },

    /// A graph node has no entry in the `jobs` section.
    #[error("job '{job}' in graph '{graph}' has no definition in the jobs section")]
    UndefinedJob { graph: String, job: String },

    /// A parameter group does not supply a parameter a job declares.
    #[error("job '{job}' in graph '{graph}' requires parameter '{parameter}' but parameter group '{group}' does not supply it")]
    MissingParameter {
        graph: String,
        group: String,
        job: String,
        parameter: String,
    },

    #[error("duplicate name '{0}' in configuration")]
    DuplicateName(String),

    #[error("unknown job type '{job_type}' for job '{job}'")]
    UnknownJobType { job: String, job_type: String },

    #[error(transparent)]
    Graph(#[from] GraphError),
}
