// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration validation.
//!
//! Checks run in order: every graph node must have a job definition, every
//! `next` reference must resolve within its graph, each graph must be acyclic
//! with a single head, and every declared job parameter must be supplied —
//! either directly in the job's properties or by each parameter group that
//! instantiates the graph. The engine relies on all of this having passed
//! before a graph is built.

use crate::config::PipelineConfig;
use crate::errors::{ConfigError, GraphError};
use crate::graph::DependencyGraph;

pub fn validate_config(cfg: &PipelineConfig) -> Result<(), ConfigError> {
    for (graph_name, definition) in &cfg.graphs {
        for job_name in definition.keys() {
            if !cfg.jobs.contains_key(job_name) {
                return Err(ConfigError::UndefinedJob {
                    graph: graph_name.clone(),
                    job: job_name.clone(),
                });
            }
        }

        for (job_name, node) in definition {
            for next in &node.next {
                if !definition.contains_key(next) {
                    return Err(ConfigError::MissingJob {
                        graph: graph_name.clone(),
                        referenced_by: job_name.clone(),
                        job: next.clone(),
                    });
                }
            }
        }

        let mut adjacency = DependencyGraph::new();
        for (job_name, node) in definition {
            adjacency.add_successors(job_name.clone(), node.next.clone());
        }
        if let Some(cycle) = adjacency.find_cycle() {
            return Err(GraphError::Cycle(cycle).into());
        }
        let counts = adjacency.build_predecessor_counts();
        let mut heads: Vec<String> = counts
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(job, _)| job.clone())
            .collect();
        heads.sort();
        if heads.len() != 1 {
            return Err(GraphError::NoSingleHead(heads.len(), heads).into());
        }

        validate_parameters(cfg, graph_name)?;
    }

    Ok(())
}

/// Every parameter a job declares must be supplied for every instantiation
/// of the graph: by the job's own properties, or by each parameter group.
fn validate_parameters(cfg: &PipelineConfig, graph_name: &str) -> Result<(), ConfigError> {
    let definition = &cfg.graphs[graph_name];
    let groups: Vec<&String> = cfg
        .parameters
        .get(graph_name)
        .map(|sets| sets.keys().collect())
        .unwrap_or_default();

    for job_name in definition.keys() {
        let job_cfg = &cfg.jobs[job_name];
        for parameter in &job_cfg.parameters {
            if job_cfg.properties.contains_key(parameter) {
                continue;
            }
            if groups.is_empty() {
                return Err(ConfigError::MissingParameter {
                    graph: graph_name.to_string(),
                    group: String::new(),
                    job: job_name.clone(),
                    parameter: parameter.clone(),
                });
            }
            for group_name in &groups {
                let supplied = cfg.parameters[graph_name][*group_name]
                    .get(job_name)
                    .map_or(false, |props| props.contains_key(parameter));
                if !supplied {
                    return Err(ConfigError::MissingParameter {
                        graph: graph_name.to_string(),
                        group: (*group_name).clone(),
                        job: job_name.clone(),
                        parameter: parameter.clone(),
                    });
                }
            }
        }
    }

    Ok(())
}
