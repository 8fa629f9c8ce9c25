// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::config::PipelineConfig;
use crate::errors::ConfigError;
use crate::graph::{DependencyGraph, JobGraph};
use crate::jobs::TracedJob;
use crate::traits::Job;

/// Creates job instances from configuration.
///
/// Concrete job implementations live outside this crate; callers supply a
/// factory that knows how to turn `(name, type, properties)` into instances.
pub trait JobFactory: Send + Sync {
    fn create(
        &self,
        name: &str,
        job_type: &str,
        properties: &HashMap<String, Value>,
    ) -> Result<Arc<dyn Job>, ConfigError>;
}

type Constructor =
    Box<dyn Fn(&str, &HashMap<String, Value>) -> Result<Arc<dyn Job>, ConfigError> + Send + Sync>;

/// Registry-backed [`JobFactory`]: job types are registered programmatically
/// and looked up by the `type` field of each job's configuration.
#[derive(Default)]
pub struct JobTypeRegistry {
    constructors: HashMap<String, Constructor>,
}

impl JobTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, job_type: impl Into<String>, constructor: F)
    where
        F: Fn(&str, &HashMap<String, Value>) -> Result<Arc<dyn Job>, ConfigError>
            + Send
            + Sync
            + 'static,
    {
        self.constructors.insert(job_type.into(), Box::new(constructor));
    }

    pub fn contains(&self, job_type: &str) -> bool {
        self.constructors.contains_key(job_type)
    }

    pub fn job_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        types.sort();
        types
    }
}

impl JobFactory for JobTypeRegistry {
    fn create(
        &self,
        name: &str,
        job_type: &str,
        properties: &HashMap<String, Value>,
    ) -> Result<Arc<dyn Job>, ConfigError> {
        let constructor =
            self.constructors
                .get(job_type)
                .ok_or_else(|| ConfigError::UnknownJobType {
                    job: name.to_string(),
                    job_type: job_type.to_string(),
                })?;
        constructor(name, properties)
    }
}

/// Instantiate every configured graph, validating first.
///
/// A graph with parameter groups fans into one concrete graph per group,
/// registered as `<graph>$$<group>$$`; a graph without groups keeps its
/// plain name. Job instances are named `<graph>$$<group>$$<job>$$` (the
/// group segment is empty when there are no parameter groups), keeping
/// instance names unique across every graph a pipeline loads. Every
/// instance is wrapped in [`TracedJob`] here, so each `run` executes inside
/// a span carrying the job name.
pub fn build_graphs(
    cfg: &PipelineConfig,
    factory: &dyn JobFactory,
) -> Result<HashMap<String, Arc<JobGraph>>, ConfigError> {
    crate::config::validate_config(cfg)?;

    let mut graphs = HashMap::new();
    for (graph_name, definition) in &cfg.graphs {
        let groups: Vec<(String, Option<&HashMap<String, HashMap<String, Value>>>)> =
            match cfg.parameters.get(graph_name) {
                Some(sets) if !sets.is_empty() => {
                    let mut groups: Vec<_> = sets
                        .iter()
                        .map(|(group, overrides)| (group.clone(), Some(overrides)))
                        .collect();
                    groups.sort_by(|a, b| a.0.cmp(&b.0));
                    groups
                }
                _ => vec![(String::new(), None)],
            };

        for (group_name, overrides) in groups {
            let instance_name =
                |job: &str| format!("{graph_name}$${group_name}$${job}$$");

            let mut adjacency = DependencyGraph::new();
            let mut registry: HashMap<String, Arc<dyn Job>> = HashMap::new();
            for (job_name, node) in definition {
                let job_cfg =
                    cfg.jobs
                        .get(job_name)
                        .ok_or_else(|| ConfigError::UndefinedJob {
                            graph: graph_name.clone(),
                            job: job_name.clone(),
                        })?;

                let mut properties = job_cfg.properties.clone();
                if let Some(per_job) = overrides.and_then(|groups| groups.get(job_name)) {
                    for (key, value) in per_job {
                        properties.insert(key.clone(), value.clone());
                    }
                }

                let instance =
                    factory.create(&instance_name(job_name), &job_cfg.job_type, &properties)?;
                let instance: Arc<dyn Job> = Arc::new(TracedJob::new(instance));
                adjacency.add_successors(
                    instance_name(job_name),
                    node.next.iter().map(|n| instance_name(n)).collect(),
                );
                registry.insert(instance_name(job_name), instance);
            }

            let graph = Arc::new(JobGraph::build(&adjacency, registry)?);
            let registry_key = if group_name.is_empty() {
                graph_name.clone()
            } else {
                format!("{graph_name}$${group_name}$$")
            };
            tracing::debug!(graph = %registry_key, jobs = graph.len(), "graph instantiated");
            if graphs.insert(registry_key.clone(), graph).is_some() {
                return Err(ConfigError::DuplicateName(registry_key));
            }
        }
    }

    Ok(graphs)
}
