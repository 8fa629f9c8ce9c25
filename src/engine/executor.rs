// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::engine::context::ExecutionContext;
use crate::engine::TASK_PASS_THROUGH_KEY;
use crate::errors::{ExecutionError, GraphError};
use crate::graph::JobGraph;
use crate::task::Task;
use crate::traits::{DataMap, Job, JobInputs, TASK_INPUT_KEY};

/// Executes tasks through one immutable job graph.
///
/// Any number of task executions may be in flight at once; each holds its
/// own [`ExecutionContext`] in a table keyed by task id, so two tasks never
/// observe each other's inputs. Scheduling is event-driven: a job's `run`
/// is spawned the moment its last expected input arrives, and outputs are
/// routed to successors as soon as the job completes.
pub struct GraphExecutor {
    graph: Arc<JobGraph>,
    contexts: Arc<Mutex<HashMap<String, ExecutionContext>>>,
}

impl GraphExecutor {
    pub fn new(graph: Arc<JobGraph>) -> Self {
        Self {
            graph,
            contexts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn graph(&self) -> &Arc<JobGraph> {
        &self.graph
    }

    /// Number of tasks currently holding execution state.
    pub async fn in_flight(&self) -> usize {
        self.contexts.lock().await.len()
    }

    /// Run `task` through the whole graph and return the composite result:
    /// the merged outputs of all sink jobs plus the original payload under
    /// `task_pass_through`.
    ///
    /// On error the task's context is dropped and its remaining in-flight
    /// jobs are aborted; other tasks are unaffected.
    pub async fn execute(&self, task: Task) -> Result<DataMap, ExecutionError> {
        let task_id = task.id().to_string();
        self.contexts
            .lock()
            .await
            .insert(task_id.clone(), ExecutionContext::new(&self.graph));
        tracing::debug!(task_id = %task_id, head = %self.graph.head(), "task accepted");

        let outcome = self.drive(&task).await;

        // Teardown happens on both paths; the context table must not leak.
        self.contexts.lock().await.remove(&task_id);
        match &outcome {
            Ok(_) => tracing::debug!(task_id = %task_id, "task completed"),
            Err(error) => tracing::debug!(task_id = %task_id, error = %error, "task dropped"),
        }
        outcome
    }

    async fn drive(&self, task: &Task) -> Result<DataMap, ExecutionError> {
        let task_id = task.id();
        let mut running: JoinSet<(String, anyhow::Result<DataMap>)> = JoinSet::new();

        {
            let mut contexts = self.contexts.lock().await;
            let context = contexts
                .get_mut(task_id)
                .ok_or_else(|| missing_context(task_id))?;
            let head = self.graph.head().to_string();
            let node = self
                .graph
                .node(&head)
                .ok_or_else(|| missing_node(&head))?;
            context.record_input(&head, TASK_INPUT_KEY, task.payload().clone());
            if let Some(inputs) = context.try_fire(&head, node) {
                spawn_run(&mut running, head, node.job.clone(), inputs);
            }
        }

        let mut result = DataMap::new();

        while let Some(joined) = running.join_next().await {
            let (job_name, run_outcome) = joined
                .map_err(|e| ExecutionError::Internal(format!("job task join failed: {e}")))?;
            let output = run_outcome.map_err(|cause| ExecutionError::JobFailed {
                task_id: task_id.to_string(),
                job: job_name.clone(),
                cause,
            })?;
            let node = self
                .graph
                .node(&job_name)
                .ok_or_else(|| missing_node(&job_name))?;

            if node.next_jobs.is_empty() {
                // Sink: its output joins the task result directly.
                for (key, value) in output {
                    if result.contains_key(&key) {
                        return Err(ExecutionError::Graph {
                            task_id: task_id.to_string(),
                            source: GraphError::SinkKeyConflict {
                                job: job_name.clone(),
                                key,
                            },
                        });
                    }
                    result.insert(key, value);
                }
            } else {
                let mut contexts = self.contexts.lock().await;
                let context = contexts
                    .get_mut(task_id)
                    .ok_or_else(|| missing_context(task_id))?;
                for successor in &node.next_jobs {
                    context.record_input(successor, &job_name, output.clone());
                    let successor_node = self
                        .graph
                        .node(successor)
                        .ok_or_else(|| missing_node(successor))?;
                    if let Some(inputs) = context.try_fire(successor, successor_node) {
                        spawn_run(
                            &mut running,
                            successor.clone(),
                            successor_node.job.clone(),
                            inputs,
                        );
                    }
                }
            }
        }

        result.insert(
            TASK_PASS_THROUGH_KEY.to_string(),
            Value::Object(task.payload().clone().into_iter().collect()),
        );
        Ok(result)
    }
}

fn spawn_run(
    running: &mut JoinSet<(String, anyhow::Result<DataMap>)>,
    name: String,
    job: Arc<dyn Job>,
    inputs: JobInputs,
) {
    running.spawn(async move {
        let output = job.run(&inputs).await;
        (name, output)
    });
}

fn missing_context(task_id: &str) -> ExecutionError {
    ExecutionError::Internal(format!("no execution context for task {task_id}"))
}

fn missing_node(job: &str) -> ExecutionError {
    ExecutionError::Internal(format!("job '{job}' not present in graph"))
}
