use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

/// The output map produced by one job run, and the shape of a task payload.
pub type DataMap = HashMap<String, Value>;

/// Inputs delivered to a job: predecessor name -> that predecessor's output
/// map. The engine never merges or flattens predecessor outputs; namespacing
/// by predecessor name is part of the contract.
pub type JobInputs = HashMap<String, DataMap>;

/// Synthetic predecessor name under which the head job of a graph receives
/// the original task payload.
pub const TASK_INPUT_KEY: &str = "__task__";

/// The unit of work executed by the engine.
///
/// One instance serves every task that flows through its graph, so
/// implementations must not keep per-task state on `self`; anything mutable
/// beyond read-only configuration has to be safe under concurrent runs.
#[async_trait]
pub trait Job: Send + Sync {
    /// Unique name of this job within its graph.
    fn name(&self) -> &str;

    /// Execute the job once for a task. A head job finds the task payload
    /// under [`TASK_INPUT_KEY`]; every other job receives exactly the outputs
    /// of its declared predecessors, keyed by their names.
    async fn run(&self, inputs: &JobInputs) -> anyhow::Result<DataMap>;
}
