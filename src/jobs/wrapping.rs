use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::Instrument;

use crate::traits::{DataMap, Job, JobInputs, TASK_INPUT_KEY};

/// A leaf job produced by lifting a plain value into a composition.
///
/// Its `run` ignores inputs and returns `{"value": <canonical string>}`.
/// Mostly useful in tests and composition experiments.
pub struct ValueJob {
    name: String,
    text: String,
}

impl ValueJob {
    pub fn new(value: impl Display) -> Self {
        let text = value.to_string();
        Self {
            name: text.clone(),
            text,
        }
    }

    pub fn named(name: impl Into<String>, value: impl Display) -> Self {
        Self {
            name: name.into(),
            text: value.to_string(),
        }
    }
}

#[async_trait]
impl Job for ValueJob {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _inputs: &JobInputs) -> anyhow::Result<DataMap> {
        let mut out = DataMap::new();
        out.insert("value".to_string(), Value::String(self.text.clone()));
        Ok(out)
    }
}

/// Gives an existing job a different name without touching the instance.
///
/// Job names are fixed at construction, so renaming for graph identity is an
/// adapter rather than a mutation.
pub struct NamedJob {
    name: String,
    inner: Arc<dyn Job>,
}

impl NamedJob {
    pub fn new(name: impl Into<String>, inner: Arc<dyn Job>) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }
}

#[async_trait]
impl Job for NamedJob {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, inputs: &JobInputs) -> anyhow::Result<DataMap> {
        self.inner.run(inputs).await
    }
}

/// Explicit parameter schema for a wrapped closure: names, required flags,
/// and defaults, checked before every run.
///
/// Values are resolved from the task payload (the [`TASK_INPUT_KEY`] entry
/// of the inputs, when present), falling back to each parameter's default.
/// A required parameter with no value fails the run.
#[derive(Clone, Default)]
pub struct ParameterSpec {
    entries: Vec<ParamEntry>,
}

#[derive(Clone)]
struct ParamEntry {
    name: String,
    required: bool,
    default: Option<Value>,
}

impl ParameterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// A parameter that must be supplied by the task payload.
    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.entries.push(ParamEntry {
            name: name.into(),
            required: true,
            default: None,
        });
        self
    }

    /// A parameter that falls back to `default` when the payload has none.
    pub fn optional(mut self, name: impl Into<String>, default: Value) -> Self {
        self.entries.push(ParamEntry {
            name: name.into(),
            required: false,
            default: Some(default),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve the arguments for one run.
    pub fn resolve(&self, inputs: &JobInputs) -> anyhow::Result<DataMap> {
        let payload = inputs.get(TASK_INPUT_KEY);
        let mut args = DataMap::new();
        for entry in &self.entries {
            let value = payload
                .and_then(|p| p.get(&entry.name))
                .cloned()
                .or_else(|| entry.default.clone());
            match value {
                Some(value) => {
                    args.insert(entry.name.clone(), value);
                }
                None if entry.required => {
                    anyhow::bail!("no value supplied for required parameter '{}'", entry.name)
                }
                None => {}
            }
        }
        Ok(args)
    }
}

type BoxedRun =
    Box<dyn Fn(JobInputs) -> Pin<Box<dyn Future<Output = anyhow::Result<DataMap>> + Send>> + Send + Sync>;

/// Adapts an async closure to the [`Job`] contract.
///
/// ```
/// use jobgraph::jobs::FnJob;
/// use jobgraph::traits::DataMap;
///
/// let job = FnJob::new("double", |_inputs| async move {
///     Ok(DataMap::new())
/// });
/// ```
pub struct FnJob {
    name: String,
    params: ParameterSpec,
    run_fn: BoxedRun,
}

impl FnJob {
    pub fn new<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(JobInputs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<DataMap>> + Send + 'static,
    {
        Self::with_params(name, ParameterSpec::new(), f)
    }

    /// Like [`FnJob::new`], with a parameter schema resolved before every
    /// run. The closure finds the resolved arguments under this job's own
    /// name in its inputs.
    pub fn with_params<F, Fut>(name: impl Into<String>, params: ParameterSpec, f: F) -> Self
    where
        F: Fn(JobInputs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<DataMap>> + Send + 'static,
    {
        Self {
            name: name.into(),
            params,
            run_fn: Box::new(move |inputs| Box::pin(f(inputs))),
        }
    }
}

#[async_trait]
impl Job for FnJob {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, inputs: &JobInputs) -> anyhow::Result<DataMap> {
        let mut inputs = inputs.clone();
        if !self.params.is_empty() {
            let args = self.params.resolve(&inputs)?;
            inputs.insert(self.name.clone(), args);
        }
        (self.run_fn)(inputs).await
    }
}

/// Wraps a job so every `run` executes inside a tracing span carrying the
/// job name. Applied once at construction; there is no implicit
/// instrumentation anywhere else.
pub struct TracedJob {
    inner: Arc<dyn Job>,
}

impl TracedJob {
    pub fn new(inner: Arc<dyn Job>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Job for TracedJob {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn run(&self, inputs: &JobInputs) -> anyhow::Result<DataMap> {
        let span = tracing::debug_span!("job_run", job = %self.inner.name());
        self.inner.run(inputs).instrument(span).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn value_job_returns_canonical_string() {
        let job = ValueJob::new(42);
        assert_eq!(job.name(), "42");
        let out = job.run(&JobInputs::new()).await.unwrap();
        assert_eq!(out.get("value"), Some(&json!("42")));
    }

    #[tokio::test]
    async fn named_job_delegates() {
        let inner: Arc<dyn Job> = Arc::new(ValueJob::new("x"));
        let renamed = NamedJob::new("alias", inner);
        assert_eq!(renamed.name(), "alias");
        let out = renamed.run(&JobInputs::new()).await.unwrap();
        assert_eq!(out.get("value"), Some(&json!("x")));
    }

    #[tokio::test]
    async fn fn_job_receives_inputs() {
        let job = FnJob::new("echo", |inputs: JobInputs| async move {
            let mut out = DataMap::new();
            out.insert("seen".to_string(), json!(inputs.len()));
            Ok(out)
        });

        let mut inputs = JobInputs::new();
        inputs.insert("upstream".to_string(), DataMap::new());
        let out = job.run(&inputs).await.unwrap();
        assert_eq!(out.get("seen"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn parameter_spec_merges_payload_values_and_defaults() {
        let spec = ParameterSpec::new()
            .required("filepath")
            .optional("depth", json!(1));
        let job = FnJob::with_params("fetch", spec, |inputs: JobInputs| async move {
            Ok(inputs["fetch"].clone())
        });

        let mut payload = DataMap::new();
        payload.insert("filepath".to_string(), json!("/tmp/a.txt"));
        let mut inputs = JobInputs::new();
        inputs.insert(TASK_INPUT_KEY.to_string(), payload);

        let out = job.run(&inputs).await.unwrap();
        assert_eq!(out.get("filepath"), Some(&json!("/tmp/a.txt")));
        assert_eq!(out.get("depth"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn payload_value_overrides_the_default() {
        let spec = ParameterSpec::new().optional("depth", json!(1));
        let job = FnJob::with_params("fetch", spec, |inputs: JobInputs| async move {
            Ok(inputs["fetch"].clone())
        });

        let mut payload = DataMap::new();
        payload.insert("depth".to_string(), json!(5));
        let mut inputs = JobInputs::new();
        inputs.insert(TASK_INPUT_KEY.to_string(), payload);

        let out = job.run(&inputs).await.unwrap();
        assert_eq!(out.get("depth"), Some(&json!(5)));
    }

    #[tokio::test]
    async fn missing_required_parameter_fails_the_run() {
        let spec = ParameterSpec::new().required("filepath");
        let job = FnJob::with_params("fetch", spec, |_inputs: JobInputs| async move {
            Ok(DataMap::new())
        });

        let error = job.run(&JobInputs::new()).await.unwrap_err();
        assert!(error.to_string().contains("filepath"));
    }

    #[tokio::test]
    async fn traced_job_is_transparent() {
        let inner: Arc<dyn Job> = Arc::new(ValueJob::new("y"));
        let traced = TracedJob::new(inner);
        assert_eq!(traced.name(), "y");
        let out = traced.run(&JobInputs::new()).await.unwrap();
        assert_eq!(out.get("value"), Some(&json!("y")));
    }
}
