// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Producer/consumer task pipeline.
//!
//! A [`TaskPipeline`] accepts tasks on the caller's thread, executes them on
//! a dedicated worker thread, and streams results to an optional sink. The
//! worker runs a current-thread tokio runtime, so any number of in-flight
//! task executions multiplex cooperatively on one scheduler; the only
//! cross-thread communication is two bounded queues, with `None` as the
//! end-of-stream sentinel on both.
//!
//! Result delivery has two modes. In the default parallel mode a separate
//! result-processor thread invokes the sink as results arrive, which
//! requires a sink that can cross threads ([`ResultSink::Shared`]). A sink
//! that must stay on the caller's thread ([`ResultSink::Local`]) can only be
//! used in serial mode, where results are drained inside
//! [`TaskPipeline::mark_input_completed`].


use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::engine::GraphExecutor;
use crate::errors::{PipelineError, SubmitError};
use crate::graph::JobGraph;
use crate::task::Task;
use crate::traits::DataMap;

/// Payload field consulted for graph routing when no explicit graph name is
/// passed to `submit`.
pub const GRAPH_NAME_KEY: &str = "graph_name";

/// The user-supplied result callback.
///
/// `Shared` sinks can be handed to the result-processor thread; `Local`
/// sinks capture caller-thread-only state and are restricted to serial
/// result processing.
pub enum ResultSink {
    Shared(Arc<dyn Fn(&DataMap) + Send + Sync>),
    Local(Box<dyn FnMut(&DataMap)>),
}

impl ResultSink {
    pub fn shared(f: impl Fn(&DataMap) + Send + Sync + 'static) -> Self {
        Self::Shared(Arc::new(f))
    }

    pub fn local(f: impl FnMut(&DataMap) + 'static) -> Self {
        Self::Local(Box::new(f))
    }
}

/// Tuning knobs for a pipeline instance.
#[derive(Clone)]
pub struct PipelineOptions {
    /// Capacity of both the input and the result queue. `submit` blocks when
    /// the input queue is full; no task is ever dropped.
    pub queue_capacity: usize,
    /// Run the sink on the caller's thread inside `mark_input_completed`
    /// instead of on the result-processor thread.
    pub serial_processing: bool,
    /// Sleep between polls while draining results in serial mode.
    pub poll_interval: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            serial_processing: false,
            poll_interval: Duration::from_millis(25),
        }
    }
}

/// Executes submitted tasks through registered job graphs.
///
/// Construction starts the worker (and, in parallel mode, the result
/// processor). `submit` feeds tasks in, `mark_input_completed` signals
/// end-of-input and blocks until everything has drained, and `cleanup`
/// releases resources; dropping the pipeline cleans up as well.
pub struct TaskPipeline {
    executors: Arc<HashMap<String, Arc<GraphExecutor>>>,
    task_tx: Option<mpsc::Sender<Option<Task>>>,
    result_rx: Option<mpsc::Receiver<Option<DataMap>>>,
    serial_sink: Option<Box<dyn FnMut(&DataMap)>>,
    worker: Option<thread::JoinHandle<()>>,
    processor: Option<thread::JoinHandle<()>>,
    cancel: CancellationToken,
    poll_interval: Duration,
}

impl TaskPipeline {
    /// Build a pipeline over a registry of named graphs.
    ///
    /// Fails with [`PipelineError::NotSerializable`] if parallel result
    /// processing is requested with a sink that cannot leave the caller's
    /// thread. This is checked here, before any task is accepted.
    pub fn new(
        graphs: HashMap<String, Arc<JobGraph>>,
        sink: Option<ResultSink>,
        options: PipelineOptions,
    ) -> Result<Self, PipelineError> {
        let executors: Arc<HashMap<String, Arc<GraphExecutor>>> = Arc::new(
            graphs
                .into_iter()
                .map(|(name, graph)| (name, Arc::new(GraphExecutor::new(graph))))
                .collect(),
        );

        let capacity = options.queue_capacity.max(1);
        let (task_tx, task_rx) = mpsc::channel::<Option<Task>>(capacity);
        let (result_tx, result_rx) = mpsc::channel::<Option<DataMap>>(capacity);
        let cancel = CancellationToken::new();

        let worker = {
            let executors = executors.clone();
            let cancel = cancel.clone();
            thread::Builder::new()
                .name("jobgraph-worker".into())
                .spawn(move || worker_main(executors, task_rx, result_tx, cancel))
                .map_err(|_| PipelineError::WorkerCrashed)?
        };

        let mut pipeline = Self {
            executors,
            task_tx: Some(task_tx),
            result_rx: None,
            serial_sink: None,
            worker: Some(worker),
            processor: None,
            cancel,
            poll_interval: options.poll_interval,
        };

        if options.serial_processing {
            pipeline.result_rx = Some(result_rx);
            pipeline.serial_sink = sink.map(|sink| match sink {
                ResultSink::Shared(f) => {
                    Box::new(move |result: &DataMap| f(result)) as Box<dyn FnMut(&DataMap)>
                }
                ResultSink::Local(f) => f,
            });
        } else {
            let shared = match sink {
                Some(ResultSink::Shared(f)) => Some(f),
                Some(ResultSink::Local(_)) => {
                    pipeline.cleanup();
                    return Err(PipelineError::NotSerializable);
                }
                None => None,
            };
            let processor = thread::Builder::new()
                .name("jobgraph-results".into())
                .spawn(move || result_processor_main(shared, result_rx))
                .map_err(|_| PipelineError::WorkerCrashed)?;
            pipeline.processor = Some(processor);
        }

        Ok(pipeline)
    }

    /// Convenience constructor for a single graph, registered as "default".
    pub fn single(
        graph: JobGraph,
        sink: Option<ResultSink>,
        options: PipelineOptions,
    ) -> Result<Self, PipelineError> {
        let mut graphs = HashMap::new();
        graphs.insert("default".to_string(), Arc::new(graph));
        Self::new(graphs, sink, options)
    }

    /// Enqueue a task for execution; blocks while the input queue is full.
    ///
    /// `payload` may be an object (used as the task payload directly) or a
    /// non-null scalar (lifted to `{"value": <scalar>}`). With more than one
    /// graph registered the target must be named, either via `graph_name` or
    /// the payload's `"graph_name"` field.
    pub fn submit(
        &self,
        payload: serde_json::Value,
        graph_name: Option<&str>,
    ) -> Result<(), SubmitError> {
        let mut task = Task::from_value(payload)?;
        let resolved = self.resolve_graph(graph_name, &task)?;
        task.set_graph_name(resolved);

        let tx = self.task_tx.as_ref().ok_or(SubmitError::WorkerCrashed)?;
        tx.blocking_send(Some(task))
            .map_err(|_| SubmitError::WorkerCrashed)
    }

    fn resolve_graph(&self, explicit: Option<&str>, task: &Task) -> Result<String, SubmitError> {
        match explicit.or_else(|| task.graph_name()) {
            Some(name) => {
                if self.executors.contains_key(name) {
                    Ok(name.to_string())
                } else {
                    let mut available: Vec<String> = self.executors.keys().cloned().collect();
                    available.sort();
                    Err(SubmitError::UnknownGraph {
                        name: name.to_string(),
                        available,
                    })
                }
            }
            None => match self.executors.keys().next() {
                Some(sole) if self.executors.len() == 1 => Ok(sole.clone()),
                _ => Err(SubmitError::MissingGraphName),
            },
        }
    }

    /// Signal end-of-input and block until all in-flight tasks have drained
    /// and the sink has seen every result.
    pub fn mark_input_completed(&mut self) -> Result<(), PipelineError> {
        tracing::debug!("marking input completed");
        if let Some(tx) = self.task_tx.take() {
            tx.blocking_send(None)
                .map_err(|_| PipelineError::WorkerCrashed)?;
        }

        if self.result_rx.is_some() {
            self.drain_serial_results()?;
        }

        if let Some(worker) = self.worker.take() {
            worker.join().map_err(|_| PipelineError::WorkerCrashed)?;
        }
        if let Some(processor) = self.processor.take() {
            processor.join().map_err(|_| PipelineError::WorkerCrashed)?;
        }
        Ok(())
    }

    fn drain_serial_results(&mut self) -> Result<(), PipelineError> {
        let Some(result_rx) = self.result_rx.as_mut() else {
            return Ok(());
        };
        loop {
            match result_rx.try_recv() {
                Ok(Some(result)) => {
                    if let Some(sink) = self.serial_sink.as_mut() {
                        sink(&result);
                    }
                }
                Ok(None) => break,
                Err(TryRecvError::Empty) => {
                    // The worker sends the sentinel before exiting; an empty
                    // queue with a finished worker means it never got there.
                    if self.worker.as_ref().map_or(true, |w| w.is_finished()) {
                        return Err(PipelineError::WorkerCrashed);
                    }
                    thread::sleep(self.poll_interval);
                }
                Err(TryRecvError::Disconnected) => return Err(PipelineError::WorkerCrashed),
            }
        }
        self.result_rx = None;
        Ok(())
    }

    /// Idempotent resource release: stops the worker and result processor,
    /// forcibly if they do not yield promptly, and closes both queues.
    pub fn cleanup(&mut self) {
        self.cancel.cancel();
        self.task_tx = None;
        self.result_rx = None;
        self.serial_sink = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("worker thread panicked");
            }
        }
        if let Some(processor) = self.processor.take() {
            if processor.join().is_err() {
                tracing::error!("result processor thread panicked");
            }
        }
    }

    /// Identifier of the worker thread, for diagnostics. `None` once the
    /// pipeline has completed or been cleaned up.
    pub fn worker_thread_id(&self) -> Option<thread::ThreadId> {
        self.worker.as_ref().map(|w| w.thread().id())
    }

    #[cfg(test)]
    pub(crate) fn executor(&self, name: &str) -> Option<&Arc<GraphExecutor>> {
        self.executors.get(name)
    }
}

impl Drop for TaskPipeline {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn worker_main(
    executors: Arc<HashMap<String, Arc<GraphExecutor>>>,
    task_rx: mpsc::Receiver<Option<Task>>,
    result_tx: mpsc::Sender<Option<DataMap>>,
    cancel: CancellationToken,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            tracing::error!(error = %error, "failed to start worker runtime");
            return;
        }
    };
    tracing::info!(thread = ?thread::current().id(), "job executor started");
    runtime.block_on(worker_loop(executors, task_rx, result_tx, cancel));
    tracing::debug!("job executor exiting");
}

async fn worker_loop(
    executors: Arc<HashMap<String, Arc<GraphExecutor>>>,
    mut task_rx: mpsc::Receiver<Option<Task>>,
    result_tx: mpsc::Sender<Option<DataMap>>,
    cancel: CancellationToken,
) {
    let mut in_flight: JoinSet<()> = JoinSet::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                in_flight.abort_all();
                break;
            }
            received = task_rx.recv() => match received {
                Some(Some(task)) => {
                    let Some(executor) = task.graph_name().and_then(|n| executors.get(n)).cloned()
                    else {
                        tracing::error!(task_id = %task.id(), "task names no known graph; dropping");
                        continue;
                    };
                    let tx = result_tx.clone();
                    let cancelled = cancel.clone();
                    in_flight.spawn(async move {
                        match executor.execute(task).await {
                            Ok(result) => {
                                tokio::select! {
                                    _ = cancelled.cancelled() => {}
                                    _ = tx.send(Some(result)) => {}
                                }
                            }
                            Err(error) => {
                                tracing::error!(error = %error, "task execution failed; no result emitted");
                            }
                        }
                    });
                }
                Some(None) => {
                    tracing::debug!("input completion sentinel received");
                    break;
                }
                None => break,
            },
            Some(finished) = in_flight.join_next(), if !in_flight.is_empty() => {
                log_join_outcome(finished);
            }
        }
    }

    while let Some(finished) = in_flight.join_next().await {
        log_join_outcome(finished);
    }

    tokio::select! {
        _ = cancel.cancelled() => {}
        _ = result_tx.send(None) => {}
    }
}

fn log_join_outcome(outcome: Result<(), tokio::task::JoinError>) {
    if let Err(error) = outcome {
        if !error.is_cancelled() {
            tracing::error!(error = %error, "in-flight task panicked");
        }
    }
}

fn result_processor_main(
    sink: Option<Arc<dyn Fn(&DataMap) + Send + Sync>>,
    mut result_rx: mpsc::Receiver<Option<DataMap>>,
) {
    tracing::info!(thread = ?thread::current().id(), "result processor started");
    while let Some(message) = result_rx.blocking_recv() {
        match message {
            Some(result) => {
                if let Some(sink) = &sink {
                    sink(&result);
                }
            }
            None => break,
        }
    }
    tracing::debug!("result processor exiting");
}
