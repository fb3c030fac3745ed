//! Graph executor
//!
//! Runs every node of a graph in dependency order. Nodes whose producers have
//! all succeeded are spawned onto a [`JoinSet`], bounded by a semaphore, so
//! independent branches run concurrently. The coordinating task owns all
//! per-run state and is the only writer of the output and status maps; node
//! tasks hand their results back through the join set.
//!
//! A failing node never aborts the run. Its status becomes `Failed`, every
//! node reachable from it becomes `Skipped`, and unrelated branches keep
//! running.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::ExecutorConfig;
use crate::constants::defaults;
use crate::error::{NodeExecutionError, NodeFailure, Result, RunError};
use crate::events::{EventSink, NullEventSink, RunEvent};
use crate::graph::Graph;
use crate::node::Node;
use crate::report::{NodeStatus, RunReport};
use crate::resolver::{resolve, ExecutionPlan};
use crate::schema::validate;
use crate::types::NodeName;
use crate::validation::{validate_request, validate_wiring};

/// What to run: initial inputs for source nodes and the sinks to report
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    /// Input values for source nodes, keyed by node name
    #[serde(default)]
    pub initial_inputs: BTreeMap<NodeName, Value>,
    /// Nodes whose outputs are requested
    #[serde(default)]
    pub sinks: BTreeSet<NodeName>,
}

impl RunRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply the input of a source node
    pub fn with_input(mut self, node: impl Into<String>, value: Value) -> Self {
        self.initial_inputs.insert(node.into(), value);
        self
    }

    /// Request a node's output
    pub fn with_sink(mut self, node: impl Into<String>) -> Self {
        self.sinks.insert(node.into());
        self
    }

    /// Request several nodes' outputs
    pub fn with_sinks<I, S>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sinks.extend(nodes.into_iter().map(Into::into));
        self
    }
}

/// Executes graphs
///
/// An executor holds no per-run state and can run any number of graphs,
/// sequentially or concurrently.
pub struct Executor {
    config: ExecutorConfig,
    event_sink: Arc<dyn EventSink>,
}

impl Executor {
    /// Create an executor that discards run events
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            config,
            event_sink: Arc::new(NullEventSink),
        }
    }

    /// Report run events to a sink
    pub fn with_event_sink(mut self, event_sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run a graph
    ///
    /// Returns [`RunError`] when the graph or the request is invalid, in
    /// which case no node has executed. Otherwise returns a report with every
    /// node's status and every requested sink's result.
    pub async fn run(&self, graph: &Graph, request: RunRequest) -> Result<RunReport> {
        let plan = self.preflight(graph, &request)?;
        let execution_id = format!("{}-{}", defaults::EXECUTION_ID_PREFIX, uuid::Uuid::new_v4());

        log::info!(
            "Run {} started: {} nodes, {} sinks",
            execution_id,
            graph.len(),
            request.sinks.len()
        );
        self.emit(RunEvent::RunStarted {
            execution_id: execution_id.clone(),
            order: plan.order().to_vec(),
        });

        let started = Instant::now();
        let mut run = Run::new(graph, &plan, &request, &execution_id, self);
        run.execute(self.config.effective_concurrency()).await;
        let nodes = run.finish();

        let sinks = request
            .sinks
            .iter()
            .filter_map(|sink| {
                let result = match nodes.get(sink)? {
                    NodeStatus::Succeeded { output } => Ok(output.clone()),
                    NodeStatus::Failed { error } => Err(error.clone()),
                    NodeStatus::Skipped { cause } => Err(cause.clone()),
                };
                Some((sink.clone(), result))
            })
            .collect();

        let report = RunReport {
            execution_id,
            order: plan.order().to_vec(),
            nodes,
            sinks,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        log::info!(
            "Run {} completed in {}ms: {} succeeded, {} failed, {} skipped",
            report.execution_id,
            report.duration_ms,
            report.succeeded(),
            report.failed(),
            report.skipped()
        );
        self.emit(RunEvent::RunCompleted {
            execution_id: report.execution_id.clone(),
            succeeded: report.succeeded(),
            failed: report.failed(),
            skipped: report.skipped(),
        });

        Ok(report)
    }

    /// Check the graph and request, then resolve the execution order
    fn preflight(&self, graph: &Graph, request: &RunRequest) -> Result<ExecutionPlan> {
        let mut errors = validate_wiring(graph);
        errors.extend(validate_request(graph, request));

        if let Some(first) = errors.into_iter().next() {
            log::warn!("Run rejected: {}", first);
            return Err(RunError::GraphConfig(first));
        }

        resolve(graph).map_err(|err| {
            log::warn!("Run rejected: {}", err);
            RunError::Cycle(err)
        })
    }

    fn emit(&self, event: RunEvent) {
        if let Err(e) = self.event_sink.send(event) {
            log::debug!("Dropped run event: {}", e);
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

/// Per-run state, owned by the coordinating task
struct Run<'a> {
    graph: &'a Graph,
    plan: &'a ExecutionPlan,
    request: &'a RunRequest,
    execution_id: &'a str,
    executor: &'a Executor,
    /// Validated outputs of succeeded nodes
    outputs: BTreeMap<NodeName, Value>,
    /// Final status per node
    statuses: BTreeMap<NodeName, NodeStatus>,
    /// Producers each node is still waiting on
    waiting_on: BTreeMap<NodeName, usize>,
    /// Nodes whose producers have all succeeded
    ready: BTreeSet<NodeName>,
}

type TaskResult = (NodeName, std::result::Result<Value, NodeFailure>);

impl<'a> Run<'a> {
    fn new(
        graph: &'a Graph,
        plan: &'a ExecutionPlan,
        request: &'a RunRequest,
        execution_id: &'a str,
        executor: &'a Executor,
    ) -> Self {
        let waiting_on: BTreeMap<NodeName, usize> = plan
            .order()
            .iter()
            .map(|name| (name.clone(), plan.upstream(name).count()))
            .collect();
        let ready = waiting_on
            .iter()
            .filter(|(_, &n)| n == 0)
            .map(|(name, _)| name.clone())
            .collect();

        Self {
            graph,
            plan,
            request,
            execution_id,
            executor,
            outputs: BTreeMap::new(),
            statuses: BTreeMap::new(),
            waiting_on,
            ready,
        }
    }

    async fn execute(&mut self, max_concurrency: usize) {
        let semaphore = Arc::new(Semaphore::new(max_concurrency));
        let mut tasks: JoinSet<TaskResult> = JoinSet::new();

        loop {
            while let Some(name) = self.ready.pop_first() {
                let Some(node) = self.graph.node(&name).cloned() else {
                    continue;
                };

                let input = match self.gather_input(&name) {
                    Ok(input) => input,
                    Err(failure) => {
                        self.record_failure(&name, failure);
                        continue;
                    }
                };

                // Acquired before spawning so nodes start in resolved order
                let permit = semaphore.clone().acquire_owned().await.ok();

                log::debug!("Node '{}' started", name);
                self.executor.emit(RunEvent::NodeStarted {
                    execution_id: self.execution_id.to_string(),
                    node: name.clone(),
                });

                tasks.spawn(async move {
                    let _permit = permit;
                    let outcome = run_isolated(node, input).await;
                    (name, outcome)
                });
            }

            match tasks.join_next().await {
                Some(Ok((name, Ok(output)))) => self.record_success(&name, output),
                Some(Ok((name, Err(failure)))) => self.record_failure(&name, failure),
                Some(Err(e)) => log::error!("Node task was lost: {}", e),
                None => break,
            }
        }
    }

    /// Build a node's input from its initial input or upstream outputs
    fn gather_input(&self, name: &str) -> std::result::Result<Value, NodeFailure> {
        if self.plan.is_source(name) {
            return Ok(self
                .request
                .initial_inputs
                .get(name)
                .cloned()
                .unwrap_or(Value::Null));
        }

        let mut fields = Map::new();
        for conn in self.plan.inbound(name) {
            let produced = self.outputs.get(&conn.from_node).ok_or_else(|| {
                NodeFailure::Execution {
                    message: format!("no output recorded for '{}'", conn.from_node),
                }
            })?;

            let value = match &conn.from_output {
                None => produced.clone(),
                Some(channel) => produced.get(channel).cloned().ok_or_else(|| {
                    NodeFailure::MissingOutputChannel {
                        from: conn.from_node.clone(),
                        channel: channel.clone(),
                    }
                })?,
            };

            match &conn.to_input {
                None => return Ok(value),
                Some(channel) => {
                    fields.insert(channel.clone(), value);
                }
            }
        }

        Ok(Value::Object(fields))
    }

    fn record_success(&mut self, name: &str, output: Value) {
        log::debug!("Node '{}' completed", name);
        self.executor.emit(RunEvent::NodeCompleted {
            execution_id: self.execution_id.to_string(),
            node: name.to_string(),
            output: output.clone(),
        });

        self.outputs.insert(name.to_string(), output.clone());
        self.statuses
            .insert(name.to_string(), NodeStatus::Succeeded { output });

        for next in self.plan.downstream(name) {
            if let Some(waiting) = self.waiting_on.get_mut(next) {
                *waiting = waiting.saturating_sub(1);
                if *waiting == 0 && !self.statuses.contains_key(next) {
                    self.ready.insert(next.to_string());
                }
            }
        }
    }

    fn record_failure(&mut self, name: &str, failure: NodeFailure) {
        let error = NodeExecutionError::new(name, failure);
        log::warn!("{}", error);
        self.executor.emit(RunEvent::NodeFailed {
            execution_id: self.execution_id.to_string(),
            node: name.to_string(),
            failure: error.failure.clone(),
        });
        self.statuses.insert(
            name.to_string(),
            NodeStatus::Failed {
                error: error.clone(),
            },
        );

        for skipped in self.plan.reachable_from(name) {
            if self.statuses.contains_key(&skipped) {
                continue;
            }
            log::warn!("Node '{}' skipped: upstream node '{}' failed", skipped, name);
            self.executor.emit(RunEvent::NodeSkipped {
                execution_id: self.execution_id.to_string(),
                node: skipped.clone(),
                cause: error.clone(),
            });
            self.ready.remove(&skipped);
            self.statuses
                .insert(skipped, NodeStatus::Skipped { cause: error.clone() });
        }
    }

    /// Final statuses; a node without one lost its task
    fn finish(self) -> BTreeMap<NodeName, NodeStatus> {
        let mut statuses = self.statuses;
        for name in self.plan.order() {
            statuses.entry(name.clone()).or_insert_with(|| NodeStatus::Failed {
                error: NodeExecutionError::new(
                    name.clone(),
                    NodeFailure::Panicked {
                        message: "node task did not report a result".to_string(),
                    },
                ),
            });
        }
        statuses
    }
}

/// Run a node on its own task so a panic becomes a failure value
async fn run_isolated(node: Arc<dyn Node>, input: Value) -> std::result::Result<Value, NodeFailure> {
    match tokio::spawn(execute_node(node, input)).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_panic() => Err(NodeFailure::Panicked {
            message: panic_message(e.into_panic()),
        }),
        Err(e) => Err(NodeFailure::Panicked {
            message: e.to_string(),
        }),
    }
}

/// Validate input, execute, validate output
async fn execute_node(node: Arc<dyn Node>, input: Value) -> std::result::Result<Value, NodeFailure> {
    let input = validate(node.input_schema(), &input)
        .map_err(|error| NodeFailure::InvalidInput { error })?;
    let output = node.execute(input).await?;
    validate(node.output_schema(), &output).map_err(|error| NodeFailure::InvalidOutput { error })
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
