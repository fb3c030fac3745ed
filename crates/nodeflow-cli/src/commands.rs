//! Subcommand implementations
//!
//! Each command returns the process exit code: 0 on success, 1 when the
//! graph ran (or was checked) but something in it failed.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use nodeflow_engine::validation::validate_wiring;
use nodeflow_engine::{
    resolve, DocumentError, Executor, ExecutorConfig, Graph, GraphConfigError, GraphDocument,
    ProviderError, RunError, RunRequest,
};
use nodeflow_nodes::{builtin_registry, ProviderConfig, Services};
use serde_json::Value;
use thiserror::Error;

/// Errors that stop a command before it produces output
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Graph(#[from] GraphConfigError),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Invalid inputs: {0}")]
    Inputs(String),

    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Options of the `run` command
#[derive(Debug, Default)]
pub struct RunOptions {
    pub graph: PathBuf,
    pub inputs_file: Option<PathBuf>,
    pub inline_inputs: Vec<String>,
    pub sinks: Vec<String>,
    pub user: Option<String>,
    pub max_concurrency: Option<usize>,
}

/// Run a graph document and print its report
pub async fn run(options: RunOptions) -> Result<i32> {
    let document = GraphDocument::load(&options.graph)?;
    let services = Services::from_env(options.user.clone())?;
    let graph = builtin_registry(&services).instantiate(&document)?;
    let request = build_request(&graph, &options)?;
    log::debug!(
        "Running {} with {} initial inputs and sinks {:?}",
        options.graph.display(),
        request.initial_inputs.len(),
        request.sinks
    );

    let mut config = ExecutorConfig::default();
    if let Some(n) = options.max_concurrency {
        config = config.with_max_concurrency(n);
    }

    let report = Executor::new(config).run(&graph, request).await?;
    println!("{}", report.to_json()?);

    Ok(if report.is_success() { 0 } else { 1 })
}

/// Check a graph document without running it
pub fn validate(path: &Path) -> Result<i32> {
    let document = GraphDocument::load(path)?;
    let services = Services::from_config(ProviderConfig::default(), None)?;
    let graph = builtin_registry(&services).instantiate(&document)?;

    let problems = validate_wiring(&graph);
    if !problems.is_empty() {
        for problem in &problems {
            println!("error: {}", problem);
        }
        return Ok(1);
    }

    match resolve(&graph) {
        Ok(plan) => {
            println!("ok: {}", plan.order().join(" -> "));
            Ok(0)
        }
        Err(e) => {
            println!("error: {}", e);
            Ok(1)
        }
    }
}

/// Print the built-in node descriptors
pub fn nodes() -> Result<i32> {
    let services = Services::from_config(ProviderConfig::default(), None)?;
    let descriptors = builtin_registry(&services).descriptors();
    println!("{}", serde_json::to_string_pretty(&descriptors)?);
    Ok(0)
}

/// Assemble the run request from files and flags
///
/// Without explicit sinks, every node with no outgoing connections is
/// reported.
fn build_request(graph: &Graph, options: &RunOptions) -> Result<RunRequest> {
    let mut request = RunRequest::new();

    if let Some(path) = &options.inputs_file {
        let text = fs::read_to_string(path)
            .map_err(|e| CliError::Inputs(format!("{}: {}", path.display(), e)))?;
        let inputs: BTreeMap<String, Value> = serde_json::from_str(&text)
            .map_err(|e| CliError::Inputs(format!("{}: {}", path.display(), e)))?;
        request.initial_inputs.extend(inputs);
    }

    for item in &options.inline_inputs {
        let (node, value) = parse_inline_input(item)?;
        request = request.with_input(node, value);
    }

    if options.sinks.is_empty() {
        let terminal = graph
            .node_names()
            .filter(|name| graph.outgoing(name).next().is_none());
        request = request.with_sinks(terminal);
    } else {
        request = request.with_sinks(options.sinks.iter().cloned());
    }

    Ok(request)
}

/// Parse `NODE=JSON`
fn parse_inline_input(item: &str) -> Result<(String, Value)> {
    let (node, json) = item
        .split_once('=')
        .ok_or_else(|| CliError::Inputs(format!("expected NODE=JSON, got '{}'", item)))?;
    let value = serde_json::from_str(json)
        .map_err(|e| CliError::Inputs(format!("input for '{}': {}", node, e)))?;
    Ok((node.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_document(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("graph.json");
        fs::write(&path, json).unwrap();
        path
    }

    const ECHO_GRAPH: &str = r#"{
        "nodes": [
            {"name": "helloWorld", "kind": "pure"},
            {"name": "echo", "kind": "pure"}
        ],
        "connections": [
            {"fromNode": "helloWorld", "toNode": "echo", "toInput": "text"}
        ]
    }"#;

    #[test]
    fn test_parse_inline_input() {
        let (node, value) = parse_inline_input(r#"echo={"text":"a=b"}"#).unwrap();
        assert_eq!(node, "echo");
        assert_eq!(value, json!({"text": "a=b"}));

        assert!(matches!(parse_inline_input("echo"), Err(CliError::Inputs(_))));
        assert!(matches!(parse_inline_input("echo={"), Err(CliError::Inputs(_))));
    }

    #[test]
    fn test_build_request_defaults_to_terminal_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_document(dir.path(), ECHO_GRAPH);
        let services = Services::from_config(ProviderConfig::default(), None).unwrap();
        let graph = builtin_registry(&services)
            .instantiate(&GraphDocument::load(&path).unwrap())
            .unwrap();

        let request = build_request(&graph, &RunOptions::default()).unwrap();
        assert_eq!(request.sinks.into_iter().collect::<Vec<_>>(), vec!["echo"]);
    }

    #[test]
    fn test_build_request_reads_inputs_file() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = dir.path().join("inputs.json");
        fs::write(&inputs, r#"{"echo": {"text": "from file"}}"#).unwrap();

        let options = RunOptions {
            inputs_file: Some(inputs),
            inline_inputs: vec![r#"other={"x":1}"#.to_string()],
            sinks: vec!["echo".to_string()],
            ..RunOptions::default()
        };
        let request = build_request(&Graph::default(), &options).unwrap();

        assert_eq!(request.initial_inputs["echo"], json!({"text": "from file"}));
        assert_eq!(request.initial_inputs["other"], json!({"x": 1}));
        assert!(request.sinks.contains("echo"));
    }

    #[test]
    fn test_validate_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_document(dir.path(), ECHO_GRAPH);
        assert_eq!(validate(&path).unwrap(), 0);

        let unknown = write_document(
            dir.path(),
            r#"{"nodes": [{"name": "mystery", "kind": "pure"}]}"#,
        );
        assert!(matches!(
            validate(&unknown),
            Err(CliError::Graph(GraphConfigError::UnregisteredNode(_)))
        ));
    }

    #[tokio::test]
    async fn test_run_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_document(dir.path(), ECHO_GRAPH);
        let options = RunOptions {
            graph: path,
            ..RunOptions::default()
        };
        assert_eq!(run(options).await.unwrap(), 0);
    }
}
