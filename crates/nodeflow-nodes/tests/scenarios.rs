//! End-to-end runs of built-in nodes through the executor

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use nodeflow_engine::{
    Connection, Executor, GraphBuilder, GraphConfigError, GraphDocument, NodeEntry, NodeFailure,
    NodeKind, ProviderError, RunError, RunRequest,
};
use nodeflow_nodes::{
    builtin_registry, CompletionOptions, EchoNode, HelloWorldNode, MemoryRecordStore,
    RecordFilter, RecordStore, Services, StaticIdentity, TextCompletionNode, TextProvider,
};
use serde_json::json;

struct MockProvider {
    reply: Result<String, ProviderError>,
    calls: AtomicUsize,
}

impl MockProvider {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(error: ProviderError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(error),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TextProvider for MockProvider {
    async fn complete(
        &self,
        _prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

fn services(provider: Arc<MockProvider>, records: Arc<MemoryRecordStore>) -> Services {
    Services::new(provider, records, Arc::new(StaticIdentity::new("user-1")))
}

#[tokio::test]
async fn test_hello_world_sink() {
    let graph = GraphBuilder::new()
        .node(HelloWorldNode.into_node())
        .build()
        .unwrap();

    let report = Executor::default()
        .run(&graph, RunRequest::new().with_sink("helloWorld"))
        .await
        .unwrap();

    assert_eq!(report.sinks.len(), 1);
    assert_eq!(report.sink_output("helloWorld"), Some(&json!("Hello, world!")));
}

#[tokio::test]
async fn test_completion_feeds_echo() {
    let provider = MockProvider::replying("mocked completion");
    let graph = GraphBuilder::new()
        .node(TextCompletionNode::new(provider.clone()).named("gen"))
        .node(EchoNode.into_node())
        .connect_channels("gen", "completion", "echo", "text")
        .build()
        .unwrap();

    let report = Executor::default()
        .run(
            &graph,
            RunRequest::new()
                .with_input("gen", json!({"prompt": "Say something"}))
                .with_sink("echo"),
        )
        .await
        .unwrap();

    assert_eq!(report.sink_output("echo"), Some(&json!("mocked completion")));
    assert_eq!(report.order, vec!["gen", "echo"]);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_duplicate_input_channel_rejected() {
    let provider = MockProvider::replying("unused");
    let graph = GraphBuilder::new()
        .node(TextCompletionNode::new(provider.clone()).named("gen1"))
        .node(TextCompletionNode::new(provider.clone()).named("gen2"))
        .node(EchoNode.into_node())
        .connect_channels("gen1", "completion", "echo", "text")
        .connect_channels("gen2", "completion", "echo", "text")
        .build()
        .unwrap();

    let err = Executor::default()
        .run(
            &graph,
            RunRequest::new()
                .with_input("gen1", json!({"prompt": "a"}))
                .with_input("gen2", json!({"prompt": "b"}))
                .with_sink("echo"),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RunError::GraphConfig(GraphConfigError::DuplicateInputChannel { .. })
    ));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_provider_failure_skips_dependents() {
    let provider = MockProvider::failing(ProviderError::Quota("exhausted".to_string()));
    let graph = GraphBuilder::new()
        .node(TextCompletionNode::new(provider).named("gen"))
        .node(EchoNode.into_node())
        .node(HelloWorldNode.into_node())
        .connect_channels("gen", "completion", "echo", "text")
        .build()
        .unwrap();

    let report = Executor::default()
        .run(
            &graph,
            RunRequest::new()
                .with_input("gen", json!({"prompt": "x"}))
                .with_sinks(["echo", "helloWorld"]),
        )
        .await
        .unwrap();

    let err = report.sink("echo").unwrap().as_ref().unwrap_err();
    assert_eq!(err.node, "gen");
    assert!(err.is_provider_error());
    assert!(matches!(
        &err.failure,
        NodeFailure::Provider { error: ProviderError::Quota(_) }
    ));
    assert!(report.status("echo").unwrap().is_skipped());
    assert_eq!(report.sink_output("helloWorld"), Some(&json!("Hello, world!")));
}

#[tokio::test]
async fn test_missing_prompt_requires_input() {
    let provider = MockProvider::replying("unused");
    let graph = GraphBuilder::new()
        .node(TextCompletionNode::new(provider).named("gen"))
        .build()
        .unwrap();

    let err = Executor::default()
        .run(&graph, RunRequest::new().with_sink("gen"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RunError::GraphConfig(GraphConfigError::SourceRequiresInput { ref node, .. }) if node == "gen"
    ));
}

#[tokio::test]
async fn test_whole_value_into_record_field_fails_validation() {
    let records = Arc::new(MemoryRecordStore::new());
    let registry = builtin_registry(&services(MockProvider::replying("stored text"), records.clone()));

    let document = GraphDocument::from_json(
        r#"{
            "nodes": [
                {"name": "textCompletion", "kind": "io"},
                {"name": "appendRecord", "kind": "io"}
            ],
            "connections": [
                {"fromNode": "textCompletion", "toNode": "appendRecord", "toInput": "fields"}
            ]
        }"#,
    )
    .unwrap();

    // appendRecord also requires a collection, which nothing supplies
    let err = Executor::default()
        .run(
            &registry.instantiate(&document).unwrap(),
            RunRequest::new()
                .with_input("textCompletion", json!({"prompt": "remember this"}))
                .with_sink("appendRecord"),
        )
        .await
        .unwrap()
        .sink("appendRecord")
        .cloned()
        .unwrap()
        .unwrap_err();
    assert!(matches!(err.failure, NodeFailure::InvalidInput { .. }));
    assert!(records.is_empty().await);
}

#[tokio::test]
async fn test_records_are_stamped_with_user() {
    let records = Arc::new(MemoryRecordStore::new());
    let registry = builtin_registry(&services(MockProvider::replying("unused"), records.clone()));
    let document = GraphDocument {
        nodes: vec![NodeEntry::new("appendRecord", NodeKind::Io)],
        connections: vec![],
    };
    let graph = registry.instantiate(&document).unwrap();

    let report = Executor::default()
        .run(
            &graph,
            RunRequest::new()
                .with_input(
                    "appendRecord",
                    json!({"collection": "notes", "fields": {"title": "first"}}),
                )
                .with_sink("appendRecord"),
        )
        .await
        .unwrap();

    let stored = records.list(&RecordFilter::collection("notes")).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].created_by, "user-1");
    assert_eq!(
        report.sink_output("appendRecord"),
        Some(&json!({"id": stored[0].id}))
    );
}

#[tokio::test]
async fn test_documents_round_trip_through_registry() {
    let registry = builtin_registry(&services(
        MockProvider::replying("x"),
        Arc::new(MemoryRecordStore::new()),
    ));
    let document = GraphDocument {
        nodes: vec![
            NodeEntry::new("gen", NodeKind::Io).of("textCompletion"),
            NodeEntry::new("echo", NodeKind::Pure),
        ],
        connections: vec![Connection::new("gen", "echo")
            .from_output("completion")
            .to_input("text")],
    };

    let graph = registry.instantiate(&document).unwrap();
    let restored = GraphDocument::from_json(&graph.to_document().to_json().unwrap()).unwrap();
    assert_eq!(restored, document);
}

#[tokio::test]
async fn test_document_binds_definitions_under_instance_names() {
    let provider = MockProvider::replying("mocked completion");
    let registry = builtin_registry(&services(
        provider.clone(),
        Arc::new(MemoryRecordStore::new()),
    ));

    let document = GraphDocument::from_json(
        r#"{
            "nodes": [
                {"name": "gen", "node": "textCompletion", "kind": "io"},
                {"name": "echo", "kind": "pure"}
            ],
            "connections": [
                {"fromNode": "gen", "fromOutput": "completion", "toNode": "echo", "toInput": "text"}
            ]
        }"#,
    )
    .unwrap();
    let graph = registry.instantiate(&document).unwrap();

    let report = Executor::default()
        .run(
            &graph,
            RunRequest::new()
                .with_input("gen", json!({"prompt": "Say something"}))
                .with_sink("echo"),
        )
        .await
        .unwrap();

    assert_eq!(report.sink_output("echo"), Some(&json!("mocked completion")));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_document_with_two_completions_into_one_channel_rejected() {
    let provider = MockProvider::replying("unused");
    let registry = builtin_registry(&services(
        provider.clone(),
        Arc::new(MemoryRecordStore::new()),
    ));

    let document = GraphDocument::from_json(
        r#"{
            "nodes": [
                {"name": "gen1", "node": "textCompletion", "kind": "io"},
                {"name": "gen2", "node": "textCompletion", "kind": "io"},
                {"name": "echo", "kind": "pure"}
            ],
            "connections": [
                {"fromNode": "gen1", "fromOutput": "completion", "toNode": "echo", "toInput": "text"},
                {"fromNode": "gen2", "fromOutput": "completion", "toNode": "echo", "toInput": "text"}
            ]
        }"#,
    )
    .unwrap();
    let graph = registry.instantiate(&document).unwrap();
    assert_eq!(graph.len(), 3);

    let err = Executor::default()
        .run(
            &graph,
            RunRequest::new()
                .with_input("gen1", json!({"prompt": "a"}))
                .with_input("gen2", json!({"prompt": "b"}))
                .with_sink("echo"),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RunError::GraphConfig(GraphConfigError::DuplicateInputChannel { ref node, .. }) if node == "echo"
    ));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}
