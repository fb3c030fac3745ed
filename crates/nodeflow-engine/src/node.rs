//! Node abstraction
//!
//! Every node exposes the same object-safe contract, [`Node`], so graphs can
//! hold heterogeneous nodes as `Arc<dyn Node>`. Two helpers build nodes:
//!
//! - [`TypedNode`] + [`Typed`]: a node with concrete Rust input/output types.
//!   The executor hands it a validated JSON value, which is decoded into
//!   `Input`; the returned `Output` is encoded back before output validation.
//! - [`FnNode`]: a node backed by a closure, for ad-hoc graphs and tests.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::NodeError;
use crate::schema::Schema;

/// Whether a node may have side effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// No observable side effects; deterministic and safe to re-execute
    Pure,
    /// May perform external effects; executed at most once per run
    Io,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pure => write!(f, "pure"),
            Self::Io => write!(f, "io"),
        }
    }
}

/// A named unit of computation with input/output contracts
///
/// `execute` receives an input already validated against `input_schema` and
/// must not validate it again. The executor validates the returned value
/// against `output_schema` before routing it downstream.
#[async_trait]
pub trait Node: Send + Sync {
    /// Unique name within a graph
    fn name(&self) -> &str;

    /// Registered definition this node was created from
    ///
    /// Differs from [`name`](Self::name) when a registered node is bound
    /// under another name in a graph document.
    fn definition(&self) -> &str {
        self.name()
    }

    /// Pure or effectful
    fn kind(&self) -> NodeKind;

    /// Contract for accepted input values
    fn input_schema(&self) -> &Schema;

    /// Contract for produced output values
    fn output_schema(&self) -> &Schema;

    /// Run the node on a validated input
    async fn execute(&self, input: Value) -> Result<Value, NodeError>;
}

/// A node with concrete input and output types
///
/// # Example
///
/// ```ignore
/// struct Upper;
///
/// #[async_trait]
/// impl TypedNode for Upper {
///     type Input = String;
///     type Output = String;
///     const KIND: NodeKind = NodeKind::Pure;
///
///     fn input_schema(&self) -> Schema { Schema::String }
///     fn output_schema(&self) -> Schema { Schema::String }
///
///     async fn run(&self, input: String) -> Result<String, NodeError> {
///         Ok(input.to_uppercase())
///     }
/// }
///
/// let node = Typed::new("upper", Upper).into_node();
/// ```
#[async_trait]
pub trait TypedNode: Send + Sync + 'static {
    /// Decoded input type
    type Input: DeserializeOwned + Send;
    /// Output type, encoded to JSON after `run`
    type Output: Serialize + Send;
    /// Pure or effectful
    const KIND: NodeKind;

    /// Contract for the input value
    fn input_schema(&self) -> Schema;

    /// Contract for the output value
    fn output_schema(&self) -> Schema;

    /// Run on a decoded input
    async fn run(&self, input: Self::Input) -> Result<Self::Output, NodeError>;
}

/// Adapter exposing a [`TypedNode`] through the [`Node`] contract
pub struct Typed<N: TypedNode> {
    name: String,
    input_schema: Schema,
    output_schema: Schema,
    inner: N,
}

impl<N: TypedNode> Typed<N> {
    /// Wrap a typed node under a name
    pub fn new(name: impl Into<String>, inner: N) -> Self {
        Self {
            name: name.into(),
            input_schema: inner.input_schema(),
            output_schema: inner.output_schema(),
            inner,
        }
    }

    /// Get the wrapped node
    pub fn inner(&self) -> &N {
        &self.inner
    }

    /// Convert into a shareable trait object
    pub fn into_node(self) -> Arc<dyn Node> {
        Arc::new(self)
    }
}

#[async_trait]
impl<N: TypedNode> Node for Typed<N> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        N::KIND
    }

    fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    async fn execute(&self, input: Value) -> Result<Value, NodeError> {
        let input: N::Input = serde_json::from_value(input)
            .map_err(|e| NodeError::failed(format!("cannot decode input: {}", e)))?;
        let output = self.inner.run(input).await?;
        serde_json::to_value(output)
            .map_err(|e| NodeError::failed(format!("cannot encode output: {}", e)))
    }
}

type NodeFuture = Pin<Box<dyn Future<Output = Result<Value, NodeError>> + Send>>;

/// Closure-backed node
pub struct FnNode {
    name: String,
    kind: NodeKind,
    input_schema: Schema,
    output_schema: Schema,
    callback: Box<dyn Fn(Value) -> NodeFuture + Send + Sync>,
}

impl FnNode {
    /// Create a pure node from a synchronous function
    pub fn pure<F>(name: impl Into<String>, input_schema: Schema, output_schema: Schema, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, NodeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: NodeKind::Pure,
            input_schema,
            output_schema,
            callback: Box::new(move |input| Box::pin(std::future::ready(f(input)))),
        }
    }

    /// Create an io node from an async function
    pub fn io<F, Fut>(
        name: impl Into<String>,
        input_schema: Schema,
        output_schema: Schema,
        f: F,
    ) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, NodeError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            kind: NodeKind::Io,
            input_schema,
            output_schema,
            callback: Box::new(move |input| Box::pin(f(input))),
        }
    }

    /// Convert into a shareable trait object
    pub fn into_node(self) -> Arc<dyn Node> {
        Arc::new(self)
    }
}

#[async_trait]
impl Node for FnNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    async fn execute(&self, input: Value) -> Result<Value, NodeError> {
        (self.callback)(input).await
    }
}

/// A node bound under a different name
///
/// Lets one registered definition appear several times in a graph.
pub struct Renamed {
    name: String,
    inner: Arc<dyn Node>,
}

impl Renamed {
    /// Bind `inner` under `name`
    ///
    /// Returns `inner` itself when the name is unchanged.
    pub fn bind(name: impl Into<String>, inner: Arc<dyn Node>) -> Arc<dyn Node> {
        let name = name.into();
        if name == inner.name() {
            return inner;
        }
        Arc::new(Self { name, inner })
    }
}

#[async_trait]
impl Node for Renamed {
    fn name(&self) -> &str {
        &self.name
    }

    fn definition(&self) -> &str {
        self.inner.definition()
    }

    fn kind(&self) -> NodeKind {
        self.inner.kind()
    }

    fn input_schema(&self) -> &Schema {
        self.inner.input_schema()
    }

    fn output_schema(&self) -> &Schema {
        self.inner.output_schema()
    }

    async fn execute(&self, input: Value) -> Result<Value, NodeError> {
        self.inner.execute(input).await
    }
}

impl fmt::Debug for dyn Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}
