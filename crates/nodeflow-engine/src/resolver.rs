//! Dependency resolution
//!
//! Derives a deterministic execution order from a graph's connections using
//! Kahn's algorithm. Among nodes that are ready at the same time, the one
//! with the lexically smallest name goes first, so the same graph always
//! resolves to the same order.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::CycleError;
use crate::graph::Graph;
use crate::types::{Connection, NodeName};

/// Resolved execution order plus the adjacency needed to run it
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    order: Vec<NodeName>,
    inbound: BTreeMap<NodeName, Vec<Connection>>,
    upstream: BTreeMap<NodeName, BTreeSet<NodeName>>,
    downstream: BTreeMap<NodeName, BTreeSet<NodeName>>,
}

impl ExecutionPlan {
    /// Nodes in execution order
    pub fn order(&self) -> &[NodeName] {
        &self.order
    }

    /// Connections feeding a node, in declaration order
    pub fn inbound(&self, name: &str) -> &[Connection] {
        self.inbound.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Whether a node has no inbound connections
    pub fn is_source(&self, name: &str) -> bool {
        self.inbound(name).is_empty()
    }

    /// Distinct producers of a node
    pub fn upstream(&self, name: &str) -> impl Iterator<Item = &str> {
        self.upstream
            .get(name)
            .into_iter()
            .flat_map(|s| s.iter().map(|n| n.as_str()))
    }

    /// Distinct consumers of a node
    pub fn downstream(&self, name: &str) -> impl Iterator<Item = &str> {
        self.downstream
            .get(name)
            .into_iter()
            .flat_map(|s| s.iter().map(|n| n.as_str()))
    }

    /// Every node reachable from `name` through connections, excluding `name`
    pub fn reachable_from(&self, name: &str) -> BTreeSet<NodeName> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<&str> = self.downstream(name).collect();
        while let Some(next) = queue.pop_front() {
            if seen.insert(next.to_string()) {
                queue.extend(self.downstream(next));
            }
        }
        seen
    }
}

/// Compute the execution order of a graph
///
/// Fails with [`CycleError`] listing every node whose dependencies could not
/// be satisfied.
pub fn resolve(graph: &Graph) -> Result<ExecutionPlan, CycleError> {
    let mut inbound: BTreeMap<NodeName, Vec<Connection>> = BTreeMap::new();
    let mut upstream: BTreeMap<NodeName, BTreeSet<NodeName>> = BTreeMap::new();
    let mut downstream: BTreeMap<NodeName, BTreeSet<NodeName>> = BTreeMap::new();

    for name in graph.node_names() {
        inbound.insert(name.to_string(), Vec::new());
        upstream.insert(name.to_string(), BTreeSet::new());
        downstream.insert(name.to_string(), BTreeSet::new());
    }

    for conn in graph.connections() {
        if let Some(v) = inbound.get_mut(&conn.to_node) {
            v.push(conn.clone());
        }
        if let Some(s) = upstream.get_mut(&conn.to_node) {
            s.insert(conn.from_node.clone());
        }
        if let Some(s) = downstream.get_mut(&conn.from_node) {
            s.insert(conn.to_node.clone());
        }
    }

    let order = kahn_order(graph.len(), &upstream, &downstream)?;

    Ok(ExecutionPlan {
        order,
        inbound,
        upstream,
        downstream,
    })
}

fn kahn_order(
    node_count: usize,
    upstream: &BTreeMap<NodeName, BTreeSet<NodeName>>,
    downstream: &BTreeMap<NodeName, BTreeSet<NodeName>>,
) -> Result<Vec<NodeName>, CycleError> {
    // In-degree counts distinct producers; parallel connections between the
    // same pair are one dependency.
    let mut in_degree: BTreeMap<&str, usize> = upstream
        .iter()
        .map(|(name, deps)| (name.as_str(), deps.len()))
        .collect();

    let mut ready: BTreeSet<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&name, _)| name)
        .collect();

    let mut order = Vec::with_capacity(node_count);
    while let Some(name) = ready.pop_first() {
        order.push(name.to_string());
        for next in downstream.get(name).into_iter().flatten() {
            if let Some(deg) = in_degree.get_mut(next.as_str()) {
                *deg -= 1;
                if *deg == 0 {
                    ready.insert(next.as_str());
                }
            }
        }
    }

    if order.len() < node_count {
        let involved_nodes = in_degree
            .into_iter()
            .filter(|(_, deg)| *deg > 0)
            .map(|(name, _)| name.to_string())
            .collect();
        return Err(CycleError { involved_nodes });
    }

    Ok(order)
}
