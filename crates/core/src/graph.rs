// SPDX-License-Identifier: MIT

//! The wire-level graph data model (§3, §6) and the pure graph algorithms
//! (adjacency, reachability, Kahn ordering, subgraph extraction — C8) that
//! both runners build their execution order from.

use crate::event::EventFilter;
use crate::id::NodeId;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

/// A node declared in the graph (§3). Immutable once a run begins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub config: Value,
    #[serde(rename = "eventFilters", default, skip_serializing_if = "Vec::is_empty")]
    pub event_filters: Vec<EventFilter>,
}

/// One endpoint of a [`Connection`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortRef {
    #[serde(rename = "nodeId")]
    pub node_id: NodeId,
    pub port: String,
}

/// A directed edge `(fromNode, fromPort) -> (toNode, toPort)` (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub from: PortRef,
    pub to: PortRef,
}

/// Small shared mapping nodes read and cooperatively update (§3, §5).
pub type Character = serde_json::Map<String, Value>;

/// `{nodes, connections, character}` (§3, §6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub character: Character,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("graph has no nodes")]
    EmptyGraph,
    #[error("duplicate node id `{0}`")]
    DuplicateNodeId(String),
    #[error("connection references unknown node `{0}`")]
    DanglingConnection(String),
    #[error("graph contains a cycle reachable from the entry set")]
    Cycle,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.id.as_str() == id)
    }

    /// Validates I1 and referential integrity. Surfaced at `start`, before
    /// the workflow enters *running* (§7 GraphError).
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.nodes.is_empty() {
            return Err(GraphError::EmptyGraph);
        }
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(GraphError::DuplicateNodeId(node.id.as_str().to_string()));
            }
        }
        for conn in &self.connections {
            if self.node(conn.from.node_id.as_str()).is_none() {
                return Err(GraphError::DanglingConnection(conn.from.node_id.as_str().to_string()));
            }
            if self.node(conn.to.node_id.as_str()).is_none() {
                return Err(GraphError::DanglingConnection(conn.to.node_id.as_str().to_string()));
            }
        }
        Ok(())
    }

    /// Adjacency: for every connection, add `to` to `adj[from]` without
    /// duplicates (§4.5).
    pub fn adjacency(&self) -> IndexMap<NodeId, IndexSet<NodeId>> {
        let mut adj: IndexMap<NodeId, IndexSet<NodeId>> = IndexMap::new();
        for node in &self.nodes {
            adj.entry(node.id.clone()).or_default();
        }
        for conn in &self.connections {
            adj.entry(conn.from.node_id.clone()).or_default().insert(conn.to.node_id.clone());
        }
        adj
    }

    /// BFS reachability from a seed set; each node visited once (§4.5).
    pub fn reachable(&self, seeds: impl IntoIterator<Item = NodeId>) -> IndexSet<NodeId> {
        let adj = self.adjacency();
        let mut visited = IndexSet::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        for seed in seeds {
            if visited.insert(seed.clone()) {
                queue.push_back(seed);
            }
        }
        while let Some(node) = queue.pop_front() {
            if let Some(next) = adj.get(&node) {
                for n in next {
                    if visited.insert(n.clone()) {
                        queue.push_back(n.clone());
                    }
                }
            }
        }
        visited
    }

    /// Entry-point policy (§4.5): if any node's type is `"start"`, the entry
    /// set is exactly those start nodes; otherwise every in-degree-0 node.
    pub fn entry_points(&self) -> IndexSet<NodeId> {
        let starts: IndexSet<NodeId> =
            self.nodes.iter().filter(|n| n.node_type == "start").map(|n| n.id.clone()).collect();
        if !starts.is_empty() {
            return starts;
        }
        let mut indegree: HashMap<NodeId, usize> =
            self.nodes.iter().map(|n| (n.id.clone(), 0)).collect();
        for conn in &self.connections {
            *indegree.entry(conn.to.node_id.clone()).or_insert(0) += 1;
        }
        self.nodes.iter().filter(|n| indegree.get(&n.id).copied().unwrap_or(0) == 0).map(|n| n.id.clone()).collect()
    }

    /// Nodes reachable from `seeds` plus the connections both of whose
    /// endpoints are in that set (§4.5 "Subgraph from X").
    pub fn subgraph_from(&self, seeds: impl IntoIterator<Item = NodeId>) -> Graph {
        let reachable = self.reachable(seeds);
        let nodes = self.nodes.iter().filter(|n| reachable.contains(&n.id)).cloned().collect();
        let connections = self
            .connections
            .iter()
            .filter(|c| reachable.contains(&c.from.node_id) && reachable.contains(&c.to.node_id))
            .cloned()
            .collect();
        Graph { nodes, connections, character: self.character.clone() }
    }

    /// Kahn ordering over the reachable subgraph rooted at the entry set
    /// (§4.5). Ties break in insertion (node declaration) order. A cycle
    /// yields [`GraphError::Cycle`].
    pub fn execution_order(&self) -> Result<Vec<NodeId>, GraphError> {
        let entries = self.entry_points();
        let reachable = self.reachable(entries.iter().cloned());
        kahn_order(self, &reachable, &HashSet::new())
    }

    /// Downstream ordering from a source `S` (§4.5): Kahn over
    /// `reachable(S) \ {S}`, treating edges from `S` as already satisfied.
    pub fn downstream_order_from(&self, source: &NodeId) -> Result<Vec<NodeId>, GraphError> {
        let mut reachable = self.reachable([source.clone()]);
        reachable.shift_remove(source);
        let satisfied: HashSet<NodeId> = [source.clone()].into_iter().collect();
        kahn_order(self, &reachable, &satisfied)
    }
}

/// Kahn's algorithm restricted to `reachable`, with in-edges from
/// `pre_satisfied` nodes treated as already accounted for (used to seed
/// downstream ordering from a source node whose own edges are "free").
fn kahn_order(
    graph: &Graph,
    reachable: &IndexSet<NodeId>,
    pre_satisfied: &HashSet<NodeId>,
) -> Result<Vec<NodeId>, GraphError> {
    let declaration_order: IndexMap<NodeId, usize> =
        graph.nodes.iter().enumerate().map(|(i, n)| (n.id.clone(), i)).collect();

    let mut indegree: HashMap<NodeId, usize> = reachable.iter().map(|n| (n.clone(), 0)).collect();
    let mut adj: HashMap<NodeId, Vec<NodeId>> = reachable.iter().map(|n| (n.clone(), Vec::new())).collect();

    for conn in &graph.connections {
        if !reachable.contains(&conn.from.node_id) || !reachable.contains(&conn.to.node_id) {
            continue;
        }
        if let Some(successors) = adj.get_mut(&conn.from.node_id) {
            successors.push(conn.to.node_id.clone());
        }
        if !pre_satisfied.contains(&conn.from.node_id) {
            if let Some(d) = indegree.get_mut(&conn.to.node_id) {
                *d += 1;
            }
        }
    }

    let mut ready: Vec<NodeId> =
        indegree.iter().filter(|(_, d)| **d == 0).map(|(n, _)| n.clone()).collect();
    ready.sort_by_key(|n| declaration_order.get(n).copied().unwrap_or(usize::MAX));

    let mut order = Vec::with_capacity(reachable.len());
    let mut queue: VecDeque<NodeId> = ready.into();
    while let Some(node) = queue.pop_front() {
        order.push(node.clone());
        let mut newly_ready = Vec::new();
        if let Some(next) = adj.get(&node) {
            for succ in next {
                let Some(d) = indegree.get_mut(succ) else { continue };
                if *d > 0 {
                    *d -= 1;
                    if *d == 0 {
                        newly_ready.push(succ.clone());
                    }
                }
            }
        }
        newly_ready.sort_by_key(|n| declaration_order.get(n).copied().unwrap_or(usize::MAX));
        for n in newly_ready {
            queue.push_back(n);
        }
    }

    if order.len() != reachable.len() {
        return Err(GraphError::Cycle);
    }
    Ok(order)
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
