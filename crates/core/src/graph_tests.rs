// SPDX-License-Identifier: MIT

use super::*;
use serde_json::json;

fn node(id: &str, node_type: &str) -> NodeSpec {
    NodeSpec { id: NodeId::new(id), node_type: node_type.to_string(), config: json!({}), event_filters: vec![] }
}

fn conn(from: &str, to: &str) -> Connection {
    Connection {
        from: PortRef { node_id: NodeId::new(from), port: "out".into() },
        to: PortRef { node_id: NodeId::new(to), port: "in".into() },
    }
}

#[test]
fn validate_rejects_duplicate_node_ids() {
    let graph = Graph { nodes: vec![node("a", "start"), node("a", "end")], connections: vec![], character: Default::default() };
    assert_eq!(graph.validate(), Err(GraphError::DuplicateNodeId("a".into())));
}

#[test]
fn validate_rejects_dangling_connections() {
    let graph = Graph { nodes: vec![node("a", "start")], connections: vec![conn("a", "ghost")], character: Default::default() };
    assert!(matches!(graph.validate(), Err(GraphError::DanglingConnection(_))));
}

#[test]
fn validate_rejects_empty_graph() {
    let graph = Graph::default();
    assert_eq!(graph.validate(), Err(GraphError::EmptyGraph));
}

/// S1 — linear pipeline: start -> manual-input -> console-output.
#[test]
fn execution_order_s1_linear_pipeline() {
    let graph = Graph {
        nodes: vec![node("start", "start"), node("mi", "manual-input"), node("out", "console-output")],
        connections: vec![conn("start", "mi"), conn("mi", "out")],
        character: Default::default(),
    };
    let order: Vec<String> = graph.execution_order().unwrap().iter().map(|n| n.as_str().to_string()).collect();
    assert_eq!(order, vec!["start", "mi", "out"]);
}

/// S2 — start-node gating: A (start) -> B, C -> D, unreachable branch excluded.
#[test]
fn execution_order_s2_start_node_gating() {
    let graph = Graph {
        nodes: vec![node("a", "start"), node("b", "regular"), node("c", "regular"), node("d", "regular")],
        connections: vec![conn("a", "b"), conn("c", "d")],
        character: Default::default(),
    };
    let order: Vec<String> = graph.execution_order().unwrap().iter().map(|n| n.as_str().to_string()).collect();
    assert_eq!(order, vec!["a", "b"]);
    assert_eq!(graph.nodes.len(), 4, "unreachable nodes remain in the graph, just unexecuted");
}

#[test]
fn entry_points_default_to_indegree_zero_when_no_start_node() {
    let graph = Graph {
        nodes: vec![node("a", "regular"), node("b", "regular")],
        connections: vec![conn("a", "b")],
        character: Default::default(),
    };
    let entries: Vec<String> = graph.entry_points().iter().map(|n| n.as_str().to_string()).collect();
    assert_eq!(entries, vec!["a"]);
}

#[test]
fn cycle_in_reachable_subgraph_is_an_error() {
    let graph = Graph {
        nodes: vec![node("a", "regular"), node("b", "regular")],
        connections: vec![conn("a", "b"), conn("b", "a")],
        character: Default::default(),
    };
    assert_eq!(graph.execution_order(), Err(GraphError::Cycle));
}

#[test]
fn downstream_order_from_source_excludes_the_source_itself() {
    let graph = Graph {
        nodes: vec![node("timer", "timer"), node("transform", "text-transform"), node("out", "console-output")],
        connections: vec![conn("timer", "transform"), conn("transform", "out")],
        character: Default::default(),
    };
    let order: Vec<String> =
        graph.downstream_order_from(&NodeId::new("timer")).unwrap().iter().map(|n| n.as_str().to_string()).collect();
    assert_eq!(order, vec!["transform", "out"]);
}

#[test]
fn subgraph_from_keeps_only_reachable_nodes_and_their_connections() {
    let graph = Graph {
        nodes: vec![node("a", "start"), node("b", "regular"), node("c", "regular")],
        connections: vec![conn("a", "b")],
        character: Default::default(),
    };
    let sub = graph.subgraph_from([NodeId::new("a")]);
    let ids: Vec<String> = sub.nodes.iter().map(|n| n.id.as_str().to_string()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(sub.connections.len(), 1);
}

#[test]
fn isolated_nodes_in_reachable_set_are_ordered_before_their_only_inbound_neighbour() {
    let graph = Graph {
        nodes: vec![node("isolated", "regular"), node("a", "start"), node("b", "regular")],
        connections: vec![conn("a", "b")],
        character: Default::default(),
    };
    // isolated has no start-type connection, so with a start node present it
    // is excluded from the entry set entirely; verify it's simply absent
    // from the executed order rather than mis-ordered.
    let order: Vec<String> = graph.execution_order().unwrap().iter().map(|n| n.as_str().to_string()).collect();
    assert_eq!(order, vec!["a", "b"]);
}
