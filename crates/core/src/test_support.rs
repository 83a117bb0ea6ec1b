// SPDX-License-Identifier: MIT

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::event::Event;
use crate::graph::{Connection, Graph, NodeSpec, PortRef};
use crate::id::NodeId;
use serde_json::json;

pub fn node_spec(id: &str, node_type: &str) -> NodeSpec {
    NodeSpec { id: NodeId::new(id), node_type: node_type.to_string(), config: json!({}), event_filters: vec![] }
}

pub fn connection(from_node: &str, from_port: &str, to_node: &str, to_port: &str) -> Connection {
    Connection {
        from: PortRef { node_id: NodeId::new(from_node), port: from_port.to_string() },
        to: PortRef { node_id: NodeId::new(to_node), port: to_port.to_string() },
    }
}

pub fn linear_pipeline(types: &[(&str, &str)]) -> Graph {
    let nodes: Vec<NodeSpec> = types.iter().map(|(id, ty)| node_spec(id, ty)).collect();
    let connections = types
        .windows(2)
        .map(|w| connection(w[0].0, "out", w[1].0, "in"))
        .collect();
    Graph { nodes, connections, character: Default::default() }
}

pub fn test_event(event_type: &str, payload: serde_json::Value) -> Event {
    Event::new(event_type, payload, 0)
}

/// Proptest strategies for core graph/event types.
#[cfg(any(test, feature = "test-support"))]
pub mod strategies {
    use super::*;
    use crate::graph::NodeSpec as NodeSpecT;
    use proptest::prelude::*;

    /// A small acyclic chain graph: `n0 -> n1 -> ... -> n_{k-1}`. Chains,
    /// rather than arbitrary edge sets, are used so every generated graph
    /// is guaranteed acyclic — the algorithms' cycle handling is covered by
    /// dedicated example tests instead (P2's topological-order property
    /// only makes sense for acyclic inputs).
    pub fn arb_linear_graph(max_len: usize) -> impl Strategy<Value = Graph> {
        (1..=max_len).prop_map(|len| {
            let types: Vec<(String, String)> =
                (0..len).map(|i| (format!("n{i}"), if i == 0 { "start".to_string() } else { "regular".to_string() })).collect();
            let nodes: Vec<NodeSpecT> = types.iter().map(|(id, ty)| node_spec(id, ty)).collect();
            let connections = types.windows(2).map(|w| connection(&w[0].0, "out", &w[1].0, "in")).collect();
            Graph { nodes, connections, character: Default::default() }
        })
    }

    pub fn arb_event_type() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("audio.generated".to_string()),
            Just("avatar.moved".to_string()),
            Just("message.received".to_string()),
            Just("donation".to_string()),
            Just("timer.tick".to_string()),
        ]
    }
}
