// SPDX-License-Identifier: MIT

//! Shared input-gathering rule used by both runners (§4.6 step 2, §4.7 step
//! 6): walk every connection landing on a node, pull the named output port
//! from its upstream, falling back to the whole output mapping when the
//! named port is absent.

use crate::node::PortValues;
use avatarflow_core::{Graph, NodeId};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Inputs for `node_id`, built from whatever upstream nodes have already
/// produced. A connection whose upstream has not run at all contributes
/// nothing for that port (§4.6 step 2: "a missing upstream entry yields no
/// input for that port").
pub fn gather_inputs(graph: &Graph, node_id: &NodeId, node_outputs: &HashMap<NodeId, PortValues>) -> PortValues {
    let mut inputs = PortValues::new();
    for conn in &graph.connections {
        if &conn.to.node_id != node_id {
            continue;
        }
        let Some(upstream) = node_outputs.get(&conn.from.node_id) else {
            continue;
        };
        let value = match upstream.get(&conn.from.port) {
            Some(v) => v.clone(),
            None => Value::Object(Map::from_iter(upstream.clone())),
        };
        inputs.insert(conn.to.port.clone(), value);
    }
    inputs
}

/// True if `node_id` has at least one inbound connection in the graph (used
/// to distinguish "no upstream declared" from "upstream declared but didn't
/// produce anything", §4.7 step 6).
pub fn has_inbound_connections(graph: &Graph, node_id: &NodeId) -> bool {
    graph.connections.iter().any(|c| &c.to.node_id == node_id)
}
