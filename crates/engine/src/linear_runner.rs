// SPDX-License-Identifier: MIT

//! One-shot DAG execution (C9, §4.6). Precondition: the graph contains no
//! source nodes — `WorkflowSupervisor` is responsible for routing a graph
//! with any source node to [`crate::event_driven_runner`] instead.

use crate::dataflow::gather_inputs;
use crate::error::RuntimeError;
use crate::node::{call_status, HostCallbacks, NodeInterface, NodeStatus, PortValues};
use crate::runtime::NodeRuntime;
use avatarflow_core::{Graph, NodeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

/// Whether the run reached the end of the order or stopped early on a node
/// failure (§4.6 Open-question resolution, §9). `WorkflowSupervisor` maps
/// this directly onto the workflow's final `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinearOutcome {
    Completed,
    Aborted,
}

/// Runs every node in `runtimes` in topological order (§4.5), feeding each
/// one's inputs from the outputs of already-run upstream nodes. Aborts on
/// the first node failure — the function returns as soon as one node's
/// `execute` fails, leaving remaining nodes un-run.
pub async fn run(
    graph: &Graph,
    runtimes: &mut HashMap<NodeId, NodeRuntime>,
    host: &Arc<dyn HostCallbacks>,
) -> Result<LinearOutcome, RuntimeError> {
    let order = graph.execution_order()?;
    let mut node_outputs: HashMap<NodeId, PortValues> = HashMap::new();

    for node_id in &order {
        let inputs = gather_inputs(graph, node_id, &node_outputs);
        let Some(runtime) = runtimes.get_mut(node_id) else {
            continue;
        };
        call_status(host.as_ref(), node_id, NodeStatus::Running, None).await;
        match runtime.execute(inputs).await {
            Ok(outputs) => {
                info!(node_id = %node_id, "node completed");
                call_status(
                    host.as_ref(),
                    node_id,
                    NodeStatus::Completed,
                    Some(serde_json::json!({ "outputs": outputs })),
                )
                .await;
                node_outputs.insert(node_id.clone(), outputs);
            }
            Err(e) => {
                error!(node_id = %node_id, error = %e, "node execute failed, aborting linear run");
                call_status(
                    host.as_ref(),
                    node_id,
                    NodeStatus::Error,
                    Some(serde_json::json!({ "error": e.to_string() })),
                )
                .await;
                return Ok(LinearOutcome::Aborted);
            }
        }
    }
    Ok(LinearOutcome::Completed)
}

#[cfg(test)]
#[path = "linear_runner_tests.rs"]
mod tests;
