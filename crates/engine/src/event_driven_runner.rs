// SPDX-License-Identifier: MIT

//! Source-node supervision, queue draining, and downstream dispatch (C10,
//! §4.7). A *source node* runs indefinitely via `setup` + background tasks
//! and publishes events; everything downstream of it runs one event at a
//! time, strictly sequentially, off the bounded queue.

use crate::bus::{EventBus, Subscriber, SubscriberError};
use crate::dataflow::{gather_inputs, has_inbound_connections};
use crate::node::{call_status, HostCallbacks, NodeInterface, NodeStatus, PortValues};
use crate::queue::{BoundedEventQueue, QueueItem};
use crate::runtime::NodeRuntime;
use async_trait::async_trait;
use avatarflow_core::{Event, Graph, NodeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Event-type patterns the engine treats as source triggers (§4.7 step 3).
/// A source node's own output events are expected to fall under one of
/// these; anything else emitted during a run is fanned out to
/// `HostCallbacks` by the supervisor's own bus subscriptions, not by this
/// dispatcher.
const SOURCE_TRIGGER_PATTERNS: &[&str] = &["message.*", "timer.*", "donation"];

/// Internal bus subscriber that wraps every matching event into a
/// [`QueueItem`] and enqueues it (§4.7 step 3).
struct QueueDispatcher {
    queue: Arc<BoundedEventQueue>,
}

#[async_trait]
impl Subscriber for QueueDispatcher {
    async fn on_event(&self, event: &Event) -> Result<(), SubscriberError> {
        let source_node_id = event.source_node_id.clone().unwrap_or_else(|| NodeId::new("unknown-source"));
        if !self.queue.put(QueueItem { event: event.clone(), source_node_id }) {
            warn!(event_type = %event.event_type, "event queue full, event dropped");
        }
        Ok(())
    }
}

/// Drives the queue-drainer loop to completion (runs until cancelled or the
/// queue channel closes). Spawned as a background task by
/// `WorkflowSupervisor::start` so `stop` cancels it the same way it cancels
/// every other background task (I4).
pub async fn run_drainer(
    graph: Arc<Graph>,
    runtimes: Arc<Mutex<HashMap<NodeId, NodeRuntime>>>,
    sources: Arc<HashSet<NodeId>>,
    queue: Arc<BoundedEventQueue>,
    host: Arc<dyn HostCallbacks>,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("queue drainer cancelled");
                return;
            }
            _ = ticker.tick() => continue,
            item = queue.get() => {
                match item {
                    Some(item) => process_one(&graph, &runtimes, &sources, &queue, &host, item).await,
                    None => {
                        debug!("event queue closed, drainer exiting");
                        return;
                    }
                }
            }
        }
    }
}

/// Subscribes the internal dispatcher to every source-trigger pattern
/// (§4.7 step 3). Returns nothing the caller needs to track: subscriptions
/// live as long as `bus`, which is dropped wholesale on `stop`.
pub fn install_dispatcher(bus: &EventBus, queue: Arc<BoundedEventQueue>) {
    let dispatcher: Arc<dyn Subscriber> = Arc::new(QueueDispatcher { queue });
    for pattern in SOURCE_TRIGGER_PATTERNS {
        bus.subscribe(*pattern, dispatcher.clone(), vec![], None);
    }
}

async fn process_one(
    graph: &Graph,
    runtimes: &Mutex<HashMap<NodeId, NodeRuntime>>,
    sources: &HashSet<NodeId>,
    queue: &BoundedEventQueue,
    host: &Arc<dyn HostCallbacks>,
    item: QueueItem,
) {
    queue.set_processing(true);

    let downstream = match graph.downstream_order_from(&item.source_node_id) {
        Ok(order) => order,
        Err(e) => {
            error!(source = %item.source_node_id, error = %e, "could not compute downstream order, dropping event");
            queue.set_processing(false);
            return;
        }
    };

    let mut node_outputs: HashMap<NodeId, PortValues> = HashMap::new();
    let seed: PortValues = item.event.payload.as_object().cloned().unwrap_or_default().into_iter().collect();
    node_outputs.insert(item.source_node_id.clone(), seed);

    let mut runtimes = runtimes.lock().await;
    for node_id in &downstream {
        if sources.contains(node_id) {
            continue;
        }
        let Some(spec) = graph.node(node_id.as_str()) else {
            continue;
        };
        if !spec.event_filters.is_empty() && !spec.event_filters.iter().any(|f| f.matches(&item.event)) {
            continue;
        }

        let inputs = gather_inputs(graph, node_id, &node_outputs);
        if has_inbound_connections(graph, node_id) && inputs.is_empty() {
            continue;
        }

        let Some(runtime) = runtimes.get_mut(node_id) else {
            continue;
        };
        call_status(host.as_ref(), node_id, NodeStatus::Running, None).await;
        match runtime.execute(inputs).await {
            Ok(outputs) => {
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
                warn!(node_id = %node_id, error = %e, "node execute failed, continuing with remaining downstream nodes");
                call_status(
                    host.as_ref(),
                    node_id,
                    NodeStatus::Error,
                    Some(serde_json::json!({ "error": e.to_string() })),
                )
                .await;
            }
        }
    }
    drop(runtimes);
    queue.set_processing(false);
}

#[cfg(test)]
#[path = "event_driven_runner_tests.rs"]
mod tests;
