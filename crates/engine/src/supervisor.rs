// SPDX-License-Identifier: MIT

//! Workflow lifecycle: start/stop/status, callback wiring, resource cleanup
//! (C11, §4.8). Owns every per-workflow map the rest of the crate populates
//! and is the single place I4/I5 are enforced end to end.

use crate::background::BackgroundRegistry;
use crate::bus::{EventBus, Subscriber, SubscriberError};
use crate::error::RuntimeError;
use crate::event_driven_runner::{install_dispatcher, run_drainer};
use crate::linear_runner::{self, LinearOutcome};
use crate::node::{call_status, HostCallbacks, NodeContext, NodeInterface, NodeStatus, NoopHostCallbacks};
use crate::plugin::PluginLoader;
use crate::queue::BoundedEventQueue;
use crate::runtime::{NoopNode, NodeRuntime};
use async_trait::async_trait;
use avatarflow_core::{Character, Clock, Event, EngineConfig, Graph, NodeId, SystemClock, WorkflowConfig, WorkflowId};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

/// Upper bound on how many finished workflows' statuses `last_status`
/// retains (§9 bounded-history pattern, mirroring `EventBus`'s history
/// cap). Oldest entries are evicted first once this is exceeded, so a
/// long-lived host that starts/stops many workflow ids doesn't leak the
/// map's memory unboundedly.
const MAX_RETAINED_STATUSES: usize = 256;

/// `{status, started_at, graph, last_error?}` (§3 WorkflowState).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowStatus {
    Running,
    Completed,
    Stopped,
    Error,
}

#[derive(Debug, Clone)]
pub struct WorkflowStatusReport {
    pub status: WorkflowStatus,
    pub started_at: u64,
    pub last_error: Option<String>,
    pub queue_size: Option<usize>,
    pub queue_processing: Option<bool>,
    pub queue_dropped: Option<usize>,
}

struct WorkflowEntry {
    graph: Arc<Graph>,
    bus: Arc<EventBus>,
    queue: Option<Arc<BoundedEventQueue>>,
    runtimes: Arc<tokio::sync::Mutex<HashMap<NodeId, NodeRuntime>>>,
    background: BackgroundRegistry,
    started_at: u64,
}

/// Forwards bus events matching a host-visible prefix to `HostCallbacks`
/// (§4.8 step 2, §6).
struct HostEventForwarder(Arc<dyn HostCallbacks>);

#[async_trait]
impl Subscriber for HostEventForwarder {
    async fn on_event(&self, event: &Event) -> Result<(), SubscriberError> {
        crate::node::call_event(self.0.as_ref(), event).await;
        Ok(())
    }
}

/// Owns every per-workflow resource (C11). `running` is exactly the set I5
/// requires pruned on every `stop` exit path; `last_status` is a bounded
/// status history kept *outside* that invariant purely so `get_status` can
/// answer for a workflow that already finished — capped at
/// `MAX_RETAINED_STATUSES`, oldest first out, so it cannot grow without
/// bound across a long-lived host's lifetime.
pub struct WorkflowSupervisor {
    loader: PluginLoader,
    engine_config: EngineConfig,
    clock: Arc<dyn Clock>,
    host: Arc<dyn HostCallbacks>,
    running: Mutex<HashMap<WorkflowId, WorkflowEntry>>,
    last_status: Mutex<IndexMap<WorkflowId, WorkflowStatusReport>>,
}

impl WorkflowSupervisor {
    pub fn new(loader: PluginLoader, engine_config: EngineConfig, host: Arc<dyn HostCallbacks>) -> Self {
        Self {
            loader,
            engine_config,
            clock: Arc::new(SystemClock),
            host,
            running: Mutex::new(HashMap::new()),
            last_status: Mutex::new(IndexMap::new()),
        }
    }

    /// Inserts `report` under `id`, evicting the oldest entry first while
    /// the map is over `MAX_RETAINED_STATUSES` (same bounded-retention
    /// shape as `EventBus::emit`'s history trim).
    fn record_status(&self, id: WorkflowId, report: WorkflowStatusReport) {
        let mut last_status = self.last_status.lock();
        last_status.shift_remove(&id);
        last_status.insert(id, report);
        while last_status.len() > MAX_RETAINED_STATUSES {
            last_status.shift_remove_index(0);
        }
    }

    /// Test/host hook: swap in a clock other than the real system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn without_host_callbacks(loader: PluginLoader, engine_config: EngineConfig) -> Self {
        Self::new(loader, engine_config, Arc::new(NoopHostCallbacks))
    }

    /// `start(id, graph, start_node_id?)` (§4.8). Idempotent restart: if
    /// `id` is already running, it is stopped first.
    pub async fn start(
        &self,
        id: WorkflowId,
        graph: Graph,
        start_node_id: Option<NodeId>,
        workflow_config: WorkflowConfig,
    ) -> Result<(), RuntimeError> {
        if self.running.lock().contains_key(&id) {
            self.stop(&id).await;
        }

        graph.validate()?;
        let graph = match &start_node_id {
            Some(start) => graph.subgraph_from([start.clone()]),
            None => graph,
        };
        let graph = Arc::new(graph);

        let bus = Arc::new(EventBus::new(&workflow_config));
        bus.start().map_err(|_| RuntimeError::NotRunning(id.as_str().to_string()))?;
        for pattern in &self.engine_config.host_forwarded_patterns {
            bus.subscribe(pattern.clone(), Arc::new(HostEventForwarder(self.host.clone())), vec![], None);
        }

        let character = Arc::new(Mutex::new(graph.character.clone()));
        let background = BackgroundRegistry::new();

        let sources: HashSet<NodeId> = graph
            .nodes
            .iter()
            .filter(|n| self.engine_config.source_node_types.contains(&n.node_type))
            .map(|n| n.id.clone())
            .collect();

        let mut runtimes = HashMap::new();
        for node in &graph.nodes {
            let instance = self.loader.resolve(&node.node_type).unwrap_or_else(|| Box::new(NoopNode));
            let ctx = NodeContext::new(
                id.clone(),
                node.id.clone(),
                bus.clone(),
                character.clone(),
                self.host.clone(),
                background.clone(),
                self.clock.clone(),
            );
            let mut runtime = NodeRuntime::new(node.id.clone(), node.node_type.clone(), node.config.clone(), instance, ctx);
            if let Err(e) = runtime.setup().await {
                warn!(node_id = %node.id, error = %e, "node setup failed, run continues");
                call_status(self.host.as_ref(), &node.id, NodeStatus::Error, Some(serde_json::json!({ "error": e.to_string() }))).await;
            }
            runtimes.insert(node.id.clone(), runtime);
        }

        let started_at = self.clock.epoch_ms();

        if sources.is_empty() {
            let runtimes = Arc::new(tokio::sync::Mutex::new(runtimes));
            self.running.lock().insert(
                id.clone(),
                WorkflowEntry { graph: graph.clone(), bus: bus.clone(), queue: None, runtimes: runtimes.clone(), background: background.clone(), started_at },
            );
            let result = {
                let mut guard = runtimes.lock().await;
                linear_runner::run(&graph, &mut guard, &self.host).await
            };
            let status = match result {
                Ok(LinearOutcome::Completed) => WorkflowStatus::Completed,
                Ok(LinearOutcome::Aborted) => WorkflowStatus::Error,
                Err(e) => {
                    self.cleanup(&id, WorkflowStatus::Error, started_at).await;
                    return Err(e);
                }
            };
            info!(workflow_id = %id, ?status, "linear run finished");
            self.cleanup(&id, status, started_at).await;
            return Ok(());
        }

        for source_id in &sources {
            call_status(self.host.as_ref(), source_id, NodeStatus::Listening, None).await;
        }

        let queue = Arc::new(BoundedEventQueue::new(workflow_config.queue_capacity));
        install_dispatcher(&bus, queue.clone());

        let runtimes = Arc::new(tokio::sync::Mutex::new(runtimes));
        let token = background.child_token();
        background.spawn(run_drainer(graph.clone(), runtimes.clone(), Arc::new(sources), queue.clone(), self.host.clone(), token));

        self.running.lock().insert(
            id.clone(),
            WorkflowEntry { graph, bus, queue: Some(queue), runtimes, background, started_at },
        );
        info!(workflow_id = %id, "event-driven workflow started");
        Ok(())
    }

    /// `stop(id)` (§4.8). Safe to call at any time, including for an id
    /// that is not running (no-op past recording `Stopped` if it was never
    /// seen before).
    pub async fn stop(&self, id: &WorkflowId) {
        let entry = self.running.lock().remove(id);
        let Some(entry) = entry else {
            return;
        };

        entry.background.shutdown().await;

        let mut runtimes = entry.runtimes.lock().await;
        for (node_id, runtime) in runtimes.iter_mut() {
            if let Err(e) = runtime.teardown().await {
                warn!(node_id = %node_id, error = %e, "node teardown failed");
            }
        }
        drop(runtimes);

        entry.bus.stop();
        drop(entry.queue);

        self.record_status(
            id.clone(),
            WorkflowStatusReport { status: WorkflowStatus::Stopped, started_at: entry.started_at, last_error: None, queue_size: None, queue_processing: None, queue_dropped: None },
        );
        info!(workflow_id = %id, "workflow stopped");
    }

    /// Shared cleanup for a run that ended on its own (linear completion or
    /// abort) rather than via an explicit `stop` call — same teardown path,
    /// same I4/I5 guarantee, recorded status reflects the actual outcome
    /// instead of always `Stopped`.
    async fn cleanup(&self, id: &WorkflowId, status: WorkflowStatus, started_at: u64) {
        let entry = self.running.lock().remove(id);
        if let Some(entry) = entry {
            entry.background.shutdown().await;
            let mut runtimes = entry.runtimes.lock().await;
            for (node_id, runtime) in runtimes.iter_mut() {
                if let Err(e) = runtime.teardown().await {
                    warn!(node_id = %node_id, error = %e, "node teardown failed");
                }
            }
            drop(runtimes);
            entry.bus.stop();
        }
        self.record_status(
            id.clone(),
            WorkflowStatusReport { status, started_at, last_error: None, queue_size: None, queue_processing: None, queue_dropped: None },
        );
    }

    pub fn get_status(&self, id: &WorkflowId) -> Option<WorkflowStatusReport> {
        if let Some(entry) = self.running.lock().get(id) {
            return Some(WorkflowStatusReport {
                status: WorkflowStatus::Running,
                started_at: entry.started_at,
                last_error: None,
                queue_size: entry.queue.as_ref().map(|q| q.size()),
                queue_processing: entry.queue.as_ref().map(|q| q.is_processing()),
                queue_dropped: entry.queue.as_ref().map(|q| q.dropped_count()),
            });
        }
        self.last_status.lock().get(id).cloned()
    }

    pub fn is_running(&self, id: &WorkflowId) -> bool {
        self.running.lock().contains_key(id)
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
