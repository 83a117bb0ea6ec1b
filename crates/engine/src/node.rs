// SPDX-License-Identifier: MIT

//! The node contract (C13), the per-invocation capability object (C5), and
//! the host's observability hooks (C12).

use crate::background::BackgroundRegistry;
use crate::bus::EventBus;
use crate::error::NodeError;
use async_trait::async_trait;
use avatarflow_core::{Character, Event, NodeId, WorkflowId};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// String-keyed port mapping, opaque to the engine (§3, §4.3).
pub type PortValues = HashMap<String, Value>;

/// Log level passed to [`HostCallbacks::log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// Status codes emitted on the status callback (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Listening,
    Running,
    Completed,
    Error,
}

#[derive(Debug, Error)]
#[error("host callback failed: {0}")]
pub struct CallbackError(pub String);

/// Three optional, deferred hooks into the outside world (§4.9). Default
/// methods no-op so a host need only implement the slots it cares about;
/// the engine treats any failure from an override as non-fatal (§7
/// CallbackError — logged, swallowed, never propagated).
#[async_trait]
pub trait HostCallbacks: Send + Sync {
    async fn log(&self, _node_id: Option<&NodeId>, _message: &str, _level: LogLevel) -> Result<(), CallbackError> {
        Ok(())
    }

    async fn status(&self, _node_id: &NodeId, _status: NodeStatus, _data: Option<Value>) -> Result<(), CallbackError> {
        Ok(())
    }

    async fn event(&self, _event: &Event) -> Result<(), CallbackError> {
        Ok(())
    }
}

/// Default, silent implementation used when a host registers none of the
/// three slots.
pub struct NoopHostCallbacks;

#[async_trait]
impl HostCallbacks for NoopHostCallbacks {
    async fn log(&self, _node_id: Option<&NodeId>, _message: &str, _level: LogLevel) -> Result<(), CallbackError> {
        Ok(())
    }

    async fn status(&self, _node_id: &NodeId, _status: NodeStatus, _data: Option<Value>) -> Result<(), CallbackError> {
        Ok(())
    }

    async fn event(&self, _event: &Event) -> Result<(), CallbackError> {
        Ok(())
    }
}

/// Invokes a host callback and swallows any failure (§7 CallbackError):
/// logged at warning, never propagated.
pub async fn call_log(host: &dyn HostCallbacks, node_id: Option<&NodeId>, message: &str, level: LogLevel) {
    if let Err(e) = host.log(node_id, message, level).await {
        warn!(error = %e, "host log callback failed");
    }
}

pub async fn call_status(host: &dyn HostCallbacks, node_id: &NodeId, status: NodeStatus, data: Option<Value>) {
    if let Err(e) = host.status(node_id, status, data).await {
        warn!(error = %e, "host status callback failed");
    }
}

pub async fn call_event(host: &dyn HostCallbacks, event: &Event) {
    if let Err(e) = host.event(event).await {
        warn!(error = %e, "host event callback failed");
    }
}

/// Per-invocation capability object handed to node code (§4.3).
#[derive(Clone)]
pub struct NodeContext {
    workflow_id: WorkflowId,
    node_id: NodeId,
    bus: Arc<EventBus>,
    character: Arc<Mutex<Character>>,
    host: Arc<dyn HostCallbacks>,
    background: BackgroundRegistry,
    clock: Arc<dyn avatarflow_core::Clock>,
}

impl NodeContext {
    pub fn new(
        workflow_id: WorkflowId,
        node_id: NodeId,
        bus: Arc<EventBus>,
        character: Arc<Mutex<Character>>,
        host: Arc<dyn HostCallbacks>,
        background: BackgroundRegistry,
        clock: Arc<dyn avatarflow_core::Clock>,
    ) -> Self {
        Self { workflow_id, node_id, bus, character, host, background, clock }
    }

    pub fn workflow_id(&self) -> &WorkflowId {
        &self.workflow_id
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Stamps `source_node_id = this node`, then emits on the bus (§4.3).
    pub async fn emit(&self, event_type: impl Into<String>, payload: Value) -> usize {
        let event = Event::new(event_type, payload, self.clock.epoch_ms()).with_source(self.node_id.clone());
        self.bus.emit(event).await
    }

    pub async fn log(&self, message: impl AsRef<str>, level: LogLevel) {
        call_log(self.host.as_ref(), Some(&self.node_id), message.as_ref(), level).await;
    }

    /// Merges `delta` into the shared character mapping, last-writer-wins,
    /// no cross-node locking beyond the map's own mutex (§4.3, §5, P8).
    pub fn update_character(&self, delta: Character) {
        let mut character = self.character.lock();
        for (k, v) in delta {
            character.insert(k, v);
        }
    }

    pub fn character_name(&self) -> Option<String> {
        self.character.lock().get("name").and_then(|v| v.as_str()).map(str::to_string)
    }

    pub fn character_personality(&self) -> Option<String> {
        self.character.lock().get("personality").and_then(|v| v.as_str()).map(str::to_string)
    }

    /// Registers `fut` as a long-lived cooperative task with the workflow's
    /// background-task registry. The engine guarantees cancellation when
    /// the workflow stops (§4.3, I4).
    pub fn spawn_background<F>(&self, fut: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.background.spawn(fut);
    }

    /// The token a long-running node should `select!` against so it notices
    /// cancellation promptly, rather than polling workflow state itself.
    pub fn cancellation_token(&self) -> tokio_util::sync::CancellationToken {
        self.background.child_token()
    }
}

/// The contract every plugin implements (C13, §4.3, §6). Any operation may
/// be a no-op; `execute` is the only one a useful node must implement.
#[async_trait]
pub trait NodeInterface: Send + Sync {
    /// Called once, before any `execute` (§4.3).
    async fn setup(&mut self, _config: &Value, _ctx: &NodeContext) -> Result<(), NodeError> {
        Ok(())
    }

    /// Called per invocation; `inputs` maps input port name to the value
    /// produced upstream (§4.3).
    async fn execute(&mut self, inputs: PortValues, ctx: &NodeContext) -> Result<PortValues, NodeError>;

    /// Optional direct reaction to a bus event (§4.3). No runner in this
    /// crate calls it (§9 Open Question); the hook exists for a future
    /// runner to wire in without a contract change.
    async fn on_event(&mut self, _event: &Event, _ctx: &NodeContext) -> Result<Option<PortValues>, NodeError> {
        Ok(None)
    }

    /// Called once, when the workflow ends (§4.3).
    async fn teardown(&mut self) -> Result<(), NodeError> {
        Ok(())
    }
}
