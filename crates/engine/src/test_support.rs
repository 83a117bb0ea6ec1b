// SPDX-License-Identifier: MIT

//! Shared test helpers for the runner/supervisor suites.

use crate::background::BackgroundRegistry;
use crate::bus::EventBus;
use crate::node::{HostCallbacks, NoopHostCallbacks, NodeContext, NodeInterface};
use crate::runtime::NodeRuntime;
use avatarflow_core::{Character, Clock, FakeClock, NodeId, WorkflowConfig, WorkflowId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A bundle of the shared, per-workflow state a `NodeContext` needs, built
/// fresh for one test.
pub struct TestWorkflow {
    pub workflow_id: WorkflowId,
    pub bus: Arc<EventBus>,
    pub character: Arc<Mutex<Character>>,
    pub host: Arc<dyn HostCallbacks>,
    pub background: BackgroundRegistry,
    pub clock: Arc<dyn Clock>,
}

impl TestWorkflow {
    pub fn new() -> Self {
        let bus = Arc::new(EventBus::new(&WorkflowConfig::default()));
        bus.start().expect("fresh bus starts");
        Self {
            workflow_id: WorkflowId::new("test-workflow"),
            bus,
            character: Arc::new(Mutex::new(Character::new())),
            host: Arc::new(NoopHostCallbacks),
            background: BackgroundRegistry::new(),
            clock: Arc::new(FakeClock::new()),
        }
    }

    pub fn context(&self, node_id: &str) -> NodeContext {
        NodeContext::new(
            self.workflow_id.clone(),
            NodeId::new(node_id),
            self.bus.clone(),
            self.character.clone(),
            self.host.clone(),
            self.background.clone(),
            self.clock.clone(),
        )
    }

    pub fn runtime(&self, node_id: &str, node_type: &str, instance: Box<dyn NodeInterface>) -> NodeRuntime {
        NodeRuntime::new(NodeId::new(node_id), node_type.to_string(), serde_json::json!({}), instance, self.context(node_id))
    }
}

impl Default for TestWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

pub fn runtimes_map(entries: Vec<NodeRuntime>) -> HashMap<NodeId, NodeRuntime> {
    entries.into_iter().map(|r| (r.node_id.clone(), r)).collect()
}
