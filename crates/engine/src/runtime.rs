// SPDX-License-Identifier: MIT

//! Per-workflow, per-node cached instance (C6, I2).

use crate::error::NodeError;
use crate::node::{NodeContext, NodeInterface, PortValues};
use async_trait::async_trait;
use avatarflow_core::NodeId;
use serde_json::Value;
use std::collections::HashMap;

/// Fallback behaviour when a node type cannot be resolved (§4.4): a no-op
/// producing `{}`.
pub struct NoopNode;

#[async_trait]
impl NodeInterface for NoopNode {
    async fn execute(&mut self, _inputs: PortValues, _ctx: &NodeContext) -> Result<PortValues, NodeError> {
        Ok(HashMap::new())
    }
}

/// Owned exclusively by the [`crate::supervisor::WorkflowSupervisor`];
/// destroyed when the workflow terminates (§3). At most one exists per
/// `(workflow_id, node_id)` at any time (I2), enforced by the supervisor's
/// runtime table being keyed on `NodeId` within one workflow's map.
pub struct NodeRuntime {
    pub node_id: NodeId,
    pub node_type: String,
    pub config: Value,
    pub instance: Box<dyn NodeInterface>,
    pub context: NodeContext,
}

impl NodeRuntime {
    pub fn new(node_id: NodeId, node_type: String, config: Value, instance: Box<dyn NodeInterface>, context: NodeContext) -> Self {
        Self { node_id, node_type, config, instance, context }
    }

    pub async fn setup(&mut self) -> Result<(), NodeError> {
        let config = self.config.clone();
        self.instance.setup(&config, &self.context).await
    }

    pub async fn execute(&mut self, inputs: PortValues) -> Result<PortValues, NodeError> {
        self.instance.execute(inputs, &self.context).await
    }

    pub async fn teardown(&mut self) -> Result<(), NodeError> {
        self.instance.teardown().await
    }
}
