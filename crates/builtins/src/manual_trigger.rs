// SPDX-License-Identifier: MIT

//! `manual-trigger` — a source that never emits on its own; tests inject
//! events into its queue entry directly (§2.1). Grounds the queue-overflow
//! scenario S5 without needing real wall-clock timing.

use async_trait::async_trait;
use avatarflow_engine::{NodeContext, NodeError, NodeInterface, PortValues};

#[derive(Debug, Default)]
pub struct ManualTriggerNode;

#[async_trait]
impl NodeInterface for ManualTriggerNode {
    async fn execute(&mut self, _inputs: PortValues, _ctx: &NodeContext) -> Result<PortValues, NodeError> {
        Ok(PortValues::new())
    }
}
