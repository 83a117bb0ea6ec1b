// SPDX-License-Identifier: MIT

//! `start` — a no-op pass-through source of the entry signal (§2.1).

use async_trait::async_trait;
use avatarflow_engine::{NodeContext, NodeError, NodeInterface, PortValues};
use serde_json::Value;

#[derive(Debug, Default)]
pub struct StartNode {
    config: Value,
}

#[async_trait]
impl NodeInterface for StartNode {
    async fn setup(&mut self, config: &Value, _ctx: &NodeContext) -> Result<(), NodeError> {
        self.config = config.clone();
        Ok(())
    }

    async fn execute(&mut self, _inputs: PortValues, _ctx: &NodeContext) -> Result<PortValues, NodeError> {
        Ok(self.config.as_object().cloned().unwrap_or_default().into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avatarflow_engine::test_support::TestWorkflow;

    #[tokio::test]
    async fn execute_returns_config_verbatim() {
        let tw = TestWorkflow::new();
        let ctx = tw.context("s");
        let mut node = StartNode::default();
        node.setup(&serde_json::json!({"seed": "hello"}), &ctx).await.unwrap();
        let out = node.execute(PortValues::new(), &ctx).await.unwrap();
        assert_eq!(out.get("seed").unwrap(), "hello");
    }
}
