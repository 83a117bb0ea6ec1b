// SPDX-License-Identifier: MIT

//! `console-output` — logs `prefix + " " + inputs["text"]` through
//! `NodeContext::log` at `info` (§2.1).

use async_trait::async_trait;
use avatarflow_engine::{LogLevel, NodeContext, NodeError, NodeInterface, PortValues};
use serde_json::Value;

#[derive(Debug, Default)]
pub struct ConsoleOutputNode {
    prefix: String,
}

#[async_trait]
impl NodeInterface for ConsoleOutputNode {
    async fn setup(&mut self, config: &Value, _ctx: &NodeContext) -> Result<(), NodeError> {
        self.prefix = config.get("prefix").and_then(Value::as_str).unwrap_or_default().to_string();
        Ok(())
    }

    async fn execute(&mut self, inputs: PortValues, ctx: &NodeContext) -> Result<PortValues, NodeError> {
        let text = inputs.get("text").and_then(Value::as_str).unwrap_or_default();
        ctx.log(format!("{} {}", self.prefix, text), LogLevel::Info).await;
        Ok(PortValues::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avatarflow_engine::test_support::TestWorkflow;

    #[tokio::test]
    async fn execute_logs_prefixed_text_and_returns_nothing() {
        let tw = TestWorkflow::new();
        let ctx = tw.context("c");
        let mut node = ConsoleOutputNode::default();
        node.setup(&serde_json::json!({"prefix": "[out]"}), &ctx).await.unwrap();
        let mut inputs = PortValues::new();
        inputs.insert("text".to_string(), Value::String("hello".to_string()));
        let out = node.execute(inputs, &ctx).await.unwrap();
        assert!(out.is_empty());
    }
}
