// SPDX-License-Identifier: MIT

//! `manual-input` — returns its configured text verbatim (§2.1), the
//! harness-friendly stand-in for a UI text box.

use async_trait::async_trait;
use avatarflow_engine::{NodeContext, NodeError, NodeInterface, PortValues};
use serde_json::Value;

#[derive(Debug, Default)]
pub struct ManualInputNode {
    text: String,
}

#[async_trait]
impl NodeInterface for ManualInputNode {
    async fn setup(&mut self, config: &Value, _ctx: &NodeContext) -> Result<(), NodeError> {
        self.text = config
            .get("text")
            .or_else(|| config.get("inputText"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(())
    }

    async fn execute(&mut self, _inputs: PortValues, _ctx: &NodeContext) -> Result<PortValues, NodeError> {
        let mut out = PortValues::new();
        out.insert("text".to_string(), Value::String(self.text.clone()));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avatarflow_engine::test_support::TestWorkflow;

    #[tokio::test]
    async fn execute_returns_configured_text() {
        let tw = TestWorkflow::new();
        let ctx = tw.context("m");
        let mut node = ManualInputNode::default();
        node.setup(&serde_json::json!({"text": "hello"}), &ctx).await.unwrap();
        let out = node.execute(PortValues::new(), &ctx).await.unwrap();
        assert_eq!(out.get("text").unwrap(), "hello");
    }

    #[tokio::test]
    async fn falls_back_to_input_text_field() {
        let tw = TestWorkflow::new();
        let ctx = tw.context("m");
        let mut node = ManualInputNode::default();
        node.setup(&serde_json::json!({"inputText": "hi"}), &ctx).await.unwrap();
        let out = node.execute(PortValues::new(), &ctx).await.unwrap();
        assert_eq!(out.get("text").unwrap(), "hi");
    }
}
