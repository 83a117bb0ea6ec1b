// SPDX-License-Identifier: MIT

//! `end` — terminal no-op sink (§2.1).

use async_trait::async_trait;
use avatarflow_engine::{NodeContext, NodeError, NodeInterface, PortValues};

#[derive(Debug, Default)]
pub struct EndNode;

#[async_trait]
impl NodeInterface for EndNode {
    async fn execute(&mut self, _inputs: PortValues, _ctx: &NodeContext) -> Result<PortValues, NodeError> {
        Ok(PortValues::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avatarflow_engine::test_support::TestWorkflow;

    #[tokio::test]
    async fn execute_returns_empty_outputs() {
        let tw = TestWorkflow::new();
        let ctx = tw.context("e");
        let mut node = EndNode;
        let out = node.execute(PortValues::new(), &ctx).await.unwrap();
        assert!(out.is_empty());
    }
}
