// SPDX-License-Identifier: MIT

//! `timer` — emits `timer.tick` on an interval from `config.intervalMs`
//! (default 1000ms). Source node; grounds scenario S3 and the cancellation
//! scenario S6.

use async_trait::async_trait;
use avatarflow_engine::{NodeContext, NodeError, NodeInterface, PortValues};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Default)]
pub struct TimerNode {
    interval_ms: u64,
}

#[async_trait]
impl NodeInterface for TimerNode {
    async fn setup(&mut self, config: &Value, ctx: &NodeContext) -> Result<(), NodeError> {
        self.interval_ms = config.get("intervalMs").and_then(Value::as_u64).unwrap_or(DEFAULT_INTERVAL_MS);
        let ctx = ctx.clone();
        let interval_ms = self.interval_ms;
        let token = ctx.cancellation_token();
        ctx.spawn_background(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            let mut tick = 0u64;
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    _ = ticker.tick() => {
                        tick += 1;
                        ctx.emit("timer.tick", serde_json::json!({ "tick": tick, "intervalMs": interval_ms })).await;
                    }
                }
            }
        });
        Ok(())
    }

    async fn execute(&mut self, _inputs: PortValues, _ctx: &NodeContext) -> Result<PortValues, NodeError> {
        Ok(PortValues::new())
    }
}
