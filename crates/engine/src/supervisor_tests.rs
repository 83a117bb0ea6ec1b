// SPDX-License-Identifier: MIT

use super::*;
use crate::error::NodeError;
use crate::node::{NodeContext, PortValues};
use crate::plugin::PluginLoader;
use async_trait::async_trait;
use avatarflow_core::test_support::{connection, linear_pipeline, node_spec};
use avatarflow_core::FakeClock;
use std::time::Duration;

struct Echo;

#[async_trait]
impl NodeInterface for Echo {
    async fn execute(&mut self, inputs: PortValues, _ctx: &NodeContext) -> Result<PortValues, NodeError> {
        Ok(inputs)
    }
}

fn supervisor_with(loader: PluginLoader) -> WorkflowSupervisor {
    WorkflowSupervisor::without_host_callbacks(loader, EngineConfig::default()).with_clock(Arc::new(FakeClock::new()))
}

/// S1 — a linear run with no source nodes completes and is fully cleaned
/// up (I5): after `start` returns, the workflow is no longer in `running`.
#[tokio::test]
async fn s1_linear_run_completes_and_cleans_up() {
    let loader = PluginLoader::new();
    loader.register("start", Arc::new(|| Box::new(Echo) as Box<dyn NodeInterface>));
    loader.register("regular", Arc::new(|| Box::new(Echo) as Box<dyn NodeInterface>));
    let sup = supervisor_with(loader);

    let id = WorkflowId::new("wf1");
    let graph = linear_pipeline(&[("start", "start"), ("echo", "regular")]);
    sup.start(id.clone(), graph, None, WorkflowConfig::default()).await.unwrap();

    assert!(!sup.is_running(&id));
    let status = sup.get_status(&id).unwrap();
    assert_eq!(status.status, WorkflowStatus::Completed);
}

/// A node that always fails aborts the linear run and is recorded `Error`.
#[tokio::test]
async fn linear_run_node_failure_is_recorded_as_error() {
    struct AlwaysFails;
    #[async_trait]
    impl NodeInterface for AlwaysFails {
        async fn execute(&mut self, _inputs: PortValues, _ctx: &NodeContext) -> Result<PortValues, NodeError> {
            Err(NodeError::Execute("x".into(), "boom".into()))
        }
    }

    let loader = PluginLoader::new();
    loader.register("start", Arc::new(|| Box::new(AlwaysFails) as Box<dyn NodeInterface>));
    let sup = supervisor_with(loader);

    let id = WorkflowId::new("wf-err");
    let graph = linear_pipeline(&[("start", "start")]);
    sup.start(id.clone(), graph, None, WorkflowConfig::default()).await.unwrap();

    let status = sup.get_status(&id).unwrap();
    assert_eq!(status.status, WorkflowStatus::Error);
}

struct TimerSource;

#[async_trait]
impl NodeInterface for TimerSource {
    async fn setup(&mut self, _config: &serde_json::Value, ctx: &NodeContext) -> Result<(), NodeError> {
        let ctx = ctx.clone();
        ctx.spawn_background(async move {
            let token = ctx.cancellation_token();
            let mut i = 0;
            loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(Duration::from_millis(5)) => {}
                }
                ctx.emit("timer.tick", serde_json::json!({ "n": i })).await;
                i += 1;
            }
        });
        Ok(())
    }

    async fn execute(&mut self, _inputs: PortValues, _ctx: &NodeContext) -> Result<PortValues, NodeError> {
        Ok(PortValues::new())
    }
}

struct Recorder(Arc<parking_lot::Mutex<Vec<serde_json::Value>>>);

#[async_trait]
impl NodeInterface for Recorder {
    async fn execute(&mut self, inputs: PortValues, _ctx: &NodeContext) -> Result<PortValues, NodeError> {
        self.0.lock().push(inputs.get("in").cloned().unwrap_or(serde_json::Value::Null));
        Ok(PortValues::new())
    }
}

/// S3 — event-driven fan-out: a timer-like source drives a downstream
/// node once per tick, sequentially.
#[tokio::test]
async fn s3_event_driven_fan_out_runs_downstream_once_per_tick() {
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let loader = PluginLoader::new();
    loader.register("timer", Arc::new(|| Box::new(TimerSource) as Box<dyn NodeInterface>));
    let seen_for_factory = seen.clone();
    loader.register("regular", Arc::new(move || Box::new(Recorder(seen_for_factory.clone())) as Box<dyn NodeInterface>));
    let sup = supervisor_with(loader);

    let id = WorkflowId::new("wf-timer");
    let graph = Graph {
        nodes: vec![node_spec("src", "timer"), node_spec("echo", "regular")],
        connections: vec![connection("src", "out", "echo", "in")],
        character: Default::default(),
    };

    sup.start(id.clone(), graph, None, WorkflowConfig::default()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;
    sup.stop(&id).await;

    assert!(seen.lock().len() >= 2, "expected at least two ticks processed, got {:?}", seen.lock());
    assert!(!sup.is_running(&id));
}

/// S6 — stop during a long-running node's execute returns promptly because
/// the node cooperatively selects on the context's cancellation token.
#[tokio::test]
async fn s6_stop_during_long_running_node_returns_promptly() {
    struct SlowNode;
    #[async_trait]
    impl NodeInterface for SlowNode {
        async fn execute(&mut self, inputs: PortValues, ctx: &NodeContext) -> Result<PortValues, NodeError> {
            let token = ctx.cancellation_token();
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(Duration::from_secs(10)) => {}
            }
            Ok(inputs)
        }
    }

    let loader = PluginLoader::new();
    loader.register("timer", Arc::new(|| Box::new(TimerSource) as Box<dyn NodeInterface>));
    loader.register("regular", Arc::new(|| Box::new(SlowNode) as Box<dyn NodeInterface>));
    let sup = supervisor_with(loader);

    let id = WorkflowId::new("wf-slow");
    let graph = Graph {
        nodes: vec![node_spec("src", "timer"), node_spec("slow", "regular")],
        connections: vec![connection("src", "out", "slow", "in")],
        character: Default::default(),
    };
    sup.start(id.clone(), graph, None, WorkflowConfig::default()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let result = tokio::time::timeout(Duration::from_secs(2), sup.stop(&id)).await;
    assert!(result.is_ok(), "stop() did not return promptly");
    assert!(!sup.is_running(&id));
}
