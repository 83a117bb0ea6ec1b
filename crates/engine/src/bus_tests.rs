// SPDX-License-Identifier: MIT

use super::*;
use avatarflow_core::test_support::test_event;
use parking_lot::Mutex as PMutex;
use std::sync::Arc;

struct Recorder(Arc<PMutex<Vec<String>>>);

#[async_trait]
impl Subscriber for Recorder {
    async fn on_event(&self, event: &Event) -> Result<(), SubscriberError> {
        self.0.lock().push(event.event_type.clone());
        Ok(())
    }
}

struct Failing;

#[async_trait]
impl Subscriber for Failing {
    async fn on_event(&self, _event: &Event) -> Result<(), SubscriberError> {
        Err(SubscriberError("boom".into()))
    }
}

fn bus() -> EventBus {
    let bus = EventBus::new(&WorkflowConfig::default());
    bus.start().unwrap();
    bus
}

#[tokio::test]
async fn emit_dispatches_in_registration_order() {
    let bus = bus();
    let log = Arc::new(PMutex::new(Vec::new()));
    bus.subscribe("a.*", Arc::new(Recorder(log.clone())), vec![], None);
    bus.subscribe("*", Arc::new(Recorder(log.clone())), vec![], None);

    let notified = bus.emit(test_event("a.one", serde_json::json!({}))).await;
    assert_eq!(notified, 2);
    assert_eq!(*log.lock(), vec!["a.one", "a.one"]);
}

#[tokio::test]
async fn failing_subscriber_is_logged_and_skipped_not_counted() {
    let bus = bus();
    let log = Arc::new(PMutex::new(Vec::new()));
    bus.subscribe("*", Arc::new(Failing), vec![], None);
    bus.subscribe("*", Arc::new(Recorder(log.clone())), vec![], None);

    let notified = bus.emit(test_event("x", serde_json::json!({}))).await;
    assert_eq!(notified, 1);
    assert_eq!(*log.lock(), vec!["x"]);
}

#[tokio::test]
async fn emit_after_stop_is_a_no_op() {
    let bus = bus();
    let log = Arc::new(PMutex::new(Vec::new()));
    bus.subscribe("*", Arc::new(Recorder(log.clone())), vec![], None);
    bus.stop();

    let notified = bus.emit(test_event("x", serde_json::json!({}))).await;
    assert_eq!(notified, 0);
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn start_twice_without_stop_errors() {
    let bus = bus();
    assert!(matches!(bus.start(), Err(BusError::AlreadyStarted)));
}

#[tokio::test]
async fn clear_by_node_id_only_removes_that_nodes_subscriptions() {
    let bus = bus();
    let log = Arc::new(PMutex::new(Vec::new()));
    let owned = NodeId::new("n1");
    bus.subscribe("*", Arc::new(Recorder(log.clone())), vec![], Some(owned.clone()));
    bus.subscribe("*", Arc::new(Recorder(log.clone())), vec![], None);

    bus.clear(Some(&owned));
    let notified = bus.emit(test_event("x", serde_json::json!({}))).await;
    assert_eq!(notified, 1);
}

#[tokio::test]
async fn history_is_bounded_and_newest_last() {
    let mut config = WorkflowConfig::default();
    config.history_limit = 2;
    let bus = EventBus::new(&config);
    bus.start().unwrap();

    bus.emit(test_event("a", serde_json::json!({}))).await;
    bus.emit(test_event("b", serde_json::json!({}))).await;
    bus.emit(test_event("c", serde_json::json!({}))).await;

    let history = bus.history(None, 10);
    let types: Vec<&str> = history.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(types, vec!["b", "c"]);
}

#[tokio::test]
async fn history_filters_by_type() {
    let bus = bus();
    bus.emit(test_event("a", serde_json::json!({}))).await;
    bus.emit(test_event("b", serde_json::json!({}))).await;
    bus.emit(test_event("a", serde_json::json!({}))).await;

    let history = bus.history(Some("a"), 10);
    assert_eq!(history.len(), 2);
}
