// SPDX-License-Identifier: MIT

//! Per-workflow pub/sub event bus (C3, §4.1). Not shared between
//! workflows — one `EventBus` belongs to exactly one running workflow (I3).

use async_trait::async_trait;
use avatarflow_core::{Event, EventFilter, NodeId, SubscriptionId, WorkflowConfig};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Receives events the bus has decided match a subscription. Deferred
/// callbacks are awaited in registration order — no implicit parallel
/// fan-out (§4.1). A callback that fails is logged and skipped; dispatch
/// continues with the next subscriber.
#[async_trait]
pub trait Subscriber: Send + Sync {
    async fn on_event(&self, event: &Event) -> Result<(), SubscriberError>;
}

#[derive(Debug, Error)]
#[error("event handler failed: {0}")]
pub struct SubscriberError(pub String);

struct Subscription {
    id: SubscriptionId,
    pattern: String,
    subscriber: Arc<dyn Subscriber>,
    filters: Vec<EventFilter>,
    node_id: Option<NodeId>,
}

#[derive(Debug, Error)]
pub enum BusError {
    #[error("event bus already started")]
    AlreadyStarted,
}

struct Inner {
    running: bool,
    subscriptions: Vec<Subscription>,
    history: VecDeque<Event>,
}

pub struct EventBus {
    history_limit: usize,
    inner: Mutex<Inner>,
}

impl EventBus {
    pub fn new(config: &WorkflowConfig) -> Self {
        Self {
            history_limit: config.history_limit,
            inner: Mutex::new(Inner { running: false, subscriptions: Vec::new(), history: VecDeque::new() }),
        }
    }

    pub fn start(&self) -> Result<(), BusError> {
        let mut inner = self.inner.lock();
        if inner.running {
            return Err(BusError::AlreadyStarted);
        }
        inner.running = true;
        inner.subscriptions.clear();
        inner.history.clear();
        Ok(())
    }

    /// Transitions to stopped. After this, `emit` is a no-op (§4.1).
    pub fn stop(&self) {
        let mut inner = self.inner.lock();
        inner.running = false;
    }

    pub fn subscribe(
        &self,
        pattern: impl Into<String>,
        subscriber: Arc<dyn Subscriber>,
        filters: Vec<EventFilter>,
        node_id: Option<NodeId>,
    ) -> SubscriptionId {
        let id = avatarflow_core::new_subscription_id();
        self.inner.lock().subscriptions.push(Subscription {
            id: id.clone(),
            pattern: pattern.into(),
            subscriber,
            filters,
            node_id,
        });
        id
    }

    pub fn unsubscribe_by_id(&self, id: &SubscriptionId) {
        self.inner.lock().subscriptions.retain(|s| &s.id != id);
    }

    pub fn unsubscribe_by_node(&self, node_id: &NodeId) {
        self.inner.lock().subscriptions.retain(|s| s.node_id.as_ref() != Some(node_id));
    }

    /// Drops all subscriptions, optionally scoped to one node (§4.1).
    pub fn clear(&self, node_id: Option<&NodeId>) {
        let mut inner = self.inner.lock();
        match node_id {
            Some(id) => inner.subscriptions.retain(|s| s.node_id.as_ref() != Some(id)),
            None => inner.subscriptions.clear(),
        }
    }

    /// Dispatches to every matching subscriber in registration order and
    /// returns how many ran. A no-op, zero-returning call after `stop`
    /// (§4.1, P5).
    pub async fn emit(&self, event: Event) -> usize {
        let (running, matching) = {
            let mut inner = self.inner.lock();
            if !inner.running {
                warn!(event_type = %event.event_type, "event bus is not running, event dropped");
                return 0;
            }
            debug!(event_type = %event.event_type, "emitting event");
            inner.history.push_back(event.clone());
            while inner.history.len() > self.history_limit {
                inner.history.pop_front();
            }
            let matching: Vec<Arc<dyn Subscriber>> = inner
                .subscriptions
                .iter()
                .filter(|s| avatarflow_core::pattern_matches(&s.pattern, &event.event_type))
                .filter(|s| s.filters.iter().all(|f| f.matches(&event)))
                .map(|s| s.subscriber.clone())
                .collect();
            (true, matching)
        };
        debug_assert!(running);
        let mut notified = 0;
        for subscriber in matching {
            match subscriber.on_event(&event).await {
                Ok(()) => notified += 1,
                Err(e) => warn!(event_type = %event.event_type, error = %e, "event handler failed"),
            }
        }
        notified
    }

    /// Newest-last, bounded by the configured history limit (I6, P6).
    pub fn history(&self, event_type: Option<&str>, limit: usize) -> Vec<Event> {
        let inner = self.inner.lock();
        let filtered: Vec<Event> = match event_type {
            Some(t) => inner.history.iter().filter(|e| e.event_type == t).cloned().collect(),
            None => inner.history.iter().cloned().collect(),
        };
        let start = filtered.len().saturating_sub(limit);
        filtered[start..].to_vec()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
