// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! avatarflow-core: data model and pure algorithms for the workflow
//! execution engine — events, filters, the predicate expression language,
//! the graph wire format, and graph algorithms (C1, C2, C8). Stateful,
//! async orchestration lives in `avatarflow-engine`.

pub mod clock;
pub mod config;
pub mod event;
pub mod graph;
pub mod id;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{EngineConfig, WorkflowConfig};
pub use event::{evaluate_predicate, pattern_matches, Event, EventFilter, FilterError};
pub use graph::{Character, Connection, Graph, GraphError, NodeSpec, PortRef};
pub use id::{new_subscription_id, NodeId, SubscriptionId, WorkflowId};
