// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! avatarflow-engine: the stateful, async orchestration layer — the event
//! bus, bounded queue, node lifecycle, plugin registry, both runners, and
//! the workflow supervisor (C3–C7, C9–C13). Pure data and algorithms live
//! in `avatarflow-core`.

pub mod background;
pub mod bus;
pub mod dataflow;
pub mod error;
pub mod event_driven_runner;
pub mod linear_runner;
pub mod node;
pub mod plugin;
pub mod queue;
pub mod runtime;
pub mod supervisor;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use background::BackgroundRegistry;
pub use bus::{BusError, EventBus, Subscriber, SubscriberError};
pub use error::{NodeError, RuntimeError};
pub use linear_runner::LinearOutcome;
pub use node::{
    call_event, call_log, call_status, CallbackError, HostCallbacks, LogLevel, NodeContext, NodeInterface, NodeStatus,
    NoopHostCallbacks, PortValues,
};
pub use plugin::{NodeFactory, PluginLoader};
pub use queue::{BoundedEventQueue, QueueItem};
pub use runtime::{NodeRuntime, NoopNode};
pub use supervisor::{WorkflowStatus, WorkflowStatusReport, WorkflowSupervisor};
