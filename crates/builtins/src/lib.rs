// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! avatarflow-builtins: the small built-in node catalogue (§2.1) the engine
//! falls back to when no host plugin registers a richer implementation for
//! a given node type.

mod console_output;
mod end;
mod manual_input;
mod manual_trigger;
mod openai_llm;
mod start;
mod timer;

pub use console_output::ConsoleOutputNode;
pub use end::EndNode;
pub use manual_input::ManualInputNode;
pub use manual_trigger::ManualTriggerNode;
pub use openai_llm::{LlmClient, LlmClientError, OpenAiLlmNode, ReqwestLlmClient};
pub use start::StartNode;
pub use timer::TimerNode;

use avatarflow_engine::{NodeInterface, PluginLoader};
use std::sync::Arc;

/// Registers every built-in node factory (§4.4, §4.4.1). Call once at
/// startup before the first `WorkflowSupervisor::start`; a host's own
/// `register` calls for its own node types may run before or after this.
pub fn register_builtins(loader: &PluginLoader) {
    loader.register("start", Arc::new(|| Box::new(StartNode::default()) as Box<dyn NodeInterface>));
    loader.register("end", Arc::new(|| Box::new(EndNode) as Box<dyn NodeInterface>));
    loader.register("manual-input", Arc::new(|| Box::new(ManualInputNode::default()) as Box<dyn NodeInterface>));
    loader.register("console-output", Arc::new(|| Box::new(ConsoleOutputNode::default()) as Box<dyn NodeInterface>));
    loader.register("openai-llm", Arc::new(|| Box::new(OpenAiLlmNode::default()) as Box<dyn NodeInterface>));
    loader.register("timer", Arc::new(|| Box::new(TimerNode::default()) as Box<dyn NodeInterface>));
    loader.register("manual-trigger", Arc::new(|| Box::new(ManualTriggerNode) as Box<dyn NodeInterface>));
}
