// SPDX-License-Identifier: MIT

//! Typed configuration structs. The engine owns no CLI, environment
//! variables, or persisted config (§6) — a host constructs these however it
//! likes and hands them to `WorkflowSupervisor::start`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default queue capacity and history length (§3, §9 Open Questions) made
/// configurable per workflow rather than hard-coded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Bounded event queue capacity in event-driven mode (default 100).
    pub queue_capacity: usize,
    /// Maximum retained bus history length (default 100).
    pub history_limit: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self { queue_capacity: 100, history_limit: 100 }
    }
}

/// Process-wide engine configuration: which node types are treated as
/// *source* nodes (§4.7) and which event-type patterns are forwarded to the
/// host by default (§4.8 step 2, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub source_node_types: HashSet<String>,
    pub host_forwarded_patterns: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // `discord-chat` is included by default even though the
            // reference implementation's own default set omits it: the
            // spec text names Discord as an example source type and a
            // `discord-chat` node exists in the original catalogue.
            source_node_types: [
                "timer",
                "manual-trigger",
                "twitch-chat",
                "youtube-chat",
                "discord-chat",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            host_forwarded_patterns: vec!["audio.*".into(), "avatar.*".into(), "subtitle".into()],
        }
    }
}
