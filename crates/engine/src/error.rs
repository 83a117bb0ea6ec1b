// SPDX-License-Identifier: MIT

//! Error kinds (§7). Node-originating failures never unwind past a runner
//! method — they are downgraded to a logged event or a status callback at
//! the point described in §7's propagation table. `RuntimeError` is the one
//! type that can escape `WorkflowSupervisor::start`, and only for the
//! engine's own programmer errors (invariant violations), never for a
//! node's misbehaviour.

use avatarflow_core::GraphError;
use thiserror::Error;

/// Errors a node implementation's lifecycle methods can raise. The runner
/// and supervisor are the only things that ever see these; every variant is
/// downgraded to a logged event per §7, never propagated further.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("node type `{0}` could not be loaded")]
    Load(String),
    #[error("node `{0}` setup failed: {1}")]
    Setup(String, String),
    #[error("node `{0}` execute failed: {1}")]
    Execute(String, String),
    #[error("node `{0}` teardown failed: {1}")]
    Teardown(String, String),
}

/// Returned by `WorkflowSupervisor::start`/`stop` for the engine's own
/// invariant violations — malformed graphs (§7 GraphError) and internal
/// consistency failures. Node failures never surface here.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
    #[error("workflow `{0}` is not running")]
    NotRunning(String),
}
