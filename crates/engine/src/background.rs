// SPDX-License-Identifier: MIT

//! The workflow-scoped background-task registry (§4.3 `spawn_background`,
//! §5 "Leak discipline", I4). Every task a node starts through
//! [`crate::node::NodeContext::spawn_background`] is registered here;
//! `stop` cancels and awaits every one of them before returning, which is
//! the concrete mechanism behind I4 and I5.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Owned by one [`crate::supervisor::WorkflowSupervisor`] entry. Cloning is
/// cheap (`Arc` inside); clones share the same task set and cancellation
/// token.
#[derive(Clone)]
pub struct BackgroundRegistry {
    token: CancellationToken,
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl BackgroundRegistry {
    pub fn new() -> Self {
        Self { token: CancellationToken::new(), handles: Arc::new(Mutex::new(Vec::new())) }
    }

    /// A child token that a spawned task should select against alongside
    /// its own work, so it notices cancellation promptly (§5 cooperative
    /// cancellation).
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Spawns `fut` as a tracked background task. `fut` is expected to
    /// observe `token` (via [`child_token`]) and return promptly once it is
    /// cancelled.
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(fut);
        self.handles.lock().push(handle);
    }

    /// Cancels the token and awaits every registered task, discarding
    /// `JoinError`s (a cancelled or panicked task is logged by the caller,
    /// never propagated — §5 "failures coalesced").
    pub async fn shutdown(&self) {
        self.token.cancel();
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            let _ = handle.await;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }
}

impl Default for BackgroundRegistry {
    fn default() -> Self {
        Self::new()
    }
}
