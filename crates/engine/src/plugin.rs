// SPDX-License-Identifier: MIT

//! Resolves a `node_type` string to a node factory (C7, §4.4, §4.4.1).
//!
//! Dynamic module import and duck-typed discovery (§9) are replaced with an
//! explicit, process-wide registry populated by `register` calls made once
//! at startup — no filesystem scan, no reflection. A lookup miss is not an
//! error: it is exactly the "unknown node type" fallback path §4.4
//! describes, resolved one level up in `PluginLoader::resolve`.

use crate::node::NodeInterface;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Constructs a fresh node instance for one node type. Implementors are
/// typically a zero-sized struct whose `create` returns `Box::new(Self::default())`.
pub trait NodeFactory: Send + Sync {
    fn create(&self) -> Box<dyn NodeInterface>;
}

impl<F> NodeFactory for F
where
    F: Fn() -> Box<dyn NodeInterface> + Send + Sync,
{
    fn create(&self) -> Box<dyn NodeInterface> {
        (self)()
    }
}

/// Process-wide, read-mostly registry (§5 "plugin factory cache").
#[derive(Clone, Default)]
pub struct PluginLoader {
    factories: Arc<RwLock<HashMap<String, Arc<dyn NodeFactory>>>>,
}

impl PluginLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under `node_type`. Called once per type at
    /// startup, by built-ins and by host-provided node types alike
    /// (§4.4.1).
    pub fn register(&self, node_type: impl Into<String>, factory: Arc<dyn NodeFactory>) {
        self.factories.write().insert(node_type.into(), factory);
    }

    /// Resolves `node_type`. A miss is logged and returns `None` — callers
    /// fall back to a no-op node producing `{}` (§4.4); this is never a
    /// fatal error.
    pub fn resolve(&self, node_type: &str) -> Option<Box<dyn NodeInterface>> {
        let factory = self.factories.read().get(node_type).cloned();
        match factory {
            Some(f) => Some(f.create()),
            None => {
                warn!(node_type, "unknown node type");
                None
            }
        }
    }

    pub fn is_registered(&self, node_type: &str) -> bool {
        self.factories.read().contains_key(node_type)
    }
}

#[cfg(test)]
#[path = "plugin_tests.rs"]
mod tests;
