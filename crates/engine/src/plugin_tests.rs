// SPDX-License-Identifier: MIT

use super::*;
use crate::error::NodeError;
use async_trait::async_trait;

struct Echo;

#[async_trait]
impl NodeInterface for Echo {
    async fn execute(&mut self, inputs: crate::node::PortValues, _ctx: &crate::node::NodeContext) -> Result<crate::node::PortValues, NodeError> {
        Ok(inputs)
    }
}

#[test]
fn resolve_returns_a_fresh_instance_per_call() {
    let loader = PluginLoader::new();
    loader.register("echo", Arc::new(|| Box::new(Echo) as Box<dyn NodeInterface>));
    assert!(loader.resolve("echo").is_some());
    assert!(loader.is_registered("echo"));
}

#[test]
fn unregistered_type_resolves_to_none_not_an_error() {
    let loader = PluginLoader::new();
    assert!(loader.resolve("does-not-exist").is_none());
}
