// SPDX-License-Identifier: MIT

//! `openai-llm` — the one built-in that talks to the outside world (§2.1).
//! The HTTP client is an injectable trait so tests never need network
//! access; production wiring points [`OpenAiLlmNode`] at [`ReqwestLlmClient`].

use async_trait::async_trait;
use avatarflow_engine::{NodeContext, NodeError, NodeInterface, PortValues};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmClientError {
    #[error("llm request failed: {0}")]
    Request(String),
    #[error("llm response had no completion text")]
    EmptyResponse,
}

/// Swappable boundary between [`OpenAiLlmNode`] and the outside world.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, api_key: &str, model: &str, system_prompt: Option<&str>, text: &str) -> Result<String, LlmClientError>;
}

/// Talks to the real OpenAI chat completions endpoint.
pub struct ReqwestLlmClient {
    http: reqwest::Client,
}

impl ReqwestLlmClient {
    pub fn new() -> Self {
        Self { http: reqwest::Client::new() }
    }
}

impl Default for ReqwestLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for ReqwestLlmClient {
    async fn complete(&self, api_key: &str, model: &str, system_prompt: Option<&str>, text: &str) -> Result<String, LlmClientError> {
        let mut messages = Vec::new();
        if let Some(prompt) = system_prompt {
            messages.push(serde_json::json!({ "role": "system", "content": prompt }));
        }
        messages.push(serde_json::json!({ "role": "user", "content": text }));

        let response = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(api_key)
            .json(&serde_json::json!({ "model": model, "messages": messages }))
            .send()
            .await
            .map_err(|e| LlmClientError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| LlmClientError::Request(e.to_string()))?
            .json::<Value>()
            .await
            .map_err(|e| LlmClientError::Request(e.to_string()))?;

        response
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(LlmClientError::EmptyResponse)
    }
}

pub struct OpenAiLlmNode {
    client: Arc<dyn LlmClient>,
    api_key: String,
    model: String,
    system_prompt: Option<String>,
}

impl OpenAiLlmNode {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client, api_key: String::new(), model: "gpt-4o-mini".to_string(), system_prompt: None }
    }
}

impl Default for OpenAiLlmNode {
    fn default() -> Self {
        Self::new(Arc::new(ReqwestLlmClient::new()))
    }
}

#[async_trait]
impl NodeInterface for OpenAiLlmNode {
    async fn setup(&mut self, config: &Value, _ctx: &NodeContext) -> Result<(), NodeError> {
        if let Some(key) = config.get("apiKey").and_then(Value::as_str) {
            self.api_key = key.to_string();
        }
        if let Some(model) = config.get("model").and_then(Value::as_str) {
            self.model = model.to_string();
        }
        self.system_prompt = config.get("systemPrompt").and_then(Value::as_str).map(str::to_string);
        Ok(())
    }

    async fn execute(&mut self, inputs: PortValues, ctx: &NodeContext) -> Result<PortValues, NodeError> {
        let text = inputs.get("text").and_then(Value::as_str).unwrap_or_default();
        let completion = self
            .client
            .complete(&self.api_key, &self.model, self.system_prompt.as_deref(), text)
            .await
            .map_err(|e| NodeError::Execute(ctx.node_id().to_string(), e.to_string()))?;

        let mut out = PortValues::new();
        out.insert("text".to_string(), Value::String(completion));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avatarflow_engine::test_support::TestWorkflow;
    use parking_lot::Mutex;

    struct FakeLlmClient {
        seen: Mutex<Vec<String>>,
        reply: String,
    }

    #[async_trait]
    impl LlmClient for FakeLlmClient {
        async fn complete(&self, _api_key: &str, _model: &str, _system_prompt: Option<&str>, text: &str) -> Result<String, LlmClientError> {
            self.seen.lock().push(text.to_string());
            Ok(self.reply.clone())
        }
    }

    struct FailingLlmClient;

    #[async_trait]
    impl LlmClient for FailingLlmClient {
        async fn complete(&self, _api_key: &str, _model: &str, _system_prompt: Option<&str>, _text: &str) -> Result<String, LlmClientError> {
            Err(LlmClientError::Request("unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn execute_returns_client_completion_without_network_access() {
        let tw = TestWorkflow::new();
        let ctx = tw.context("llm");
        let client = Arc::new(FakeLlmClient { seen: Mutex::new(Vec::new()), reply: "hi there".to_string() });
        let mut node = OpenAiLlmNode::new(client.clone());
        node.setup(&serde_json::json!({"apiKey": "k", "model": "gpt-4o-mini"}), &ctx).await.unwrap();

        let mut inputs = PortValues::new();
        inputs.insert("text".to_string(), Value::String("hello".to_string()));
        let out = node.execute(inputs, &ctx).await.unwrap();

        assert_eq!(out.get("text").unwrap(), "hi there");
        assert_eq!(client.seen.lock().as_slice(), ["hello".to_string()]);
    }

    #[tokio::test]
    async fn execute_surfaces_client_failure_as_node_error() {
        let tw = TestWorkflow::new();
        let ctx = tw.context("llm");
        let mut node = OpenAiLlmNode::new(Arc::new(FailingLlmClient));
        node.setup(&serde_json::json!({}), &ctx).await.unwrap();
        let err = node.execute(PortValues::new(), &ctx).await.unwrap_err();
        assert!(matches!(err, NodeError::Execute(_, _)));
    }
}
