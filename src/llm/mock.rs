//! 脚本化的 Mock 供应商（用于测试，无需 API）
//!
//! 按 response_format 的 schema 名分队列回放预置回复；队列只剩最后一条时重复返回它。
//! 无 schema 的请求使用键 `""`。

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::LlmError;

use super::cost::TokenCounts;
use super::traits::{ChatProvider, ChatRequest, Provider, ProviderReply};

#[derive(Default)]
pub struct ScriptedChatProvider {
    kind: Option<Provider>,
    scripts: Mutex<HashMap<String, VecDeque<String>>>,
    requests: Mutex<Vec<ChatRequest>>,
    always_fail: bool,
    usage: TokenCounts,
}

impl ScriptedChatProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每次调用都返回瞬时错误
    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: Provider) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_usage(mut self, usage: TokenCounts) -> Self {
        self.usage = usage;
        self
    }

    /// 为某个 schema 追加一条回复
    pub fn push(&self, schema: &str, reply: impl Into<String>) -> &Self {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.entry(schema.to_string()).or_default().push_back(reply.into());
        }
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn calls_for(&self, schema: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.response_format.as_ref().map(|s| s.name.as_str()).unwrap_or("") == schema)
            .count()
    }

    fn next_reply(&self, schema: &str) -> Option<String> {
        let mut scripts = self.scripts.lock().ok()?;
        let queue = scripts.get_mut(schema)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl ChatProvider for ScriptedChatProvider {
    fn kind(&self) -> Provider {
        self.kind.unwrap_or(Provider::OpenAi)
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ProviderReply, LlmError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        if self.always_fail {
            return Err(LlmError::Request {
                provider: self.kind(),
                message: "scripted failure".into(),
            });
        }
        let schema = request
            .response_format
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_default();
        let content = self.next_reply(&schema).ok_or(LlmError::EmptyResponse {
            provider: self.kind(),
        })?;
        Ok(ProviderReply {
            content,
            usage: self.usage,
            extra_cost: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::traits::ResponseSchema;

    fn request(schema: Option<&str>) -> ChatRequest {
        ChatRequest {
            model: "gpt-4o-mini".into(),
            system_prompt: String::new(),
            user_prompt: "q".into(),
            history: vec![],
            temperature: Some(0.0),
            n: 1,
            max_tokens: None,
            response_format: schema.map(|name| ResponseSchema {
                name: name.into(),
                schema: serde_json::Value::Null,
            }),
            reasoning_effort: None,
            max_thinking_tokens: None,
        }
    }

    #[tokio::test]
    async fn test_queue_then_sticky_last() {
        let p = ScriptedChatProvider::new();
        p.push("A", "1").push("A", "2");
        assert_eq!(p.complete(&request(Some("A"))).await.unwrap().content, "1");
        assert_eq!(p.complete(&request(Some("A"))).await.unwrap().content, "2");
        assert_eq!(p.complete(&request(Some("A"))).await.unwrap().content, "2");
        assert!(p.complete(&request(None)).await.is_err());
        assert_eq!(p.calls_for("A"), 3);
        assert_eq!(p.call_count(), 4);
    }
}
