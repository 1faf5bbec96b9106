//! OpenAI 适配器
//!
//! 通过 async_openai 调用 Chat Completions（可配置 base_url）。请求先按 JSON 组装再反序列化为
//! `CreateChatCompletionRequest`，这样 developer 角色、json_schema、reasoning_effort 与
//! max_completion_tokens 都走同一条路径。

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::CreateChatCompletionRequest;
use async_openai::Client;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::LlmError;
use crate::memory::Role;

use super::cost::TokenCounts;
use super::models::{is_reasoning_model, GPT_MAX_TOKENS, REASONING_MAX_TOKENS};
use super::traits::{ChatProvider, ChatRequest, Provider, ProviderReply};

pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
}

impl OpenAiProvider {
    pub fn new(base_url: Option<&str>, api_key: Option<&str>) -> Self {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| "sk-placeholder".to_string());

        let config = if let Some(url) = base_url {
            OpenAIConfig::new().with_api_base(url).with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        Self {
            client: Client::with_config(config),
        }
    }

    fn error(message: impl ToString) -> LlmError {
        LlmError::Request {
            provider: Provider::OpenAi,
            message: message.to_string(),
        }
    }
}

/// 组装原生请求体
pub(crate) fn request_body(request: &ChatRequest) -> Value {
    let reasoning = is_reasoning_model(&request.model);
    let system_role = if reasoning { Role::Developer } else { Role::System };

    let mut messages = Vec::new();
    if !request.system_prompt.is_empty() {
        messages.push(json!({"role": system_role.as_str(), "content": request.system_prompt}));
    }
    for m in &request.history {
        messages.push(json!({"role": m.role.as_str(), "content": m.content}));
    }
    messages.push(json!({"role": "user", "content": request.user_prompt}));

    let mut body = json!({
        "model": request.model,
        "messages": messages,
        "n": request.n,
    });
    if reasoning {
        body["max_completion_tokens"] = json!(request.max_tokens.unwrap_or(REASONING_MAX_TOKENS));
        if let Some(effort) = request.reasoning_effort {
            body["reasoning_effort"] = json!(effort.as_str());
        }
    } else {
        body["max_tokens"] = json!(request.max_tokens.unwrap_or(GPT_MAX_TOKENS));
        if let Some(t) = request.temperature {
            body["temperature"] = json!(t);
        }
    }
    if let Some(schema) = &request.response_format {
        body["response_format"] = json!({
            "type": "json_schema",
            "json_schema": {
                "name": schema.name,
                "schema": schema.schema,
            }
        });
    }
    body
}

/// 从 usage 中取 prompt/cached/completion token
fn token_counts(usage: &Value) -> TokenCounts {
    let get = |path: &str| usage.pointer(path).and_then(Value::as_u64).unwrap_or(0);
    TokenCounts {
        input: get("/prompt_tokens"),
        cached: get("/prompt_tokens_details/cached_tokens"),
        output: get("/completion_tokens"),
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn kind(&self) -> Provider {
        Provider::OpenAi
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ProviderReply, LlmError> {
        let native: CreateChatCompletionRequest = serde_json::from_value(request_body(request))
            .map_err(|e| LlmError::Config(format!("invalid OpenAI request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(native)
            .await
            .map_err(Self::error)?;

        let usage = response
            .usage
            .as_ref()
            .and_then(|u| serde_json::to_value(u).ok())
            .map(|u| token_counts(&u))
            .unwrap_or_default();

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|c| !c.is_empty())
            .ok_or(LlmError::EmptyResponse {
                provider: Provider::OpenAi,
            })?;

        Ok(ProviderReply {
            content,
            usage,
            extra_cost: 0.0,
        })
    }
}
