//! Anthropic 适配器（Messages API over reqwest）
//!
//! Messages API 不支持 response_format：需要结构化输出时，在 user 消息末尾追加 schema 说明，
//! 再把原始文本交给注入的解析客户端整理为目标 schema。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::core::LlmError;
use crate::memory::Role;
use crate::prompts::parse_json_prompt;

use super::client::{ChatClient, ChatOptions};
use super::cost::TokenCounts;
use super::models::{is_thinking_model, GPT_MAX_TOKENS};
use super::traits::{ChatProvider, ChatRequest, Provider, ProviderReply, ResponseSchema};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Anthropic token 上限
#[derive(Debug, Clone, Copy)]
pub struct AnthropicLimits {
    pub thinking_model_max_tokens: u32,
    pub basic_model_max_tokens: u32,
    pub max_thinking_budget_tokens: u32,
}

impl Default for AnthropicLimits {
    fn default() -> Self {
        Self {
            thinking_model_max_tokens: 64_000,
            basic_model_max_tokens: 8_192,
            max_thinking_budget_tokens: 20_000,
        }
    }
}

pub struct AnthropicProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    limits: AnthropicLimits,
    parse_client: Option<Arc<ChatClient>>,
}

impl AnthropicProvider {
    pub fn new(
        base_url: Option<&str>,
        api_key: Option<&str>,
        limits: AnthropicLimits,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| LlmError::Config("ANTHROPIC_API_KEY is not set".into()))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
            api_key,
            limits,
            parse_client: None,
        })
    }

    /// 结构化输出的二次整理客户端（通常是 OpenAI 轻量模型）
    pub fn with_parse_client(mut self, client: Arc<ChatClient>) -> Self {
        self.parse_client = Some(client);
        self
    }

    fn error(message: impl ToString) -> LlmError {
        LlmError::Request {
            provider: Provider::Anthropic,
            message: message.to_string(),
        }
    }

    pub(crate) fn request_body(&self, request: &ChatRequest) -> Value {
        let user_content = match &request.response_format {
            Some(schema) => format!(
                "{}\nProvide a response strictly in below JSON format.\nDo not include any additional commentary or text outside of the JSON object.\n\n{}\n",
                request.user_prompt,
                schema_outline(schema)
            ),
            None => request.user_prompt.clone(),
        };

        // Messages API 只接受 user / assistant
        let mut messages: Vec<Value> = request
            .history
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::Assistant => "assistant",
                    _ => "user",
                };
                json!({"role": role, "content": m.content})
            })
            .collect();
        messages.push(json!({
            "role": "user",
            "content": [{"type": "text", "text": user_content}],
        }));

        let mut body = json!({
            "model": request.model,
            "system": request.system_prompt,
            "messages": messages,
        });
        if is_thinking_model(&request.model) {
            body["max_tokens"] =
                json!(request.max_tokens.unwrap_or(self.limits.thinking_model_max_tokens));
            body["thinking"] = json!({
                "type": "enabled",
                "budget_tokens": request
                    .max_thinking_tokens
                    .unwrap_or(self.limits.max_thinking_budget_tokens),
            });
        } else {
            body["max_tokens"] = json!(request.max_tokens.unwrap_or(self.limits.basic_model_max_tokens));
            if let Some(t) = request.temperature {
                body["temperature"] = json!(t);
            }
        }
        body
    }

    /// 原始文本 → 目标 schema
    async fn reformat(&self, raw: String, schema: &ResponseSchema) -> Result<(String, f64), LlmError> {
        let Some(parser) = &self.parse_client else {
            tracing::warn!("No parse client for Anthropic structured output; returning raw content");
            return Ok((raw, 0.0));
        };
        let prompt = parse_json_prompt(&raw);
        let opts = ChatOptions::new()
            .n_history(Some(0))
            .max_tokens(GPT_MAX_TOKENS)
            .response_format(schema.clone());
        let resp = parser.parse_chat(&prompt.system, &prompt.user, &[], &opts).await?;
        Ok((resp.content, resp.cost))
    }
}

/// 响应体中的文本块与 token 计数
fn parse_response(body: &Value) -> (String, TokenCounts) {
    let text = body["content"]
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b["type"] == "text")
                .filter_map(|b| b["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    let get = |key: &str| body["usage"][key].as_u64().unwrap_or(0);
    // input_tokens 不含缓存命中部分
    let cached = get("cache_read_input_tokens");
    let usage = TokenCounts {
        input: get("input_tokens") + cached,
        cached,
        output: get("output_tokens"),
    };
    (text, usage)
}

/// 把 JSON Schema 展开成 "字段: 描述 (类型)" 的样例对象，供提示使用
pub(crate) fn schema_outline(schema: &ResponseSchema) -> String {
    let definitions = schema
        .schema
        .get("definitions")
        .or_else(|| schema.schema.get("$defs"))
        .cloned()
        .unwrap_or(Value::Null);
    let outline = outline_properties(&schema.schema, &definitions);
    serde_json::to_string_pretty(&outline).unwrap_or_default()
}

fn resolve<'a>(value: &'a Value, definitions: &'a Value) -> &'a Value {
    match value.get("$ref").and_then(Value::as_str) {
        Some(r) => r
            .rsplit('/')
            .next()
            .and_then(|name| definitions.get(name))
            .unwrap_or(value),
        None => match value.get("allOf").and_then(|a| a.get(0)) {
            Some(inner) if inner.get("$ref").is_some() => resolve(inner, definitions),
            _ => value,
        },
    }
}

fn type_name(value: &Value) -> String {
    match value.get("type") {
        Some(Value::String(t)) => t.clone(),
        Some(Value::Array(ts)) => ts
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .unwrap_or("object")
            .to_string(),
        _ => "object".to_string(),
    }
}

fn outline_properties(schema: &Value, definitions: &Value) -> Value {
    let mut out = Map::new();
    let Some(props) = schema.get("properties").and_then(Value::as_object) else {
        return Value::Object(out);
    };
    for (key, value) in props {
        let target = resolve(value, definitions);
        let entry = if target.get("properties").is_some() {
            outline_properties(target, definitions)
        } else if let Some(items) = value.get("items") {
            let item = resolve(items, definitions);
            if item.get("properties").is_some() {
                let one = outline_properties(item, definitions);
                Value::Array(vec![one.clone(), one])
            } else {
                describe(value)
            }
        } else {
            describe(value)
        };
        out.insert(key.clone(), entry);
    }
    Value::Object(out)
}

fn describe(value: &Value) -> Value {
    let description = value.get("description").and_then(Value::as_str).unwrap_or("");
    Value::String(format!("{} ({})", description, type_name(value)).trim().to_string())
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn kind(&self) -> Provider {
        Provider::Anthropic
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ProviderReply, LlmError> {
        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(Self::error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                provider: Provider::Anthropic,
                status: status.as_u16(),
                body,
            });
        }
        let body: Value = response.json().await.map_err(Self::error)?;
        let (raw, usage) = parse_response(&body);
        if raw.is_empty() {
            return Err(LlmError::EmptyResponse {
                provider: Provider::Anthropic,
            });
        }

        let (content, extra_cost) = match &request.response_format {
            Some(schema) => self.reformat(raw, schema).await?,
            None => (raw, 0.0),
        };
        Ok(ProviderReply {
            content,
            usage,
            extra_cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Message;
    use schemars::JsonSchema;

    #[derive(JsonSchema)]
    #[allow(dead_code)]
    struct Inner {
        /// the score
        score: f64,
    }

    #[derive(JsonSchema)]
    #[allow(dead_code)]
    struct Outer {
        /// whether done
        done: bool,
        inner: Inner,
        items: Vec<Inner>,
    }

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new(None, Some("k"), AnthropicLimits::default(), Duration::from_secs(5))
            .unwrap()
    }

    fn request(model: &str) -> ChatRequest {
        ChatRequest {
            model: model.into(),
            system_prompt: "sys".into(),
            user_prompt: "hi".into(),
            history: vec![Message::user("q"), Message::assistant("a")],
            temperature: Some(0.0),
            n: 1,
            max_tokens: None,
            response_format: None,
            reasoning_effort: None,
            max_thinking_tokens: None,
        }
    }

    #[test]
    fn test_basic_and_thinking_bodies() {
        let p = provider();
        let body = p.request_body(&request("claude-3-5-haiku-latest"));
        assert_eq!(body["max_tokens"], 8_192);
        assert_eq!(body["messages"].as_array().unwrap().len(), 3);
        assert!(body.get("thinking").is_none());

        let body = p.request_body(&request("claude-3-7-sonnet-20250219"));
        assert_eq!(body["max_tokens"], 64_000);
        assert_eq!(body["thinking"]["budget_tokens"], 20_000);
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_cache_reads_counted_as_cached_input() {
        let body = serde_json::json!({
            "content": [{"type": "text", "text": "ok"}],
            "usage": {"input_tokens": 100, "cache_read_input_tokens": 900, "output_tokens": 50}
        });
        let (text, usage) = parse_response(&body);
        assert_eq!(text, "ok");
        assert_eq!(usage, TokenCounts { input: 1_000, cached: 900, output: 50 });

        // claude-3-7-sonnet: 100 * 3.0 + 900 * 0.3 + 50 * 15.0
        let cost = crate::llm::chat_cost(Provider::Anthropic, "claude-3-7-sonnet-20250219", usage);
        assert!((cost - 1_320.0 / 1_000_000.0).abs() < 1e-12);
    }

    #[test]
    fn test_schema_outline_expands_refs() {
        let outline: Value =
            serde_json::from_str(&schema_outline(&ResponseSchema::of::<Outer>())).unwrap();
        assert_eq!(outline["done"], "whether done (boolean)");
        assert_eq!(outline["inner"]["score"], "the score (number)");
        assert_eq!(outline["items"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_schema_instruction_appended() {
        let mut req = request("claude-3-5-haiku-latest");
        req.response_format = Some(ResponseSchema::of::<Inner>());
        let body = provider().request_body(&req);
        let text = body["messages"][2]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("hi\nProvide a response strictly in below JSON format."));
        assert!(text.contains("the score (number)"));
    }
}
