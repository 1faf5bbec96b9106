//! Google 适配器（Gemini generateContent over reqwest）
//!
//! 历史被展平为 `user: ...` / `model: ...` 文本行；需要结构化输出时设置
//! `responseMimeType=application/json` 并给出内联后的 responseSchema。

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::core::LlmError;
use crate::memory::Role;

use super::cost::TokenCounts;
use super::traits::{ChatProvider, ChatRequest, Provider, ProviderReply};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GoogleProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GoogleProvider {
    pub fn new(base_url: Option<&str>, api_key: Option<&str>, timeout: Duration) -> Result<Self, LlmError> {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .ok_or_else(|| LlmError::Config("GOOGLE_API_KEY is not set".into()))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn error(message: impl ToString) -> LlmError {
        LlmError::Request {
            provider: Provider::Google,
            message: message.to_string(),
        }
    }
}

pub(crate) fn request_body(request: &ChatRequest) -> Value {
    let mut lines: Vec<String> = request
        .history
        .iter()
        .map(|m| {
            let speaker = match m.role {
                Role::Assistant => "model",
                _ => "user",
            };
            format!("{}: {}", speaker, m.content)
        })
        .collect();
    lines.push(format!("user: {}", request.user_prompt));

    let mut generation_config = json!({
        "candidateCount": request.n,
    });
    if let Some(t) = request.temperature {
        generation_config["temperature"] = json!(t);
    }
    if let Some(max) = request.max_tokens {
        generation_config["maxOutputTokens"] = json!(max);
    }
    if let Some(schema) = &request.response_format {
        generation_config["responseMimeType"] = json!("application/json");
        let definitions = schema.schema.get("definitions").cloned().unwrap_or(Value::Null);
        generation_config["responseSchema"] = inline_schema(&schema.schema, &definitions);
    }

    json!({
        "systemInstruction": {"parts": [{"text": request.system_prompt}]},
        "contents": [{"role": "user", "parts": [{"text": lines.join("\n")}]}],
        "generationConfig": generation_config,
    })
}

/// 展开 $ref，只保留 Gemini 接受的 OpenAPI 子集
pub(crate) fn inline_schema(schema: &Value, definitions: &Value) -> Value {
    let target = match schema.get("$ref").and_then(Value::as_str) {
        Some(r) => r
            .rsplit('/')
            .next()
            .and_then(|name| definitions.get(name))
            .unwrap_or(schema),
        None => match schema.get("allOf").and_then(|a| a.get(0)) {
            Some(inner) => return inline_schema(inner, definitions),
            None => schema,
        },
    };

    let mut out = Map::new();
    match target.get("type") {
        Some(Value::String(t)) => {
            out.insert("type".into(), json!(t.to_uppercase()));
        }
        Some(Value::Array(ts)) => {
            if let Some(t) = ts.iter().filter_map(Value::as_str).find(|t| *t != "null") {
                out.insert("type".into(), json!(t.to_uppercase()));
            }
            out.insert("nullable".into(), json!(true));
        }
        _ => {}
    }
    for key in ["description", "enum", "required", "format"] {
        if let Some(v) = schema.get(key).or_else(|| target.get(key)) {
            if key == "format" && !matches!(v.as_str(), Some("enum" | "date-time")) {
                continue;
            }
            out.insert(key.into(), v.clone());
        }
    }
    if let Some(props) = target.get("properties").and_then(Value::as_object) {
        let inlined: Map<String, Value> = props
            .iter()
            .map(|(k, v)| (k.clone(), inline_schema(v, definitions)))
            .collect();
        out.insert("properties".into(), Value::Object(inlined));
    }
    if let Some(items) = target.get("items") {
        out.insert("items".into(), inline_schema(items, definitions));
    }
    Value::Object(out)
}

fn parse_response(body: &Value) -> (String, TokenCounts) {
    let text = body
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    let get = |key: &str| body["usageMetadata"][key].as_u64().unwrap_or(0);
    let usage = TokenCounts {
        input: get("promptTokenCount"),
        cached: get("cachedContentTokenCount"),
        output: get("candidatesTokenCount"),
    };
    (text, usage)
}

#[async_trait]
impl ChatProvider for GoogleProvider {
    fn kind(&self) -> Provider {
        Provider::Google
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ProviderReply, LlmError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, request.model
        );
        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body(request))
            .send()
            .await
            .map_err(Self::error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                provider: Provider::Google,
                status: status.as_u16(),
                body,
            });
        }
        let body: Value = response.json().await.map_err(Self::error)?;
        let (content, usage) = parse_response(&body);
        if content.is_empty() {
            return Err(LlmError::EmptyResponse {
                provider: Provider::Google,
            });
        }
        Ok(ProviderReply {
            content,
            usage,
            extra_cost: 0.0,
        })
    }
}
