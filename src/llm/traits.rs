//! 供应商能力抽象
//!
//! 网关把一次调用规整为 `ChatRequest`（历史已截断、模型已确定），
//! 三个适配器各自转换为原生请求并返回文本与 token 计数；重试与计费都在网关里完成。

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::LlmError;
use crate::memory::Message;

use super::cost::TokenCounts;

/// 供应商（工厂按此选择适配器）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    Google,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::OpenAi => "OpenAI",
            Provider::Anthropic => "Anthropic",
            Provider::Google => "Google",
        };
        f.write_str(name)
    }
}

impl FromStr for Provider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            "google" | "gemini" => Ok(Provider::Google),
            other => Err(LlmError::Config(format!("unsupported provider: {}", other))),
        }
    }
}

/// 推理强度（仅 OpenAI 推理系列使用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    #[default]
    High,
}

impl ReasoningEffort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningEffort::Low => "low",
            ReasoningEffort::Medium => "medium",
            ReasoningEffort::High => "high",
        }
    }
}

/// 结构化输出约束：schema 名称 + JSON Schema
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: serde_json::Value,
}

impl ResponseSchema {
    pub fn of<T: JsonSchema>() -> Self {
        let root = schemars::schema_for!(T);
        let schema = serde_json::to_value(&root).unwrap_or(serde_json::Value::Null);
        Self {
            name: T::schema_name(),
            schema,
        }
    }
}

/// 规整后的单次请求
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    /// 已按 n_history 截断
    pub history: Vec<Message>,
    /// None 表示不传（推理系列）
    pub temperature: Option<f32>,
    pub n: u8,
    pub max_tokens: Option<u32>,
    pub response_format: Option<ResponseSchema>,
    pub reasoning_effort: Option<ReasoningEffort>,
    pub max_thinking_tokens: Option<u32>,
}

/// 适配器返回：文本、token 计数，以及适配器内部产生的附加费用（如二次解析调用）
#[derive(Debug, Clone, Default)]
pub struct ProviderReply {
    pub content: String,
    pub usage: TokenCounts,
    pub extra_cost: f64,
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn kind(&self) -> Provider;

    /// 单次调用；瞬时错误返回 `LlmError::Request/Api/EmptyResponse`，由网关重试
    async fn complete(&self, request: &ChatRequest) -> Result<ProviderReply, LlmError>;
}
