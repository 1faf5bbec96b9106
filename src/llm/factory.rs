//! 按配置构建网关：供应商枚举 → 具体适配器

use std::sync::Arc;
use std::time::Duration;

use crate::config::{EmbeddingSection, LlmSection};
use crate::core::LlmError;

use super::anthropic::{AnthropicLimits, AnthropicProvider};
use super::client::ChatClient;
use super::embedding::OpenAiEmbedder;
use super::google::GoogleProvider;
use super::openai::OpenAiProvider;
use super::traits::{ChatProvider, Provider};

/// Anthropic 结构化输出整理使用的模型
pub const PARSE_MODEL: &str = "gpt-4o-mini-2024-07-18";

fn with_retry(client: ChatClient, cfg: &LlmSection) -> ChatClient {
    client
        .with_max_retries(cfg.max_retries)
        .with_retry_base(Duration::from_secs(cfg.retry_base_secs))
}

fn openai_client(cfg: &LlmSection, default_model: &str) -> ChatClient {
    let key = cfg.openai_key();
    let provider = OpenAiProvider::new(cfg.openai_base_url.as_deref(), key.as_deref());
    with_retry(ChatClient::new(Arc::new(provider), default_model), cfg)
}

/// 选择 `provider` 对应的适配器；Anthropic 在有 OpenAI Key 时注入解析客户端
pub fn build_chat_client(cfg: &LlmSection, default_model: &str) -> Result<ChatClient, LlmError> {
    let timeout = Duration::from_secs(cfg.request_timeout_secs);
    let provider: Arc<dyn ChatProvider> = match cfg.provider {
        Provider::OpenAi => return Ok(openai_client(cfg, default_model)),
        Provider::Anthropic => {
            let limits = AnthropicLimits {
                thinking_model_max_tokens: cfg.thinking_model_max_tokens,
                basic_model_max_tokens: cfg.basic_model_max_tokens,
                max_thinking_budget_tokens: cfg.max_thinking_budget_tokens,
            };
            let key = cfg.anthropic_key();
            let mut provider = AnthropicProvider::new(
                cfg.anthropic_base_url.as_deref(),
                key.as_deref(),
                limits,
                timeout,
            )?;
            if cfg.openai_key().is_some() {
                provider = provider.with_parse_client(Arc::new(openai_client(cfg, PARSE_MODEL)));
            } else {
                tracing::warn!("OPENAI_API_KEY is not set; Anthropic structured output is returned unparsed");
            }
            Arc::new(provider)
        }
        Provider::Google => {
            let key = cfg.google_key();
            Arc::new(GoogleProvider::new(
                cfg.google_base_url.as_deref(),
                key.as_deref(),
                timeout,
            )?)
        }
    };
    Ok(with_retry(ChatClient::new(provider, default_model), cfg))
}

/// 嵌入客户端（始终走 OpenAI 兼容端点）
pub fn build_embedder(llm: &LlmSection, cfg: &EmbeddingSection) -> OpenAiEmbedder {
    let key = llm.openai_key();
    OpenAiEmbedder::new(llm.openai_base_url.as_deref(), &cfg.model, key.as_deref())
        .with_dimensions(cfg.dimension)
}
