//! LLM 网关
//!
//! 所有阶段都只通过 `ChatClient::parse_chat` 访问模型：
//! 截断历史 → 规整请求 → 有界重试调用适配器 → 计费 → 返回 (content, 新历史, cost)。

use std::sync::Arc;
use std::time::Duration;

use crate::core::{LlmError, RetryError, RetryPolicy};
use crate::memory::{extend_history, last_n_history, Message};

use super::cost::{chat_cost, CostMeter};
use super::models::is_reasoning_model;
use super::traits::{ChatProvider, ChatRequest, Provider, ReasoningEffort, ResponseSchema};

/// 单次调用参数；未设置的项取客户端默认值
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub n_history: Option<usize>,
    pub temperature: f32,
    pub n: u8,
    pub max_tokens: Option<u32>,
    pub response_format: Option<ResponseSchema>,
    pub model_version: Option<String>,
    pub max_retries: Option<usize>,
    pub reasoning_effort: Option<ReasoningEffort>,
    pub max_thinking_tokens: Option<u32>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            n_history: None,
            temperature: 0.0,
            n: 1,
            max_tokens: None,
            response_format: None,
            model_version: None,
            max_retries: None,
            reasoning_effort: None,
            max_thinking_tokens: None,
        }
    }
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_history(mut self, n_history: Option<usize>) -> Self {
        self.n_history = n_history;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn response_format(mut self, schema: ResponseSchema) -> Self {
        self.response_format = Some(schema);
        self
    }

    pub fn model_version(mut self, model: impl Into<String>) -> Self {
        self.model_version = Some(model.into());
        self
    }

    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn reasoning_effort(mut self, effort: ReasoningEffort) -> Self {
        self.reasoning_effort = Some(effort);
        self
    }

    pub fn max_thinking_tokens(mut self, tokens: u32) -> Self {
        self.max_thinking_tokens = Some(tokens);
        self
    }
}

/// 网关返回
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    /// 完整线程（未截断）+ 本轮 user/assistant
    pub history: Vec<Message>,
    pub cost: f64,
}

/// 与供应商无关的聊天网关；费用按实例累计
pub struct ChatClient {
    provider: Arc<dyn ChatProvider>,
    default_model: String,
    max_retries: usize,
    retry_base: Duration,
    meter: CostMeter,
}

impl ChatClient {
    pub fn new(provider: Arc<dyn ChatProvider>, default_model: impl Into<String>) -> Self {
        Self {
            provider,
            default_model: default_model.into(),
            max_retries: 3,
            retry_base: Duration::from_secs(60),
            meter: CostMeter::new(),
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// 退避基数（第 k 次失败后等待 base * 2^k）；测试中设为 0
    pub fn with_retry_base(mut self, base: Duration) -> Self {
        self.retry_base = base;
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider.kind()
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn total_cost(&self) -> f64 {
        self.meter.total()
    }

    /// 规整为单次请求：推理系列不传 temperature
    fn build_request(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        history: &[Message],
        opts: &ChatOptions,
    ) -> ChatRequest {
        let model = opts
            .model_version
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.default_model.clone());
        let temperature = if is_reasoning_model(&model) {
            None
        } else {
            Some(opts.temperature)
        };
        ChatRequest {
            model,
            system_prompt: system_prompt.to_string(),
            user_prompt: user_prompt.to_string(),
            history: last_n_history(history, opts.n_history),
            temperature,
            n: opts.n.max(1),
            max_tokens: opts.max_tokens,
            response_format: opts.response_format.clone(),
            reasoning_effort: opts.reasoning_effort,
            max_thinking_tokens: opts.max_thinking_tokens,
        }
    }

    pub async fn parse_chat(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        history: &[Message],
        opts: &ChatOptions,
    ) -> Result<ChatResponse, LlmError> {
        let request = self.build_request(system_prompt, user_prompt, history, opts);
        let kind = self.provider.kind();
        let policy = RetryPolicy::exponential(
            opts.max_retries.unwrap_or(self.max_retries),
            self.retry_base,
        );

        tracing::debug!(
            provider = %kind,
            model = %request.model,
            history = request.history.len(),
            "chat request"
        );

        let provider = Arc::clone(&self.provider);
        let reply = policy
            .run(
                |_attempt| {
                    let provider = Arc::clone(&provider);
                    let request = request.clone();
                    async move { provider.complete(&request).await }
                },
                LlmError::is_retryable,
            )
            .await
            .map_err(|e| match e {
                RetryError::Fatal(e) => e,
                RetryError::Exhausted { attempts, last } => LlmError::RetriesExhausted {
                    provider: kind,
                    attempts,
                    last_error: last.to_string(),
                },
            })?;

        let cost = chat_cost(kind, &request.model, reply.usage) + reply.extra_cost;
        self.meter.add(cost);
        tracing::debug!(cost, content = %reply.content, "chat response");

        Ok(ChatResponse {
            history: extend_history(history, user_prompt, &reply.content),
            content: reply.content,
            cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::cost::TokenCounts;
    use crate::llm::traits::ProviderReply;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// 记录请求，前 fail_times 次返回瞬时错误
    struct Flaky {
        fail_times: usize,
        calls: AtomicUsize,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl Flaky {
        fn new(fail_times: usize) -> Self {
            Self {
                fail_times,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatProvider for Flaky {
        fn kind(&self) -> Provider {
            Provider::OpenAi
        }

        async fn complete(&self, request: &ChatRequest) -> Result<ProviderReply, LlmError> {
            self.seen.lock().unwrap().push(request.clone());
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_times {
                return Err(LlmError::Api {
                    provider: Provider::OpenAi,
                    status: 429,
                    body: "rate limited".into(),
                });
            }
            Ok(ProviderReply {
                content: "ok".into(),
                usage: TokenCounts {
                    input: 1_000_000,
                    cached: 0,
                    output: 0,
                },
                extra_cost: 0.0,
            })
        }
    }

    fn client(provider: Arc<Flaky>) -> ChatClient {
        ChatClient::new(provider, "gpt-4o-mini").with_retry_base(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_retries_then_succeeds_and_meters_cost() {
        let provider = Arc::new(Flaky::new(2));
        let client = client(provider.clone());
        let history = vec![Message::user("q0"), Message::assistant("a0")];

        let resp = client
            .parse_chat("sys", "q1", &history, &ChatOptions::new().n_history(Some(0)))
            .await
            .unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert_eq!(resp.content, "ok");
        assert_eq!(resp.history.len(), 4);
        assert!((resp.cost - 0.15).abs() < 1e-9);
        assert!((client.total_cost() - 0.15).abs() < 1e-9);
        // n_history = 0 时不带历史
        assert!(provider.seen.lock().unwrap()[0].history.is_empty());
    }

    #[tokio::test]
    async fn test_exhaustion_reports_provider_and_attempts() {
        let provider = Arc::new(Flaky::new(usize::MAX));
        let client = client(provider.clone());

        let err = client
            .parse_chat("sys", "q", &[], &ChatOptions::new().max_retries(4))
            .await
            .unwrap_err();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
        match err {
            LlmError::RetriesExhausted {
                provider, attempts, ..
            } => {
                assert_eq!(provider, Provider::OpenAi);
                assert_eq!(attempts, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_reasoning_model_drops_temperature() {
        let provider = Arc::new(Flaky::new(0));
        let client = client(provider.clone());

        client
            .parse_chat("sys", "q", &[], &ChatOptions::new().temperature(0.8).model_version("o1"))
            .await
            .unwrap();
        client
            .parse_chat("sys", "q", &[], &ChatOptions::new().temperature(0.8))
            .await
            .unwrap();

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].model, "o1");
        assert_eq!(seen[0].temperature, None);
        assert_eq!(seen[1].model, "gpt-4o-mini");
        assert_eq!(seen[1].temperature, Some(0.8));
    }
}
