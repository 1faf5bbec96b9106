//! 嵌入 API：供向量库查询与写入使用，调用 OpenAI 兼容的 /embeddings 端点

use async_openai::config::OpenAIConfig;
use async_openai::types::embeddings::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_openai::Client;
use async_trait::async_trait;

use crate::core::LlmError;

use super::cost::{embedding_cost, CostMeter};
use super::Provider;

/// 一批文本的向量与本次费用
#[derive(Debug, Clone, Default)]
pub struct Embeddings {
    pub vectors: Vec<Vec<f32>>,
    pub cost: f64,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Embeddings, LlmError>;

    /// 累计费用
    fn total_cost(&self) -> f64 {
        0.0
    }
}

/// 使用 async-openai 调用 embeddings API
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: Option<u32>,
    meter: CostMeter,
}

impl OpenAiEmbedder {
    /// 与 LLM 共用 OPENAI_API_KEY / base_url
    pub fn new(base_url: Option<&str>, model: &str, api_key: Option<&str>) -> Self {
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
            model: model.to_string(),
            dimensions: None,
            meter: CostMeter::new(),
        }
    }

    pub fn with_dimensions(mut self, dimensions: u32) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    fn error(message: impl ToString) -> LlmError {
        LlmError::Request {
            provider: Provider::OpenAi,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Embeddings, LlmError> {
        if texts.is_empty() {
            return Ok(Embeddings::default());
        }
        let mut args = CreateEmbeddingRequestArgs::default();
        args.model(&self.model)
            .input(EmbeddingInput::StringArray(texts.to_vec()));
        if let Some(d) = self.dimensions {
            args.dimensions(d);
        }
        let request = args.build().map_err(|e| LlmError::Config(e.to_string()))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(Self::error)?;

        let cost = embedding_cost(&self.model, response.usage.prompt_tokens as u64);
        self.meter.add(cost);

        let mut data = response.data;
        data.sort_by_key(|e| e.index);
        Ok(Embeddings {
            vectors: data.into_iter().map(|e| e.embedding).collect(),
            cost,
        })
    }

    fn total_cost(&self) -> f64 {
        self.meter.total()
    }
}
