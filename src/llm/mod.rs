//! LLM 层：供应商抽象、三个适配器、网关、计费、嵌入与 Mock

pub mod anthropic;
pub mod client;
pub mod cost;
pub mod embedding;
pub mod factory;
pub mod google;
pub mod mock;
pub mod models;
pub mod openai;
pub mod traits;

pub use anthropic::{AnthropicLimits, AnthropicProvider};
pub use client::{ChatClient, ChatOptions, ChatResponse};
pub use cost::{calculate_cost, chat_cost, embedding_cost, CostMeter, Rate, TokenCounts};
pub use embedding::{Embedder, Embeddings, OpenAiEmbedder};
pub use factory::{build_chat_client, build_embedder};
pub use google::GoogleProvider;
pub use mock::ScriptedChatProvider;
pub use models::{
    is_reasoning_model, is_stable_reasoning_model, is_thinking_model, GPT_MAX_TOKENS,
    REASONING_MAX_TOKENS,
};
pub use openai::OpenAiProvider;
pub use traits::{
    ChatProvider, ChatRequest, Provider, ProviderReply, ReasoningEffort, ResponseSchema,
};
