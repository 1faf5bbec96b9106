//! 构思服务

use std::sync::Arc;

use crate::core::ResearchResult;
use crate::llm::ChatClient;
use crate::memory::Message;
use crate::prompts::{idea_prompt, IdeaPromptInput};

use super::parser::{structured_chat, StageCall, Structured};
use super::types::GeneratedIdeaResult;

/// 普通模型构思温度
pub const IDEA_TEMPERATURE: f32 = 0.8;

pub struct IdeaGenerator {
    client: Arc<ChatClient>,
    model: String,
    parser_model: String,
}

impl IdeaGenerator {
    pub fn new(client: Arc<ChatClient>, model: impl Into<String>, parser_model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            parser_model: parser_model.into(),
        }
    }

    pub async fn generate(
        &self,
        input: &IdeaPromptInput,
        review_comment: &str,
        history: &[Message],
        n_history: Option<usize>,
    ) -> ResearchResult<Structured<GeneratedIdeaResult>> {
        tracing::info!("Generating Idea...");
        let prompt = idea_prompt(input, review_comment);
        let out = structured_chat::<GeneratedIdeaResult>(
            &self.client,
            &self.parser_model,
            StageCall {
                prompt: &prompt,
                history,
                n_history,
                model: &self.model,
                temperature: IDEA_TEMPERATURE,
            },
        )
        .await?;
        tracing::info!("Generating Idea is done ({} ideas).", out.value.results.len());
        Ok(out)
    }
}
