//! 代码生成：想法 → 基于模板的特征映射类

use std::sync::Arc;
use std::time::Duration;

use crate::core::{ResearchResult, RetryError, RetryPolicy};
use crate::llm::ChatClient;
use crate::memory::Message;
use crate::prompts::{code_prompt, PromptPair};

use super::parser::{structured_chat, StageCall, Structured};
use super::types::{GeneratedIdea, GeneratedImpl};

pub struct CodeGenerator {
    client: Arc<ChatClient>,
    model: String,
    parser_model: String,
}

impl CodeGenerator {
    pub fn new(client: Arc<ChatClient>, model: impl Into<String>, parser_model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            parser_model: parser_model.into(),
        }
    }

    /// 温度固定为 0；返回的代码已去掉围栏
    pub async fn generate(
        &self,
        prompt: &PromptPair,
        history: &[Message],
        n_history: Option<usize>,
    ) -> ResearchResult<Structured<GeneratedImpl>> {
        let out = structured_chat::<GeneratedImpl>(
            &self.client,
            &self.parser_model,
            StageCall {
                prompt,
                history,
                n_history,
                model: &self.model,
                temperature: 0.0,
            },
        )
        .await?;
        tracing::info!("Generate Code is done ({}).", out.value.class_name);
        Ok(out)
    }
}

/// 逐个想法生成代码的参数
pub struct CodeBatch<'a> {
    pub last_code: &'a str,
    pub operations: &'a str,
    pub n_qubits: usize,
    pub n_history: Option<usize>,
}

/// 单个想法失败时的重试：3 次，间隔 3 秒
pub fn default_code_retry() -> RetryPolicy {
    RetryPolicy::fixed(3, Duration::from_secs(3))
}

/// 依次为每个想法生成代码；代码对话线程在想法之间延续
///
/// 返回 (实现列表, 对话线程, 费用)
pub async fn generate_code(
    generator: &CodeGenerator,
    retry: &RetryPolicy,
    ideas: &[GeneratedIdea],
    batch: &CodeBatch<'_>,
    history: &[Message],
) -> ResearchResult<(Vec<GeneratedImpl>, Vec<Message>, f64)> {
    let mut history = history.to_vec();
    let mut implements = Vec::with_capacity(ideas.len());
    let mut total_cost = 0.0;

    for (i, idea) in ideas.iter().enumerate() {
        tracing::info!("Generate Feature Map Code ({}/{})...", i + 1, ideas.len());
        let prompt = code_prompt(
            batch.last_code,
            &idea.for_code_generation(),
            batch.operations,
            batch.n_qubits,
        );
        let (prompt, thread, n_history) = (&prompt, &history, batch.n_history);
        let out = retry
            .run(
                move |_attempt| generator.generate(prompt, thread, n_history),
                |_| true,
            )
            .await
            .map_err(|e| match e {
                RetryError::Fatal(e) => e,
                RetryError::Exhausted { last, .. } => last,
            })?;
        total_cost += out.cost;
        history = out.history;
        implements.push(out.value);
    }
    Ok((implements, history, total_cost))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedChatProvider;
    use serde_json::json;

    fn idea(name: &str) -> GeneratedIdea {
        GeneratedIdea {
            feature_map_name: name.into(),
            summary: "s".into(),
            explanation: format!("{} explanation", name),
            formula: "f".into(),
            key_sentences: vec![],
        }
    }

    #[tokio::test]
    async fn test_history_carries_across_ideas() {
        let provider = Arc::new(ScriptedChatProvider::new());
        provider
            .push(
                "GeneratedImpl",
                json!({"class_name": "A", "code": "```python\nclass A:\n    pass\n```"}).to_string(),
            )
            .push(
                "GeneratedImpl",
                json!({"class_name": "B", "code": "class B:\n    pass\n"}).to_string(),
            );
        let client = Arc::new(ChatClient::new(provider.clone(), "gpt-4o-mini"));
        let generator = CodeGenerator::new(client, "gpt-4o-mini", "gpt-4o-mini");
        let batch = CodeBatch {
            last_code: "class Seed:\n    pass\n",
            operations: "qml.RX",
            n_qubits: 8,
            n_history: Some(1),
        };

        let (impls, history, _) = generate_code(
            &generator,
            &RetryPolicy::immediate(3),
            &[idea("First"), idea("Second")],
            &batch,
            &[],
        )
        .await
        .unwrap();

        assert_eq!(impls[0].code, "class A:\n    pass");
        assert_eq!(impls[1].class_name, "B");
        assert_eq!(history.len(), 4);

        let requests = provider.requests();
        assert!(requests[0].system_prompt.contains("class Seed:"));
        assert!(requests[1].user_prompt.contains("Second explanation"));
        assert_eq!(requests[1].history.len(), 2);
        assert_eq!(requests[1].temperature, Some(0.0));
    }

    #[tokio::test]
    async fn test_malformed_reply_is_retried_then_fails() {
        let provider = Arc::new(ScriptedChatProvider::new());
        provider.push("GeneratedImpl", "not json");
        let client = Arc::new(ChatClient::new(provider.clone(), "gpt-4o-mini"));
        let generator = CodeGenerator::new(client, "gpt-4o-mini", "gpt-4o-mini");
        let batch = CodeBatch {
            last_code: "",
            operations: "",
            n_qubits: 4,
            n_history: None,
        };

        let err = generate_code(&generator, &RetryPolicy::immediate(3), &[idea("X")], &batch, &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("GeneratedImpl"));
        assert_eq!(provider.call_count(), 3);
    }
}
