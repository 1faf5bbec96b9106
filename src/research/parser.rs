//! 结构化输出：调用网关并把回复解码为目标 schema
//!
//! 普通模型与稳定版推理模型直接携带 response_format；
//! 其余推理模型不支持结构化输出，先取原始文本，再交给解析模型整理成 JSON。

use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use crate::core::{ParseError, ResearchResult};
use crate::llm::{
    is_reasoning_model, is_stable_reasoning_model, ChatClient, ChatOptions, ResponseSchema,
    GPT_MAX_TOKENS, REASONING_MAX_TOKENS,
};
use crate::memory::Message;
use crate::prompts::{parse_json_prompt, PromptPair};
use crate::research::types::strip_code_fence;

/// 把模型回复解码为 T；允许外层包着 ```json 围栏
pub fn decode<T: DeserializeOwned>(schema: &str, content: &str) -> Result<T, ParseError> {
    let body = strip_code_fence(content);
    serde_json::from_str(body.trim()).map_err(|e| ParseError::new(schema, e.to_string()))
}

/// 一次阶段调用
#[derive(Debug, Clone, Copy)]
pub struct StageCall<'a> {
    pub prompt: &'a PromptPair,
    pub history: &'a [Message],
    pub n_history: Option<usize>,
    pub model: &'a str,
    /// 仅对普通模型生效
    pub temperature: f32,
}

/// 阶段调用结果
#[derive(Debug, Clone)]
pub struct Structured<T> {
    pub value: T,
    pub history: Vec<Message>,
    pub cost: f64,
}

/// 解析模型：把任意文本整理为 T 的 JSON
pub async fn reparse<T: JsonSchema + DeserializeOwned>(
    client: &ChatClient,
    parser_model: &str,
    raw: &str,
) -> ResearchResult<(T, f64)> {
    let schema = ResponseSchema::of::<T>();
    tracing::info!("Parse generated result into {}...", schema.name);
    let prompt = parse_json_prompt(raw);
    let opts = ChatOptions::new()
        .n_history(Some(0))
        .max_tokens(GPT_MAX_TOKENS)
        .response_format(schema.clone())
        .model_version(parser_model);
    let response = client.parse_chat(&prompt.system, &prompt.user, &[], &opts).await?;
    let value = decode(&schema.name, &response.content)?;
    Ok((value, response.cost))
}

/// 按模型类型选择直接结构化输出或“原始文本 + 解析模型”
pub async fn structured_chat<T: JsonSchema + DeserializeOwned>(
    client: &ChatClient,
    parser_model: &str,
    call: StageCall<'_>,
) -> ResearchResult<Structured<T>> {
    let schema = ResponseSchema::of::<T>();
    let reasoning = is_reasoning_model(call.model);
    let native = !reasoning || is_stable_reasoning_model(call.model);

    let mut opts = ChatOptions::new()
        .n_history(call.n_history)
        .model_version(call.model);
    opts = if reasoning {
        opts.max_tokens(REASONING_MAX_TOKENS)
    } else {
        opts.temperature(call.temperature).max_tokens(GPT_MAX_TOKENS)
    };
    if native {
        opts = opts.response_format(schema.clone());
    }
    // 不稳定的推理模型不接收 system 文本
    let system = if native { call.prompt.system.as_str() } else { "" };

    tracing::debug!("Input User Prompt: {}", call.prompt.user);
    let response = client
        .parse_chat(system, &call.prompt.user, call.history, &opts)
        .await?;

    let (value, cost) = if native {
        (decode(&schema.name, &response.content)?, response.cost)
    } else {
        let (value, parse_cost) = reparse::<T>(client, parser_model, &response.content).await?;
        (value, response.cost + parse_cost)
    };
    Ok(Structured {
        value,
        history: response.history,
        cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedChatProvider;
    use crate::research::types::ReviewIdeaResult;
    use std::sync::Arc;

    const REVIEW: &str = r#"{"keep_points": ["a"], "suggestions": ["b"]}"#;

    #[test]
    fn test_decode_accepts_fenced_json() {
        let fenced = format!("```json\n{}\n```", REVIEW);
        let r: ReviewIdeaResult = decode("ReviewIdeaResult", &fenced).unwrap();
        assert_eq!(r.keep_points, vec!["a"]);

        let err = decode::<ReviewIdeaResult>("ReviewIdeaResult", "{\"keep_points\": []}").unwrap_err();
        assert_eq!(err.schema, "ReviewIdeaResult");
        assert!(err.message.contains("suggestions"));
    }

    #[tokio::test]
    async fn test_native_schema_for_standard_model() {
        let provider = Arc::new(ScriptedChatProvider::new());
        provider.push("ReviewIdeaResult", REVIEW);
        let client = ChatClient::new(provider.clone(), "gpt-4o-mini");
        let prompt = PromptPair::new("sys", "user");
        let out: Structured<ReviewIdeaResult> = structured_chat(
            &client,
            "gpt-4o-mini-2024-07-18",
            StageCall {
                prompt: &prompt,
                history: &[],
                n_history: None,
                model: "gpt-4o-mini",
                temperature: 0.2,
            },
        )
        .await
        .unwrap();
        assert_eq!(out.value.suggestions, vec!["b"]);
        assert_eq!(out.history.len(), 2);

        let req = &provider.requests()[0];
        assert_eq!(req.temperature, Some(0.2));
        assert_eq!(req.max_tokens, Some(GPT_MAX_TOKENS));
        assert_eq!(req.system_prompt, "sys");
    }

    #[tokio::test]
    async fn test_unstable_reasoning_model_goes_through_parser() {
        let provider = Arc::new(ScriptedChatProvider::new());
        provider.push("", "keep a, suggest b");
        provider.push("ReviewIdeaResult", REVIEW);
        let client = ChatClient::new(provider.clone(), "gpt-4o-mini");
        let prompt = PromptPair::new("sys", "user");
        let out: Structured<ReviewIdeaResult> = structured_chat(
            &client,
            "gpt-4o-mini-2024-07-18",
            StageCall {
                prompt: &prompt,
                history: &[],
                n_history: None,
                model: "o1-mini",
                temperature: 0.2,
            },
        )
        .await
        .unwrap();
        assert_eq!(out.value.keep_points, vec!["a"]);

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].response_format.is_none());
        assert_eq!(requests[0].system_prompt, "");
        assert_eq!(requests[0].temperature, None);
        assert_eq!(requests[0].max_tokens, Some(REASONING_MAX_TOKENS));
        assert_eq!(requests[1].model, "gpt-4o-mini-2024-07-18");
        assert!(requests[1].history.is_empty());
        // 对话线程只保留原始调用
        assert_eq!(out.history[1].content, "keep a, suggest b");
    }
}
