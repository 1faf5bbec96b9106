//! 文档合规检查：调用点参数必须出现在检索到的 PennyLane 文档中

use std::sync::Arc;

use serde_json::{json, Value};

use crate::core::ResearchResult;
use crate::llm::ChatClient;
use crate::prompts::{docs_validate_prompt, format_doc_reference};
use crate::research::parser::{structured_chat, StageCall};
use crate::research::types::DocsValidateResultList;
use crate::store::{QueryMatch, VectorStore};

pub struct DocsChecker {
    client: Arc<ChatClient>,
    store: Arc<dyn VectorStore>,
}

/// 按调用名精确过滤
pub fn call_name_filter(call_names: &[String]) -> Value {
    let any: Vec<Value> = call_names.iter().map(|n| json!({ "call_name": n })).collect();
    json!({ "$or": any })
}

/// 每个调用名约取 1.5 条文档
pub fn docs_top_k(n_call_names: usize) -> usize {
    n_call_names * 3 / 2
}

pub fn format_references(hits: &[QueryMatch]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            format_doc_reference(
                i + 1,
                hit.meta_str("file_path"),
                hit.meta_str("class_name"),
                hit.meta_str("chunk_text"),
            )
        })
        .collect()
}

impl DocsChecker {
    pub fn new(client: Arc<ChatClient>, store: Arc<dyn VectorStore>) -> Self {
        Self { client, store }
    }

    /// 返回 (错误列表, 费用)
    pub async fn check(
        &self,
        calls: &[String],
        call_names: &[String],
        model: &str,
        parser_model: &str,
    ) -> ResearchResult<(Vec<String>, f64)> {
        if calls.is_empty() || call_names.is_empty() {
            tracing::info!("pennylane_doc: No PennyLane call is found.");
            return Ok((Vec::new(), 0.0));
        }
        let methods = format!("- {}", calls.join("\n- "));
        let hits = self
            .store
            .query(&methods, docs_top_k(call_names.len()), Some(call_name_filter(call_names)))
            .await?;

        let prompt = docs_validate_prompt(&methods, &format_references(&hits));
        let out = structured_chat::<DocsValidateResultList>(
            &self.client,
            parser_model,
            StageCall {
                prompt: &prompt,
                history: &[],
                n_history: None,
                model,
                temperature: 0.0,
            },
        )
        .await?;

        let errors = out.value.error_messages();
        if errors.is_empty() {
            tracing::info!("pennylane_doc: Feature map is valid.");
        } else {
            tracing::info!("pennylane_doc: Feature map is invalid. Error Messages: {:?}", errors);
        }
        Ok((errors, out.cost))
    }
}
