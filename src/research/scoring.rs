//! 评分服务与文献检索评分循环

use std::sync::Arc;

use serde_json::json;

use crate::core::{ResearchError, ResearchResult};
use crate::llm::{is_reasoning_model, ChatClient};
use crate::memory::Message;
use crate::prompts::{scoring_prompt, NOT_PROVIDED_INFORMATION};
use crate::store::{QueryMatch, VectorStore};

use super::parser::{structured_chat, StageCall};
use super::types::{GeneratedIdea, ScoringResult};

/// 评分最多轮数
pub const MAX_SCORING_ROUND: usize = 3;
/// 每个关键句检索的论文数
pub const MAX_PAPER_PER_QUERY: usize = 1;

const PAPER_SEPARATOR: &str = "\n--------------";

pub struct IdeaScorer {
    client: Arc<ChatClient>,
    model: String,
}

impl IdeaScorer {
    pub fn new(client: Arc<ChatClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// 单轮评分；推理系列不支持
    #[allow(clippy::too_many_arguments)]
    pub async fn score(
        &self,
        idea: &GeneratedIdea,
        related_work: &str,
        history: &[Message],
        n_history: Option<usize>,
        round: usize,
        max_round: usize,
        score_histories: &str,
    ) -> ResearchResult<(ScoringResult, Vec<Message>, f64)> {
        tracing::info!("Scoring Idea...");
        if is_reasoning_model(&self.model) {
            return Err(ResearchError::Other(
                "Scoring Idea is not supported in O1 series".into(),
            ));
        }
        let prompt = scoring_prompt(score_histories, &idea.explanation, related_work, round, max_round);
        let out = structured_chat::<ScoringResult>(
            &self.client,
            &self.model,
            StageCall {
                prompt: &prompt,
                history,
                n_history,
                model: &self.model,
                temperature: 0.0,
            },
        )
        .await?;
        let score = &out.value.score;
        tracing::info!(
            "[Round {}/{}] Scoring Idea is done (originality={}, feasibility={}, versatility={}).",
            round,
            max_round,
            score.originality.score,
            score.feasibility.score,
            score.versatility.score
        );
        Ok((out.value, out.history, out.cost))
    }
}

/// 检索结果格式化为相关文献段落
pub fn format_related_paper(hit: &QueryMatch) -> String {
    format!(
        "\nPaper Id: {}\nAbstract: {}\nReleted Chunk: {}\n",
        hit.id,
        hit.meta_str("abstract"),
        hit.meta_str("chunk_text")
    )
}

/// 文献检索 + 多轮评分
///
/// 每轮用当前关键句检索（排除已见过的论文），信息不足时换用模型给出的补充关键句再评一轮，
/// 最多 max_round 轮。没有文献库时相关文献为固定的“未提供”文本。
pub async fn score_with_literature(
    scorer: &IdeaScorer,
    store: Option<&dyn VectorStore>,
    idea: &GeneratedIdea,
    max_round: usize,
    score_histories: &str,
) -> ResearchResult<(ScoringResult, f64)> {
    let max_round = max_round.max(1);
    let mut total_cost = 0.0;
    let mut key_sentences = idea.key_sentences.clone();
    let mut history: Vec<Message> = Vec::new();
    let mut seen_papers: Vec<String> = Vec::new();
    let mut round = 1;

    loop {
        let related_work = match store {
            Some(store) => {
                let mut papers = Vec::new();
                for query in &key_sentences {
                    let hits = store
                        .query(
                            query,
                            MAX_PAPER_PER_QUERY,
                            Some(json!({"id": {"$nin": seen_papers}})),
                        )
                        .await?;
                    papers.extend(hits.iter().map(format_related_paper));
                    seen_papers.extend(hits.into_iter().map(|h| h.id));
                }
                papers.join(PAPER_SEPARATOR)
            }
            None => NOT_PROVIDED_INFORMATION.to_string(),
        };

        let (result, next_history, cost) = scorer
            .score(idea, &related_work, &history, None, round, max_round, score_histories)
            .await?;
        total_cost += cost;
        history = next_history;

        if result.is_lack_information && round < max_round {
            tracing::info!("Lack of information. Retry to get related work information.");
            key_sentences = result.additional_key_sentences.clone();
            round += 1;
        } else {
            return Ok((result, total_cost));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedChatProvider;
    use crate::store::InMemoryStore;

    fn idea() -> GeneratedIdea {
        GeneratedIdea {
            feature_map_name: "Layered".into(),
            summary: "layered angle encoding".into(),
            explanation: "rotations then ring entanglement".into(),
            formula: "U(x)".into(),
            key_sentences: vec!["angle encoding".into(), "ring entanglement".into()],
        }
    }

    fn scoring(lack: bool, extra: &[&str]) -> String {
        json!({
            "score": {
                "originality": {"score": 6.0, "reason": "r"},
                "feasibility": {"score": 7.0, "reason": "r"},
                "versatility": {"score": 5.0, "reason": "r"}
            },
            "is_lack_information": lack,
            "additional_key_sentences": extra
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_retries_with_additional_key_sentences_and_excludes_seen() {
        let provider = Arc::new(ScriptedChatProvider::new());
        provider
            .push("ScoringResult", scoring(true, &["kernel alignment"]))
            .push("ScoringResult", scoring(false, &[]));
        let client = Arc::new(ChatClient::new(provider.clone(), "gpt-4o-mini"));
        let scorer = IdeaScorer::new(client, "gpt-4o-mini");

        let store = InMemoryStore::new();
        store.insert("p1", "angle encoding", json!({"abstract": "A1", "chunk_text": "c1"}));
        store.insert("p2", "ring entanglement", json!({"abstract": "A2", "chunk_text": "c2"}));
        store.insert("p3", "kernel alignment", json!({"abstract": "A3", "chunk_text": "c3"}));

        let (result, _) = score_with_literature(&scorer, Some(&store), &idea(), 3, "")
            .await
            .unwrap();
        assert!(!result.is_lack_information);
        assert_eq!(result.score.feasibility.score, 7.0);

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].user_prompt.contains("Paper Id: p1"));
        assert!(requests[0].user_prompt.contains("Paper Id: p2"));
        assert!(requests[1].user_prompt.contains("Paper Id: p3"));
        assert!(!requests[1].user_prompt.contains("Paper Id: p1"));
        // 第二轮携带第一轮对话
        assert_eq!(requests[1].history.len(), 2);
    }

    #[tokio::test]
    async fn test_without_store_uses_marker_and_stops_at_max_round() {
        let provider = Arc::new(ScriptedChatProvider::new());
        provider.push("ScoringResult", scoring(true, &["more"]));
        let client = Arc::new(ChatClient::new(provider.clone(), "gpt-4o-mini"));
        let scorer = IdeaScorer::new(client, "gpt-4o-mini");

        let (result, _) = score_with_literature(&scorer, None, &idea(), 2, "")
            .await
            .unwrap();
        assert!(result.is_lack_information);
        assert_eq!(provider.call_count(), 2);
        assert!(provider.requests()[0].user_prompt.contains(NOT_PROVIDED_INFORMATION));
    }

    #[tokio::test]
    async fn test_reasoning_model_is_rejected() {
        let provider = Arc::new(ScriptedChatProvider::new());
        let client = Arc::new(ChatClient::new(provider.clone(), "o1-mini"));
        let scorer = IdeaScorer::new(client, "o1-mini");
        let err = scorer
            .score(&idea(), "", &[], None, 1, 3, "")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not supported"));
        assert_eq!(provider.call_count(), 0);
    }
}
