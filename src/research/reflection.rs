//! 反思：借助相关文献多轮改进一个想法，结束后只评分一次

use std::sync::Arc;

use crate::core::ResearchResult;
use crate::llm::ChatClient;
use crate::memory::Message;
use crate::prompts::{reflection_prompt, PromptPair, NOT_PROVIDED_INFORMATION};
use crate::store::VectorStore;

use super::parser::{structured_chat, StageCall, Structured};
use super::scoring::{score_with_literature, IdeaScorer, MAX_SCORING_ROUND};
use super::summary::RelatedPapers;
use super::types::{GeneratedIdea, IdeaScore, ReflectIdeaResult};

/// 每轮按摘要检索的论文数
pub const MAX_PAPER_PER_REFLECTION: usize = 3;

const PAPER_SEPARATOR: &str = "\n--------------";

pub struct IdeaReflector {
    client: Arc<ChatClient>,
    model: String,
    parser_model: String,
}

impl IdeaReflector {
    pub fn new(client: Arc<ChatClient>, model: impl Into<String>, parser_model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            parser_model: parser_model.into(),
        }
    }

    pub async fn reflect(
        &self,
        prompt: &PromptPair,
        history: &[Message],
        n_history: Option<usize>,
    ) -> ResearchResult<Structured<ReflectIdeaResult>> {
        let out = structured_chat::<ReflectIdeaResult>(
            &self.client,
            &self.parser_model,
            StageCall {
                prompt,
                history,
                n_history,
                model: &self.model,
                temperature: 0.2,
            },
        )
        .await?;
        tracing::info!("Reflected Feature Map Idea is done.");
        tracing::debug!("Reflected Idea: {:?}", out.value.result);
        Ok(out)
    }
}

/// 一次反思所需的服务
pub struct Reflection<'a> {
    pub reflector: &'a IdeaReflector,
    pub scorer: &'a IdeaScorer,
    pub papers: &'a RelatedPapers,
    pub store: Option<&'a dyn VectorStore>,
}

impl Reflection<'_> {
    /// 返回 (最终想法, 最终评分, 费用)
    ///
    /// 模型给出 is_completed 时提前结束；中间轮不评分。
    pub async fn run(
        &self,
        seed_idea: &GeneratedIdea,
        seed_score: &IdeaScore,
        max_round: usize,
        n_history: Option<usize>,
        score_histories: &str,
    ) -> ResearchResult<(GeneratedIdea, IdeaScore, f64)> {
        let mut total_cost = 0.0;
        let mut final_idea = seed_idea.clone();
        let mut history: Vec<Message> = Vec::new();

        for round in 1..=max_round {
            tracing::info!("Reflect Idea ({}/{})...", round, max_round);

            let related_work = match self.store {
                Some(store) => {
                    let hits = store
                        .query(&final_idea.summary, MAX_PAPER_PER_REFLECTION, None)
                        .await?;
                    let (papers, cost) = self.papers.load(&hits).await?;
                    total_cost += cost;
                    papers.join(PAPER_SEPARATOR)
                }
                None => NOT_PROVIDED_INFORMATION.to_string(),
            };

            let prompt = reflection_prompt(
                round,
                max_round,
                &final_idea.to_string(),
                &seed_score.to_string(),
                &related_work,
            );
            let out = self.reflector.reflect(&prompt, &history, n_history).await?;
            total_cost += out.cost;
            history = out.history;
            final_idea = out.value.result;

            if out.value.is_completed {
                tracing::info!("The idea reflection is completed.");
                break;
            }
        }

        let (scoring, cost) = score_with_literature(
            self.scorer,
            self.store,
            &final_idea,
            MAX_SCORING_ROUND,
            score_histories,
        )
        .await?;
        total_cost += cost;
        Ok((final_idea, scoring.score, total_cost))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedChatProvider;
    use serde_json::json;

    fn idea(name: &str) -> serde_json::Value {
        json!({
            "feature_map_name": name,
            "summary": "s",
            "explanation": "e",
            "formula": "f",
            "key_sentences": ["k"]
        })
    }

    fn scoring() -> String {
        json!({
            "score": {
                "originality": {"score": 8.0, "reason": "r"},
                "feasibility": {"score": 7.0, "reason": "r"},
                "versatility": {"score": 6.0, "reason": "r"}
            },
            "is_lack_information": false,
            "additional_key_sentences": []
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_stops_when_completed_and_scores_once() {
        let provider = Arc::new(ScriptedChatProvider::new());
        provider
            .push(
                "ReflectIdeaResult",
                json!({"result": idea("Round1"), "is_completed": false}).to_string(),
            )
            .push(
                "ReflectIdeaResult",
                json!({"result": idea("Round2"), "is_completed": true}).to_string(),
            )
            .push("ScoringResult", scoring());
        let client = Arc::new(ChatClient::new(provider.clone(), "gpt-4o-mini"));
        let reflector = IdeaReflector::new(client.clone(), "gpt-4o-mini", "gpt-4o-mini");
        let scorer = IdeaScorer::new(client, "gpt-4o-mini");
        let papers = RelatedPapers::new(None, None);
        let reflection = Reflection {
            reflector: &reflector,
            scorer: &scorer,
            papers: &papers,
            store: None,
        };

        let seed: GeneratedIdea = serde_json::from_value(idea("Seed")).unwrap();
        let (final_idea, score, _) = reflection
            .run(&seed, &IdeaScore::zero(), 3, None, "")
            .await
            .unwrap();

        assert_eq!(final_idea.feature_map_name, "Round2");
        assert_eq!(score.originality.score, 8.0);
        assert_eq!(provider.calls_for("ReflectIdeaResult"), 2);
        assert_eq!(provider.calls_for("ScoringResult"), 1);

        let requests = provider.requests();
        assert!(requests[0].user_prompt.contains("Round 1/3"));
        assert!(requests[1].user_prompt.contains("Round1"));
        assert_eq!(requests[0].temperature, Some(0.2));
    }
}
