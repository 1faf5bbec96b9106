//! 一次试验的生成阶段：构思 → 评分/反思 → 代码生成

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::{MessageHistory, ResearchResult, RetryPolicy, RunContext};
use crate::llm::ChatClient;
use crate::prompts::{pennylane_operations, IdeaPromptInput, PENNYLANE_VERSION};
use crate::store::VectorStore;

use super::code::{default_code_retry, generate_code, CodeBatch, CodeGenerator};
use super::idea::IdeaGenerator;
use super::reflection::{IdeaReflector, Reflection};
use super::scoring::{score_with_literature, IdeaScorer, MAX_SCORING_ROUND};
use super::summary::{PaperSummarizer, RelatedPapers};
use super::types::GeneratedResult;

/// 生成阶段的产出
#[derive(Debug, Clone)]
pub struct Generation {
    pub results: Vec<GeneratedResult>,
    pub message_history: MessageHistory,
    pub cost: f64,
}

pub struct FeatureMapGenerator {
    client: Arc<ChatClient>,
    arxiv: Option<Arc<dyn VectorStore>>,
    paper_dir: Option<PathBuf>,
    summarize_papers: bool,
    code_retry: RetryPolicy,
}

impl FeatureMapGenerator {
    pub fn new(client: Arc<ChatClient>, arxiv: Option<Arc<dyn VectorStore>>) -> Self {
        Self {
            client,
            arxiv,
            paper_dir: None,
            summarize_papers: true,
            code_retry: default_code_retry(),
        }
    }

    pub fn with_papers(mut self, paper_dir: Option<PathBuf>, summarize: bool) -> Self {
        self.paper_dir = paper_dir;
        self.summarize_papers = summarize;
        self
    }

    pub fn with_code_retry(mut self, retry: RetryPolicy) -> Self {
        self.code_retry = retry;
        self
    }

    pub async fn generate(&self, trial_num: usize, ctx: &RunContext) -> ResearchResult<Generation> {
        let models = &ctx.model_versions;
        let store = self.arxiv.as_deref();
        let mut cost = 0.0;

        let input = IdeaPromptInput {
            max_trial_num: ctx.max_trial_num,
            trial_num,
            idea_num: ctx.max_idea_num,
            device_n_qubit: ctx.n_qubits,
        };
        let ideas = IdeaGenerator::new(self.client.clone(), &models.idea, &models.parser)
            .generate(
                &input,
                &ctx.review_comment,
                &ctx.message_history.idea,
                ctx.n_message_history.idea,
            )
            .await?;
        cost += ideas.cost;

        let mut candidates = ideas.value.results;
        if candidates.len() > ctx.max_idea_num {
            candidates.truncate(ctx.max_idea_num);
        } else if candidates.len() < ctx.max_idea_num {
            tracing::warn!(
                "Only {} of {} ideas were generated",
                candidates.len(),
                ctx.max_idea_num
            );
        }

        let scorer = IdeaScorer::new(self.client.clone(), &models.scoring);
        let reflector = IdeaReflector::new(self.client.clone(), &models.reflection, &models.parser);
        let summarizer = self
            .summarize_papers
            .then(|| PaperSummarizer::new(self.client.clone(), &models.summary));
        let papers = RelatedPapers::new(self.paper_dir.clone(), summarizer);
        let reflection = Reflection {
            reflector: &reflector,
            scorer: &scorer,
            papers: &papers,
            store,
        };

        let mut finalized = Vec::with_capacity(candidates.len());
        for idea in candidates {
            let (first, c) =
                score_with_literature(&scorer, store, &idea, MAX_SCORING_ROUND, &ctx.score_histories).await?;
            cost += c;

            if ctx.max_reflection_round > 0 {
                let (idea, score, c) = reflection
                    .run(
                        &idea,
                        &first.score,
                        ctx.max_reflection_round,
                        ctx.n_message_history.idea,
                        &ctx.score_histories,
                    )
                    .await?;
                cost += c;
                finalized.push((idea, score));
            } else {
                finalized.push((idea, first.score));
            }
        }

        let operations = pennylane_operations(PENNYLANE_VERSION)?;
        let coder = CodeGenerator::new(self.client.clone(), &models.code, &models.parser);
        let batch = CodeBatch {
            last_code: &ctx.last_code,
            operations,
            n_qubits: ctx.n_qubits,
            n_history: ctx.n_message_history.code,
        };
        let finalized_ideas: Vec<_> = finalized.iter().map(|(idea, _)| idea.clone()).collect();
        let (implements, code_history, c) = generate_code(
            &coder,
            &self.code_retry,
            &finalized_ideas,
            &batch,
            &ctx.message_history.code,
        )
        .await?;
        cost += c;

        let results = finalized
            .into_iter()
            .zip(implements)
            .map(|((idea, score), implement)| GeneratedResult {
                idea,
                score,
                implement,
            })
            .collect();

        Ok(Generation {
            results,
            message_history: MessageHistory {
                review: ctx.message_history.review.clone(),
                idea: ideas.history,
                code: code_history,
            },
            cost,
        })
    }
}
