//! 试验编排：评审 → 生成 → 验证 → 基准运行 → 折叠上下文
//!
//! 单个想法失败只记一条占位行，不中断本轮；整轮失败时记录错误并结束循环，
//! 返回此前累积的上下文。

use std::sync::Arc;

use crate::core::{ContextPatch, MessageHistory, ResearchResult, RunContext, TrialOutcome};
use crate::harness::{write_trial_config, EvalRow, ExperimentConfig, ExperimentHarness, ResultTable, RunMode};
use crate::llm::ChatClient;
use crate::validation::CodeValidator;

use super::generation::FeatureMapGenerator;
use super::review::{IdeaReviewer, PerformanceReviewer, ReviewRequest};
use super::types::{GeneratedResult, COMPLETED};

/// 一轮试验的去向
#[derive(Debug)]
enum TrialStep {
    Continue(RunContext),
    Halt(RunContext),
}

pub struct Orchestrator {
    client: Arc<ChatClient>,
    generator: FeatureMapGenerator,
    validator: CodeValidator,
    harness: Arc<dyn ExperimentHarness>,
    base_config: ExperimentConfig,
    module_root: String,
    performance: PerformanceReviewer,
}

impl Orchestrator {
    pub fn new(
        client: Arc<ChatClient>,
        generator: FeatureMapGenerator,
        validator: CodeValidator,
        harness: Arc<dyn ExperimentHarness>,
        base_config: ExperimentConfig,
        module_root: impl Into<String>,
    ) -> Self {
        Self {
            client,
            generator,
            validator,
            harness,
            base_config,
            module_root: module_root.into(),
            performance: PerformanceReviewer::default(),
        }
    }

    pub fn with_performance_reviewer(mut self, performance: PerformanceReviewer) -> Self {
        self.performance = performance;
        self
    }

    /// 运行全部试验，返回最终上下文；不向外抛错
    pub async fn run(&self, ctx: RunContext) -> RunContext {
        let mut ctx = ctx;
        if let Err(e) = self.prepare_dirs(&ctx).await {
            tracing::error!("Failed to prepare output directories: {}", e);
            return ctx;
        }

        for trial_num in 1..=ctx.max_trial_num {
            tracing::info!("Trial {} / {} starts.", trial_num, ctx.max_trial_num);
            match self.run_trial(trial_num, &ctx).await {
                Ok(TrialStep::Continue(next)) => ctx = next,
                Ok(TrialStep::Halt(next)) => {
                    ctx = next;
                    break;
                }
                Err(e) => {
                    tracing::error!("Trial {} failed: {}", trial_num, e);
                    break;
                }
            }
        }

        tracing::info!("All trials are done. Total Cost: ${:.2}", ctx.total_cost);
        ctx
    }

    async fn prepare_dirs(&self, ctx: &RunContext) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&ctx.gen_config_dir).await?;
        tokio::fs::create_dir_all(&ctx.gen_code_dir).await
    }

    async fn run_trial(&self, trial_num: usize, ctx: &RunContext) -> ResearchResult<TrialStep> {
        let mut cost = 0.0;
        let mut ctx = ctx.clone();

        if ctx.need_idea_review {
            let (next, review_cost) = self.review_last_trial(trial_num, &ctx).await?;
            cost += review_cost;
            ctx = next;
            if ctx.review_comment == COMPLETED {
                tracing::info!("Work is done. No more suggestions for improvement.");
                let done = ctx.apply(ContextPatch {
                    total_cost: Some(ctx.total_cost + cost),
                    ..ContextPatch::default()
                });
                return Ok(TrialStep::Halt(done));
            }
        }

        let generation = self.generator.generate(trial_num, &ctx).await?;
        cost += generation.cost;

        let mut results = Vec::with_capacity(generation.results.len());
        let mut rows = ResultTable::new();
        for (i, result) in generation.results.into_iter().enumerate() {
            let idea_id = format!("{}_{}", trial_num, i + 1);
            let mut idea_cost = 0.0;
            let evaluated = self.evaluate_idea(&ctx, &idea_id, &result, &mut idea_cost).await;
            cost += idea_cost;
            match evaluated {
                Ok((validated, row)) => {
                    results.push(validated);
                    rows.push(row);
                }
                Err(e) => {
                    tracing::error!("Idea {} failed: {}", idea_id, e);
                    results.push(result);
                    rows.push(EvalRow::dummy(idea_id));
                }
            }
        }

        let outcome = TrialOutcome {
            results,
            rows,
            message_history: generation.message_history,
            cost,
        };
        let next = ctx.advance(&outcome);
        tracing::info!("Trial {} is done. [COST]: ${:.2}", trial_num, cost);
        tracing::info!("Evaluation Result:\n{}", next.eval_results);
        Ok(TrialStep::Continue(next))
    }

    /// 评审上一轮；评审线程与评审意见写回上下文
    async fn review_last_trial(&self, trial_num: usize, ctx: &RunContext) -> ResearchResult<(RunContext, f64)> {
        let models = &ctx.model_versions;
        let performance = self.performance.review(&ctx.eval_results, &ctx.score_list);
        let reviewer = IdeaReviewer::new(self.client.clone(), &models.review, &models.parser);
        let out = reviewer
            .review(
                &ReviewRequest {
                    max_suggestion_num: ctx.max_suggestion_num,
                    last_trial_num: trial_num.saturating_sub(1),
                    last_trial_results: &ctx.last_trial_results,
                    performance_review: performance.as_deref(),
                },
                &ctx.message_history.review,
                ctx.n_message_history.review,
            )
            .await?;

        let next = ctx.apply(ContextPatch {
            message_history: Some(MessageHistory {
                review: out.history,
                ..ctx.message_history.clone()
            }),
            review_comment: Some(out.value.review_comment()),
            ..ContextPatch::default()
        });
        Ok((next, out.cost))
    }

    /// 验证、落盘、写配置、正式运行；返回采纳的结果与结果行
    ///
    /// 验证费用记入 `spent`，后续步骤失败也不丢。
    async fn evaluate_idea(
        &self,
        ctx: &RunContext,
        idea_id: &str,
        result: &GeneratedResult,
        spent: &mut f64,
    ) -> ResearchResult<(GeneratedResult, EvalRow)> {
        let validated = self.validator.validate(ctx, result, spent).await?;

        let code_path = ctx.gen_code_dir.join(format!("feature_map_{}.py", idea_id));
        tokio::fs::write(&code_path, &validated.implement.code).await?;
        tracing::info!("Saved feature map to {}", code_path.display());

        let config_path = write_trial_config(
            &self.base_config,
            &ctx.gen_config_dir,
            &self.module_root,
            self.harness.name(),
            idea_id,
            &validated.implement.class_name,
            &validated.idea.summary,
        )?;
        let outcome = self.harness.run(&config_path, RunMode::Record).await?;
        for w in &outcome.warnings {
            tracing::warn!("Idea {}: {}", idea_id, w);
        }
        let row = outcome.to_row(idea_id);
        Ok((validated, row))
    }
}
