//! 研究策略：前置检查、基线运行、试验循环

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::ValueEnum;

use crate::core::{ContextSeed, ResearchResult, RunContext};
use crate::harness::{ExperimentHarness, RunMode, RunOutcome};
use crate::store::VectorStore;

use super::orchestrator::Orchestrator;

/// 命令行可选的策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyKind {
    /// 量子核分类的特征映射搜索
    QuantumKernel,
}

#[async_trait]
pub trait ResearchStrategy: Send + Sync {
    /// 存储可连通，且运行记录为空
    async fn validate(&self) -> bool;

    /// 用种子配置试运行一次，不写运行记录
    async fn execute_baseline(&self) -> ResearchResult<RunOutcome>;

    async fn execute_experiment(&self) -> RunContext;
}

pub struct QuantumKernelStrategy {
    orchestrator: Orchestrator,
    harness: Arc<dyn ExperimentHarness>,
    arxiv: Option<Arc<dyn VectorStore>>,
    docs: Option<Arc<dyn VectorStore>>,
    baseline_config: PathBuf,
    seed: ContextSeed,
}

impl QuantumKernelStrategy {
    pub fn new(
        orchestrator: Orchestrator,
        harness: Arc<dyn ExperimentHarness>,
        baseline_config: impl Into<PathBuf>,
        seed: ContextSeed,
    ) -> Self {
        Self {
            orchestrator,
            harness,
            arxiv: None,
            docs: None,
            baseline_config: baseline_config.into(),
            seed,
        }
    }

    pub fn with_stores(
        mut self,
        arxiv: Option<Arc<dyn VectorStore>>,
        docs: Option<Arc<dyn VectorStore>>,
    ) -> Self {
        self.arxiv = arxiv;
        self.docs = docs;
        self
    }
}

async fn store_reachable(store: Option<&Arc<dyn VectorStore>>, label: &str) -> bool {
    match store {
        Some(s) if !s.check_connection().await => {
            tracing::error!("{} index is not reachable", label);
            false
        }
        _ => true,
    }
}

#[async_trait]
impl ResearchStrategy for QuantumKernelStrategy {
    async fn validate(&self) -> bool {
        let arxiv_ok = store_reachable(self.arxiv.as_ref(), "arXiv").await;
        let docs_ok = store_reachable(self.docs.as_ref(), "Docs").await;
        if !(arxiv_ok && docs_ok) {
            return false;
        }

        match self.harness.recorded_runs().await {
            Ok(0) => true,
            Ok(n) => {
                tracing::error!(
                    "Experiment {} already has {} recorded runs",
                    self.harness.name(),
                    n
                );
                false
            }
            Err(e) => {
                tracing::error!("Failed to read recorded runs: {}", e);
                false
            }
        }
    }

    async fn execute_baseline(&self) -> ResearchResult<RunOutcome> {
        let outcome = self.harness.run(&self.baseline_config, RunMode::DryRun).await?;
        tracing::info!(
            "Base Score: validation accuracy {:.4}, test accuracy {:.4}",
            outcome.validation.accuracy,
            outcome.test.accuracy
        );
        tracing::debug!("Base Score: {:?}", outcome);
        Ok(outcome)
    }

    async fn execute_experiment(&self) -> RunContext {
        let ctx = RunContext::initial(self.seed.clone());
        self.orchestrator.run(ctx).await
    }
}
