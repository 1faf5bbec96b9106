//! Orbit 命令行
//!
//! `run` 做前置检查、基线运行并执行试验循环；`baseline` 只跑基线；`validate` 只做前置检查。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};

use orbit::config::{load_config, AppConfig};
use orbit::core::{ContextSeed, RunBudgets};
use orbit::harness::{ExperimentConfig, ExperimentHarness, ProcessHarness};
use orbit::llm::{build_chat_client, build_embedder, Embedder};
use orbit::research::{FeatureMapGenerator, Orchestrator, QuantumKernelStrategy, ResearchStrategy, StrategyKind};
use orbit::store::{PineconeStore, VectorStore};
use orbit::validation::{CodeValidator, PythonSyntaxChecker};

#[derive(Parser)]
#[command(name = "orbit", version, about = "LLM-driven quantum feature map research loop")]
struct Cli {
    /// 额外的配置文件，覆盖 config/default.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 前置检查 + 基线 + 试验循环
    Run(RunArgs),
    /// 只运行基线
    Baseline(ExperimentArgs),
    /// 只做前置检查
    Validate(ExperimentArgs),
}

#[derive(Args)]
struct ExperimentArgs {
    #[arg(long, value_enum, default_value_t = StrategyKind::QuantumKernel)]
    strategy: StrategyKind,

    #[arg(long, default_value = "quantum_kernel")]
    experiment_name: String,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    experiment: ExperimentArgs,

    /// 实验说明，仅写入日志
    #[arg(long)]
    desc: Option<String>,

    #[arg(long)]
    max_trial_num: Option<usize>,

    #[arg(long)]
    max_idea_num: Option<usize>,

    #[arg(long)]
    max_suggestion_num: Option<usize>,

    #[arg(long)]
    max_reflection_round: Option<usize>,

    #[arg(long)]
    skip_baseline: bool,
}

impl RunArgs {
    fn budgets(&self, base: RunBudgets) -> RunBudgets {
        RunBudgets {
            max_trial_num: self.max_trial_num.unwrap_or(base.max_trial_num),
            max_idea_num: self.max_idea_num.unwrap_or(base.max_idea_num),
            max_suggestion_num: self.max_suggestion_num.unwrap_or(base.max_suggestion_num),
            max_reflection_round: self.max_reflection_round.unwrap_or(base.max_reflection_round),
        }
    }
}

fn pinecone_store(
    cfg: &AppConfig,
    host: Option<&str>,
    embedder: &Arc<dyn Embedder>,
) -> anyhow::Result<Option<Arc<dyn VectorStore>>> {
    let (Some(host), Some(key)) = (host.filter(|h| !h.is_empty()), cfg.store.api_key()) else {
        return Ok(None);
    };
    let store = PineconeStore::new(
        host,
        &key,
        embedder.clone(),
        Duration::from_secs(cfg.llm.request_timeout_secs),
    )
    .with_context(|| format!("Failed to create Pinecone client for {}", host))?
    .with_namespace(cfg.store.namespace.clone());
    Ok(Some(Arc::new(store)))
}

fn build_strategy(
    cfg: &AppConfig,
    experiment: &ExperimentArgs,
    budgets: RunBudgets,
) -> anyhow::Result<Box<dyn ResearchStrategy>> {
    match experiment.strategy {
        StrategyKind::QuantumKernel => Ok(Box::new(quantum_kernel_strategy(
            cfg,
            &experiment.experiment_name,
            budgets,
        )?)),
    }
}

fn quantum_kernel_strategy(
    cfg: &AppConfig,
    experiment_name: &str,
    budgets: RunBudgets,
) -> anyhow::Result<QuantumKernelStrategy> {
    let client = Arc::new(
        build_chat_client(&cfg.llm, &cfg.models.default).context("Failed to create LLM client")?,
    );
    let embedder: Arc<dyn Embedder> = Arc::new(build_embedder(&cfg.llm, &cfg.embedding));
    let arxiv = pinecone_store(cfg, cfg.store.arxiv_index_host.as_deref(), &embedder)?;
    let docs = pinecone_store(cfg, cfg.store.docs_index_host.as_deref(), &embedder)?;
    if arxiv.is_none() {
        tracing::warn!("arXiv index is not configured; ideas are scored without related work");
    }
    if docs.is_none() {
        tracing::warn!("Docs index is not configured; PennyLane docs check is skipped");
    }

    let harness: Arc<dyn ExperimentHarness> = Arc::new(
        ProcessHarness::new(experiment_name, &cfg.harness.command, &cfg.harness.runs_file)
            .with_args(cfg.harness.args.clone())
            .with_working_dir(cfg.harness.working_dir.clone())
            .with_timeout(Duration::from_secs(cfg.harness.timeout_secs)),
    );

    let base_config = ExperimentConfig::load(&cfg.paths.base_config)
        .with_context(|| format!("Failed to load {}", cfg.paths.base_config.display()))?;
    let n_qubits = base_config.n_qubits().context("Base config has no qubit count")?;
    let seed_code = std::fs::read_to_string(&cfg.paths.seed_code)
        .with_context(|| format!("Failed to read {}", cfg.paths.seed_code.display()))?;

    let generator = FeatureMapGenerator::new(client.clone(), arxiv.clone())
        .with_papers(cfg.paths.paper_dir.clone(), cfg.run.summarize_papers);
    let validator = CodeValidator::new(
        client.clone(),
        Arc::new(PythonSyntaxChecker::new(&cfg.harness.python)),
        docs.clone(),
        harness.clone(),
        cfg.paths.dry_run_config.clone(),
        cfg.paths.generated_module_root.clone(),
    )
    .with_max_retry(cfg.run.max_retry);
    let orchestrator = Orchestrator::new(
        client,
        generator,
        validator,
        harness.clone(),
        base_config,
        cfg.paths.generated_module_root.clone(),
    );

    let seed = ContextSeed {
        gen_config_dir: cfg.paths.generated_config_dir.join(experiment_name),
        gen_code_dir: cfg.paths.generated_code_dir.join(experiment_name),
        model_versions: cfg.models.clone(),
        n_qubits,
        budgets,
        seed_code,
    };
    Ok(
        QuantumKernelStrategy::new(orchestrator, harness, cfg.paths.base_config.clone(), seed)
            .with_stores(arxiv, docs),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    orbit::observability::init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config.clone()).context("Failed to load config")?;

    match cli.command {
        Command::Validate(experiment) => {
            let strategy = build_strategy(&cfg, &experiment, cfg.run.budgets())?;
            if !strategy.validate().await {
                bail!("Validation failed for experiment {}", experiment.experiment_name);
            }
            tracing::info!("Validation passed.");
        }
        Command::Baseline(experiment) => {
            let strategy = build_strategy(&cfg, &experiment, cfg.run.budgets())?;
            strategy.execute_baseline().await.context("Baseline run failed")?;
        }
        Command::Run(args) => {
            let budgets = args.budgets(cfg.run.budgets());
            tracing::info!(
                "Experiment: {} ({})",
                args.experiment.experiment_name,
                args.desc.as_deref().unwrap_or("no description")
            );
            let strategy = build_strategy(&cfg, &args.experiment, budgets)?;
            if !strategy.validate().await {
                bail!("Validation failed for experiment {}", args.experiment.experiment_name);
            }
            if !args.skip_baseline {
                strategy.execute_baseline().await.context("Baseline run failed")?;
            }
            let ctx = strategy.execute_experiment().await;
            tracing::info!("Final Evaluation Result:\n{}", ctx.eval_results);
        }
    }

    Ok(())
}
