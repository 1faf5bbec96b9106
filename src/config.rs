//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `ORBIT__*` 覆盖（双下划线表示嵌套，如 `ORBIT__LLM__PROVIDER=anthropic`）。
//! API Key 另外回退到 `OPENAI_API_KEY` / `ANTHROPIC_API_KEY` / `GOOGLE_API_KEY` / `PINECONE_API_KEY`。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::{ModelVersions, RunBudgets};
use crate::llm::Provider;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmSection,
    pub models: ModelVersions,
    pub embedding: EmbeddingSection,
    pub store: StoreSection,
    pub paths: PathsSection,
    pub harness: HarnessSection,
    pub run: RunSection,
}

/// [llm] 段：供应商、密钥、重试与 Anthropic token 上限
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub provider: Provider,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub anthropic_base_url: Option<String>,
    pub google_base_url: Option<String>,
    pub request_timeout_secs: u64,
    /// 退避基数：第 k 次失败后等待 base * 2^k 秒
    pub retry_base_secs: u64,
    pub max_retries: usize,
    pub thinking_model_max_tokens: u32,
    pub basic_model_max_tokens: u32,
    pub max_thinking_budget_tokens: u32,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAi,
            openai_api_key: None,
            anthropic_api_key: None,
            google_api_key: None,
            openai_base_url: None,
            anthropic_base_url: None,
            google_base_url: None,
            request_timeout_secs: 600,
            retry_base_secs: 60,
            max_retries: 3,
            thinking_model_max_tokens: 64_000,
            basic_model_max_tokens: 8_192,
            max_thinking_budget_tokens: 20_000,
        }
    }
}

impl LlmSection {
    pub fn openai_key(&self) -> Option<String> {
        non_empty(self.openai_api_key.clone()).or_else(|| env_key("OPENAI_API_KEY"))
    }

    pub fn anthropic_key(&self) -> Option<String> {
        non_empty(self.anthropic_api_key.clone()).or_else(|| env_key("ANTHROPIC_API_KEY"))
    }

    pub fn google_key(&self) -> Option<String> {
        non_empty(self.google_api_key.clone()).or_else(|| env_key("GOOGLE_API_KEY"))
    }
}

/// [embedding] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingSection {
    pub model: String,
    pub dimension: u32,
}

impl Default for EmbeddingSection {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
        }
    }
}

/// [store] 段：Pinecone 索引；任一 host 缺省时对应检索被跳过
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StoreSection {
    pub pinecone_api_key: Option<String>,
    /// 论文索引
    pub arxiv_index_host: Option<String>,
    /// PennyLane 文档索引
    pub docs_index_host: Option<String>,
    pub namespace: Option<String>,
}

impl StoreSection {
    pub fn api_key(&self) -> Option<String> {
        non_empty(self.pinecone_api_key.clone()).or_else(|| env_key("PINECONE_API_KEY"))
    }
}

/// [paths] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    pub base_config: PathBuf,
    pub dry_run_config: PathBuf,
    pub seed_code: PathBuf,
    pub generated_config_dir: PathBuf,
    pub generated_code_dir: PathBuf,
    /// 生成代码所在的 Python 包路径，如 `generated`
    pub generated_module_root: String,
    /// 本地论文全文目录（`{document_id}.txt`）
    pub paper_dir: Option<PathBuf>,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            base_config: PathBuf::from("config/base/experiment.yaml"),
            dry_run_config: PathBuf::from("config/base/dry_run.yaml"),
            seed_code: PathBuf::from("assets/seed_feature_map.py"),
            generated_config_dir: PathBuf::from("config/generated"),
            generated_code_dir: PathBuf::from("generated"),
            generated_module_root: "generated".to_string(),
            paper_dir: None,
        }
    }
}

/// [harness] 段：外部基准程序
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarnessSection {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub timeout_secs: u64,
    /// 记录运行的 JSONL 文件
    pub runs_file: PathBuf,
    /// 语法检查使用的解释器
    pub python: String,
}

impl Default for HarnessSection {
    fn default() -> Self {
        Self {
            command: "python".to_string(),
            args: vec!["-m".to_string(), "harness".to_string()],
            working_dir: None,
            timeout_secs: 3600,
            runs_file: PathBuf::from("runs/runs.jsonl"),
            python: "python".to_string(),
        }
    }
}

/// [run] 段：预算
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunSection {
    pub max_trial_num: usize,
    pub max_idea_num: usize,
    pub max_suggestion_num: usize,
    pub max_reflection_round: usize,
    pub max_retry: usize,
    pub summarize_papers: bool,
}

impl Default for RunSection {
    fn default() -> Self {
        let budgets = RunBudgets::default();
        Self {
            max_trial_num: budgets.max_trial_num,
            max_idea_num: budgets.max_idea_num,
            max_suggestion_num: budgets.max_suggestion_num,
            max_reflection_round: budgets.max_reflection_round,
            max_retry: 3,
            summarize_papers: true,
        }
    }
}

impl RunSection {
    pub fn budgets(&self) -> RunBudgets {
        RunBudgets {
            max_trial_num: self.max_trial_num,
            max_idea_num: self.max_idea_num,
            max_suggestion_num: self.max_suggestion_num,
            max_reflection_round: self.max_reflection_round,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn env_key(name: &str) -> Option<String> {
    non_empty(std::env::var(name).ok())
}

/// 从 config 目录加载配置，环境变量 ORBIT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 ORBIT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("ORBIT")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.llm.provider, Provider::OpenAi);
        assert_eq!(cfg.llm.retry_base_secs, 60);
        assert_eq!(cfg.run.max_trial_num, 10);
        assert_eq!(cfg.run.max_idea_num, 2);
        assert_eq!(cfg.embedding.model, "text-embedding-3-small");
        assert_eq!(cfg.models.parser, "gpt-4o-mini-2024-07-18");
    }

    #[test]
    fn test_load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orbit.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "[llm]\nprovider = \"anthropic\"\nmax_retries = 5\n\n[models]\ndefault = \"claude-3-7-sonnet-latest\"\n\n[run]\nmax_trial_num = 4\n"
        )
        .unwrap();

        let cfg = load_config(Some(path)).unwrap();
        assert_eq!(cfg.llm.provider, Provider::Anthropic);
        assert_eq!(cfg.llm.max_retries, 5);
        assert_eq!(cfg.models.default, "claude-3-7-sonnet-latest");
        assert_eq!(cfg.run.max_trial_num, 4);
        assert_eq!(cfg.run.max_idea_num, 2);
    }
}
