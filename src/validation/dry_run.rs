//! 试运行：把候选代码写到固定的 dry_run.py，经基准程序执行一次，不记录结果

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::{HarnessError, ResearchResult};
use crate::harness::{write_dry_run_config, ExperimentHarness, RunMode};

/// 试运行代码的文件名
pub const DRY_RUN_CODE_FILE: &str = "dry_run.py";

/// 一次试运行的结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DryRunReport {
    /// 失败时为完整错误文本
    pub error: Option<String>,
    pub warnings: Vec<String>,
}

impl DryRunReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

pub struct DryRunner {
    harness: Arc<dyn ExperimentHarness>,
    dry_run_config: PathBuf,
    module_root: String,
}

impl DryRunner {
    pub fn new(
        harness: Arc<dyn ExperimentHarness>,
        dry_run_config: impl Into<PathBuf>,
        module_root: impl Into<String>,
    ) -> Self {
        Self {
            harness,
            dry_run_config: dry_run_config.into(),
            module_root: module_root.into(),
        }
    }

    /// 运行失败记为报告中的错误；只有写文件失败才返回 Err
    pub async fn run(&self, code_dir: &Path, code: &str, class_name: &str) -> ResearchResult<DryRunReport> {
        tokio::fs::create_dir_all(code_dir).await?;
        tokio::fs::write(code_dir.join(DRY_RUN_CODE_FILE), code).await?;
        let config = write_dry_run_config(
            &self.dry_run_config,
            &self.module_root,
            self.harness.name(),
            class_name,
        )?;

        tracing::info!("Execute dry run ...");
        match self.harness.run(&config, RunMode::DryRun).await {
            Ok(outcome) => {
                if let Err(e) = tokio::fs::remove_file(&config).await {
                    tracing::debug!("failed to remove {}: {}", config.display(), e);
                }
                tracing::info!("dry run: Code execution is successful.");
                Ok(DryRunReport {
                    error: None,
                    warnings: outcome.warnings,
                })
            }
            Err(HarnessError::RunFailed { message, warnings }) => {
                tracing::info!("Error occurred during dry run: {}", message);
                Ok(DryRunReport {
                    error: Some(message),
                    warnings,
                })
            }
            Err(e) => {
                tracing::info!("Error occurred during dry run: {}", e);
                Ok(DryRunReport {
                    error: Some(e.to_string()),
                    warnings: Vec::new(),
                })
            }
        }
    }
}
