//! 外部基准程序边界
//!
//! 编排器只通过 `ExperimentHarness` 运行实验：给定一份 YAML 配置，返回验证集/测试集指标。
//! `RunMode::DryRun` 只用于捕获运行期错误，不写入运行记录。

pub mod config;
pub mod process;
pub mod table;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::HarnessError;

pub use config::{module_path, write_dry_run_config, write_trial_config, ExperimentConfig};
pub use process::ProcessHarness;
pub use table::{EvalRow, MetricColumn, Metrics, ResultTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// 正式运行，结果写入运行记录
    Record,
    /// 试运行
    DryRun,
}

/// 一次运行的结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// 记录模式下分配的运行编号
    #[serde(default)]
    pub run_id: Option<i64>,
    pub validation: Metrics,
    pub test: Metrics,
    /// 训练耗时（秒）
    #[serde(default)]
    pub run_time: f64,
    /// 运行期警告（不阻塞）
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl RunOutcome {
    /// 转为结果行；未分配编号时记为 0
    pub fn to_row(&self, idea_id: &str) -> EvalRow {
        EvalRow::new(
            self.run_id.unwrap_or(0),
            idea_id,
            self.run_time,
            self.validation,
            self.test,
        )
    }
}

#[async_trait]
pub trait ExperimentHarness: Send + Sync {
    /// 实验名，用于生成代码的模块路径
    fn name(&self) -> &str;

    async fn run(&self, config_path: &Path, mode: RunMode) -> Result<RunOutcome, HarnessError>;

    /// 已记录的运行数
    async fn recorded_runs(&self) -> Result<usize, HarnessError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_to_row() {
        let outcome = RunOutcome {
            run_id: Some(4),
            validation: Metrics {
                accuracy: 0.55,
                ..Metrics::default()
            },
            test: Metrics {
                accuracy: 0.5,
                ..Metrics::default()
            },
            run_time: 12.5,
            warnings: vec![],
        };
        let row = outcome.to_row("3_2");
        assert_eq!(row.run_id, 4);
        assert_eq!(row.idea_id, "3_2");
        assert_eq!(row.accuracy_validation, 0.55);
        assert_eq!(row.accuracy, 0.5);
        assert_eq!(row.run_time, 12.5);
    }
}
