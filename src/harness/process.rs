//! 子进程基准程序
//!
//! 以 `{command} {args..} --config <path> [--dry-run]` 启动外部实验程序：
//! - 成功时 stdout 最后一行是 JSON：`{"validation": {...}, "test": {...}, "run_time": 1.2}`
//! - 失败时退出码非 0，stderr 携带 traceback
//! - stderr 中形如 `XxxWarning: msg` 的行收集为警告
//!
//! 正式运行追加到 runs 文件（JSONL），一行一条记录。

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::core::HarnessError;

use super::{ExperimentHarness, Metrics, RunMode, RunOutcome};

fn warning_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\w*Warning): (.*)").expect("valid regex"))
}

/// 提取 stderr 中的警告
pub fn parse_warnings(stderr: &str) -> Vec<String> {
    warning_regex()
        .captures_iter(stderr)
        .map(|c| format!("{}: {}", &c[1], c[2].trim()))
        .collect()
}

#[derive(Debug, Deserialize)]
struct HarnessReport {
    validation: Metrics,
    test: Metrics,
    #[serde(default)]
    run_time: f64,
}

/// stdout 中最后一个可解析的 JSON 行
fn parse_report(stdout: &str) -> Result<HarnessReport, HarnessError> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .filter(|l| l.starts_with('{'))
        .find_map(|l| serde_json::from_str(l).ok())
        .ok_or_else(|| HarnessError::Output(format!("no result line in output: {}", stdout.trim())))
}

/// runs 文件中的一条记录
#[derive(Debug, Serialize, Deserialize)]
struct RunRecord {
    run_id: i64,
    uuid: String,
    experiment: String,
    config: String,
    created_at: String,
    run_time: f64,
    validation: Metrics,
    test: Metrics,
}

pub struct ProcessHarness {
    name: String,
    command: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    timeout: Duration,
    runs_file: PathBuf,
}

impl ProcessHarness {
    pub fn new(name: impl Into<String>, command: impl Into<String>, runs_file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            working_dir: None,
            timeout: Duration::from_secs(3600),
            runs_file: runs_file.into(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn read_records(&self) -> Result<Vec<RunRecord>, HarnessError> {
        let text = match tokio::fs::read_to_string(&self.runs_file).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(|e| HarnessError::Output(e.to_string())))
            .collect()
    }

    async fn append_record(&self, record: &RunRecord) -> Result<(), HarnessError> {
        if let Some(parent) = self.runs_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let line = serde_json::to_string(record).map_err(|e| HarnessError::Output(e.to_string()))?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.runs_file)
            .await?;
        file.write_all(format!("{}\n", line).as_bytes()).await?;
        Ok(())
    }
}

#[async_trait]
impl ExperimentHarness for ProcessHarness {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, config_path: &Path, mode: RunMode) -> Result<RunOutcome, HarnessError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args).arg("--config").arg(config_path);
        if mode == RunMode::DryRun {
            cmd.arg("--dry-run");
        }
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd.kill_on_drop(true);

        tracing::debug!(config = %config_path.display(), ?mode, "run harness");
        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| HarnessError::Timeout(self.timeout.as_secs()))??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let warnings = parse_warnings(&stderr);

        if !output.status.success() {
            return Err(HarnessError::RunFailed {
                message: format!("Exit {:?}\n{}", output.status.code(), stderr.trim()),
                warnings,
            });
        }

        let report = parse_report(&stdout)?;
        let mut outcome = RunOutcome {
            run_id: None,
            validation: report.validation,
            test: report.test,
            run_time: report.run_time,
            warnings,
        };

        if mode == RunMode::Record {
            let run_id = self.read_records().await?.len() as i64 + 1;
            self.append_record(&RunRecord {
                run_id,
                uuid: uuid::Uuid::new_v4().to_string(),
                experiment: self.name.clone(),
                config: config_path.display().to_string(),
                created_at: chrono::Utc::now().to_rfc3339(),
                run_time: outcome.run_time,
                validation: outcome.validation,
                test: outcome.test,
            })
            .await?;
            outcome.run_id = Some(run_id);
        }
        Ok(outcome)
    }

    async fn recorded_runs(&self) -> Result<usize, HarnessError> {
        Ok(self.read_records().await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_warnings() {
        let stderr = "/x.py:3: UserWarning: shots ignored\nTraceback...\nDeprecationWarning: old api\n";
        assert_eq!(
            parse_warnings(stderr),
            vec!["UserWarning: shots ignored", "DeprecationWarning: old api"]
        );
    }

    #[test]
    fn test_parse_report_takes_last_json_line() {
        let stdout = "loading...\n{\"validation\": {\"accuracy\": 0.5, \"precision\": 0.4, \"recall\": 0.3, \"f1_score\": 0.2}, \"test\": {\"accuracy\": 0.45, \"precision\": 0, \"recall\": 0, \"f1_score\": 0}, \"run_time\": 3.5}\n";
        let report = parse_report(stdout).unwrap();
        assert_eq!(report.validation.accuracy, 0.5);
        assert_eq!(report.test.accuracy, 0.45);
        assert_eq!(report.run_time, 3.5);
        assert!(parse_report("nothing here").is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_record_run_appends_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("harness.sh");
        std::fs::write(
            &script,
            "#!/bin/sh\necho 'UserWarning: noisy' >&2\necho '{\"validation\":{\"accuracy\":0.6,\"precision\":0,\"recall\":0,\"f1_score\":0},\"test\":{\"accuracy\":0.5,\"precision\":0,\"recall\":0,\"f1_score\":0},\"run_time\":2.0}'\n",
        )
        .unwrap();
        let runs = dir.path().join("runs/runs.jsonl");
        let harness = ProcessHarness::new("exp", "sh", &runs).with_args(vec![script.display().to_string()]);
        let config = dir.path().join("config.yaml");

        assert_eq!(harness.recorded_runs().await.unwrap(), 0);
        let dry = harness.run(&config, RunMode::DryRun).await.unwrap();
        assert_eq!(dry.run_id, None);
        assert_eq!(dry.warnings, vec!["UserWarning: noisy"]);
        assert_eq!(harness.recorded_runs().await.unwrap(), 0);

        let first = harness.run(&config, RunMode::Record).await.unwrap();
        let second = harness.run(&config, RunMode::Record).await.unwrap();
        assert_eq!(first.run_id, Some(1));
        assert_eq!(second.run_id, Some(2));
        assert_eq!(second.validation.accuracy, 0.6);
        assert_eq!(harness.recorded_runs().await.unwrap(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_run_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fail.sh");
        std::fs::write(&script, "#!/bin/sh\necho 'Traceback: NameError' >&2\nexit 1\n").unwrap();
        let harness = ProcessHarness::new("exp", "sh", dir.path().join("runs.jsonl"))
            .with_args(vec![script.display().to_string()]);
        let err = harness
            .run(&dir.path().join("c.yaml"), RunMode::DryRun)
            .await
            .unwrap_err();
        match err {
            HarnessError::RunFailed { message, .. } => assert!(message.contains("NameError")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
