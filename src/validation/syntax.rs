//! 语法检查：编译检查与 AST 解析各自收集错误

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use crate::core::ValidationError;

#[async_trait]
pub trait SyntaxChecker: Send + Sync {
    /// 返回错误列表；检查器本身无法运行时返回 Err
    async fn check(&self, code: &str) -> Result<Vec<String>, ValidationError>;
}

const AST_CHECK: &str = "import ast, sys\nast.parse(open(sys.argv[1]).read())";

/// 调用外部 Python 解释器
pub struct PythonSyntaxChecker {
    python: String,
}

impl PythonSyntaxChecker {
    pub fn new(python: impl Into<String>) -> Self {
        Self { python: python.into() }
    }

    /// 成功返回 None，失败返回 stderr 最后一个非空行
    async fn run(&self, args: &[&str], file: &Path) -> Result<Option<String>, ValidationError> {
        let output = Command::new(&self.python)
            .args(args)
            .arg(file)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ValidationError::Checker(format!("{}: {}", self.python, e)))?;
        if output.status.success() {
            return Ok(None);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("unknown error")
            .trim()
            .to_string();
        Ok(Some(message))
    }
}

#[async_trait]
impl SyntaxChecker for PythonSyntaxChecker {
    async fn check(&self, code: &str) -> Result<Vec<String>, ValidationError> {
        let file = std::env::temp_dir().join(format!("orbit_{}.py", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&file, code)
            .await
            .map_err(|e| ValidationError::Checker(e.to_string()))?;

        let compiled = self.run(&["-m", "py_compile"], &file).await;
        let parsed = self.run(&["-c", AST_CHECK], &file).await;
        if let Err(e) = tokio::fs::remove_file(&file).await {
            tracing::debug!("failed to remove {}: {}", file.display(), e);
        }

        let mut errors = Vec::new();
        match compiled? {
            Some(e) => {
                let message = format!("py_compile: Syntax error: {}", e);
                tracing::info!("{}", message);
                errors.push(message);
            }
            None => tracing::info!("py_compile: Syntax is correct."),
        }
        match parsed? {
            Some(e) => {
                let message = format!("ast: Syntax error: {}", e);
                tracing::info!("{}", message);
                errors.push(message);
            }
            None => tracing::info!("ast: Code is syntactically valid."),
        }
        Ok(errors)
    }
}
