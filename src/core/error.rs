//! 错误类型
//!
//! 分层：LlmError（网关/供应商）、ParseError（结构化输出解码）、StoreError（向量库）、
//! HarnessError（外部实验框架）、ValidationError（代码验证与试运行），
//! 最终汇总到 ResearchError，供各服务与试验编排器使用。

use thiserror::Error;

use crate::llm::Provider;

/// LLM 结构化输出无法解码为目标 schema
#[derive(Error, Debug, Clone)]
#[error("failed to parse {schema}: {message}")]
pub struct ParseError {
    pub schema: String,
    pub message: String,
}

impl ParseError {
    pub fn new(schema: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            message: message.into(),
        }
    }
}

/// LLM 网关与供应商适配器错误
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("{provider} request failed: {message}")]
    Request { provider: Provider, message: String },

    #[error("{provider} returned status {status}: {body}")]
    Api {
        provider: Provider,
        status: u16,
        body: String,
    },

    #[error("{provider} response has no content")]
    EmptyResponse { provider: Provider },

    /// 结构化输出与 schema 不符，不重试
    #[error(transparent)]
    Schema(#[from] ParseError),

    #[error("failed to get response from {provider} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        provider: Provider,
        attempts: usize,
        last_error: String,
    },

    #[error("LLM config error: {0}")]
    Config(String),
}

impl LlmError {
    /// 瞬时错误（网络、限流、5xx、空响应）可按退避重试；schema / 配置错误立即返回
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::Request { .. } | LlmError::Api { .. } | LlmError::EmptyResponse { .. }
        )
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("vector store request failed: {0}")]
    Request(String),

    #[error("vector store returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("embedding failed: {0}")]
    Embedding(#[from] LlmError),

    #[error("invalid chunk method: {0}")]
    InvalidChunkMethod(String),
}

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("harness io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("experiment config error: {0}")]
    Config(String),

    #[error("harness timed out after {0}s")]
    Timeout(u64),

    /// 运行失败：message 携带完整 traceback
    #[error("experiment run failed: {message}")]
    RunFailed {
        message: String,
        warnings: Vec<String>,
    },

    #[error("unexpected harness output: {0}")]
    Output(String),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    /// 语法检查器本身无法运行（解释器缺失等）
    #[error("syntax checker failed: {0}")]
    Checker(String),

    #[error("Failed to generate valid code after {retries} regenerations: {errors:?}")]
    StaticChecksExhausted { retries: usize, errors: Vec<String> },

    #[error("dry run still failing after {attempts} attempts: {last_error}")]
    DryRunExhausted { attempts: usize, last_error: String },
}

/// 研究流程总错误
#[derive(Error, Debug)]
pub enum ResearchError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Harness(#[from] HarnessError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type ResearchResult<T> = Result<T, ResearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_split() {
        let transient = LlmError::Request {
            provider: Provider::OpenAi,
            message: "connection reset".into(),
        };
        assert!(transient.is_retryable());

        let schema = LlmError::Schema(ParseError::new("ScoringResult", "missing field `score`"));
        assert!(!schema.is_retryable());

        let exhausted = LlmError::RetriesExhausted {
            provider: Provider::Anthropic,
            attempts: 3,
            last_error: "boom".into(),
        };
        assert!(!exhausted.is_retryable());
        let text = exhausted.to_string();
        assert!(text.contains("Anthropic"));
        assert!(text.contains("3 attempts"));
    }
}
