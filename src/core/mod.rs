//! 核心层：错误分类、有界重试、运行上下文与试验折叠

pub mod error;
pub mod retry;
pub mod state;

pub use error::{
    HarnessError, LlmError, ParseError, ResearchError, ResearchResult, StoreError, ValidationError,
};
pub use retry::{Attempt, Backoff, RetryError, RetryPolicy};
pub use state::{
    ContextPatch, ContextSeed, MessageHistory, MessageHistoryNum, ModelVersions, RunBudgets,
    RunContext, TrialOutcome,
};
