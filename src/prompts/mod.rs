//! 各阶段提示词
//!
//! 每个构建函数返回 `PromptPair`（system + user 文本）。角色由网关按模型决定：
//! 推理系列以 developer 角色发送 system 文本。

pub mod few_shots;
pub mod generator;
pub mod operations;
pub mod parse;
pub mod review;
pub mod scoring;
pub mod summary;
pub mod validator;

pub use generator::{
    code_prompt, idea_prompt, reflection_prompt, retry_code_prompt, IdeaPromptInput,
};
pub use operations::{pennylane_operations, PENNYLANE_VERSION};
pub use parse::parse_json_prompt;
pub use review::review_prompt;
pub use scoring::scoring_prompt;
pub use summary::summary_prompt;
pub use validator::{docs_validate_prompt, format_doc_reference};

/// 未检索到相关文献时写入提示的固定文本
pub const NOT_PROVIDED_INFORMATION: &str = "Related work is not provided.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// `- a\n- b`；空列表返回 fallback
pub(crate) fn bullets_or(items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        format!("- {}", items.join("\n- "))
    }
}
