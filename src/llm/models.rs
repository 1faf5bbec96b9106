//! 模型系列与 token 上限

use std::sync::OnceLock;

use regex::Regex;

use super::Provider;

/// 推理系列：使用 developer 角色、不传 temperature、用 max_completion_tokens
pub const REASONING_SERIES: &[&str] = &[
    "o1-mini",
    "o1-mini-2024-09-12",
    "o1-preview",
    "o1-preview-2024-09-12",
    "o1",
    "o1-2024-12-17",
    "o1-pro-2025-03-19",
    "o3-mini",
    "o3-mini-2025-01-31",
];

/// 可直接返回结构化输出的推理模型；其他推理模型需要经解析模型二次整理
pub const STABLE_REASONING_MODEL_VERSIONS: &[&str] =
    &["o3-mini-2025-01-31", "o1-pro-2025-03-19", "o1-2024-12-17"];

/// Anthropic 支持 extended thinking 的模型
pub const ANTHROPIC_THINKING_SERIES: &[&str] = &[
    "claude-3-7-sonnet",
    "claude-3-7-sonnet-latest",
    "claude-3-7-sonnet-20250219",
];

pub const REASONING_MAX_TOKENS: u32 = 100_000;
pub const GPT_MAX_TOKENS: u32 = 16_384;

pub fn is_reasoning_model(model_version: &str) -> bool {
    REASONING_SERIES.contains(&model_version)
}

pub fn is_stable_reasoning_model(model_version: &str) -> bool {
    STABLE_REASONING_MODEL_VERSIONS.contains(&model_version)
}

pub fn is_thinking_model(model_version: &str) -> bool {
    ANTHROPIC_THINKING_SERIES.contains(&model_version)
}

static OPENAI_SUFFIX: OnceLock<Regex> = OnceLock::new();
static ANTHROPIC_SUFFIX: OnceLock<Regex> = OnceLock::new();
static GOOGLE_SUFFIX: OnceLock<Regex> = OnceLock::new();

/// 去掉版本后缀得到计价用的模型名
///
/// - OpenAI: `gpt-4o-2024-11-20` → `gpt-4o`
/// - Anthropic: `claude-3-7-sonnet-20250219` / `-latest` → `claude-3-7-sonnet`
/// - Google: `gemini-1.5-flash-002` → `gemini-1.5-flash`
pub fn normalize_model_name(provider: Provider, model_version: &str) -> String {
    let re = match provider {
        Provider::OpenAi => OPENAI_SUFFIX
            .get_or_init(|| Regex::new(r"-\d{4}-\d{2}-\d{2}$").expect("valid regex")),
        Provider::Anthropic => ANTHROPIC_SUFFIX
            .get_or_init(|| Regex::new(r"[-_](\d+|latest)$").expect("valid regex")),
        Provider::Google => {
            GOOGLE_SUFFIX.get_or_init(|| Regex::new(r"(-\d+)+$").expect("valid regex"))
        }
    };
    re.replace(model_version, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_model_name() {
        assert_eq!(normalize_model_name(Provider::OpenAi, "gpt-4o-2024-11-20"), "gpt-4o");
        assert_eq!(normalize_model_name(Provider::OpenAi, "o3-mini"), "o3-mini");
        assert_eq!(
            normalize_model_name(Provider::Anthropic, "claude-3-7-sonnet-20250219"),
            "claude-3-7-sonnet"
        );
        assert_eq!(
            normalize_model_name(Provider::Anthropic, "claude-3-5-haiku-latest"),
            "claude-3-5-haiku"
        );
        assert_eq!(
            normalize_model_name(Provider::Google, "gemini-1.5-flash-002"),
            "gemini-1.5-flash"
        );
        assert_eq!(
            normalize_model_name(Provider::Google, "gemini-2.0-flash"),
            "gemini-2.0-flash"
        );
    }

    #[test]
    fn test_series() {
        assert!(is_reasoning_model("o1"));
        assert!(!is_reasoning_model("gpt-4o"));
        assert!(is_stable_reasoning_model("o3-mini-2025-01-31"));
        assert!(!is_stable_reasoning_model("o1-mini"));
        assert!(is_thinking_model("claude-3-7-sonnet-latest"));
    }
}
