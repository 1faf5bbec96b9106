//! 费用计算
//!
//! 单价均为每 100 万 token 的美元价；未收录的模型记 0 并告警。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::models::normalize_model_name;
use super::Provider;

/// 一次调用的 token 计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenCounts {
    pub input: u64,
    pub cached: u64,
    pub output: u64,
}

/// 每 1M token 单价；cached 缺省时缓存 token 按 0 计
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rate {
    pub input: f64,
    pub cached: Option<f64>,
    pub output: f64,
}

const fn rate(input: f64, cached: Option<f64>, output: f64) -> Rate {
    Rate {
        input,
        cached,
        output,
    }
}

const CHAT_RATES: &[(&str, Rate)] = &[
    // OpenAI
    ("gpt-4o-mini", rate(0.15, Some(0.075), 0.6)),
    ("gpt-4o", rate(2.5, Some(1.25), 10.0)),
    ("gpt-4.5-preview", rate(75.0, Some(37.5), 150.0)),
    ("o1-mini", rate(3.0, Some(0.55), 12.0)),
    ("o1-preview", rate(15.0, None, 60.0)),
    ("o1", rate(15.0, Some(7.5), 60.0)),
    ("o1-pro", rate(150.0, None, 600.0)),
    ("o3-mini", rate(1.1, Some(0.55), 4.4)),
    // Google
    ("gemini-1.5-flash-8b", rate(0.0375, Some(0.01), 0.15)),
    ("gemini-1.5-flash", rate(0.075, Some(0.01875), 0.3)),
    ("gemini-1.5-pro", rate(1.25, Some(0.3125), 5.0)),
    ("gemini-2.0-flash-lite", rate(0.075, None, 0.3)),
    ("gemini-2.0-flash", rate(0.1, Some(0.025), 0.4)),
    ("gemini-2.0-pro-exp", rate(0.0, None, 0.0)),
    ("gemini-2.5-pro-exp", rate(0.0, None, 0.0)),
    // Anthropic
    ("claude-3-opus", rate(15.0, Some(1.5), 75.0)),
    ("claude-3-haiku", rate(0.25, None, 1.25)),
    ("claude-3-5-haiku", rate(0.8, Some(0.08), 4.0)),
    ("claude-3-5-sonnet", rate(3.0, None, 15.0)),
    ("claude-3-7-sonnet", rate(3.0, Some(0.3), 15.0)),
];

const EMBEDDING_RATES: &[(&str, f64)] = &[
    ("text-embedding-3-small", 0.02),
    ("text-embedding-3-large", 0.13),
    ("text-embedding-ada-002", 0.1),
];

pub fn chat_rate(model_name: &str) -> Option<Rate> {
    CHAT_RATES
        .iter()
        .find(|(name, _)| *name == model_name)
        .map(|(_, r)| *r)
}

/// (input - cached) * in + cached * cached_rate + output * out，按 1e-6 缩放
pub fn calculate_cost(usage: TokenCounts, rate: Rate) -> f64 {
    let uncached = usage.input.saturating_sub(usage.cached) as f64;
    let cached_rate = rate.cached.unwrap_or(0.0);
    (uncached * rate.input + usage.cached as f64 * cached_rate + usage.output as f64 * rate.output)
        / 1_000_000.0
}

/// 按供应商规则规整模型名后查表
pub fn chat_cost(provider: Provider, model_version: &str, usage: TokenCounts) -> f64 {
    let model_name = normalize_model_name(provider, model_version);
    match chat_rate(&model_name) {
        Some(r) => calculate_cost(usage, r),
        None => {
            tracing::warn!("Model '{}' is not found in the cost table. Cost is 0.", model_name);
            0.0
        }
    }
}

pub fn embedding_cost(model: &str, input_tokens: u64) -> f64 {
    match EMBEDDING_RATES.iter().find(|(name, _)| *name == model) {
        Some((_, r)) => input_tokens as f64 * r / 1_000_000.0,
        None => {
            tracing::warn!("Embedding model '{}' is not found in the cost table. Cost is 0.", model);
            0.0
        }
    }
}

/// 客户端实例累计费用（f64 位模式存于原子量）
#[derive(Debug, Clone, Default)]
pub struct CostMeter {
    total_bits: Arc<AtomicU64>,
}

impl CostMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, cost: f64) {
        let _ = self
            .total_bits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some((f64::from_bits(bits) + cost).to_bits())
            });
    }

    pub fn total(&self) -> f64 {
        f64::from_bits(self.total_bits.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_is_linear() {
        let usage = TokenCounts {
            input: 100,
            cached: 20,
            output: 50,
        };
        let cost = calculate_cost(usage, rate(1.0, Some(0.5), 2.0));
        assert!((cost - 190e-6).abs() < 1e-15);

        // 缺省缓存单价按 0 计
        let cost = calculate_cost(usage, rate(1.0, None, 2.0));
        assert!((cost - 180e-6).abs() < 1e-15);
    }

    #[test]
    fn test_unknown_model_costs_nothing() {
        let usage = TokenCounts {
            input: 1000,
            cached: 0,
            output: 1000,
        };
        assert_eq!(chat_cost(Provider::OpenAi, "my-private-model", usage), 0.0);
        assert!(chat_cost(Provider::OpenAi, "gpt-4o-2024-11-20", usage) > 0.0);
        assert_eq!(embedding_cost("unknown", 10), 0.0);
    }

    #[test]
    fn test_meter_accumulates() {
        let meter = CostMeter::new();
        meter.add(0.25);
        meter.add(0.5);
        assert!((meter.total() - 0.75).abs() < 1e-12);
    }
}
