//! 研究循环
//!
//! - **types / report**：结构化输出类型与回灌到提示词的报告文本
//! - **parser**：结构化调用（含推理模型的二次解析）
//! - **idea / scoring / reflection / summary**：构思、文献评分、反思与论文摘要
//! - **code / generation**：代码生成与一次试验的生成阶段
//! - **review**：想法评审与性能评审
//! - **orchestrator / strategy**：试验循环与策略入口

pub mod code;
pub mod generation;
pub mod idea;
pub mod orchestrator;
pub mod parser;
pub mod reflection;
pub mod report;
pub mod review;
pub mod scoring;
pub mod strategy;
pub mod summary;
pub mod types;

pub use generation::{FeatureMapGenerator, Generation};
pub use orchestrator::Orchestrator;
pub use review::{PerformanceReviewer, ReviewMetric};
pub use strategy::{QuantumKernelStrategy, ResearchStrategy, StrategyKind};
pub use types::{
    GeneratedIdea, GeneratedImpl, GeneratedResult, IdeaScore, ReviewIdeaResult, ScoringResult,
    COMPLETED,
};
