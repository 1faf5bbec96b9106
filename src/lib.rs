//! Orbit - LLM 驱动的量子特征映射研究循环
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **observability**: tracing 订阅器
//! - **core**: 错误分类、有界重试、运行上下文
//! - **llm**: 统一对话网关（OpenAI / Anthropic / Google / 脚本化）、费用与嵌入
//! - **memory**: 对话历史与文本切分
//! - **prompts**: 各阶段提示词
//! - **research**: 构思、评分、反思、代码生成、评审与试验编排
//! - **validation**: 静态检查、文档合规与试运行修复循环
//! - **store**: 向量检索（Pinecone / 内存）
//! - **harness**: 外部基准程序与结果表

pub mod config;
pub mod core;
pub mod harness;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod prompts;
pub mod research;
pub mod store;
pub mod validation;

pub use research::{Orchestrator, QuantumKernelStrategy, ResearchStrategy, StrategyKind};
