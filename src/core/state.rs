//! 运行上下文
//!
//! `RunContext` 贯穿一次完整的多试验运行，只能通过 `apply(ContextPatch)` 或 `advance(TrialOutcome)`
//! 派生新值，原值保持不变；编排循环因此就是对试验结果的一次 fold。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::harness::ResultTable;
use crate::memory::Message;
use crate::research::report::{best_idea_abstract, format_trial_results, update_score_histories};
use crate::research::types::{GeneratedResult, IdeaScore};

/// 各阶段使用的模型版本；空字符串回落到 default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersions {
    #[serde(default = "default_model")]
    pub default: String,
    #[serde(default)]
    pub idea: String,
    #[serde(default)]
    pub scoring: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub reflection: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub validation: String,
    #[serde(default)]
    pub review: String,
    #[serde(default = "default_parser_model")]
    pub parser: String,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_parser_model() -> String {
    "gpt-4o-mini-2024-07-18".to_string()
}

impl Default for ModelVersions {
    fn default() -> Self {
        Self {
            default: default_model(),
            idea: String::new(),
            scoring: String::new(),
            summary: String::new(),
            reflection: String::new(),
            code: String::new(),
            validation: String::new(),
            review: String::new(),
            parser: default_parser_model(),
        }
    }
}

impl ModelVersions {
    /// 所有空字段替换为 default
    pub fn resolved(mut self) -> Self {
        let fallback = self.default.clone();
        for field in [
            &mut self.idea,
            &mut self.scoring,
            &mut self.summary,
            &mut self.reflection,
            &mut self.code,
            &mut self.validation,
            &mut self.review,
            &mut self.parser,
        ] {
            if field.is_empty() {
                *field = fallback.clone();
            }
        }
        self
    }
}

/// 三条独立的对话线程
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageHistory {
    pub review: Vec<Message>,
    pub idea: Vec<Message>,
    pub code: Vec<Message>,
}

/// 每条线程的截断窗口（None = 全部）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHistoryNum {
    pub review: Option<usize>,
    pub idea: Option<usize>,
    pub code: Option<usize>,
}

impl Default for MessageHistoryNum {
    fn default() -> Self {
        Self {
            review: None,
            idea: None,
            code: Some(1),
        }
    }
}

/// 试验预算
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunBudgets {
    pub max_trial_num: usize,
    pub max_idea_num: usize,
    pub max_suggestion_num: usize,
    pub max_reflection_round: usize,
}

impl Default for RunBudgets {
    fn default() -> Self {
        Self {
            max_trial_num: 10,
            max_idea_num: 2,
            max_suggestion_num: 3,
            max_reflection_round: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    pub gen_config_dir: PathBuf,
    pub gen_code_dir: PathBuf,
    pub model_versions: ModelVersions,
    pub n_qubits: usize,
    pub max_trial_num: usize,
    pub max_idea_num: usize,
    pub max_suggestion_num: usize,
    pub max_reflection_round: usize,
    pub best_idea_abstract: String,
    /// 最近一次被接受的源码：既是代码生成模板，也是“未变化”判定基线
    pub last_code: String,
    pub score_list: Vec<IdeaScore>,
    pub total_cost: f64,
    pub need_idea_review: bool,
    pub review_comment: String,
    pub last_trial_results: String,
    pub score_histories: String,
    pub message_history: MessageHistory,
    pub n_message_history: MessageHistoryNum,
    /// 每轮最佳结果行
    pub eval_results: ResultTable,
}

/// 上下文的局部更新；只能更新这里列出的字段
#[derive(Debug, Clone, Default)]
pub struct ContextPatch {
    pub message_history: Option<MessageHistory>,
    pub review_comment: Option<String>,
    pub last_trial_results: Option<String>,
    pub score_histories: Option<String>,
    pub need_idea_review: Option<bool>,
    pub best_idea_abstract: Option<String>,
    pub last_code: Option<String>,
    pub score_list: Option<Vec<IdeaScore>>,
    pub total_cost: Option<f64>,
    pub eval_results: Option<ResultTable>,
}

impl ContextPatch {
    fn updated_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        macro_rules! key {
            ($field:ident) => {
                if self.$field.is_some() {
                    keys.push(stringify!($field));
                }
            };
        }
        key!(message_history);
        key!(review_comment);
        key!(last_trial_results);
        key!(score_histories);
        key!(need_idea_review);
        key!(best_idea_abstract);
        key!(last_code);
        key!(score_list);
        key!(total_cost);
        key!(eval_results);
        keys
    }
}

/// 一次试验（构思 → 代码 → 验证 → 基准）的产出，供 `advance` 折叠
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    /// 按想法顺序排列的（验证后）结果
    pub results: Vec<GeneratedResult>,
    /// 与 results 一一对应的结果行（失败的想法为占位行）
    pub rows: ResultTable,
    /// 构思与代码生成之后的对话线程
    pub message_history: MessageHistory,
    pub cost: f64,
}

impl TrialOutcome {
    /// 验证集准确率最高的结果行及对应想法
    pub fn best(&self) -> Option<(&crate::harness::EvalRow, &GeneratedResult)> {
        let idx = self.rows.best_index()?;
        let row = &self.rows.rows()[idx];
        let result = row
            .idea_number()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.results.get(i))?;
        Some((row, result))
    }
}

/// 构建初始上下文所需的参数
#[derive(Debug, Clone)]
pub struct ContextSeed {
    pub gen_config_dir: PathBuf,
    pub gen_code_dir: PathBuf,
    pub model_versions: ModelVersions,
    pub n_qubits: usize,
    pub budgets: RunBudgets,
    pub seed_code: String,
}

impl RunContext {
    /// 第一轮不需要评审；score_list 以一个全零分开头
    pub fn initial(seed: ContextSeed) -> Self {
        Self {
            gen_config_dir: seed.gen_config_dir,
            gen_code_dir: seed.gen_code_dir,
            model_versions: seed.model_versions.resolved(),
            n_qubits: seed.n_qubits,
            max_trial_num: seed.budgets.max_trial_num,
            max_idea_num: seed.budgets.max_idea_num,
            max_suggestion_num: seed.budgets.max_suggestion_num,
            max_reflection_round: seed.budgets.max_reflection_round,
            best_idea_abstract: String::new(),
            last_code: seed.seed_code,
            score_list: vec![IdeaScore::zero()],
            total_cost: 0.0,
            need_idea_review: false,
            review_comment: String::new(),
            last_trial_results: String::new(),
            score_histories: String::new(),
            message_history: MessageHistory::default(),
            n_message_history: MessageHistoryNum::default(),
            eval_results: ResultTable::new(),
        }
    }

    /// 复制并应用局部更新
    pub fn apply(&self, patch: ContextPatch) -> Self {
        tracing::debug!("Update Run Context: {:?}", patch.updated_keys());
        let mut next = self.clone();
        if let Some(v) = patch.message_history {
            next.message_history = v;
        }
        if let Some(v) = patch.review_comment {
            next.review_comment = v;
        }
        if let Some(v) = patch.last_trial_results {
            next.last_trial_results = v;
        }
        if let Some(v) = patch.score_histories {
            next.score_histories = v;
        }
        if let Some(v) = patch.need_idea_review {
            next.need_idea_review = v;
        }
        if let Some(v) = patch.best_idea_abstract {
            next.best_idea_abstract = v;
        }
        if let Some(v) = patch.last_code {
            next.last_code = v;
        }
        if let Some(v) = patch.score_list {
            next.score_list = v;
        }
        if let Some(v) = patch.total_cost {
            next.total_cost = v;
        }
        if let Some(v) = patch.eval_results {
            next.eval_results = v;
        }
        next
    }

    /// 把一次试验的结果折叠进上下文（纯函数）
    ///
    /// 最佳行追加到 eval_results，最佳想法的评分追加到 score_list；
    /// 最佳行是真实运行结果时，其代码成为新的 last_code。
    pub fn advance(&self, outcome: &TrialOutcome) -> Self {
        let mut patch = ContextPatch {
            message_history: Some(outcome.message_history.clone()),
            last_trial_results: Some(format_trial_results(&outcome.results, &outcome.rows)),
            score_histories: Some(update_score_histories(&self.score_histories, &outcome.results)),
            need_idea_review: Some(true),
            total_cost: Some(self.total_cost + outcome.cost),
            ..ContextPatch::default()
        };

        match outcome.best() {
            Some((row, best)) => {
                let mut score_list = self.score_list.clone();
                score_list.push(best.score.clone());
                patch.score_list = Some(score_list);
                patch.best_idea_abstract = Some(best_idea_abstract(best));
                patch.eval_results = Some(self.eval_results.with_row(row.clone()));
                if !row.is_dummy() {
                    patch.last_code = Some(best.implement.code.clone());
                }
            }
            None => tracing::warn!("Trial produced no results; best-of-trial is skipped"),
        }

        self.apply(patch)
    }
}
