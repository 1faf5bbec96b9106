//! 评审：LLM 想法评审 + 基于指标差值的性能评审

use std::fmt;
use std::sync::Arc;

use crate::core::ResearchResult;
use crate::harness::{MetricColumn, ResultTable};
use crate::llm::ChatClient;
use crate::memory::Message;
use crate::prompts::review_prompt;

use super::parser::{structured_chat, StageCall, Structured};
use super::types::{IdeaScore, ReviewIdeaResult};

pub struct IdeaReviewer {
    client: Arc<ChatClient>,
    model: String,
    parser_model: String,
}

/// 一次想法评审的输入
pub struct ReviewRequest<'a> {
    pub max_suggestion_num: usize,
    pub last_trial_num: usize,
    pub last_trial_results: &'a str,
    pub performance_review: Option<&'a str>,
}

impl IdeaReviewer {
    pub fn new(client: Arc<ChatClient>, model: impl Into<String>, parser_model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            parser_model: parser_model.into(),
        }
    }

    pub async fn review(
        &self,
        request: &ReviewRequest<'_>,
        history: &[Message],
        n_history: Option<usize>,
    ) -> ResearchResult<Structured<ReviewIdeaResult>> {
        tracing::info!("Review Last Idea...");
        let prompt = review_prompt(
            request.max_suggestion_num,
            request.last_trial_num,
            request.last_trial_results,
            request.performance_review,
        );
        let out = structured_chat::<ReviewIdeaResult>(
            &self.client,
            &self.parser_model,
            StageCall {
                prompt: &prompt,
                history,
                n_history,
                model: &self.model,
                temperature: 0.2,
            },
        )
        .await?;
        tracing::info!("Review Last Step Idea is done.");
        tracing::debug!("Reviewed Last Idea: {:?}", out.value);
        Ok(out)
    }
}

/// 相邻两轮指标差值的分档
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceStatus {
    SignificantlyImproved,
    Improved,
    MarginallyImproved,
    Unchanged,
    DroppedSlightly,
    DroppedSignificantly,
    OutOfRange,
}

impl PerformanceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::SignificantlyImproved => "Significantly improved",
            Self::Improved => "Improved",
            Self::MarginallyImproved => "Marginally improved",
            Self::Unchanged => "Unchanged",
            Self::DroppedSlightly => "Dropped slightly",
            Self::DroppedSignificantly => "Dropped significantly",
            Self::OutOfRange => "Out of Range",
        }
    }

    /// 下一轮评审的改进方向
    pub fn direction(&self) -> &'static str {
        match self {
            Self::SignificantlyImproved => {
                "Please review the changes or factors that likely led to this improvement by referring to all past trials, analyze their impact, and propose how we can enhance these aspects further to sustain or amplify the positive trend."
            }
            Self::Improved | Self::MarginallyImproved => {
                "Please examine the elements that contributed to this progress by referencing all past trials, assess their effectiveness, and suggest additional refinements or strategies to achieve more significant advancements."
            }
            Self::Unchanged => {
                "Please investigate the potential reasons for this stagnation by comparing all past trials, identify any bottlenecks or limitations, and propose actionable strategies to introduce meaningful progress."
            }
            Self::DroppedSlightly => {
                "Please review the factors or changes that may have negatively impacted the results by analyzing all past trials, evaluate their significance, and propose targeted solutions to recover or improve performance in subsequent trials."
            }
            Self::DroppedSignificantly => {
                "Please thoroughly analyze the root causes of this drop by referencing all past trials, including any critical changes or issues in the process, and recommend urgent actions to address these challenges effectively and recover performance."
            }
            Self::OutOfRange => "The performance metric is out of the expected range.",
        }
    }
}

impl fmt::Display for PerformanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// (lower, upper) 区间；改进档为左开右闭，下降档为左闭右开
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub significant_improve: (f64, f64),
    pub improve: (f64, f64),
    pub marginal_improve: (f64, f64),
    pub slight_drop: (f64, f64),
    pub significant_drop: (f64, f64),
}

/// 评审读取的指标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewMetric {
    /// 越大越好
    Accuracy,
    /// 越小越好（运行时间）
    Cost,
}

impl ReviewMetric {
    pub fn thresholds(&self) -> Thresholds {
        match self {
            ReviewMetric::Accuracy => Thresholds {
                significant_improve: (0.2, 1.0),
                improve: (0.05, 0.2),
                marginal_improve: (0.0, 0.05),
                slight_drop: (-0.2, 0.0),
                significant_drop: (-1.0, -0.2),
            },
            ReviewMetric::Cost => Thresholds {
                significant_improve: (-100.0, -0.1),
                improve: (-0.1, -0.01),
                marginal_improve: (-0.01, -1e-10),
                slight_drop: (1e-10, 0.1),
                significant_drop: (0.1, 100.0),
            },
        }
    }

    pub fn column(&self) -> MetricColumn {
        match self {
            ReviewMetric::Accuracy => MetricColumn::Accuracy,
            ReviewMetric::Cost => MetricColumn::RunTime,
        }
    }

    /// 差值分档；按改进、不变、下降的顺序判断
    pub fn status(&self, diff: f64) -> PerformanceStatus {
        let t = self.thresholds();
        let open_closed = |(lo, hi): (f64, f64)| lo < diff && diff <= hi;
        let closed_open = |(lo, hi): (f64, f64)| lo <= diff && diff < hi;
        if open_closed(t.significant_improve) {
            PerformanceStatus::SignificantlyImproved
        } else if open_closed(t.improve) {
            PerformanceStatus::Improved
        } else if open_closed(t.marginal_improve) {
            PerformanceStatus::MarginallyImproved
        } else if diff == 0.0 {
            PerformanceStatus::Unchanged
        } else if closed_open(t.slight_drop) {
            PerformanceStatus::DroppedSlightly
        } else if closed_open(t.significant_drop) {
            PerformanceStatus::DroppedSignificantly
        } else {
            PerformanceStatus::OutOfRange
        }
    }
}

/// 性能评审：纯函数，不调用模型
#[derive(Debug, Clone)]
pub struct PerformanceReviewer {
    metric: ReviewMetric,
}

impl Default for PerformanceReviewer {
    fn default() -> Self {
        Self::new(ReviewMetric::Accuracy)
    }
}

impl PerformanceReviewer {
    pub fn new(metric: ReviewMetric) -> Self {
        Self { metric }
    }

    /// 少于两轮结果（或两份评分）时返回 None
    pub fn review(&self, results: &ResultTable, score_list: &[IdeaScore]) -> Option<String> {
        if results.len() < 2 || score_list.len() < 2 {
            return None;
        }
        let values = results.column(self.metric.column());
        let diff = values[values.len() - 1] - values[values.len() - 2];
        let status = self.metric.status(diff);
        Some(format!(
            "In the previous trial, the model's classification accuracy \"{}\". {}",
            status.label(),
            status.direction()
        ))
    }
}
