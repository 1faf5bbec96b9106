//! 试验报告文本
//!
//! 这些文本会回到下一轮的提示词里：上一轮结果（评审输入）、评分历史（评分 few-shot）、
//! 最佳想法摘要。

use crate::harness::ResultTable;

use super::types::GeneratedResult;

/// 上一轮各想法按验证集准确率降序排列，附解释、公式、运行时间与验证指标
pub fn format_trial_results(results: &[GeneratedResult], rows: &ResultTable) -> String {
    let mut order = Vec::new();
    let mut blocks = Vec::new();
    for row in rows.sorted_by_validation_accuracy() {
        let Some(idea_num) = row.idea_number() else {
            tracing::warn!("Unexpected idea id in results: {}", row.idea_id);
            continue;
        };
        let Some(result) = idea_num.checked_sub(1).and_then(|i| results.get(i)) else {
            tracing::warn!("No generated result for idea {}", row.idea_id);
            continue;
        };
        order.push(format!("\"Idea Number: {}\"", idea_num));
        blocks.push(format!(
            "## Idea Number: {}\n\
             ### Idea Explanation:\n{}\n\n\
             ### Idea Mathematical Expression:\n{}\n\n\
             ### Trial Results:\n\
             #### Run Time: {:.2} [seconds]\n\n\
             #### Result:\n\
             \x20   - Accuracy: {:.2}\n\
             \x20   - Precision: {:.2}\n\
             \x20   - Recall: {:.2}\n\
             \x20   - F1 Score: {:.2}\n",
            idea_num,
            result.idea.explanation,
            result.idea.formula,
            row.run_time,
            row.accuracy_validation,
            row.precision_validation,
            row.recall_validation,
            row.f1_score_validation,
        ));
    }
    format!(
        "Current trial ideas sorted by accuracy (scores from highest to lowest): {}\n{}",
        order.join(" > "),
        blocks.join("\n")
    )
}

/// 评分历史追加：名称、摘要与三项得分
pub fn update_score_histories(score_histories: &str, results: &[GeneratedResult]) -> String {
    results.iter().fold(score_histories.to_string(), |acc, r| {
        let scores = r.score.to_string().replace('\n', "\n        ");
        format!(
            "{}\n\n- {}:\n    - explanation:\n        - {}\n\n    - scores:\n        {}\n",
            acc, r.idea.feature_map_name, r.idea.summary, scores
        )
    })
}

pub fn best_idea_abstract(best: &GeneratedResult) -> String {
    format!(
        "### Idea Explanation:\n{}\n\n### Idea Mathematical Expression:\n{}\n",
        best.idea.explanation, best.idea.formula
    )
}
