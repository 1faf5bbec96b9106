//! 基准结果行与结果表

use std::fmt;

use serde::{Deserialize, Serialize};

/// 验证集或测试集上的分类指标
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// 一次基准运行记录为一行；`run_id = -1` 表示失败占位行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalRow {
    pub run_id: i64,
    pub idea_id: String,
    pub run_time: f64,
    pub accuracy_validation: f64,
    pub precision_validation: f64,
    pub recall_validation: f64,
    pub f1_score_validation: f64,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

impl EvalRow {
    pub fn new(run_id: i64, idea_id: impl Into<String>, run_time: f64, validation: Metrics, test: Metrics) -> Self {
        Self {
            run_id,
            idea_id: idea_id.into(),
            run_time,
            accuracy_validation: validation.accuracy,
            precision_validation: validation.precision,
            recall_validation: validation.recall,
            f1_score_validation: validation.f1_score,
            accuracy: test.accuracy,
            precision: test.precision,
            recall: test.recall,
            f1_score: test.f1_score,
        }
    }

    /// 失败占位行：全部指标为 0
    pub fn dummy(idea_id: impl Into<String>) -> Self {
        Self::new(-1, idea_id, 0.0, Metrics::default(), Metrics::default())
    }

    pub fn is_dummy(&self) -> bool {
        self.run_id < 0
    }

    /// idea_id 形如 `{trial}_{n}`，返回 n
    pub fn idea_number(&self) -> Option<usize> {
        self.idea_id.rsplit('_').next()?.parse().ok()
    }
}

/// 评审时读取的列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricColumn {
    /// 测试集准确率
    Accuracy,
    AccuracyValidation,
    RunTime,
}

impl MetricColumn {
    pub fn value(&self, row: &EvalRow) -> f64 {
        match self {
            MetricColumn::Accuracy => row.accuracy,
            MetricColumn::AccuracyValidation => row.accuracy_validation,
            MetricColumn::RunTime => row.run_time,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    rows: Vec<EvalRow>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: EvalRow) {
        self.rows.push(row);
    }

    /// 追加一行并返回新表
    pub fn with_row(&self, row: EvalRow) -> Self {
        let mut next = self.clone();
        next.push(row);
        next
    }

    pub fn rows(&self) -> &[EvalRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, column: MetricColumn) -> Vec<f64> {
        self.rows.iter().map(|r| column.value(r)).collect()
    }

    /// 验证集准确率最高的行下标；并列时取最先出现的
    pub fn best_index(&self) -> Option<usize> {
        self.rows
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, row)| {
                let v = validation_key(row);
                match best {
                    Some((_, b)) if v <= b => best,
                    _ => Some((i, v)),
                }
            })
            .map(|(i, _)| i)
    }

    /// 按验证集准确率降序（稳定排序）
    pub fn sorted_by_validation_accuracy(&self) -> Vec<&EvalRow> {
        let mut rows: Vec<&EvalRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| validation_key(b).total_cmp(&validation_key(a)));
        rows
    }
}

/// NaN 视为负无穷，永远排在最后
fn validation_key(row: &EvalRow) -> f64 {
    if row.accuracy_validation.is_nan() {
        f64::NEG_INFINITY
    } else {
        row.accuracy_validation
    }
}

impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>6} {:>8} {:>9} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
            "run_id", "idea_id", "run_time", "acc_val", "prec_val", "rec_val", "f1_val", "acc", "prec", "rec", "f1"
        )?;
        for r in &self.rows {
            writeln!(
                f,
                "{:>6} {:>8} {:>9.2} {:>8.4} {:>8.4} {:>8.4} {:>8.4} {:>8.4} {:>8.4} {:>8.4} {:>8.4}",
                r.run_id,
                r.idea_id,
                r.run_time,
                r.accuracy_validation,
                r.precision_validation,
                r.recall_validation,
                r.f1_score_validation,
                r.accuracy,
                r.precision,
                r.recall,
                r.f1_score
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(idea_id: &str, acc_val: f64) -> EvalRow {
        EvalRow::new(
            1,
            idea_id,
            3.0,
            Metrics {
                accuracy: acc_val,
                ..Metrics::default()
            },
            Metrics::default(),
        )
    }

    #[test]
    fn test_best_index_prefers_first_max() {
        let mut t = ResultTable::new();
        t.push(row("1_1", 0.4));
        t.push(row("1_2", 0.7));
        t.push(row("1_3", 0.7));
        assert_eq!(t.best_index(), Some(1));
        assert_eq!(ResultTable::new().best_index(), None);
    }

    #[test]
    fn test_nan_accuracy_never_best() {
        let mut t = ResultTable::new();
        t.push(row("1_1", f64::NAN));
        t.push(row("1_2", 0.3));
        t.push(row("1_3", f64::NAN));
        assert_eq!(t.best_index(), Some(1));
        let last = t.sorted_by_validation_accuracy().last().map(|r| r.idea_id.clone());
        assert_eq!(last.as_deref(), Some("1_3"));

        let mut t = ResultTable::new();
        t.push(row("2_1", 0.0));
        t.push(row("2_2", f64::NAN));
        assert_eq!(t.best_index(), Some(0));
    }

    #[test]
    fn test_dummy_row() {
        let d = EvalRow::dummy("2_3");
        assert!(d.is_dummy());
        assert_eq!(d.idea_number(), Some(3));
        assert_eq!(d.accuracy_validation, 0.0);
        assert_eq!(d.run_time, 0.0);
    }

    #[test]
    fn test_sorted_descending() {
        let mut t = ResultTable::new();
        t.push(row("1_1", 0.2));
        t.push(row("1_2", 0.9));
        let ids: Vec<_> = t
            .sorted_by_validation_accuracy()
            .iter()
            .map(|r| r.idea_id.clone())
            .collect();
        assert_eq!(ids, vec!["1_2", "1_1"]);
    }
}
