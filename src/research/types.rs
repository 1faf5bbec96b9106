//! 结构化输出 schema
//!
//! 每个 LLM 阶段返回的 JSON 都解码为这里的类型；`///` 注释会随 schemars 进入 JSON Schema，
//! 作为字段描述交给模型。

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// 评审结束哨兵：suggestions 首项为此值时停止后续试验
pub const COMPLETED: &str = "COMPLETED";

/// 单个维度的得分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Score {
    /// The score of viewpoint.
    pub score: f64,
    /// The reason of the score.
    pub reason: String,
}

impl Score {
    pub fn new(score: f64, reason: impl Into<String>) -> Self {
        Self {
            score,
            reason: reason.into(),
        }
    }
}

/// 三维评分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IdeaScore {
    /// The score and reason of originality.
    pub originality: Score,
    /// The score and reason of feasibility.
    pub feasibility: Score,
    /// The score and reason of versatility.
    pub versatility: Score,
}

impl IdeaScore {
    /// 三项全为 0 的初始分
    pub fn zero() -> Self {
        Self {
            originality: Score::new(0.0, ""),
            feasibility: Score::new(0.0, ""),
            versatility: Score::new(0.0, ""),
        }
    }

    /// 三个维度差值之和
    pub fn diff(&self, prev: &IdeaScore) -> f64 {
        (self.originality.score - prev.originality.score)
            + (self.feasibility.score - prev.feasibility.score)
            + (self.versatility.score - prev.versatility.score)
    }

    /// diff 严格大于阈值
    pub fn is_improved(&self, prev: &IdeaScore, threshold: f64) -> bool {
        self.diff(prev) > threshold
    }
}

impl fmt::Display for IdeaScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "- Originality: {:.1}\n- Feasibility: {:.1}\n- Versatility: {:.1}",
            self.originality.score, self.feasibility.score, self.versatility.score
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoringResult {
    /// The score of idea.
    pub score: IdeaScore,
    /// Whether the external information is lack for scoring idea.
    pub is_lack_information: bool,
    /// The additional key sentences for requesting more external information.
    #[serde(default)]
    pub additional_key_sentences: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReviewIdeaResult {
    /// The points to keep in the next idea.
    pub keep_points: Vec<String>,
    /// The suggestions for the next idea.
    pub suggestions: Vec<String>,
}

impl ReviewIdeaResult {
    pub fn is_completed(&self) -> bool {
        self.suggestions.first().map(String::as_str) == Some(COMPLETED)
    }

    /// 供下一轮构思使用的评审意见；完成时返回哨兵
    pub fn review_comment(&self) -> String {
        if self.is_completed() {
            return COMPLETED.to_string();
        }
        format!(
            "#### Keep Points:\n{}\n\n#### Suggestions:\n{}",
            bullet_list(&self.keep_points),
            bullet_list(&self.suggestions)
        )
    }
}

fn bullet_list(items: &[String]) -> String {
    format!("- {}", items.join("\n- "))
}

/// 一个候选特征映射设计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedIdea {
    /// The name of the generated feature map.
    pub feature_map_name: String,
    /// The summary of the generated feature map.
    pub summary: String,
    /// The detail explanation of the generated feature map.
    pub explanation: String,
    /// The formula of the generated feature map.
    pub formula: String,
    /// The key sentences expressing the generated feature map (up to 5).
    pub key_sentences: Vec<String>,
}

impl GeneratedIdea {
    /// 代码生成阶段只需要名称、解释与公式
    pub fn for_code_generation(&self) -> String {
        format!(
            "### Feature Map Name\n{}\n\n### Explanation\n{}\n\n### Formula\n{}\n",
            self.feature_map_name, self.explanation, self.formula
        )
    }
}

impl fmt::Display for GeneratedIdea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "## feature_map_name\n{}\n\n## summary\n{}\n\n## explanation\n{}\n\n## formula\n{}\n\n## key_sentences\n{}\n",
            self.feature_map_name,
            self.summary,
            self.explanation,
            self.formula,
            self.key_sentences.join("\n")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedIdeaResult {
    /// The results of the idea generation.
    pub results: Vec<GeneratedIdea>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReflectIdeaResult {
    /// The result of the idea reflection.
    pub result: GeneratedIdea,
    /// Whether the reflection is completed.
    pub is_completed: bool,
}

/// 生成的实现：类名 + 源码；源码在构造与反序列化时都会去掉 markdown 围栏
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedImpl {
    /// The name of the implemented class.
    pub class_name: String,
    /// The code of the implemented class.
    #[serde(deserialize_with = "deserialize_bare_code")]
    #[schemars(with = "String")]
    pub code: String,
}

impl GeneratedImpl {
    pub fn new(class_name: impl Into<String>, code: impl AsRef<str>) -> Self {
        Self {
            class_name: class_name.into(),
            code: strip_code_fence(code.as_ref()),
        }
    }
}

fn deserialize_bare_code<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(strip_code_fence(&raw))
}

/// 去掉 ```python / ``` 围栏；没有围栏时原样返回
pub fn strip_code_fence(code: &str) -> String {
    let trimmed = code.trim();
    if !trimmed.starts_with("```") {
        return code.to_string();
    }
    let body = match trimmed.find('\n') {
        Some(idx) => &trimmed[idx + 1..],
        None => return String::new(),
    };
    let body = body.trim_end();
    let body = body.strip_suffix("```").unwrap_or(body);
    body.strip_suffix('\n').unwrap_or(body).to_string()
}

/// 文档校验：调用点参数与文档参数对照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DocsValidateResult {
    /// The class name
    pub class_name: String,
    /// The arguments defined in the generated code.
    pub user_args_name: Vec<String>,
    /// The arguments supported in the documentation.
    pub docs_args_name: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DocsValidateResultList {
    /// The results of the document validation.
    pub result: Vec<DocsValidateResult>,
}

impl DocsValidateResultList {
    /// 文档中不存在的用户参数逐条成为错误
    pub fn error_messages(&self) -> Vec<String> {
        self.result
            .iter()
            .flat_map(|r| {
                r.user_args_name
                    .iter()
                    .filter(|arg| !r.docs_args_name.contains(arg))
                    .map(move |arg| {
                        format!(
                            "{}: Argument '{}' is not supported. Please only use supported arguments: {:?}",
                            r.class_name, arg, r.docs_args_name
                        )
                    })
            })
            .collect()
    }
}

/// 一个想法 + 评分 + 实现，验证与基准测试的基本单位
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedResult {
    pub idea: GeneratedIdea,
    pub score: IdeaScore,
    pub implement: GeneratedImpl,
}
