//! 代码验证与修复循环
//!
//! 静态检查（语法 + 文档合规）失败时用“只修复”提示重新生成，最多 max_retry 次；
//! 通过后若代码与上次采纳的代码完全相同则直接返回，否则试运行，失败同样重新生成。
//! 两个阶段共用一条验证对话线程。

pub mod docs;
pub mod dry_run;
pub mod extract;
pub mod syntax;

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::{ResearchResult, RetryPolicy, RunContext, ValidationError};
use crate::harness::ExperimentHarness;
use crate::llm::ChatClient;
use crate::memory::Message;
use crate::prompts::retry_code_prompt;
use crate::research::code::CodeGenerator;
use crate::research::types::{GeneratedImpl, GeneratedResult};
use crate::store::VectorStore;

pub use docs::DocsChecker;
pub use dry_run::{DryRunReport, DryRunner, DRY_RUN_CODE_FILE};
pub use extract::{extract_call_names, extract_class_code, extract_qml_calls};
pub use syntax::{PythonSyntaxChecker, SyntaxChecker};

/// 默认重试次数
pub const DEFAULT_MAX_RETRY: usize = 3;

pub const CLASS_NOT_FOUND: &str = "Feature map class is not found.";

/// 与上次采纳的代码逐字节相同
pub fn is_same_code(last_code: &str, code: &str) -> bool {
    last_code == code
}

pub struct CodeValidator {
    client: Arc<ChatClient>,
    syntax: Arc<dyn SyntaxChecker>,
    docs: Option<DocsChecker>,
    dry_runner: DryRunner,
    max_retry: usize,
}

/// 一次验证过程中的修复状态；费用直接记到调用方的累计值上
struct Repair<'a> {
    generator: CodeGenerator,
    history: Vec<Message>,
    spent: &'a mut f64,
}

impl Repair<'_> {
    async fn regenerate(
        &mut self,
        code: &str,
        errors: &[String],
        warnings: &[String],
    ) -> ResearchResult<GeneratedImpl> {
        let prompt = retry_code_prompt(code, errors, warnings);
        let out = self.generator.generate(&prompt, &self.history, None).await?;
        *self.spent += out.cost;
        self.history = out.history;
        Ok(out.value)
    }
}

impl CodeValidator {
    pub fn new(
        client: Arc<ChatClient>,
        syntax: Arc<dyn SyntaxChecker>,
        docs_store: Option<Arc<dyn VectorStore>>,
        harness: Arc<dyn ExperimentHarness>,
        dry_run_config: impl Into<PathBuf>,
        module_root: impl Into<String>,
    ) -> Self {
        let docs = docs_store.map(|store| DocsChecker::new(client.clone(), store));
        Self {
            client,
            syntax,
            docs,
            dry_runner: DryRunner::new(harness, dry_run_config, module_root),
            max_retry: DEFAULT_MAX_RETRY,
        }
    }

    pub fn with_max_retry(mut self, max_retry: usize) -> Self {
        self.max_retry = max_retry;
        self
    }

    /// 语法 + 类提取 + 文档合规；返回 (错误列表, 费用)
    pub async fn static_check(&self, code: &str, ctx: &RunContext) -> ResearchResult<(Vec<String>, f64)> {
        let mut errors = self.syntax.check(code).await?;

        let Some(class_code) = extract_class_code(code) else {
            tracing::info!("{}", CLASS_NOT_FOUND);
            errors.push(CLASS_NOT_FOUND.to_string());
            return Ok((errors, 0.0));
        };

        let mut cost = 0.0;
        match &self.docs {
            Some(docs) => {
                let calls = extract_qml_calls(&class_code);
                let names = extract_call_names(code);
                let (doc_errors, c) = docs
                    .check(
                        &calls,
                        &names,
                        &ctx.model_versions.validation,
                        &ctx.model_versions.parser,
                    )
                    .await?;
                cost += c;
                errors.extend(doc_errors);
            }
            None => tracing::info!("pennylane_doc: Documentation store is not provided. Skip validation."),
        }
        Ok((errors, cost))
    }

    /// 验证一个生成结果；想法与评分保持不变
    ///
    /// 已花费的费用累加到 `spent`，验证失败时同样保留。
    pub async fn validate(
        &self,
        ctx: &RunContext,
        result: &GeneratedResult,
        spent: &mut f64,
    ) -> ResearchResult<GeneratedResult> {
        let mut repair = Repair {
            generator: CodeGenerator::new(
                self.client.clone(),
                &ctx.model_versions.default,
                &ctx.model_versions.parser,
            ),
            history: Vec::new(),
            spent,
        };
        let mut implement = result.implement.clone();

        // 静态检查：最多 max_retry + 1 次检查，其间 max_retry 次重新生成
        let mut last_errors = Vec::new();
        let mut passed = false;
        for attempt in RetryPolicy::immediate(self.max_retry + 1).attempts() {
            let (errors, c) = self.static_check(&implement.code, ctx).await?;
            *repair.spent += c;
            if errors.is_empty() {
                passed = true;
                break;
            }
            if attempt.is_last() {
                last_errors = errors;
                break;
            }
            tracing::info!("Generated code is invalid. Retry to generate code...");
            implement = repair.regenerate(&implement.code, &errors, &[]).await?;
        }
        if !passed {
            return Err(ValidationError::StaticChecksExhausted {
                retries: self.max_retry,
                errors: last_errors,
            }
            .into());
        }

        let validated = |implement: GeneratedImpl| GeneratedResult {
            idea: result.idea.clone(),
            score: result.score.clone(),
            implement,
        };

        if is_same_code(&ctx.last_code, &implement.code) {
            tracing::info!("Generated code is same as last code.");
            return Ok(validated(implement));
        }

        // 试运行：最多 max_retry 次执行，失败之间重新生成
        let mut last_error = String::new();
        for attempt in RetryPolicy::immediate(self.max_retry).attempts() {
            let report = self
                .dry_runner
                .run(&ctx.gen_code_dir, &implement.code, &implement.class_name)
                .await?;
            let Some(error) = report.error else {
                if !report.warnings.is_empty() {
                    tracing::info!("dry run warnings: {:?}", report.warnings);
                }
                return Ok(validated(implement));
            };
            if attempt.is_last() {
                last_error = error;
                break;
            }
            implement = repair
                .regenerate(&implement.code, std::slice::from_ref(&error), &report.warnings)
                .await?;
        }
        Err(ValidationError::DryRunExhausted {
            attempts: self.max_retry.max(1),
            last_error,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ContextSeed, HarnessError, ModelVersions, RunBudgets};
    use crate::harness::{RunMode, RunOutcome};
    use crate::llm::{ScriptedChatProvider, TokenCounts};
    use crate::research::types::{GeneratedIdea, IdeaScore};
    use async_trait::async_trait;
    use serde_json::json;
    use std::path::Path;
    use std::sync::Mutex;

    /// 含 `syntax error` 的代码视为语法错误
    struct StubChecker;

    #[async_trait]
    impl SyntaxChecker for StubChecker {
        async fn check(&self, code: &str) -> Result<Vec<String>, ValidationError> {
            if code.contains("syntax error") {
                Ok(vec!["ast: Syntax error: invalid syntax".into()])
            } else {
                Ok(vec![])
            }
        }
    }

    /// 按顺序返回预置的试运行结果
    struct FakeHarness {
        outcomes: Mutex<Vec<Result<RunOutcome, HarnessError>>>,
        runs: Mutex<usize>,
    }

    impl FakeHarness {
        fn new(outcomes: Vec<Result<RunOutcome, HarnessError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                runs: Mutex::new(0),
            }
        }

        fn runs(&self) -> usize {
            *self.runs.lock().unwrap()
        }
    }

    #[async_trait]
    impl ExperimentHarness for FakeHarness {
        fn name(&self) -> &str {
            "exp"
        }

        async fn run(&self, _config: &Path, _mode: RunMode) -> Result<RunOutcome, HarnessError> {
            *self.runs.lock().unwrap() += 1;
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.is_empty() {
                Ok(RunOutcome::default())
            } else {
                outcomes.remove(0)
            }
        }

        async fn recorded_runs(&self) -> Result<usize, HarnessError> {
            Ok(0)
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        ctx: RunContext,
        dry_run_config: PathBuf,
    }

    fn fixture(last_code: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let dry_run_config = dir.path().join("dry_run.yaml");
        std::fs::write(
            &dry_run_config,
            "device:\n  n_qubits: 4\nfeature_map:\n  module_name: seed\n  implement_name: Seed\n",
        )
        .unwrap();
        let ctx = RunContext::initial(ContextSeed {
            gen_config_dir: dir.path().join("config"),
            gen_code_dir: dir.path().join("code"),
            model_versions: ModelVersions::default(),
            n_qubits: 4,
            budgets: RunBudgets::default(),
            seed_code: last_code.to_string(),
        });
        Fixture {
            _dir: dir,
            ctx,
            dry_run_config,
        }
    }

    fn result(code: &str) -> GeneratedResult {
        GeneratedResult {
            idea: GeneratedIdea {
                feature_map_name: "Map".into(),
                summary: "s".into(),
                explanation: "e".into(),
                formula: "f".into(),
                key_sentences: vec![],
            },
            score: IdeaScore::zero(),
            implement: GeneratedImpl::new("Fm", code),
        }
    }

    fn impl_reply(code: &str) -> String {
        json!({"class_name": "Fm", "code": code}).to_string()
    }

    const GOOD: &str = "class Fm:\n    def feature_map(self, x):\n        pass\n";

    #[tokio::test]
    async fn test_same_code_skips_dry_run() {
        let f = fixture(GOOD);
        let provider = Arc::new(ScriptedChatProvider::new());
        let client = Arc::new(ChatClient::new(provider.clone(), "gpt-4o-mini"));
        let harness = Arc::new(FakeHarness::new(vec![]));
        let validator = CodeValidator::new(
            client,
            Arc::new(StubChecker),
            None,
            harness.clone(),
            &f.dry_run_config,
            "generated",
        );

        let mut cost = 0.0;
        let validated = validator.validate(&f.ctx, &result(GOOD), &mut cost).await.unwrap();
        assert_eq!(validated.implement.code, GOOD);
        assert_eq!(cost, 0.0);
        assert_eq!(harness.runs(), 0);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_static_failure_regenerates_then_dry_runs() {
        let f = fixture("seed");
        let provider = Arc::new(ScriptedChatProvider::new());
        provider.push("GeneratedImpl", impl_reply(GOOD));
        let client = Arc::new(ChatClient::new(provider.clone(), "gpt-4o-mini"));
        let harness = Arc::new(FakeHarness::new(vec![]));
        let validator = CodeValidator::new(
            client,
            Arc::new(StubChecker),
            None,
            harness.clone(),
            &f.dry_run_config,
            "generated",
        );

        let broken = "class Fm:\n    syntax error\n";
        let validated = validator.validate(&f.ctx, &result(broken), &mut 0.0).await.unwrap();
        assert_eq!(validated.implement.code, GOOD);
        assert_eq!(harness.runs(), 1);

        let req = &provider.requests()[0];
        assert!(req.user_prompt.contains("ast: Syntax error: invalid syntax"));
        assert!(f.ctx.gen_code_dir.join(DRY_RUN_CODE_FILE).exists());
    }

    #[tokio::test]
    async fn test_missing_class_is_static_error() {
        let f = fixture("seed");
        let provider = Arc::new(ScriptedChatProvider::new());
        provider.push("GeneratedImpl", impl_reply("x = 1\n"));
        let client = Arc::new(ChatClient::new(provider.clone(), "gpt-4o-mini"));
        let validator = CodeValidator::new(
            client,
            Arc::new(StubChecker),
            None,
            Arc::new(FakeHarness::new(vec![])),
            &f.dry_run_config,
            "generated",
        )
        .with_max_retry(2);

        let err = validator.validate(&f.ctx, &result("x = 1\n"), &mut 0.0).await.unwrap_err();
        match err {
            crate::core::ResearchError::Validation(ValidationError::StaticChecksExhausted { retries, errors }) => {
                assert_eq!(retries, 2);
                assert_eq!(errors, vec![CLASS_NOT_FOUND.to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_dry_run_failure_feeds_traceback_and_warnings() {
        let f = fixture("seed");
        let provider = Arc::new(ScriptedChatProvider::new());
        provider.push("GeneratedImpl", impl_reply(GOOD));
        let client = Arc::new(ChatClient::new(provider.clone(), "gpt-4o-mini"));
        let harness = Arc::new(FakeHarness::new(vec![Err(HarnessError::RunFailed {
            message: "Traceback: NameError: np".into(),
            warnings: vec!["UserWarning: shots".into()],
        })]));
        let validator = CodeValidator::new(
            client,
            Arc::new(StubChecker),
            None,
            harness.clone(),
            &f.dry_run_config,
            "generated",
        );

        let first = "class Fm:\n    def feature_map(self, x):\n        np.sin(x)\n";
        let validated = validator.validate(&f.ctx, &result(first), &mut 0.0).await.unwrap();
        assert_eq!(validated.implement.code, GOOD);
        assert_eq!(harness.runs(), 2);

        let prompt = &provider.requests()[0].user_prompt;
        assert!(prompt.contains("NameError"));
        assert!(prompt.contains("UserWarning: shots"));
    }

    #[tokio::test]
    async fn test_dry_run_exhausted_keeps_spent_cost() {
        let f = fixture("seed");
        let provider = Arc::new(ScriptedChatProvider::new().with_usage(TokenCounts {
            input: 1_000,
            cached: 0,
            output: 500,
        }));
        provider.push("GeneratedImpl", impl_reply(GOOD));
        let client = Arc::new(ChatClient::new(provider.clone(), "gpt-4o-mini"));
        let failures = (0..3)
            .map(|i| {
                Err(HarnessError::RunFailed {
                    message: format!("failure {}", i),
                    warnings: vec![],
                })
            })
            .collect();
        let harness = Arc::new(FakeHarness::new(failures));
        let validator = CodeValidator::new(
            client.clone(),
            Arc::new(StubChecker),
            None,
            harness.clone(),
            &f.dry_run_config,
            "generated",
        );

        let mut spent = 0.0;
        let err = validator
            .validate(&f.ctx, &result(GOOD.replace("pass", "x").as_str()), &mut spent)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failure 2"));
        assert_eq!(harness.runs(), 3);
        assert_eq!(provider.call_count(), 2);
        // 两次修复的费用在失败后仍然记账
        assert!(spent > 0.0);
        assert!((spent - client.total_cost()).abs() < 1e-12);
    }
}
