//! 论文摘要与本地全文加载

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::ResearchResult;
use crate::llm::{ChatClient, ChatOptions, GPT_MAX_TOKENS};
use crate::memory::cut_to_token_limit;
use crate::prompts::summary_prompt;
use crate::store::QueryMatch;

use super::scoring::format_related_paper;

/// 全文截断上限
pub const MAX_PAPER_CONTENT_TOKENS: usize = 100_000;
/// 摘要目标词数
pub const MAX_PAPER_SUMMARY_WORDS: usize = 1000;

pub struct PaperSummarizer {
    client: Arc<ChatClient>,
    model: String,
}

impl PaperSummarizer {
    pub fn new(client: Arc<ChatClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// 纯文本摘要，不带历史
    pub async fn summarize(&self, paper_content: &str, max_summary_words: usize) -> ResearchResult<(String, f64)> {
        tracing::info!("Summarize Paper...");
        let prompt = summary_prompt(paper_content, max_summary_words);
        let opts = ChatOptions::new()
            .n_history(Some(0))
            .max_tokens(GPT_MAX_TOKENS)
            .model_version(&self.model);
        let response = self
            .client
            .parse_chat(&prompt.system, &prompt.user, &[], &opts)
            .await?;
        tracing::info!("Summarize Paper is done.");
        Ok((response.content, response.cost))
    }
}

/// 读取 `{paper_dir}/{document_id}.txt`；文件不存在时返回空串
pub async fn load_paper(paper_dir: &Path, document_id: &str) -> String {
    let path = paper_dir.join(format!("{}.txt", document_id));
    match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("Local paper file is not readable: {} ({})", path.display(), e);
            String::new()
        }
    }
}

/// 反思阶段的相关文献来源
pub struct RelatedPapers {
    paper_dir: Option<PathBuf>,
    summarizer: Option<PaperSummarizer>,
}

impl RelatedPapers {
    pub fn new(paper_dir: Option<PathBuf>, summarizer: Option<PaperSummarizer>) -> Self {
        Self { paper_dir, summarizer }
    }

    /// 每条检索结果转为一段文献文本，返回 (文本列表, 摘要费用)
    ///
    /// 有本地论文目录时读全文并截断，启用摘要时再压缩；没有目录时直接使用检索到的摘要与片段。
    pub async fn load(&self, hits: &[QueryMatch]) -> ResearchResult<(Vec<String>, f64)> {
        let Some(dir) = &self.paper_dir else {
            return Ok((hits.iter().map(format_related_paper).collect(), 0.0));
        };
        let mut papers = Vec::with_capacity(hits.len());
        let mut cost = 0.0;
        for hit in hits {
            let paper = load_paper(dir, hit.document_id()).await;
            let paper = cut_to_token_limit(&paper, MAX_PAPER_CONTENT_TOKENS);
            match &self.summarizer {
                Some(summarizer) => {
                    let (summary, c) = summarizer.summarize(&paper, MAX_PAPER_SUMMARY_WORDS).await?;
                    cost += c;
                    papers.push(summary);
                }
                None => papers.push(paper),
            }
        }
        Ok((papers, cost))
    }
}
