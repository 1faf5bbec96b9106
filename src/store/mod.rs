//! 向量库：论文索引与 PennyLane 文档索引
//!
//! 两个索引共用同一套接口：写入时按块嵌入，查询时返回带元数据的匹配项，
//! 过滤条件沿用 Pinecone 的 `$nin` / `$in` / `$eq` / `$or` 语法。

pub mod chunking;
pub mod memory;
pub mod pinecone;

use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::StoreError;

pub use chunking::{chunk_by_sentence, chunk_by_size, chunk_text};
pub use memory::InMemoryStore;
pub use pinecone::PineconeStore;

/// 分块方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChunkMethod {
    #[default]
    Size,
    Sentence,
}

impl FromStr for ChunkMethod {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "size" => Ok(ChunkMethod::Size),
            "sentence" => Ok(ChunkMethod::Sentence),
            other => Err(StoreError::InvalidChunkMethod(other.to_string())),
        }
    }
}

/// 一条检索结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub metadata: Value,
}

impl QueryMatch {
    /// 读取字符串元数据，缺失时返回空串
    pub fn meta_str(&self, key: &str) -> &str {
        self.metadata.get(key).and_then(Value::as_str).unwrap_or("")
    }

    /// 块所属文档 ID：优先 `document_id`，否则去掉 `_{chunk}` 后缀
    pub fn document_id(&self) -> &str {
        match self.metadata.get("document_id").and_then(Value::as_str) {
            Some(id) => id,
            None => self.id.rsplit_once('_').map(|(doc, _)| doc).unwrap_or(&self.id),
        }
    }
}

/// 写入请求
#[derive(Debug, Clone)]
pub struct UpsertRequest {
    pub document_id: String,
    pub text: String,
    pub chunk_size: usize,
    pub metadata: Value,
    pub method: ChunkMethod,
    pub allow_update: bool,
}

impl UpsertRequest {
    pub fn new(document_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            text: text.into(),
            chunk_size: 500,
            metadata: Value::Object(Default::default()),
            method: ChunkMethod::Size,
            allow_update: false,
        }
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn method(mut self, method: ChunkMethod) -> Self {
        self.method = method;
        self
    }

    pub fn allow_update(mut self, allow: bool) -> Self {
        self.allow_update = allow;
        self
    }

    /// 单块元数据：原元数据 + chunk_text / chunk_id / document_id
    pub(crate) fn chunk_metadata(&self, index: usize, chunk: &str) -> Value {
        let mut meta = match &self.metadata {
            Value::Object(map) => map.clone(),
            _ => Default::default(),
        };
        meta.insert("chunk_text".into(), Value::String(chunk.to_string()));
        meta.insert("chunk_id".into(), Value::from(index as u64));
        meta.entry("document_id")
            .or_insert_with(|| Value::String(self.document_id.clone()));
        Value::Object(meta)
    }
}

/// 块 ID：`{document_id}_{index}`
pub fn chunk_id(document_id: &str, index: usize) -> String {
    format!("{}_{}", document_id, index)
}

/// 写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Written { chunks: usize },
    /// 文档已存在且不允许更新
    Skipped,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn query(
        &self,
        text: &str,
        top_k: usize,
        filter: Option<Value>,
    ) -> Result<Vec<QueryMatch>, StoreError>;

    async fn upsert(&self, request: UpsertRequest) -> Result<UpsertOutcome, StoreError>;

    /// 连通性检查，失败返回 false
    async fn check_connection(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chunk_method_parse() {
        assert_eq!("sentence".parse::<ChunkMethod>().unwrap(), ChunkMethod::Sentence);
        assert_eq!("Size".parse::<ChunkMethod>().unwrap(), ChunkMethod::Size);
        assert!(matches!(
            "paragraph".parse::<ChunkMethod>(),
            Err(StoreError::InvalidChunkMethod(m)) if m == "paragraph"
        ));
    }

    #[test]
    fn test_document_id_fallback() {
        let m = QueryMatch {
            id: "2401.00001_3".into(),
            score: 0.9,
            metadata: json!({"chunk_text": "x"}),
        };
        assert_eq!(m.document_id(), "2401.00001");
        assert_eq!(m.meta_str("chunk_text"), "x");
        assert_eq!(m.meta_str("missing"), "");
    }

    #[test]
    fn test_chunk_metadata_merges() {
        let req = UpsertRequest::new("doc", "t").metadata(json!({"abstract": "a"}));
        let meta = req.chunk_metadata(2, "chunk");
        assert_eq!(meta["abstract"], "a");
        assert_eq!(meta["chunk_text"], "chunk");
        assert_eq!(meta["chunk_id"], 2);
        assert_eq!(meta["document_id"], "doc");
    }
}
