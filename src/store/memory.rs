//! 进程内向量库：词重叠打分，支持 Pinecone 风格的元数据过滤
//!
//! 用于测试与离线运行，不需要嵌入服务。

use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::StoreError;
use crate::memory::jaccard_similarity;

use super::chunking::chunk_text;
use super::{chunk_id, QueryMatch, UpsertOutcome, UpsertRequest, VectorStore};

#[derive(Debug, Clone)]
struct Record {
    id: String,
    document_id: String,
    text: String,
    metadata: Value,
}

#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<Record>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接放入一条记录（不分块），元数据需自带 chunk_text 等字段
    pub fn insert(&self, id: impl Into<String>, text: impl Into<String>, metadata: Value) {
        let id = id.into();
        let document_id = metadata
            .get("document_id")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| id.clone());
        if let Ok(mut records) = self.records.write() {
            records.retain(|r| r.id != id);
            records.push(Record {
                id,
                document_id,
                text: text.into(),
                metadata,
            });
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 匹配 `$and` / `$or` / `$in` / `$nin` / `$eq` / `$ne` 与直接相等；键 `id` 指记录 ID
pub(crate) fn matches_filter(id: &str, metadata: &Value, filter: &Value) -> bool {
    let Some(map) = filter.as_object() else {
        return true;
    };
    map.iter().all(|(key, cond)| match key.as_str() {
        "$or" => cond
            .as_array()
            .is_some_and(|subs| subs.iter().any(|f| matches_filter(id, metadata, f))),
        "$and" => cond
            .as_array()
            .is_some_and(|subs| subs.iter().all(|f| matches_filter(id, metadata, f))),
        _ => {
            let eq = |expected: &Value| {
                if key == "id" {
                    expected.as_str() == Some(id)
                } else {
                    metadata.get(key) == Some(expected)
                }
            };
            match cond.as_object() {
                Some(ops) if ops.keys().all(|k| k.starts_with('$')) => {
                    ops.iter().all(|(op, expected)| match op.as_str() {
                        "$eq" => eq(expected),
                        "$ne" => !eq(expected),
                        "$in" => expected.as_array().is_some_and(|l| l.iter().any(eq)),
                        "$nin" => !expected.as_array().is_some_and(|l| l.iter().any(eq)),
                        _ => false,
                    })
                }
                _ => eq(cond),
            }
        }
    })
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn query(
        &self,
        text: &str,
        top_k: usize,
        filter: Option<Value>,
    ) -> Result<Vec<QueryMatch>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|e| StoreError::Request(e.to_string()))?;
        let mut hits: Vec<QueryMatch> = records
            .iter()
            .filter(|r| filter.as_ref().map_or(true, |f| matches_filter(&r.id, &r.metadata, f)))
            .map(|r| QueryMatch {
                id: r.id.clone(),
                score: jaccard_similarity(text, &r.text),
                metadata: r.metadata.clone(),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn upsert(&self, request: UpsertRequest) -> Result<UpsertOutcome, StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| StoreError::Request(e.to_string()))?;
        if records.iter().any(|r| r.document_id == request.document_id) {
            if !request.allow_update {
                tracing::error!(
                    document_id = %request.document_id,
                    "Document already exists and update is not allowed"
                );
                return Ok(UpsertOutcome::Skipped);
            }
            records.retain(|r| r.document_id != request.document_id);
        }
        let chunks = chunk_text(&request.text, request.chunk_size, request.method);
        for (i, chunk) in chunks.iter().enumerate() {
            records.push(Record {
                id: chunk_id(&request.document_id, i),
                document_id: request.document_id.clone(),
                text: chunk.clone(),
                metadata: request.chunk_metadata(i, chunk),
            });
        }
        Ok(UpsertOutcome::Written {
            chunks: chunks.len(),
        })
    }

    async fn check_connection(&self) -> bool {
        true
    }
}
