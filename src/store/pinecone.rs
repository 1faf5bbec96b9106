//! Pinecone 数据面客户端（REST over reqwest）

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::StoreError;
use crate::llm::Embedder;

use super::chunking::chunk_text;
use super::{chunk_id, QueryMatch, UpsertOutcome, UpsertRequest, VectorStore};

const UPSERT_BATCH_SIZE: usize = 100;

pub struct PineconeStore {
    http: reqwest::Client,
    host: String,
    api_key: String,
    namespace: Option<String>,
    embedder: Arc<dyn Embedder>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct FetchResponse {
    #[serde(default)]
    vectors: serde_json::Map<String, Value>,
}

impl PineconeStore {
    /// host 为索引的数据面地址，可省略 scheme
    pub fn new(
        host: &str,
        api_key: &str,
        embedder: Arc<dyn Embedder>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Request(e.to_string()))?;
        let host = host.trim_end_matches('/');
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };
        Ok(Self {
            http,
            host,
            api_key: api_key.to_string(),
            namespace: None,
            embedder,
        })
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace.filter(|n| !n.is_empty());
        self
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, StoreError> {
        let response = request
            .header("Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| StoreError::Request(e.to_string()))
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, StoreError> {
        self.send(self.http.post(format!("{}{}", self.host, path)).json(&body))
            .await
    }

    async fn exists(&self, id: &str) -> Result<bool, StoreError> {
        let mut query = vec![("ids", id.to_string())];
        if let Some(ns) = &self.namespace {
            query.push(("namespace", ns.clone()));
        }
        let value = self
            .send(
                self.http
                    .get(format!("{}/vectors/fetch", self.host))
                    .query(&query),
            )
            .await?;
        let fetched: FetchResponse =
            serde_json::from_value(value).map_err(|e| StoreError::Request(e.to_string()))?;
        Ok(!fetched.vectors.is_empty())
    }

    fn with_namespace_field(&self, mut body: Value) -> Value {
        if let Some(ns) = &self.namespace {
            body["namespace"] = json!(ns);
        }
        body
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    async fn query(
        &self,
        text: &str,
        top_k: usize,
        filter: Option<Value>,
    ) -> Result<Vec<QueryMatch>, StoreError> {
        let embeddings = self.embedder.embed(&[text.to_string()]).await?;
        let vector = embeddings.vectors.into_iter().next().ok_or_else(|| {
            StoreError::Request("embedding response has no vector".into())
        })?;

        let mut body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
        });
        if let Some(filter) = filter {
            body["filter"] = filter;
        }
        let value = self.post("/query", self.with_namespace_field(body)).await?;
        let parsed: QueryResponse =
            serde_json::from_value(value).map_err(|e| StoreError::Request(e.to_string()))?;
        tracing::debug!(top_k, hits = parsed.matches.len(), "pinecone query");
        Ok(parsed.matches)
    }

    async fn upsert(&self, request: UpsertRequest) -> Result<UpsertOutcome, StoreError> {
        // 以首块 ID 判断文档是否已写入
        if self.exists(&chunk_id(&request.document_id, 0)).await? && !request.allow_update {
            tracing::error!(
                document_id = %request.document_id,
                "Document already exists and update is not allowed"
            );
            return Ok(UpsertOutcome::Skipped);
        }

        let chunks = chunk_text(&request.text, request.chunk_size, request.method);
        if chunks.is_empty() {
            return Ok(UpsertOutcome::Written { chunks: 0 });
        }
        let embeddings = self.embedder.embed(&chunks).await?;
        if embeddings.vectors.len() != chunks.len() {
            return Err(StoreError::Request(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.vectors.len()
            )));
        }

        let vectors: Vec<Value> = chunks
            .iter()
            .zip(embeddings.vectors)
            .enumerate()
            .map(|(i, (chunk, values))| {
                json!({
                    "id": chunk_id(&request.document_id, i),
                    "values": values,
                    "metadata": request.chunk_metadata(i, chunk),
                })
            })
            .collect();

        for batch in vectors.chunks(UPSERT_BATCH_SIZE) {
            let body = self.with_namespace_field(json!({ "vectors": batch }));
            self.post("/vectors/upsert", body).await?;
        }
        tracing::info!(
            document_id = %request.document_id,
            chunks = chunks.len(),
            "Upserted document"
        );
        Ok(UpsertOutcome::Written {
            chunks: chunks.len(),
        })
    }

    async fn check_connection(&self) -> bool {
        match self.post("/describe_index_stats", json!({})).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Pinecone connection check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LlmError;
    use crate::llm::Embeddings;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Embeddings, LlmError> {
            Ok(Embeddings {
                vectors: texts.iter().map(|_| vec![0.1, 0.2]).collect(),
                cost: 0.0,
            })
        }
    }

    fn store(server: &MockServer) -> PineconeStore {
        PineconeStore::new(
            &server.uri(),
            "pc-key",
            Arc::new(FixedEmbedder),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_query_sends_filter_and_parses_matches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(header("Api-Key", "pc-key"))
            .and(body_partial_json(json!({
                "topK": 1,
                "includeMetadata": true,
                "filter": {"id": {"$nin": ["a"]}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "matches": [{"id": "b_0", "score": 0.8, "metadata": {"chunk_text": "hello"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let hits = store(&server)
            .query("q", 1, Some(json!({"id": {"$nin": ["a"]}})))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b_0");
        assert_eq!(hits[0].meta_str("chunk_text"), "hello");
    }

    #[tokio::test]
    async fn test_upsert_skips_existing_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vectors/fetch"))
            .and(query_param("ids", "doc_0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "vectors": {"doc_0": {"id": "doc_0"}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/vectors/upsert"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let outcome = store(&server)
            .upsert(UpsertRequest::new("doc", "some text here"))
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_upsert_writes_chunks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vectors/fetch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"vectors": {}})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/vectors/upsert"))
            .and(body_partial_json(json!({
                "vectors": [{"id": "doc_0", "metadata": {"chunk_id": 0, "chunk_text": "a b"}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"upsertedCount": 2})))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = store(&server)
            .upsert(UpsertRequest::new("doc", "a b c").chunk_size(2))
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Written { chunks: 2 });
    }

    #[tokio::test]
    async fn test_check_connection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/describe_index_stats"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;
        assert!(!store(&server).check_connection().await);
    }
}
