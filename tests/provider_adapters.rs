//! HTTP 适配器集成测试（wiremock）

use std::sync::Arc;
use std::time::Duration;

use orbit::core::LlmError;
use orbit::llm::{
    AnthropicLimits, AnthropicProvider, ChatClient, ChatOptions, ChatProvider, ChatRequest,
    GoogleProvider, ResponseSchema, ScriptedChatProvider, TokenCounts,
};
use orbit::memory::Message;
use orbit::research::ReviewIdeaResult;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(model: &str) -> ChatRequest {
    ChatRequest {
        model: model.into(),
        system_prompt: "sys".into(),
        user_prompt: "review the trial".into(),
        history: vec![Message::user("q"), Message::assistant("a")],
        temperature: Some(0.2),
        n: 1,
        max_tokens: None,
        response_format: None,
        reasoning_effort: None,
        max_thinking_tokens: None,
    }
}

#[tokio::test]
async fn anthropic_reformats_structured_reply_through_parse_client() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "ak-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({"model": "claude-3-5-haiku-latest", "system": "sys"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                {"type": "text", "text": "Keep the angle encoding. "},
                {"type": "text", "text": "Add entanglement."}
            ],
            "usage": {"input_tokens": 120, "output_tokens": 30}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let scripted = Arc::new(ScriptedChatProvider::new());
    scripted.push(
        "ReviewIdeaResult",
        json!({"keep_points": ["angle encoding"], "suggestions": ["add entanglement"]}).to_string(),
    );
    let parser = Arc::new(ChatClient::new(scripted.clone(), "gpt-4o-mini"));
    let provider = AnthropicProvider::new(
        Some(&server.uri()),
        Some("ak-test"),
        AnthropicLimits::default(),
        Duration::from_secs(5),
    )
    .unwrap()
    .with_parse_client(parser);

    let mut req = request("claude-3-5-haiku-latest");
    req.response_format = Some(ResponseSchema::of::<ReviewIdeaResult>());
    let reply = provider.complete(&req).await.unwrap();

    let parsed: ReviewIdeaResult = serde_json::from_str(&reply.content).unwrap();
    assert_eq!(parsed.suggestions, vec!["add entanglement"]);
    assert_eq!(reply.usage, TokenCounts { input: 120, cached: 0, output: 30 });
    assert!(scripted.requests()[0].user_prompt.contains("Add entanglement."));
}

#[tokio::test]
async fn anthropic_surfaces_api_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new(
        Some(&server.uri()),
        Some("ak-test"),
        AnthropicLimits::default(),
        Duration::from_secs(5),
    )
    .unwrap();
    let err = provider.complete(&request("claude-3-5-haiku-latest")).await.unwrap_err();
    assert!(matches!(err, LlmError::Api { status: 529, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn google_requests_json_and_reads_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .and(query_param("key", "g-test"))
        .and(body_partial_json(json!({
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"keep_points\": [], "}, {"text": "\"suggestions\": [\"COMPLETED\"]}"}]}}],
            "usageMetadata": {"promptTokenCount": 40, "candidatesTokenCount": 8}
        })))
        .mount(&server)
        .await;

    let provider = GoogleProvider::new(Some(&server.uri()), Some("g-test"), Duration::from_secs(5)).unwrap();
    let mut req = request("gemini-2.0-flash");
    req.response_format = Some(ResponseSchema::of::<ReviewIdeaResult>());
    let reply = provider.complete(&req).await.unwrap();

    let parsed: ReviewIdeaResult = serde_json::from_str(&reply.content).unwrap();
    assert!(parsed.is_completed());
    assert_eq!(reply.usage, TokenCounts { input: 40, cached: 0, output: 8 });
}

#[tokio::test]
async fn gateway_retries_transient_google_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "hello"}]}}],
            "usageMetadata": {"promptTokenCount": 1, "candidatesTokenCount": 1}
        })))
        .mount(&server)
        .await;

    let provider = GoogleProvider::new(Some(&server.uri()), Some("g-test"), Duration::from_secs(5)).unwrap();
    let client = ChatClient::new(Arc::new(provider), "gemini-2.0-flash")
        .with_retry_base(Duration::ZERO)
        .with_max_retries(3);

    let resp = client
        .parse_chat("sys", "hi", &[], &ChatOptions::new())
        .await
        .unwrap();
    assert_eq!(resp.content, "hello");
    assert_eq!(resp.history.len(), 2);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}
