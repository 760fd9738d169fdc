//! End-to-end tests for the OpenAI-compatible provider
//!
//! Runs the real HTTP client against `FakeOpenAi`, both directly and behind
//! the recommendations route.

mod common;

use common::*;
use dj_console_server::llm::{
    ApiKeySource, CompletionOptions, LlmError, LlmProvider, Message, OpenAIProvider,
};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const GENERATED_REPLY: &str = r#"```json
[
  {"title": "Generated One", "artist": "Model", "bpm": 126, "key": "G", "mood": "upbeat",
   "energy": 0.8, "danceability": 0.8, "transitionNotes": "Blend over the outro"},
  {"title": "Generated Two", "artist": "Model", "bpm": 128, "key": "C", "mood": "energetic",
   "energy": 0.7, "danceability": 0.6}
]
```"#;

fn provider_for(fake: &FakeOpenAi) -> OpenAIProvider {
    OpenAIProvider::new(
        fake.api_base_url(),
        "gpt-4",
        ApiKeySource::Static(FAKE_OPENAI_KEY.to_string()),
    )
}

fn options() -> CompletionOptions {
    CompletionOptions {
        temperature: 0.7,
        max_tokens: Some(1000),
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn test_completion_request_shape() {
    let fake = FakeOpenAi::replying("[]").await;
    let provider = provider_for(&fake);

    let messages = vec![Message::system("be a DJ"), Message::user("next track?")];
    let response = provider.complete(&messages, &options()).await.unwrap();
    assert_eq!(response.message.content, "[]");
    assert_eq!(response.usage.unwrap().total_tokens, 200);

    let captured = fake.captured();
    assert_eq!(captured.len(), 1);
    assert_eq!(
        captured[0].authorization.as_deref(),
        Some(format!("Bearer {}", FAKE_OPENAI_KEY).as_str())
    );
    let body = &captured[0].body;
    assert_eq!(body["model"], "gpt-4");
    assert_eq!(body["max_tokens"], 1000);
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "next track?");
}

#[tokio::test]
async fn test_rate_limit_and_api_errors() {
    let limited = FakeOpenAi::failing(StatusCode::TOO_MANY_REQUESTS).await;
    let result = provider_for(&limited)
        .complete(&[Message::user("hi")], &options())
        .await;
    assert!(matches!(result, Err(LlmError::RateLimited)));

    let broken = FakeOpenAi::failing(StatusCode::INTERNAL_SERVER_ERROR).await;
    let result = provider_for(&broken)
        .complete(&[Message::user("hi")], &options())
        .await;
    assert!(matches!(result, Err(LlmError::Api { status: 500, .. })));
}

#[tokio::test]
async fn test_health_check_lists_models() {
    let fake = FakeOpenAi::replying("[]").await;
    assert!(provider_for(&fake).health_check().await.is_ok());
}

#[tokio::test]
async fn test_recommendations_through_openai_backend() {
    let fake = FakeOpenAi::replying(GENERATED_REPLY).await;
    let provider: Arc<dyn LlmProvider> = Arc::new(provider_for(&fake));
    let server = TestServer::spawn_with(TestServerOptions {
        provider: Some(provider),
        llm_timeout: Duration::from_secs(5),
        ..Default::default()
    })
    .await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .post_recommendations(json!({
            "currentTrack": {"bpm": 128, "key": "C", "mood": "energetic"},
            "userPreferences": "no vocals",
            "library": [{"title": "a"}, {"title": "b"}]
        }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = response.json().await.unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["fallback"], false);
    let tracks = json["recommendations"].as_array().unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0]["title"], "Generated Two");
    assert_eq!(tracks[0]["compatibilityScore"], 100);
    assert_eq!(tracks[1]["title"], "Generated One");
    assert_eq!(tracks[1]["compatibilityScore"], 99);

    // The prompt carries the reference and the client context
    let captured = fake.captured();
    assert_eq!(captured.len(), 1);
    let prompt = captured[0].body["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("128"));
    assert!(prompt.contains("no vocals"));
    assert!(prompt.contains("Available Library: 2 tracks"));
}

#[tokio::test]
async fn test_upstream_error_falls_back_to_catalog() {
    let fake = FakeOpenAi::failing(StatusCode::SERVICE_UNAVAILABLE).await;
    let provider: Arc<dyn LlmProvider> = Arc::new(provider_for(&fake));
    let server = TestServer::spawn_with(TestServerOptions {
        provider: Some(provider),
        ..Default::default()
    })
    .await;
    let client = TestClient::new(server.base_url.clone());

    let json: Value = client
        .post_recommendations(json!({}))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(json["success"], false);
    assert_eq!(json["fallback"], true);
    assert_eq!(json["error"], "AI service temporarily unavailable");
    assert_eq!(json["recommendations"].as_array().unwrap().len(), 5);
}
