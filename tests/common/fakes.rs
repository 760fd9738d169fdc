//! Fake collaborators for end-to-end tests
//!
//! - `ScriptedProvider` stands in for the text-generation backend at the
//!   `LlmProvider` seam.
//! - `FakeOpenAi` and `FakeSpotify` are small axum servers speaking the
//!   OpenAI chat completions API and the Spotify token endpoint, so the real
//!   HTTP clients can be exercised end to end.

use super::constants::*;
use async_trait::async_trait;
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use dj_console_server::llm::{
    CompletionOptions, CompletionResponse, FinishReason, LlmError, LlmProvider, Message,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

// ============================================================================
// Scripted LLM provider
// ============================================================================

pub enum Script {
    Reply(String),
    Fail,
    Hang,
}

pub struct ScriptedProvider {
    script: Script,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn with_script(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(content: impl Into<String>) -> Arc<Self> {
        Self::with_script(Script::Reply(content.into()))
    }

    pub fn failing() -> Arc<Self> {
        Self::with_script(Script::Fail)
    }

    /// Never answers within any sane timeout.
    pub fn hanging() -> Arc<Self> {
        Self::with_script(Script::Hang)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Last message of every completion request, in arrival order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(
        &self,
        messages: &[Message],
        _options: &CompletionOptions,
    ) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(last) = messages.last() {
            self.prompts.lock().unwrap().push(last.content.clone());
        }
        match &self.script {
            Script::Reply(content) => Ok(CompletionResponse {
                message: Message::assistant(content.clone()),
                finish_reason: FinishReason::Stop,
                usage: None,
            }),
            Script::Fail => Err(LlmError::Connection("connection refused".to_string())),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(LlmError::Timeout)
            }
        }
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        Ok(())
    }
}

// ============================================================================
// Shared fake server plumbing
// ============================================================================

struct FakeHandle {
    base_url: String,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FakeHandle {
    async fn spawn(app: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake server");
        let port = listener.local_addr().expect("No local address").port();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Fake server failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            shutdown_tx: Some(shutdown_tx),
        }
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

// ============================================================================
// Fake OpenAI-compatible API
// ============================================================================

#[derive(Debug, Clone)]
pub struct CapturedCompletion {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct OpenAiState {
    status: StatusCode,
    content: String,
    captured: Arc<Mutex<Vec<CapturedCompletion>>>,
}

pub struct FakeOpenAi {
    handle: FakeHandle,
    captured: Arc<Mutex<Vec<CapturedCompletion>>>,
}

async fn chat_completions(
    State(state): State<OpenAiState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.captured.lock().unwrap().push(CapturedCompletion {
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string()),
        body,
    });

    if !state.status.is_success() {
        return (state.status, Json(json!({"error": {"message": "upstream"}}))).into_response();
    }

    Json(json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": state.content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 120, "completion_tokens": 80, "total_tokens": 200}
    }))
    .into_response()
}

async fn list_models() -> impl IntoResponse {
    Json(json!({"object": "list", "data": [{"id": "gpt-4", "object": "model"}]}))
}

impl FakeOpenAi {
    /// Answers every completion with `content`.
    pub async fn replying(content: impl Into<String>) -> Self {
        Self::spawn(StatusCode::OK, content.into()).await
    }

    /// Answers every completion with the given error status.
    pub async fn failing(status: StatusCode) -> Self {
        Self::spawn(status, String::new()).await
    }

    async fn spawn(status: StatusCode, content: String) -> Self {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let state = OpenAiState {
            status,
            content,
            captured: captured.clone(),
        };
        let app = Router::new()
            .route("/v1/chat/completions", post(chat_completions))
            .route("/v1/models", get(list_models))
            .with_state(state);

        Self {
            handle: FakeHandle::spawn(app).await,
            captured,
        }
    }

    /// Base URL to configure the provider with, including `/v1`.
    pub fn api_base_url(&self) -> String {
        format!("{}/v1", self.handle.base_url)
    }

    pub fn captured(&self) -> Vec<CapturedCompletion> {
        self.captured.lock().unwrap().clone()
    }
}

// ============================================================================
// Fake Spotify token endpoint
// ============================================================================

#[derive(Debug, Clone)]
pub struct CapturedTokenRequest {
    pub authorization: Option<String>,
    pub form: HashMap<String, String>,
}

pub struct FakeSpotify {
    handle: FakeHandle,
    captured: Arc<Mutex<Vec<CapturedTokenRequest>>>,
}

async fn token(
    State(captured): State<Arc<Mutex<Vec<CapturedTokenRequest>>>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    captured.lock().unwrap().push(CapturedTokenRequest {
        authorization: authorization.clone(),
        form: form.clone(),
    });

    let basic_auth = authorization
        .as_deref()
        .map(|v| v.starts_with("Basic "))
        .unwrap_or(false);
    let valid = basic_auth
        && form.get("grant_type").map(String::as_str) == Some("authorization_code")
        && form.get("code").map(String::as_str) == Some(VALID_AUTH_CODE);

    if !valid {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant", "error_description": "Invalid authorization code"})),
        )
            .into_response();
    }

    Json(json!({
        "access_token": FAKE_ACCESS_TOKEN,
        "token_type": "Bearer",
        "scope": "user-read-private user-read-email",
        "expires_in": FAKE_EXPIRES_IN,
        "refresh_token": FAKE_REFRESH_TOKEN
    }))
    .into_response()
}

impl FakeSpotify {
    pub async fn spawn() -> Self {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/api/token", post(token))
            .with_state(captured.clone());

        Self {
            handle: FakeHandle::spawn(app).await,
            captured,
        }
    }

    pub fn token_url(&self) -> String {
        format!("{}/api/token", self.handle.base_url)
    }

    pub fn captured(&self) -> Vec<CapturedTokenRequest> {
        self.captured.lock().unwrap().clone()
    }
}
