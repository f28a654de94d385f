//! Completion gateway: the single point of entry for chat-completion API calls.
//!
//! One attempt per request, no retry, no streaming. The model and sampling
//! parameters are fixed constants; only the endpoint URL and timeout come from
//! config.
//!
//! Handlers depend on the `Completer` trait; `CompletionClient` is the
//! production implementation.

pub mod handlers;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// The model used for every completion call.
pub const MODEL: &str = "gpt-4";
const MAX_TOKENS: u32 = 150;
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion API unreachable: {0}")]
    Network(#[source] reqwest::Error),

    #[error("completion API timed out")]
    Timeout,

    #[error("completion API returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("completion API returned a malformed body: {0}")]
    Malformed(String),

    #[error("completion API returned no choices")]
    EmptyChoices,
}

impl From<reqwest::Error> for CompletionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CompletionError::Timeout
        } else {
            CompletionError::Network(e)
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatCompletionResponse {
    /// Extracts the text of the first choice.
    pub fn first_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Turns a single user message into a single completion text.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, message: &str) -> Result<String, CompletionError>;
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl CompletionClient {
    pub fn new(
        api_key: String,
        endpoint: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            endpoint,
        })
    }

    /// Makes the raw call, returning the full decoded response object.
    pub async fn call(&self, message: &str) -> Result<ChatCompletionResponse, CompletionError> {
        let request_body = ChatCompletionRequest {
            model: MODEL,
            messages: vec![ChatMessage {
                role: "user",
                content: message,
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        debug!(
            "Sending completion request: model={}, message_chars={}",
            MODEL,
            message.chars().count()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body).into_owned();
            let message = serde_json::from_str::<ApiError>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(CompletionError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_slice(&body)
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "Completion succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(parsed)
    }
}

#[async_trait]
impl Completer for CompletionClient {
    async fn complete(&self, message: &str) -> Result<String, CompletionError> {
        self.call(message)
            .await?
            .first_text()
            .ok_or(CompletionError::EmptyChoices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured {
        body: Arc<Mutex<Option<Value>>>,
        auth: Arc<Mutex<Option<String>>>,
    }

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1/chat/completions")
    }

    fn client(endpoint: String) -> CompletionClient {
        CompletionClient::new("sk-test".to_string(), endpoint, Duration::from_secs(5)).unwrap()
    }

    async fn stub_with_response(status: StatusCode, body: Value) -> String {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(move || {
                let body = body.clone();
                async move { (status, Json(body)) }
            }),
        );
        spawn_stub(router).await
    }

    #[tokio::test]
    async fn test_sends_fixed_parameters_and_bearer_token() {
        let captured = Captured::default();
        let router = Router::new()
            .route(
                "/v1/chat/completions",
                post(
                    |State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| async move {
                        *captured.body.lock().unwrap() = Some(body);
                        *captured.auth.lock().unwrap() = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        Json(json!({
                            "choices": [{ "message": { "role": "assistant", "content": "hello back" } }],
                            "usage": { "prompt_tokens": 3, "completion_tokens": 2 }
                        }))
                    },
                ),
            )
            .with_state(captured.clone());
        let endpoint = spawn_stub(router).await;

        let text = client(endpoint).complete("hi").await.unwrap();
        assert_eq!(text, "hello back");

        let body = captured.body.lock().unwrap().clone().unwrap();
        assert_eq!(body["model"], MODEL);
        assert_eq!(body["max_tokens"], 150);
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(body["messages"], json!([{ "role": "user", "content": "hi" }]));
        assert_eq!(
            captured.auth.lock().unwrap().as_deref(),
            Some("Bearer sk-test")
        );
    }

    #[tokio::test]
    async fn test_returns_first_of_several_choices() {
        let endpoint = stub_with_response(
            StatusCode::OK,
            json!({ "choices": [
                { "message": { "content": "first" } },
                { "message": { "content": "second" } }
            ]}),
        )
        .await;
        assert_eq!(client(endpoint).complete("x").await.unwrap(), "first");
    }

    #[tokio::test]
    async fn test_empty_choices() {
        let endpoint = stub_with_response(StatusCode::OK, json!({ "choices": [] })).await;
        let err = client(endpoint).complete("x").await.unwrap_err();
        assert!(matches!(err, CompletionError::EmptyChoices));
    }

    #[tokio::test]
    async fn test_error_status_carries_api_message() {
        let endpoint = stub_with_response(
            StatusCode::UNAUTHORIZED,
            json!({ "error": { "message": "Incorrect API key provided" } }),
        )
        .await;
        match client(endpoint).complete("x").await.unwrap_err() {
            CompletionError::Status { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let endpoint = stub_with_response(StatusCode::OK, json!({ "unexpected": true })).await;
        let err = client(endpoint).complete("x").await.unwrap_err();
        assert!(matches!(err, CompletionError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{addr}/v1/chat/completions"))
            .complete("x")
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::Network(_)));
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({ "choices": [] }))
            }),
        );
        let endpoint = spawn_stub(router).await;
        let client =
            CompletionClient::new("sk-test".to_string(), endpoint, Duration::from_millis(100))
                .unwrap();

        let err = client.complete("x").await.unwrap_err();
        assert!(matches!(err, CompletionError::Timeout));
    }
}
