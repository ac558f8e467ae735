//! # API Module
//!
//! Wire types for the relay's `/api/chat` endpoint and the single outbound call
//! to the external completions API.
//!
//! A [`ChatRequest`] carries the running message list (prior turns followed by
//! the new user message) plus the generation settings. [`Upstream::complete`]
//! runs the request assembler over it and POSTs
//!
//! ```text
//! { model, messages, temperature, max_tokens, stream: false }
//! ```
//!
//! to the configured completions URL, returning the first choice's text.
//! Failures come back as a [`ProxyError`]; nothing is retried.
//!
//! # Example
//!
//! ```no_run
//! use chat_relay::api::{ChatRequest, Upstream};
//! use chat_relay::message::Message;
//! use chat_relay::settings::Settings;
//!
//! # async fn demo() -> Result<(), chat_relay::api::ProxyError> {
//! let upstream = Upstream::new("http://localhost:5001/v1/chat/completions", None);
//! let request = ChatRequest::new(&Settings::default(), "claude-sonnet-4-20250514", vec![
//!     Message::user("What is the meaning of life?"),
//! ]);
//! let answer = upstream.complete(&request).await?;
//! println!("{answer}");
//! # Ok(()) }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::assembler::{PromptOptions, assemble};
use crate::catalog::DEFAULT_MODEL;
use crate::message::Message;
use crate::settings::Settings;

/// Completions endpoint used when the config does not name one.
pub const DEFAULT_API_URL: &str = "https://diwness.cloud/v1/chat/completions";

/// Body accepted by `POST /api/chat`.
///
/// Every field is optional on the wire. Absent toggles resolve to `false`,
/// except `useSnakeCase` and `noComments` which resolve to `true`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_code_execution: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_file_editing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_snake_case: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_comments: Option<bool>,
}

impl ChatRequest {
    /// Request for `messages` carrying every field of `settings`.
    pub fn new(settings: &Settings, model: &str, messages: Vec<Message>) -> Self {
        Self {
            messages,
            model: Some(model.to_string()),
            system_prompt: Some(settings.system_prompt.clone()),
            custom_instructions: Some(settings.custom_instructions.clone()),
            temperature: Some(settings.temperature),
            max_tokens: Some(settings.max_tokens),
            enable_code_execution: Some(settings.enable_code_execution),
            enable_file_editing: Some(settings.enable_file_editing),
            memory_enabled: Some(settings.memory_enabled),
            use_snake_case: Some(settings.use_snake_case),
            no_comments: Some(settings.no_comments),
        }
    }

    /// Requested model, or [`DEFAULT_MODEL`] when absent or empty.
    pub fn model(&self) -> &str {
        match self.model.as_deref() {
            Some(model) if !model.is_empty() => model,
            _ => DEFAULT_MODEL,
        }
    }

    /// Assembler options with wire defaults applied.
    pub fn prompt_options(&self) -> PromptOptions {
        PromptOptions {
            system_prompt: self.system_prompt.clone().unwrap_or_default(),
            custom_instructions: self.custom_instructions.clone().unwrap_or_default(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            enable_code_execution: self.enable_code_execution.unwrap_or(false),
            enable_file_editing: self.enable_file_editing.unwrap_or(false),
            memory_enabled: self.memory_enabled.unwrap_or(false),
            use_snake_case: self.use_snake_case.unwrap_or(true),
            no_comments: self.no_comments.unwrap_or(true),
        }
    }
}

/// Body returned by `POST /api/chat`: exactly one of the two fields is set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            error: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            content: None,
            error: Some(error.into()),
        }
    }
}

/// Payload POSTed to the completions API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpstreamPayload {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
struct UpstreamResponse {
    #[serde(default)]
    choices: Vec<UpstreamChoice>,
}

#[derive(Debug, Deserialize)]
struct UpstreamChoice {
    message: UpstreamMessage,
}

#[derive(Debug, Deserialize)]
struct UpstreamMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Everything that can go wrong while relaying one chat request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The completions API answered with a non-success status.
    #[error("API Error {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("request contains no messages")]
    EmptyConversation,

    #[error("completions request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completions response contained no choices")]
    NoChoices,
}

/// Handle on the external completions API.
#[derive(Debug, Clone)]
pub struct Upstream {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl Upstream {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.filter(|key| !key.is_empty()),
        }
    }

    /// Build the outbound payload for `request`.
    pub fn payload(request: &ChatRequest) -> Result<UpstreamPayload, ProxyError> {
        let (new_user, prior) = request
            .messages
            .split_last()
            .ok_or(ProxyError::EmptyConversation)?;

        let assembled = assemble(&request.prompt_options(), prior, new_user);

        Ok(UpstreamPayload {
            model: request.model().to_string(),
            messages: assembled.messages,
            temperature: assembled.temperature,
            max_tokens: assembled.max_tokens,
            stream: false,
        })
    }

    /// Assemble `request`, send it, and return the first completion's text.
    ///
    /// # Errors
    /// - [`ProxyError::Upstream`] with the status and raw body on a non-success
    ///   response.
    /// - [`ProxyError::EmptyConversation`], [`ProxyError::Transport`],
    ///   [`ProxyError::Malformed`] or [`ProxyError::NoChoices`] otherwise.
    pub async fn complete(&self, request: &ChatRequest) -> Result<String, ProxyError> {
        let payload = Self::payload(request)?;
        debug!("Sending request: {:?}", payload);

        let mut builder = self.client.post(&self.api_url).json(&payload);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await?;
            error!(status = status.as_u16(), "Completions API returned an error");
            return Err(ProxyError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let data: UpstreamResponse = serde_json::from_slice(&bytes)?;
        debug!("Received response: {:?}", data);

        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or(ProxyError::NoChoices)?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::CONTEXT_ACKNOWLEDGEMENT;
    use httpmock::prelude::*;
    use serde_json::json;

    fn setup() {
        let _ = tracing_subscriber::fmt::try_init();
    }

    fn plain_request(messages: Vec<Message>) -> ChatRequest {
        ChatRequest {
            messages,
            system_prompt: Some("Be brief.".into()),
            use_snake_case: Some(false),
            no_comments: Some(false),
            ..ChatRequest::default()
        }
    }

    #[test]
    fn test_wire_defaults() {
        let request: ChatRequest = serde_json::from_str(r#"{"messages":[]}"#).unwrap();
        assert_eq!(request.model(), DEFAULT_MODEL);

        let options = request.prompt_options();
        assert!(options.use_snake_case);
        assert!(options.no_comments);
        assert!(!options.memory_enabled);
        assert!(!options.enable_code_execution);
        assert!(!options.enable_file_editing);
        assert_eq!(options.temperature, None);
    }

    #[test]
    fn test_empty_model_falls_back() {
        let request = ChatRequest {
            model: Some(String::new()),
            ..ChatRequest::default()
        };
        assert_eq!(request.model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_request_uses_camel_case_fields() {
        let request = ChatRequest::new(&Settings::default(), "m", vec![Message::user("hi")]);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["maxTokens"], json!(4000));
        assert_eq!(value["useSnakeCase"], json!(true));
        assert_eq!(value["memoryEnabled"], json!(true));
        assert_eq!(value["model"], json!("m"));
    }

    #[test]
    fn test_payload_without_messages_is_rejected() {
        let result = Upstream::payload(&ChatRequest::default());
        assert!(matches!(result, Err(ProxyError::EmptyConversation)));
    }

    #[test]
    fn test_payload_with_memory_collapses_history() {
        let request = ChatRequest {
            memory_enabled: Some(true),
            ..plain_request(vec![
                Message::user("one"),
                Message::assistant("two"),
                Message::user("three"),
            ])
        };
        let payload = Upstream::payload(&request).unwrap();

        assert_eq!(payload.messages.len(), 4);
        assert_eq!(payload.messages[2], Message::assistant(CONTEXT_ACKNOWLEDGEMENT));
        assert_eq!(payload.messages[3], Message::user("three"));
        assert!(!payload.stream);
        assert_eq!(payload.model, DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        setup();
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("authorization", "Bearer secret")
                    .json_body(json!({
                        "model": "claude-sonnet-4-20250514",
                        "messages": [
                            {"role": "system", "content": "Be brief."},
                            {"role": "user", "content": "Hello"}
                        ],
                        "temperature": 0.7,
                        "max_tokens": 4000,
                        "stream": false
                    }));
                then.status(200).json_body(json!({
                    "choices": [
                        {"message": {"role": "assistant", "content": "Hi there"}},
                        {"message": {"role": "assistant", "content": "ignored"}}
                    ]
                }));
            })
            .await;

        let upstream = Upstream::new(
            server.url("/v1/chat/completions"),
            Some("secret".to_string()),
        );
        let answer = upstream
            .complete(&plain_request(vec![Message::user("Hello")]))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(answer, "Hi there");
    }

    #[tokio::test]
    async fn test_complete_relays_upstream_status_and_body() {
        setup();
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(429).body("rate limited");
            })
            .await;

        let upstream = Upstream::new(server.url("/v1/chat/completions"), None);
        let err = upstream
            .complete(&plain_request(vec![Message::user("Hello")]))
            .await
            .unwrap_err();

        assert!(matches!(err, ProxyError::Upstream { status: 429, .. }));
        assert_eq!(err.to_string(), "API Error 429: rate limited");
    }

    #[tokio::test]
    async fn test_complete_without_choices() {
        setup();
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).json_body(json!({"choices": []}));
            })
            .await;

        let upstream = Upstream::new(server.url("/"), None);
        let err = upstream
            .complete(&plain_request(vec![Message::user("Hello")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::NoChoices));
    }

    #[tokio::test]
    async fn test_complete_null_content_is_empty() {
        setup();
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200)
                    .json_body(json!({"choices": [{"message": {"content": null}}]}));
            })
            .await;

        let upstream = Upstream::new(server.url("/"), None);
        let answer = upstream
            .complete(&plain_request(vec![Message::user("Hello")]))
            .await
            .unwrap();
        assert_eq!(answer, "");
    }

    #[tokio::test]
    async fn test_complete_malformed_upstream_json() {
        setup();
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).body("<html>oops</html>");
            })
            .await;

        let upstream = Upstream::new(server.url("/"), None);
        let err = upstream
            .complete(&plain_request(vec![Message::user("Hello")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::Malformed(_)));
    }
}
