//! Client side of the relay: posts a [`ChatRequest`] to the proxy and turns
//! whatever comes back into one assistant [`Message`].
//!
//! | Outcome | Assistant message |
//! |---------|-------------------|
//! | 2xx | the returned `content` |
//! | non-2xx | `Error: <error>` (or `Error: Something went wrong`) |
//! | proxy unreachable / unreadable reply | `Error: Failed to connect to the server` |

use tracing::{debug, error};

use crate::api::{ChatRequest, ChatResponse};
use crate::message::Message;

pub const CONNECTION_ERROR: &str = "Error: Failed to connect to the server";
pub const UNKNOWN_ERROR: &str = "Something went wrong";

/// HTTP client for the relay's `/api/chat` endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ChatClient {
    /// `proxy_url` is the proxy's base URL, e.g. `http://127.0.0.1:3000`.
    pub fn new(proxy_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/api/chat", proxy_url.trim_end_matches('/')),
        }
    }

    /// Send `request`; never fails, errors become the assistant's reply.
    pub async fn send(&self, request: &ChatRequest) -> Message {
        match self.try_send(request).await {
            Ok(reply) => reply,
            Err(err) => {
                error!("Failed to reach chat proxy at {}: {}", self.endpoint, err);
                Message::assistant(CONNECTION_ERROR)
            }
        }
    }

    async fn try_send(&self, request: &ChatRequest) -> Result<Message, reqwest::Error> {
        debug!("Posting {} messages to {}", request.messages.len(), self.endpoint);
        let response = self.client.post(&self.endpoint).json(request).send().await?;
        let ok = response.status().is_success();
        let body: ChatResponse = response.json().await?;

        if ok {
            return Ok(Message::assistant(body.content.unwrap_or_default()));
        }

        let reason = body
            .error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
        Ok(Message::assistant(format!("Error: {reason}")))
    }
}
