//! Submitting a message from the user's side.
//!
//! [`submit`] is what the send button does: make sure a conversation is
//! active, record the user's message, post the running history to the proxy
//! and record whatever comes back. Exactly one assistant message is appended
//! per submission, whether it is a reply or an error.

use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::api::ChatRequest;
use crate::attachments;
use crate::client::ChatClient;
use crate::conversation::{ConversationStore, StoreError};
use crate::message::Message;
use crate::settings::Settings;
use crate::storage::Storage;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("nothing to send: the message is empty and no files are attached")]
    Empty,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Send `input` (plus `files`) in the active conversation.
///
/// A new conversation is created when none is active. The stored user message
/// is the trimmed input; the text sent upstream also carries the attachments.
///
/// Returns the assistant message that was appended.
pub async fn submit<S: Storage, P: AsRef<Path>>(
    store: &mut ConversationStore<S>,
    settings: &Settings,
    model: &str,
    client: &ChatClient,
    input: &str,
    files: &[P],
) -> Result<Message, SubmitError> {
    if input.trim().is_empty() && files.is_empty() {
        return Err(SubmitError::Empty);
    }

    let id = match store.active_id().map(str::to_string) {
        Some(id) => id,
        None => store.create().id.clone(),
    };

    let rendered = attachments::render(files);
    let display = input.trim().to_string();
    let outgoing = attachments::compose(input, &rendered);

    let mut history = store.messages(&id).to_vec();
    history.push(Message::user(outgoing));
    store.append_message(&id, Message::user(display))?;

    let request = ChatRequest::new(settings, model, history);
    info!(conversation = %id, model, "Submitting message");
    let reply = client.send(&request).await;

    store.append_message(&id, reply.clone())?;
    Ok(reply)
}
