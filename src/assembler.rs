//! # Request assembly
//!
//! Pure transformation from generation options, the prior history and the new
//! user message into what is sent upstream: one system prompt plus a short,
//! fixed-shape message list.
//!
//! ## System prompt
//! Built in a fixed order, each piece separated by a blank line:
//!
//! 1. the base prompt, or [`FALLBACK_SYSTEM_PROMPT`] when it is empty;
//! 2. `Code generation rules: ...` listing the enabled code conventions;
//! 3. the user's custom instructions, when present;
//! 4. the code-snippet capability clause, when enabled;
//! 5. the file-modification capability clause, when enabled.
//!
//! ## Message list
//! ```text
//! [system, user]                                  memory off, or no prior turns
//! [system, user(context), assistant(ack), user]   memory on and prior turns
//! ```
//!
//! Prior turns are never replayed one by one. When memory is on they are
//! flattened into a single context block followed by a canned assistant
//! acknowledgement. The new user message always comes last.

use serde::Serialize;

use crate::message::Message;
use crate::settings::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};

pub const FALLBACK_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

pub const SNAKE_CASE_RULE: &str = "use snake_case for all variable and function names";
pub const NO_COMMENTS_RULE: &str = "do not include any comments in code";

pub const CODE_EXECUTION_CLAUSE: &str = "You can suggest code snippets. When providing code, use markdown code blocks with the language specified.";
pub const FILE_EDITING_CLAUSE: &str = "You can suggest file modifications. When suggesting file changes, clearly indicate the file path and the changes to make.";

pub const CONTEXT_START: &str = "[CONTEXT FROM PREVIOUS MESSAGES - Use this for continuity]";
pub const CONTEXT_END: &str = "[END OF CONTEXT]";
pub const CONTEXT_ACKNOWLEDGEMENT: &str = "I understand the context from our previous conversation. I'll continue from where we left off.";

/// Everything the assembler reads.
///
/// Unlike [`Settings`](crate::settings::Settings), every field here may legitimately be absent from a
/// proxy request; absent toggles are already resolved to their defaults.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PromptOptions {
    pub system_prompt: String,
    pub custom_instructions: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub enable_code_execution: bool,
    pub enable_file_editing: bool,
    pub memory_enabled: bool,
    pub use_snake_case: bool,
    pub no_comments: bool,
}

/// Output of [`assemble`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledRequest {
    pub system_prompt: String,
    /// System message first, new user message last.
    pub messages: Vec<Message>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Build the system prompt for `options`.
pub fn build_system_prompt(options: &PromptOptions) -> String {
    let mut prompt = if options.system_prompt.is_empty() {
        FALLBACK_SYSTEM_PROMPT.to_string()
    } else {
        options.system_prompt.clone()
    };

    let mut rules = Vec::new();
    if options.use_snake_case {
        rules.push(SNAKE_CASE_RULE);
    }
    if options.no_comments {
        rules.push(NO_COMMENTS_RULE);
    }
    if !rules.is_empty() {
        prompt.push_str(&format!("\n\nCode generation rules: {}.", rules.join("; ")));
    }

    if !options.custom_instructions.is_empty() {
        prompt.push_str(&format!(
            "\n\nUser's custom instructions:\n{}",
            options.custom_instructions
        ));
    }

    if options.enable_code_execution {
        prompt.push_str("\n\n");
        prompt.push_str(CODE_EXECUTION_CLAUSE);
    }

    if options.enable_file_editing {
        prompt.push_str("\n\n");
        prompt.push_str(FILE_EDITING_CLAUSE);
    }

    prompt
}

/// Flatten `prior` into the wrapped context block.
pub fn context_block(prior: &[Message]) -> String {
    let summary = prior
        .iter()
        .map(|m| format!("{}: {}", m.role.speaker(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{CONTEXT_START}\n\n{summary}\n\n{CONTEXT_END}")
}

/// Assemble the upstream request for `new_user` given the `prior` history.
pub fn assemble(
    options: &PromptOptions,
    prior: &[Message],
    new_user: &Message,
) -> AssembledRequest {
    let system_prompt = build_system_prompt(options);

    let mut messages = vec![Message::system(system_prompt.clone())];

    if options.memory_enabled && !prior.is_empty() {
        messages.push(Message::user(context_block(prior)));
        messages.push(Message::assistant(CONTEXT_ACKNOWLEDGEMENT));
    }

    messages.push(new_user.clone());

    AssembledRequest {
        system_prompt,
        messages,
        temperature: options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
    }
}
