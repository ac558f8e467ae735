//! # Chat Relay (library root)
//!
//! This crate provides the plumbing for the **relay** CLI and its chat proxy:
//! - The wire contract between client and proxy, and the upstream call (`api`).
//! - System-prompt and message-list assembly (`assembler`).
//! - The HTTP proxy itself (`server`) and the client that talks to it (`client`).
//! - Persisted user state: settings and conversations (`settings`, `conversation`)
//!   on top of a key/value port (`storage`, `models`, `schema`).
//! - The submit flow that ties those together (`chat`), file attachments
//!   (`attachments`) and the model catalog (`catalog`).
//! - CLI parsing, configuration and terminal output (`commands`, `config`, `pretty`).
//!
//! ## Configuration layout
//! `relay init` writes `config.yaml` and the SQLite database under the
//! per-platform config directory, e.g.:
//!
//! - macOS: `~/Library/Application Support/com.chat-relay.relay/`
//! - Linux (XDG): `~/.config/relay/`
//! - Windows: `C:\Users\<you>\AppData\Roaming\chat-relay\relay\config\`
//!
//! ## Modules
//! - [`api`], [`assembler`], [`attachments`], [`catalog`], [`chat`], [`client`],
//!   [`commands`], [`config`], [`conversation`], [`message`], [`models`],
//!   [`pretty`], [`schema`], [`server`], [`settings`], [`storage`]

use directories::ProjectDirs;
use std::error::Error;
use std::path::PathBuf;

pub mod api;
pub mod assembler;
pub mod attachments;
pub mod catalog;
pub mod chat;
pub mod client;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod message;
pub mod models;
pub mod pretty;
pub mod schema;
pub mod server;
pub mod settings;
pub mod storage;

/// Return the per-platform configuration directory used by the relay.
///
/// This uses [`directories::ProjectDirs`] with the application triple
/// `("com", "chat-relay", "relay")`.
///
/// The directory is **not** created by this function; callers that need it should
/// create it with `fs::create_dir_all`.
///
/// # Errors
/// Returns an error if the platform configuration directory cannot be determined.
///
/// # Examples
/// ```no_run
/// let cfg = chat_relay::config_dir().expect("has a config dir");
/// println!("config at {}", cfg.display());
/// ```
pub fn config_dir() -> Result<PathBuf, Box<dyn Error>> {
    let proj_dirs = ProjectDirs::from("com", "chat-relay", "relay")
        .ok_or("Unable to determine config directory")?;
    let config_dir = proj_dirs.config_dir().to_path_buf();

    Ok(config_dir)
}
