//! This module defines the command-line interface for the application using `clap`.
//!
//! It provides a `Cli` struct that represents the parsed command-line arguments,
//! and a `Commands` enum that represents the available subcommands and their
//! options.
//!
//! # Examples
//!
//! ```no_run
//! use clap::Parser;
//! use chat_relay::commands::{Cli, Commands};
//!
//! let cli = Cli::parse();
//! if let Commands::Serve { bind } = cli.command {
//!     println!("serving on {:?}", bind);
//! }
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Represents the parsed command-line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, propagate_version = true, color = clap::ColorChoice::Always)]
pub struct Cli {
    /// The parsed subcommand and its options.
    #[command(subcommand)]
    pub command: Commands,
}

/// Represents the available subcommands and their options.
#[derive(Subcommand, Debug)]
#[command(about, long_about = None, color = clap::ColorChoice::Always)]
pub enum Commands {
    /// Send a message through the proxy and print the reply.
    ///
    /// Without `--conversation` a new conversation is started.
    #[clap(name = "ask", alias = "a")]
    Ask {
        /// The message to send. May be omitted when files are attached.
        text: Option<String>,

        /// Continue the conversation with this id.
        #[arg(short = 'c', long = "conversation")]
        conversation: Option<String>,

        /// Attach a file; repeat for several.
        #[arg(short = 'f', long = "file")]
        files: Vec<PathBuf>,

        /// Model id; defaults to the configured model.
        #[arg(short = 'm', long = "model")]
        model: Option<String>,
    },

    /// Run the chat proxy.
    #[clap(name = "serve", alias = "s")]
    Serve {
        /// Listen address, overriding `bind_address` from the config.
        #[arg(short = 'b', long = "bind")]
        bind: Option<String>,
    },

    /// Write a default configuration file.
    Init,

    /// Start an empty conversation.
    New,

    /// List conversations, newest first.
    #[clap(name = "list", alias = "ls")]
    List,

    /// Print a conversation's messages.
    Show { id: String },

    /// Delete a conversation and its messages.
    #[clap(name = "delete", alias = "rm")]
    Delete { id: String },

    /// List the known models.
    Models,

    /// Inspect or change generation settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Print the current settings.
    Show,

    /// Restore the default settings.
    Reset,

    /// Change one or more settings.
    Set(SettingsArgs),

    /// List the system-prompt presets.
    Presets,

    /// Replace the system prompt with a preset, e.g. "Code Expert".
    Preset { name: String },
}

/// Settings edits; unset flags leave the stored value alone.
#[derive(Args, Debug, Default, PartialEq)]
pub struct SettingsArgs {
    #[arg(long)]
    pub system_prompt: Option<String>,

    #[arg(long)]
    pub custom_instructions: Option<String>,

    #[arg(long)]
    pub temperature: Option<f64>,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    #[arg(long, value_name = "BOOL")]
    pub code_execution: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    pub file_editing: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    pub memory: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    pub snake_case: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    pub no_comments: Option<bool>,
}

impl SettingsArgs {
    /// Copy every provided value onto `settings`.
    pub fn apply(&self, settings: &mut crate::settings::Settings) {
        if let Some(prompt) = &self.system_prompt {
            settings.system_prompt = prompt.clone();
        }
        if let Some(instructions) = &self.custom_instructions {
            settings.custom_instructions = instructions.clone();
        }
        if let Some(temperature) = self.temperature {
            settings.temperature = temperature;
        }
        if let Some(max_tokens) = self.max_tokens {
            settings.max_tokens = max_tokens;
        }
        if let Some(enabled) = self.code_execution {
            settings.enable_code_execution = enabled;
        }
        if let Some(enabled) = self.file_editing {
            settings.enable_file_editing = enabled;
        }
        if let Some(enabled) = self.memory {
            settings.memory_enabled = enabled;
        }
        if let Some(enabled) = self.snake_case {
            settings.use_snake_case = enabled;
        }
        if let Some(enabled) = self.no_comments {
            settings.no_comments = enabled;
        }
    }
}
