//! Main module for the Chat Relay CLI application (relay).
//!
//! This module handles command parsing, configuration loading and
//! initialization, then dispatches to the library for the chosen command.
//!
//! # Examples
//!
//! Running the proxy:
//!
//! ```sh
//! relay serve
//! ```
//!
//! Asking a question through it, then following up:
//!
//! ```sh
//! relay ask "What is the borrow checker?"
//! relay ask -c 1741607200000 "Show me an example" -f src/main.rs
//! ```

use chat_relay::{
    catalog, chat,
    client::ChatClient,
    commands::{self, SettingsAction},
    config::{self, RelayConfig},
    config_dir,
    conversation::{ConversationStore, StoreError},
    pretty,
    server,
    settings::{self, SettingsStore},
    storage::SqliteStorage,
};
use chrono::Utc;
use clap::Parser;
use once_cell::sync::OnceCell;
use std::{env, error::Error, fs, io::stdout, path::PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

static TRACING: OnceCell<()> = OnceCell::new();

fn main() -> Result<(), Box<dyn Error>> {
    TRACING.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();
    });
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run())
}

/// Where `config.yaml` lives: the working directory under test, the
/// platform config directory otherwise.
fn config_path() -> Result<PathBuf, Box<dyn Error>> {
    if env::var("IN_TEST_ENVIRONMENT").is_ok() {
        Ok(env::current_dir()?.join("config.yaml"))
    } else {
        Ok(config_dir()?.join("config.yaml"))
    }
}

/// Main asynchronous function of the relay CLI.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, the database cannot
/// be opened, or the chosen command fails.
async fn run() -> Result<(), Box<dyn Error>> {
    let cli = commands::Cli::parse();

    let config_path = config_path()?;
    debug!("Loading config from: {}", config_path.display());
    let relay_config = config::load_config_or_default(&config_path)?;
    debug!("Config loaded: {:?}", relay_config);

    let mut out = stdout();

    match cli.command {
        commands::Commands::Init => {
            debug!("Initializing configuration");
            init()?;
        }
        commands::Commands::Serve { bind } => {
            let mut serve_config = relay_config.clone();
            if let Some(bind) = bind {
                serve_config.bind_address = bind;
            }
            server::serve(&serve_config).await?;
        }
        commands::Commands::Ask {
            text,
            conversation,
            files,
            model,
        } => {
            let mut store = open_conversations(&relay_config)?;
            if let Some(id) = conversation {
                store.select(&id)?;
            }
            let settings = SettingsStore::new(SqliteStorage::open(&relay_config.storage_db_url)?)
                .load();
            let model = model.unwrap_or_else(|| relay_config.model.clone());
            if catalog::find(&model).is_none() {
                warn!("Model {} is not in the catalog; sending it as-is", model);
            }
            let client = ChatClient::new(&relay_config.proxy_url);

            let input = text.unwrap_or_default();
            let reply = chat::submit(&mut store, &settings, &model, &client, &input, &files).await?;

            pretty::print_reply(&mut out, &reply)?;
            if let Some(id) = store.active_id() {
                info!("Conversation {}", id);
            }
        }
        commands::Commands::New => {
            let mut store = open_conversations(&relay_config)?;
            let id = store.create().id.clone();
            println!("{id}");
        }
        commands::Commands::List => {
            let store = open_conversations(&relay_config)?;
            pretty::print_conversations(&mut out, store.list(), None, Utc::now())?;
        }
        commands::Commands::Show { id } => {
            let store = open_conversations(&relay_config)?;
            if store.get(&id).is_none() {
                return Err(StoreError::NotFound(id).into());
            }
            pretty::print_transcript(&mut out, store.messages(&id))?;
        }
        commands::Commands::Delete { id } => {
            let mut store = open_conversations(&relay_config)?;
            store.delete(&id)?;
            info!("Deleted conversation {}", id);
        }
        commands::Commands::Models => {
            pretty::print_models(&mut out, catalog::MODELS, &relay_config.model)?;
        }
        commands::Commands::Settings { action } => {
            let mut settings_store =
                SettingsStore::new(SqliteStorage::open(&relay_config.storage_db_url)?);
            match action {
                SettingsAction::Show => {
                    pretty::print_settings(&mut out, &settings_store.load())?;
                }
                SettingsAction::Reset => {
                    let settings = settings_store.reset()?;
                    pretty::print_settings(&mut out, &settings)?;
                }
                SettingsAction::Set(args) => {
                    let mut settings = settings_store.load();
                    args.apply(&mut settings);
                    settings.validate()?;
                    settings_store.save(&settings)?;
                    pretty::print_settings(&mut out, &settings)?;
                }
                SettingsAction::Presets => {
                    let current = settings_store.load();
                    pretty::print_presets(&mut out, settings::PRESETS, &current.system_prompt)?;
                }
                SettingsAction::Preset { name } => {
                    let mut settings = settings_store.load();
                    settings.apply_preset(&name)?;
                    settings_store.save(&settings)?;
                    info!("Applied preset {}", name);
                    pretty::print_settings(&mut out, &settings)?;
                }
            }
        }
    }

    Ok(())
}

fn open_conversations(
    config: &RelayConfig,
) -> Result<ConversationStore<SqliteStorage>, Box<dyn Error>> {
    Ok(ConversationStore::open(SqliteStorage::open(
        &config.storage_db_url,
    )?))
}

/// Writes a default `config.yaml` into the config directory.
///
/// An existing config is left untouched.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created, or the
/// configuration cannot be serialized to YAML.
fn init() -> Result<(), Box<dyn Error>> {
    let config_dir = config_dir()?;
    info!("Creating config directory: {}", config_dir.display());
    fs::create_dir_all(&config_dir)?;

    let config_path = config_dir.join("config.yaml");
    if config_path.exists() {
        info!("Config already exists: {}", config_path.display());
        return Ok(());
    }

    info!("Creating config file: {}", config_path.display());
    let config = RelayConfig {
        storage_db_url: config_dir.join("relay.db").to_string_lossy().into_owned(),
        ..RelayConfig::default()
    };
    let config_yaml = serde_yaml::to_string(&config)?;
    fs::write(config_path, config_yaml)?;

    Ok(())
}
