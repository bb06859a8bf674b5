mod init;
pub use init::cmd_init;

use std::net::SocketAddr;
use std::path::Path;

use crate::api::{self, AppState};
use crate::cli::commands::*;
use crate::cli::output::{render_check, render_tree};
use crate::io::config_io::{self, ConfigError};
use crate::io::store::DocumentStore;
use crate::model::config::Config;
use crate::model::group::GroupType;
use crate::ops::check;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Effective configuration: the config file (or defaults) with global
/// command-line overrides applied. Per-command overrides (`serve --bind`)
/// are applied by the command itself.
pub fn load_settings(cli: &Cli) -> Result<Config, ConfigError> {
    let mut config = config_io::load_config(&cli.config)?;
    if let Some(data) = &cli.data {
        config.data.path = data.clone();
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli, mut config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;
    match cli.command {
        Commands::Serve(args) => {
            if let Some(bind) = args.bind {
                config.server.bind = bind;
            }
            cmd_serve(&config)
        }
        Commands::Init(args) => cmd_init(args, &cli.config, &config),
        Commands::Check => cmd_check(&config, json),
        Commands::Tree(args) => cmd_tree(&config, args.kind.map(GroupType::from), json),
        Commands::Config(cmd) => match cmd.action {
            ConfigAction::Show => cmd_config_show(&config, json),
            ConfigAction::Set { key, value } => cmd_config_set(&cli.config, &key, &value),
        },
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

fn cmd_serve(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .map_err(|e| format!("invalid bind address '{}': {}", config.server.bind, e))?;

    let data_path = &config.data.path;
    if !data_path.exists() {
        DocumentStore::init(data_path, false)?;
    }
    // Fail fast on an unreadable file rather than on the first request.
    let store = DocumentStore::new(data_path);
    store.snapshot()?;

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(api::serve(addr, AppState::new(store), shutdown_signal()))?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_check(config: &Config, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let doc = DocumentStore::new(&config.data.path).snapshot()?;
    let result = check::check_document(&doc);
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_check(&result));
    }
    Ok(())
}

fn cmd_tree(config: &Config, kind: Option<GroupType>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let doc = DocumentStore::new(&config.data.path).snapshot()?;
    let kinds: Vec<GroupType> = match kind {
        Some(kind) => vec![kind],
        None => GroupType::ALL.to_vec(),
    };
    if json {
        let trees: Vec<_> = kinds.iter().map(|k| doc.tree(*k)).collect();
        println!("{}", serde_json::to_string_pretty(&trees)?);
        return Ok(());
    }
    for (i, kind) in kinds.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print!("{}", render_tree(&doc, *kind));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config_show(config: &Config, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        print!("{}", toml::to_string_pretty(config)?);
    }
    Ok(())
}

fn cmd_config_set(path: &Path, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    config_io::set_config_value(path, key, value)?;
    println!("{} = {}", key, value);
    Ok(())
}
