use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::io::store::atomic_write;
use crate::model::config::Config;

pub const CONFIG_FILE: &str = "taskdeck.toml";

/// Keys `td config set` accepts
pub const KEYS: [&str; 4] = ["server.bind", "data.path", "log.filter", "log.json"];

/// Error type for config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config syntax error: {0}")]
    Syntax(#[from] toml_edit::TomlError),
    #[error("unknown config key '{0}' (expected one of: server.bind, data.path, log.filter, log.json)")]
    InvalidKey(String),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

fn read_text(path: &Path) -> Result<Option<String>, ConfigError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Load the config file. A missing file is not an error: every field has a
/// default.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    match read_text(path)? {
        Some(text) => Ok(toml::from_str(&text)?),
        None => Ok(Config::default()),
    }
}

/// Read the config as a toml_edit document for round-trip-safe editing.
/// A missing file yields an empty document.
pub fn read_config_doc(path: &Path) -> Result<toml_edit::DocumentMut, ConfigError> {
    let text = read_text(path)?.unwrap_or_default();
    Ok(text.parse()?)
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config_doc(path: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    atomic_write(path, doc.to_string().as_bytes()).map_err(|e| ConfigError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Set one dotted key (`log.json`, `server.bind`, ...) in the document.
pub fn set_value(doc: &mut toml_edit::DocumentMut, key: &str, value: &str) -> Result<(), ConfigError> {
    if !KEYS.contains(&key) {
        return Err(ConfigError::InvalidKey(key.to_string()));
    }
    let Some((table, field)) = key.split_once('.') else {
        return Err(ConfigError::InvalidKey(key.to_string()));
    };
    let item = if key == "log.json" {
        let flag: bool = value.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        toml_edit::value(flag)
    } else {
        toml_edit::value(value)
    };
    if !doc.contains_key(table) {
        doc[table] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc[table][field] = item;
    Ok(())
}

/// Read, edit and write back the config file in one step. The edited text
/// must still parse as a [`Config`] before it is written.
pub fn set_config_value(path: &Path, key: &str, value: &str) -> Result<Config, ConfigError> {
    let mut doc = read_config_doc(path)?;
    set_value(&mut doc, key, value)?;
    let config: Config = toml::from_str(&doc.to_string())?;
    write_config_doc(path, &doc)?;
    Ok(config)
}
