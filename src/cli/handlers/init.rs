use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::config_io;
use crate::io::store::{DocumentStore, atomic_write};
use crate::model::config::Config;

const CONFIG_TEMPLATE: &str = r##"# taskdeck configuration. Every key is optional.
# Environment overrides: TASKDECK_BIND, TASKDECK_DATA, RUST_LOG.

[server]
bind = "{bind}"

[data]
# Relative paths resolve against the directory td runs in.
path = "{path}"

[log]
# tracing EnvFilter directive, e.g. "taskdeck=debug,tower_http=info"
filter = "info"
# one JSON object per line
json = false
"##;

fn render_config(config: &Config) -> String {
    CONFIG_TEMPLATE
        .replace("{bind}", &config.server.bind)
        .replace("{path}", &config.data.path.display().to_string())
}

/// Create the data file, plus a commented config file when none exists.
pub fn cmd_init(args: InitArgs, config_path: &Path, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let data_path = &config.data.path;
    DocumentStore::init(data_path, args.force)?;
    println!("Created {}", data_path.display());

    if !config_path.exists() {
        atomic_write(config_path, render_config(config).as_bytes())?;
        // Make sure what we just wrote loads back.
        config_io::load_config(config_path)?;
        println!("Created {}", config_path.display());
    }
    Ok(())
}
