use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::model::group::GroupType;

#[derive(Parser)]
#[command(name = "td", about = concat!("taskdeck v", env!("CARGO_PKG_VERSION"), " - projects, labels and tasks in one JSON file"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file to read
    #[arg(short = 'c', long, global = true, env = "TASKDECK_CONFIG", default_value = "taskdeck.toml")]
    pub config: PathBuf,

    /// Data file (overrides [data] path in the config)
    #[arg(short = 'd', long, global = true, env = "TASKDECK_DATA")]
    pub data: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),
    /// Create an empty data file
    Init(InitArgs),
    /// Validate data file integrity
    Check,
    /// Print the project and label group trees
    Tree(TreeArgs),
    /// Show or edit taskdeck.toml
    Config(ConfigCmd),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on (overrides [server] bind)
    #[arg(short = 'b', long, env = "TASKDECK_BIND")]
    pub bind: Option<String>,
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing data file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Only print one tree
    #[arg(long = "type", value_enum)]
    pub kind: Option<TreeKind>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum TreeKind {
    Project,
    Label,
}

impl From<TreeKind> for GroupType {
    fn from(kind: TreeKind) -> Self {
        match kind {
            TreeKind::Project => GroupType::Project,
            TreeKind::Label => GroupType::Label,
        }
    }
}

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Set a key in the config file (server.bind, data.path, log.filter, log.json)
    Set {
        key: String,
        value: String,
    },
}
