use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use folio_core::sync::ResolveStrategy;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Sync Folio articles and categories across devices")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// CLI profile name for endpoint and session configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one sync session for a local record file
    Sync(SyncArgs),
    /// Resolve one pending conflict
    Resolve(ResolveArgs),
    /// Print this device's id
    Device,
    /// Show device id, profile and last sync time
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Manage the stored session for a profile
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(Args)]
pub struct SyncArgs {
    /// Record collection to sync
    #[arg(value_enum)]
    pub collection: Collection,
    /// JSON file holding the local records
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,
    /// Conflict policy for this session
    #[arg(long, value_enum, default_value_t = StrategyArg::Manual)]
    pub strategy: StrategyArg,
    /// Push even when there are no local records
    #[arg(long)]
    pub force: bool,
    /// Override the device id for this session
    #[arg(long, value_name = "ID")]
    pub device_id: Option<String>,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[arg(value_enum)]
    pub collection: Collection,
    /// JSON file holding the local records
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,
    /// Id of the conflicting record
    #[arg(long, value_name = "ID")]
    pub id: String,
    /// Side to keep
    #[arg(long = "use", value_enum, value_name = "SIDE")]
    pub side: SideArg,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Collection {
    Articles,
    Categories,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StrategyArg {
    Manual,
    Local,
    Remote,
}

impl From<StrategyArg> for ResolveStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Manual => Self::Manual,
            StrategyArg::Local => Self::Local,
            StrategyArg::Remote => Self::Remote,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SideArg {
    Local,
    Remote,
}

impl SideArg {
    pub const fn use_local(self) -> bool {
        matches!(self, Self::Local)
    }
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Sync service base URL (e.g. <https://api.example.com>)
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Request timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Store a session issued by the identity provider
    Login {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Authenticated user id
        #[arg(long, value_name = "ID")]
        user_id: String,
        /// Bearer access token
        #[arg(long, value_name = "TOKEN")]
        access_token: String,
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: Option<String>,
        /// Seconds until the token expires
        #[arg(long, value_name = "SECS", default_value = "3600")]
        expires_in: i64,
    },
    /// Show auth status for profile
    Status {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
    /// Clear the stored session
    Logout {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
}
