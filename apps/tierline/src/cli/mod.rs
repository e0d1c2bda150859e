//! # Tierline CLI Module
//!
//! ## Available Commands
//!
//! - `server` - Serve computed views over HTTP
//! - `battle-pass` - Show the season ladder (default)
//! - `claim` - Claim a tier reward
//! - `loyalty` - Show loyalty standing
//! - `referrals` - Show referral code and history
//! - `apply` - Apply somebody else's referral code
//! - `copy-code` - Copy own referral code to the clipboard

mod commands;

use crate::config::Config;
use crate::error::AppError;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Tierline - battle pass, loyalty and referral views
#[derive(Parser, Debug)]
#[command(name = "tierline")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// List every tier instead of a summary
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Data source: the rewards API over HTTP, or the built-in demo service
    #[arg(short = 'B', long, global = true, value_enum, default_value_t = BackendKind::Http)]
    pub backend: BackendKind,

    /// Rewards API base URL (overrides config and TIERLINE_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    Http,
    Memory,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve computed views over HTTP
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Show the battle pass season
    BattlePass,

    /// Claim the reward for a tier
    Claim {
        #[arg(short, long)]
        tier: u32,
    },

    /// Show loyalty standing and the tier list
    Loyalty,

    /// Show own referral code and referral history
    Referrals,

    /// Apply a referral code (case-insensitive)
    Apply {
        #[arg(long)]
        code: String,
    },

    /// Copy own referral code to the clipboard
    CopyCode,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }

    let backend = build_backend(cli.backend, &config).await?;
    let out = Output {
        json: cli.json_mode,
        verbose: cli.verbose,
    };

    match cli.command {
        Some(Commands::Server { host, port }) => {
            cmd_server(backend, &config, cli.backend, &host, port).await
        }
        Some(Commands::Claim { tier }) => cmd_claim(&backend, &config, out, tier).await,
        Some(Commands::Loyalty) => cmd_loyalty(&backend, out).await,
        Some(Commands::Referrals) => cmd_referrals(&backend, out).await,
        Some(Commands::Apply { code }) => cmd_apply(&backend, out, &code).await,
        Some(Commands::CopyCode) => cmd_copy_code(&backend, out).await,
        Some(Commands::BattlePass) | None => cmd_battle_pass(&backend, &config, out).await,
    }
}
