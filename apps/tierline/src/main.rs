//! # Tierline
//!
//! Battle pass, loyalty and referral views for a rewards account.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  apps/tierline (THE BINARY)              │
//! │                                                          │
//! │  ┌───────────┐   ┌─────────────┐   ┌──────────────────┐  │
//! │  │   CLI     │   │ View server │   │  Rewards client  │  │
//! │  │  (clap)   │   │   (axum)    │   │    (reqwest)     │  │
//! │  └─────┬─────┘   └──────┬──────┘   └────────┬─────────┘  │
//! │        └────────────────┼───────────────────┘            │
//! │                         ▼                                │
//! │                 ┌───────────────┐                        │
//! │                 │ tierline-core │                        │
//! │                 │ (THE ENGINE)  │                        │
//! │                 └───────────────┘                        │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Serve computed views
//! tierline server --host 0.0.0.0 --port 8080
//!
//! # Terminal views
//! tierline battle-pass
//! tierline claim --tier 10
//! tierline --backend memory referrals
//! ```

use clap::Parser;
use tierline::cli;
use tierline::logging::{self, LogFormat};
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    let format = LogFormat::from_env_value(std::env::var("TIERLINE_LOG_FORMAT").ok().as_deref());
    logging::subscriber(format, logging::env_filter(), std::io::stderr).init();

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        r#"
  ╔╦╗╦╔═╗╦═╗╦  ╦╔╗╔╔═╗
   ║ ║║╣ ╠╦╝║  ║║║║║╣
   ╩ ╩╚═╝╩╚═╩═╝╩╝╚╝╚═╝

  Rewards Progression v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
