//! `binday`: Belfast bin collection days over HTTP or from the command line.

mod api;
mod commands;
#[cfg(test)]
mod fixtures;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, filter::Directive};

use binday_core::service::BindayService;
use binday_provider_belfast::{self as belfast, BelfastConfig};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Parser)]
#[command(name = "binday", version)]
#[command(
    about = "Fetch Belfast bin collection days via the council's ASP.NET lookup form"
)]
struct Cli {
    /// Lookup page every session starts from
    #[arg(
        long,
        env = "BINDAY_BASE_URL",
        default_value = belfast::BASE_URL,
        global = true
    )]
    base_url: String,

    /// Per-request timeout in seconds
    #[arg(
        long,
        env = "BINDAY_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        global = true
    )]
    timeout_secs: u64,

    /// Override the browser-like User-Agent
    #[arg(long, env = "BINDAY_USER_AGENT", global = true)]
    user_agent: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve(commands::ServeArgs),
    /// Look up the next collections for a postcode
    Lookup(commands::LookupArgs),
    /// List the addresses the council offers for a postcode
    Addresses(commands::AddressesArgs),
}

impl Cli {
    fn provider_config(&self) -> BelfastConfig {
        let defaults = BelfastConfig::default();
        BelfastConfig {
            base_url: self.base_url.clone(),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // a missing .env file is fine
    let _env = dotenvy::dotenv();

    let filter: Directive = "binday=info".parse()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let service = Arc::new(BindayService::new(belfast::plugin(cli.provider_config())));

    match &cli.command {
        Commands::Serve(args) => commands::serve(args, service).await,
        Commands::Lookup(args) => commands::lookup(args, &service).await,
        Commands::Addresses(args) => commands::addresses(args, &service).await,
    }
}
