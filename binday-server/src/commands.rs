//! Subcommand implementations.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use clap::Args;
use tokio::net::TcpListener;

use binday_core::{
    LookupQuery, OutputFormat, PortError, Trace,
    render::{to_banner, to_json},
    service::BindayService,
};

use crate::api;

const PANEL_MISSING: &str = "Reached page, but BinDetailsPnl not found. Dumping preview:";

#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "BINDAY_BIND", default_value = "0.0.0.0:3000")]
    bind: String,
}

#[derive(Args)]
pub(crate) struct LookupArgs {
    /// Postcode to search for, e.g. "BT1 1AA"
    postcode: String,

    /// Part of the address line to pick from the results
    address: Option<String>,

    /// Print the lookup trace to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Output format: text or json
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Args)]
pub(crate) struct AddressesArgs {
    /// Postcode to search for
    postcode: String,
}

pub(crate) async fn serve(args: &ServeArgs, service: Arc<BindayService>) -> Result<()> {
    let listener = TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, api::router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
    }
    tracing::info!("shutting down");
}

pub(crate) async fn lookup(args: &LookupArgs, service: &BindayService) -> Result<()> {
    let mut out = io::stdout();
    let mut diag = io::stderr();
    write_lookup(args, service, &mut out, &mut diag).await
}

/// Run a lookup, printing the result to `out` and the trace to `diag`.
async fn write_lookup(
    args: &LookupArgs,
    service: &BindayService,
    out: &mut impl Write,
    diag: &mut impl Write,
) -> Result<()> {
    let query = LookupQuery::new(&args.postcode, args.address.as_deref());
    let mut trace = Trace::new();
    let outcome = service.schedule(&query, &mut trace).await;

    if args.verbose {
        write_trace(diag, &trace)?;
    }

    let schedule = match outcome {
        Ok(schedule) => schedule,
        Err(PortError::ResultsPanelMissing { preview }) => {
            writeln!(out, "{PANEL_MISSING}\n{preview}")?;
            return Ok(());
        }
        Err(err) => bail!("lookup failed: {err}"),
    };

    let body = match args.format {
        OutputFormat::Json => to_json(&schedule)?,
        OutputFormat::Text => to_banner(&schedule, &service.council().lookup_url),
    };
    writeln!(out, "{body}")?;
    Ok(())
}

pub(crate) async fn addresses(args: &AddressesArgs, service: &BindayService) -> Result<()> {
    let query = LookupQuery::new(&args.postcode, None::<&str>);
    let mut trace = Trace::new();
    let addresses = service.addresses(&query, &mut trace).await?;

    let mut out = io::stdout().lock();
    for address in &addresses {
        writeln!(out, "{}\t{}", address.value, address.label)?;
    }
    Ok(())
}

fn write_trace(diag: &mut impl Write, trace: &Trace) -> Result<()> {
    for line in trace.lines() {
        writeln!(diag, "{line}")?;
    }
    Ok(())
}
