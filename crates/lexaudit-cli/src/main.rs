//! lexaudit CLI: review detected tax-rate changes against the LexAudit server.
//!
//! `lexaudit review` runs an interactive session with background polling;
//! the other subcommands are one-shot requests.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use lexaudit_core::{ClientConfig, Decision, UpdateId, validate_crawl_url};
use lexaudit_sync::{ReviewApi, ReviewClient, ReviewSession};
use tracing::{debug, info};

mod display;
mod review;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "lexaudit",
    version,
    about = "Review detected tax-rate changes before they reach the rate database"
)]
struct Cli {
    /// Server base URL (overrides ~/.lexaudit/config.toml)
    #[arg(long, global = true, env = "LEXAUDIT_API_URL")]
    api_url: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive review session with background polling
    Review(ReviewArgs),
    /// List pending updates
    Updates,
    /// Show one update
    Show { id: String },
    /// Accept or reject an update
    Resolve(ResolveArgs),
    /// Crawl a government page for new rates
    Crawl { url: String },
    /// Download the evidence document for an update
    Evidence(EvidenceArgs),
    /// Show recent accept/reject decisions
    AuditLogs,
    /// Show the tax-scheme catalog
    Schemes,
    /// Check that the server is reachable
    Health,
}

#[derive(Args, Debug)]
struct ReviewArgs {
    /// Seconds between background refreshes
    #[arg(long)]
    poll_interval: Option<u64>,
}

#[derive(Args, Debug)]
struct ResolveArgs {
    id: String,
    /// Apply the detected rate
    #[arg(long, conflicts_with = "reject", required_unless_present = "reject")]
    accept: bool,
    /// Keep the current rate
    #[arg(long)]
    reject: bool,
}

#[derive(Args, Debug)]
struct EvidenceArgs {
    /// Evidence path as listed on the update
    locator: String,
    /// Output file (default: the document's file name)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_setup::init(cli.debug).ok();

    let mut config = ClientConfig::load().context("loading configuration")?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if let Commands::Review(ReviewArgs {
        poll_interval: Some(secs),
    }) = &cli.command
    {
        config.review.poll_interval_secs = *secs;
    }
    config.validate().context("invalid configuration")?;
    debug!(base_url = %config.api.base_url, "configuration loaded");

    let client = ReviewClient::from_config(&config).context("building HTTP client")?;

    match cli.command {
        Commands::Review(_) => {
            info!(
                base_url = client.base_url(),
                poll_interval_secs = config.review.poll_interval_secs,
                "starting review session"
            );
            let session = ReviewSession::new(Arc::new(client), config.poll_interval());
            review::run(session).await?;
        }
        Commands::Updates => {
            let updates = client
                .list_pending()
                .await
                .context("fetching pending updates")?;
            display::print_update_list(&updates, None);
        }
        Commands::Show { id } => {
            let update = client
                .get_update(&UpdateId::new(id))
                .await
                .context("fetching update")?;
            display::print_update_card(&update);
        }
        Commands::Resolve(args) => cmd_resolve(&client, args).await?,
        Commands::Crawl { url } => {
            let url = validate_crawl_url(&url)?;
            let summary = client.trigger_crawl(&url).await.context("crawl failed")?;
            display::print_crawl_summary(&summary);
        }
        Commands::Evidence(args) => cmd_evidence(&client, args).await?,
        Commands::AuditLogs => {
            let entries = client
                .list_audit_logs()
                .await
                .context("fetching audit logs")?;
            display::print_audit_log(&entries);
        }
        Commands::Schemes => {
            let schemes = client
                .list_tax_schemes()
                .await
                .context("fetching tax schemes")?;
            display::print_schemes(&schemes);
        }
        Commands::Health => {
            let health = client
                .health()
                .await
                .with_context(|| format!("server at {} is unreachable", client.base_url()))?;
            println!("{}: {}", health.status, health.message);
        }
    }

    Ok(())
}

async fn cmd_resolve(client: &ReviewClient, args: ResolveArgs) -> Result<()> {
    let decision = match (args.accept, args.reject) {
        (true, false) => Decision::Accept,
        (false, true) => Decision::Reject,
        _ => bail!("pass exactly one of --accept or --reject"),
    };
    let id = UpdateId::new(args.id);
    match client.resolve(&id, decision).await {
        Ok(response) => println!("Update {id}: {} ({})", response.status, response.message),
        Err(err) if err.is_not_found() => println!("Update {id} was already resolved."),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to {decision} update {id}"));
        }
    }
    Ok(())
}

async fn cmd_evidence(client: &ReviewClient, args: EvidenceArgs) -> Result<()> {
    let bytes = client
        .fetch_evidence(&args.locator)
        .await
        .with_context(|| format!("fetching {}", client.evidence_url(&args.locator)))?;
    let output = match args.output {
        Some(path) => path,
        None => {
            let url = client.evidence_url(&args.locator);
            let name = url.rsplit('/').next().unwrap_or("evidence.pdf");
            PathBuf::from(name)
        }
    };
    std::fs::write(&output, &bytes).with_context(|| format!("writing {}", output.display()))?;
    println!("Saved {} bytes to {}", bytes.len(), output.display());
    Ok(())
}
