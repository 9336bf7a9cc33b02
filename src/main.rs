#![forbid(unsafe_code)]

//! `helpdesk-gateway` — Slack webhook intake server binary.
//!
//! Bootstraps configuration and credentials, registers the demo
//! help-request routes, and serves the dispatcher until SIGTERM/ctrl-c.

use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::get;
use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use helpdesk_gateway::config::GlobalConfig;
use helpdesk_gateway::handlers;
use helpdesk_gateway::slack::client::SlackGateway;
use helpdesk_gateway::webhook::dispatcher::{serve, Dispatcher};
use helpdesk_gateway::webhook::routes::RouteTable;
use helpdesk_gateway::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "helpdesk-gateway", about = "Slack webhook intake gateway", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the configured listen address.
    #[arg(long)]
    listen: Option<String>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("helpdesk-gateway bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    let addr = config.listen_addr()?;

    // Load the signing secret and bot token from keyring / env vars.
    config.load_credentials().await?;
    info!("configuration loaded");

    // ── Platform client (absent in local-only mode) ─────
    let gateway = if config.slack.bot_token.is_empty() {
        info!("no bot token configured; running in local-only mode");
        None
    } else {
        Some(Arc::new(SlackGateway::new(&config.slack.bot_token)?))
    };

    // ── Register routes, single-threaded, before serving ─
    let mut table = RouteTable::new();
    handlers::register_routes(&mut table, gateway, config.slack.channel_id.clone())?;
    info!(routes = table.len(), "route table ready");

    let dispatcher = Dispatcher::new(config.webhook_settings(), table);
    let router = dispatcher.into_router().route("/health", get(health));

    // ── Serve until shutdown ────────────────────────────
    let ct = CancellationToken::new();
    let server_ct = ct.clone();
    let server = tokio::spawn(async move { serve(router, addr, server_ct).await });

    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    match server.await {
        Ok(result) => result?,
        Err(err) => return Err(AppError::Io(format!("server task panicked: {err}"))),
    }

    info!("helpdesk-gateway shut down");
    Ok(())
}

/// Handler for `GET /health` — returns 200 OK with a plain-text body.
///
/// Mounted beside the dispatcher fallback so liveness probes skip
/// signature validation.
async fn health() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
