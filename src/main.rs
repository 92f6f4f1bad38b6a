// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use clap::Parser;
use reconciler::config::Config;
use reconciler::dispatcher::Dispatcher;
use reconciler::event_bus::EventBus;
use reconciler::metrics;
use reconciler::plugins::PluginRegistry;
use reconciler::reconciler_host::ReconcilerHost;
use reconciler::shutdown::ShutdownHandle;
use reconciler::store::postgres::PostgresStore;
use reconciler::store::{migrations, Store};
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, error, info, warn};

/// CLI flags. Everything else (database URL, reconcile tuning, enabled
/// plugins) comes from `CONFIG_PATH`'s JSON document or its defaults; these
/// flags only override what's awkward to express as config-file content.
#[derive(Debug, Parser)]
#[command(name = "reconciler", version, about = "Operator-style reconciliation controller")]
struct Cli {
    /// Path to a JSON config file. Falls back to `CONFIG_PATH`, then to
    /// `./config.json`.
    #[arg(long)]
    config: Option<String>,

    /// Override `Config::metrics_port` for this run.
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Override the `RUST_LOG_FORMAT` environment variable ("json" or "text").
    #[arg(long)]
    log_format: Option<String>,
}

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("reconciler-worker")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

/// Initialize logging with custom format
///
/// Respects `RUST_LOG` environment variable if set, otherwise defaults to INFO level.
/// Respects `RUST_LOG_FORMAT` environment variable for output format (json or text).
fn initialize_logging(log_format_override: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = log_format_override
        .map(str::to_string)
        .or_else(|| std::env::var("RUST_LOG_FORMAT").ok())
        .unwrap_or_else(|| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting reconciliation controller");
}

/// Load the process config from the path named on the command line, the
/// `CONFIG_PATH` environment variable, or `./config.json`, in that order.
fn load_config(cli: &Cli) -> Result<Config> {
    let path = cli
        .config
        .clone()
        .or_else(|| std::env::var("CONFIG_PATH").ok())
        .unwrap_or_else(|| "config.json".to_string());

    debug!(path = %path, "loading config");
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading config file {path}"))?;
    let mut config: Config = serde_json::from_str(&raw).with_context(|| format!("parsing config file {path}"))?;

    if let Some(port) = cli.metrics_port {
        config.metrics_port = port;
    }

    Ok(config)
}

/// Start the Prometheus metrics + health HTTP server.
///
/// Serves `/metrics` and `/healthz` on `0.0.0.0:<metrics_port>`.
fn start_metrics_server(metrics_port: u16) -> tokio::task::JoinHandle<()> {
    info!(port = metrics_port, "starting metrics/health HTTP server");

    tokio::spawn(async move {
        async fn metrics_handler() -> String {
            match metrics::gather_metrics() {
                Ok(metrics_text) => metrics_text,
                Err(e) => {
                    error!("failed to gather metrics: {e}");
                    String::from("# error gathering metrics\n")
                }
            }
        }

        async fn healthz_handler() -> &'static str {
            "ok"
        }

        let app = Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/healthz", get(healthz_handler));

        let bind_addr = format!("0.0.0.0:{metrics_port}");
        let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("failed to bind metrics server to {bind_addr}: {e}");
                return;
            }
        };

        info!("metrics server listening on http://{bind_addr}");
        if let Err(e) = axum::serve(listener, app).await {
            error!("metrics server error: {e}");
        }
    })
}

/// Wait for SIGINT or SIGTERM, whichever comes first.
async fn wait_for_shutdown_signal() -> Result<()> {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            info!("received SIGINT (Ctrl+C), initiating graceful shutdown...");
            result.map_err(anyhow::Error::from)
        }
        result = async {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};
                let mut sigterm = signal(SignalKind::terminate())?;
                sigterm.recv().await;
                Ok::<(), anyhow::Error>(())
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
                Ok::<(), anyhow::Error>(())
            }
        } => {
            info!("received SIGTERM, initiating graceful shutdown...");
            result
        }
    }
}

async fn async_main() -> Result<()> {
    let cli = Cli::parse();
    initialize_logging(cli.log_format.as_deref());

    let config = load_config(&cli)?;

    debug!("connecting to database");
    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_pool_size)
        .max_connections(config.database.max_pool_size)
        .connect(secrecy::ExposeSecret::expose_secret(&config.database.url))
        .await
        .context("connecting to database")?;

    debug!("applying database migrations");
    migrations::run(&pool).await.context("applying database migrations")?;

    let store: Arc<dyn Store> = Arc::new(PostgresStore::new(pool));
    let event_bus = Arc::new(EventBus::new());

    // Concrete action executors, input sources, and reconciler plugins are
    // registered by the embedding deployment; this binary only wires the
    // generic runtime around an initially-empty registry.
    let registry = Arc::new(PluginRegistry::new());
    if config.enabled_action_plugins.is_empty() && config.enabled_input_sources.is_empty() {
        warn!("no action plugins or input sources configured; the dispatcher will skip every resource");
    }

    let shutdown = ShutdownHandle::new();

    let _metrics_handle = start_metrics_server(config.metrics_port);

    let dispatcher = Dispatcher::new(
        store.clone(),
        registry.clone(),
        event_bus.clone(),
        config.reconcile.clone(),
        shutdown.clone(),
    );

    let mut reconciler_host = ReconcilerHost::new(registry.clone(), store.clone(), shutdown.clone());
    reconciler_host.spawn_all().await;

    info!("controller started, entering main loop");
    tokio::select! {
        result = wait_for_shutdown_signal() => {
            result?;
        }
        () = dispatcher.run() => {
            warn!("dispatcher loops exited on their own; shutting down");
        }
    }

    shutdown.signal();
    dispatcher.wait_for_in_flight().await;
    reconciler_host.shutdown().await;
    info!("graceful shutdown completed successfully");

    Ok(())
}
