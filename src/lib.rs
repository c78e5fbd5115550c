pub mod api;
pub mod cli;
pub mod config;
pub mod constants;
pub mod db;
pub mod models;
pub mod services;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::CommandFactory;
use cli::{Cli, Commands};
pub use config::Config;
use config::LogFormat;
use services::AccountService;
use state::SharedState;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    config.validate()?;
    init_tracing(&config)?;

    match cli.command {
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
        Some(Commands::Serve) => run_server(config).await,
        Some(Commands::Init) => cmd_init(),
        Some(Commands::Add {
            username,
            secret,
            days,
        }) => cli::cmd_add_account(&*account_service(config)?, &username, &secret, days).await,
        Some(Commands::Remove { username }) => {
            cli::cmd_remove_account(&*account_service(config)?, &username).await
        }
        Some(Commands::List) => cli::cmd_list_accounts(&*account_service(config)?).await,
        Some(Commands::Extend { username, days }) => {
            cli::cmd_extend_account(&*account_service(config)?, &username, days).await
        }
        Some(Commands::Deactivate { username }) => {
            cli::cmd_deactivate_account(&*account_service(config)?, &username).await
        }
        Some(Commands::Info { username }) => {
            cli::cmd_account_info(&*account_service(config)?, &username).await
        }
    }
}

fn account_service(config: Config) -> anyhow::Result<Arc<dyn AccountService>> {
    Ok(SharedState::new(config)?.accounts)
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    // stdout belongs to CLI output.
    match config.general.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    }
    .context("Failed to initialize logging")
}

fn cmd_init() -> anyhow::Result<()> {
    if Config::create_default_if_missing()? {
        println!("✓ Created config.toml");
        println!("  Set ETHICSLAB_COOKIE_SECRET and ETHICSLAB_ADMIN_PASSWORD before serving.");
    } else {
        println!("config.toml already exists.");
    }
    Ok(())
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    info!("Ethics Lab v{} starting...", env!("CARGO_PKG_VERSION"));

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    let port = config.server.port;
    let state = api::create_app_state_from_config(config, prometheus_handle)?;

    let accounts = state
        .accounts()
        .list()
        .await
        .context("Failed to load account store")?;
    info!(accounts = accounts.len(), "Account store ready");

    let app = api::router(state);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 Web Server running at http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Web server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
