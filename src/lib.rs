pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = tracing_loki::builder()
            .label("app", "storefront")?
            .extra_field("env", "production")?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config, prometheus_handle).await,
        Commands::Init => cli::cmd_init(),
        Commands::Promote { identifier } => cli::cmd_promote(config, &identifier).await,
    }
}

async fn serve(config: Config, prometheus_handle: Option<PrometheusHandle>) -> anyhow::Result<()> {
    let port = config.server.port;

    let state = api::create_app_state_from_config(config, prometheus_handle).await?;
    let app = api::router(state).await;

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Web server running at http://{}", addr);

    axum::serve(listener, app)
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
