use std::net::SocketAddr;

use anyhow::Context;
use tracing::info;

use msgpush_server::adapter::handler::router;
use msgpush_server::infrastructure::config::Config;
use msgpush_server::startup::build_app_state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/config.yaml".to_string());
    let cfg = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {config_path}"))?;

    let telemetry_cfg = msgpush_telemetry::TelemetryConfig {
        service_name: cfg.app.name.clone(),
        version: cfg.app.version.clone(),
        environment: cfg.app.environment.clone(),
        log_level: cfg.app.log_level.clone(),
        log_format: cfg.app.log_format.clone(),
    };
    msgpush_telemetry::init_telemetry(&telemetry_cfg)
        .map_err(|e| anyhow::anyhow!("failed to init telemetry: {e}"))?;

    info!(
        app_name = %cfg.app.name,
        version = %cfg.app.version,
        environment = %cfg.app.environment,
        "starting message push server"
    );

    let state = build_app_state(&cfg).await?;
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!("REST server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("message push server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
