use gateway::config::Config;
use gateway::router::create_router;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();
    tracing::info!(bind = %config.bind_addr, "starting arena gateway");

    let state = gateway::build_state(&config);
    let scheduler = state.scheduler.clone();
    scheduler.start();

    let app = create_router(state);
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    // Drain in-flight rounds before exiting
    scheduler.shutdown().await;

    Ok(())
}
