use relay::config::Config;
use relay::state::AppState;
use relay::supervisor::Supervisor;
use relay::{build_router, db};
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::from_env()?;
    let pool = db::create_pool(&cfg).await?;
    db::run_migrations(&pool).await?;

    let broadcaster = std::sync::Arc::new(relay::broadcast::Broadcaster::new(cfg.legacy_payload_envelope));

    let (supervisor, shutdown_rx) = Supervisor::new(
        pool.clone(),
        broadcaster.clone(),
        cfg.upstream_ws_url.clone(),
        cfg.upstream_api_key.clone(),
    );

    let state = AppState::new(pool.clone(), &cfg, broadcaster, shutdown_rx);
    supervisor.spawn(pool.clone());

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!(addr = %cfg.bind_addr, "relay listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    supervisor.shutdown().await;
    pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
