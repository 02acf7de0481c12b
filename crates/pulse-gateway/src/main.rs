//! pulse service
//!
//! - `/`, `/health`, `/stress` demo endpoints
//! - `/metrics` scrape endpoint
//! - Background CPU simulator, stopped on shutdown

use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pulse_gateway::{app_state, config, router};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "pulse.yaml".to_string());
    let cfg = config::load_or_default(&path).expect("config load failed");
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .expect("server.listen must be a valid SocketAddr");

    let state = app_state::AppState::new(cfg).expect("app state init failed");

    let cancel = CancellationToken::new();
    let simulator = state.simulator().spawn(cancel.clone());

    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");
    tracing::info!(%listen, "pulse listening");
    tracing::info!("metrics available at http://{listen}/metrics");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");

    cancel.cancel();
    if let Err(e) = simulator.await {
        tracing::warn!(error = %e, "cpu simulator task failed");
    }
    tracing::info!("pulse stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
