use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campsunshine::api::router;
use campsunshine::config::AppConfig;
use campsunshine::db;
use campsunshine::payments::{PaymentGateway, StripeHttpClient, UnconfiguredPaymentGateway};
use campsunshine::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "campsunshine=debug,tower_http=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = db::init_pool(&config.database_url, config.db_max_connections).await?;

    let payments: Arc<dyn PaymentGateway> = match config.payment.clone() {
        Some(payment) => Arc::new(StripeHttpClient::new(payment)?),
        None => {
            warn!("STRIPE_SECRET_KEY is not set; payment intents are disabled");
            Arc::new(UnconfiguredPaymentGateway)
        }
    };

    let state = AppState {
        db: pool.clone(),
        payments,
    };

    let app = router(state);

    let addr = SocketAddr::new(config.host, config.port);
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("server shutdown complete");

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received, draining connections");
}
