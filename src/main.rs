use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;

use roombook::booking::RoomBooking;
use roombook::calendar::{Clock, LocalClock};
use roombook::config::Config;
use roombook::limits::RESEED_EVERY_SECS;
use roombook::http::{self, AppState};
use roombook::store::SlotStore;
use roombook::{compactor, observability, seed};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::init_tracing();

    let config = Config::from_env()?;
    observability::init_metrics(config.metrics_port)?;

    std::fs::create_dir_all(&config.data_dir)?;
    let store = Arc::new(SlotStore::open(config.wal_path())?);

    let clock: Arc<dyn Clock> = Arc::new(LocalClock);
    if !config.seed_rooms.is_empty() {
        seed::seed_upcoming(&store, &config.seed_rooms, &config.seed_times, clock.today()).await?;
        tokio::spawn(seed::run_seeder(
            store.clone(),
            config.seed_rooms.clone(),
            config.seed_times.clone(),
            clock.clone(),
            Duration::from_secs(RESEED_EVERY_SECS),
        ));
    }

    let compactor_store = store.clone();
    let threshold = config.compact_threshold;
    tokio::spawn(async move {
        compactor::run_compactor(compactor_store, threshold, Duration::from_secs(30)).await;
    });

    let booking = RoomBooking::new(store, clock);
    let app = http::router(AppState::new(booking));

    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("roombook listening on {addr}");
    info!("  data_dir: {}", config.data_dir.display());
    info!("  compact_threshold: {}", config.compact_threshold);
    info!(
        "  metrics: {}",
        config
            .metrics_port
            .map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics"))
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("roombook stopped");
    Ok(())
}

/// Resolves on ctrl-c, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to register SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received, draining connections");
}
