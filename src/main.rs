use placement_backend::{
    config::Config,
    database::pool::{create_pool, run_migrations},
    routes,
    services::{housekeeping, notification_service::NotificationService},
    shutdown::shutdown_signal,
    telemetry, AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

/// Delivers queued mail until `stop` flips.
async fn run_outbox_worker(notifier: NotificationService, mut stop: watch::Receiver<bool>) {
    loop {
        let idle = match notifier.run_once().await {
            Ok(true) => None,
            Ok(false) => Some(Duration::from_millis(1000)),
            Err(e) => {
                tracing::error!(error = ?e, "outbox worker error");
                Some(Duration::from_secs(2))
            }
        };

        if let Some(delay) = idle {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = stop.changed() => {}
            }
        }
        if *stop.borrow() {
            info!("outbox worker stopped");
            return;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    telemetry::init(config.log_format)?;

    let pool = create_pool(&config).await?;
    run_migrations(&pool).await?;

    let address: SocketAddr = config.server_address.parse()?;
    let app_state = AppState::new(pool.clone(), config);

    let (stop_tx, stop_rx) = watch::channel(false);
    let worker = tokio::spawn(run_outbox_worker(
        app_state.services.notifications.clone(),
        stop_rx,
    ));

    let mut scheduler = housekeeping::start(
        app_state.services.otp.clone(),
        app_state.services.notifications.clone(),
    )
    .await?;

    let app = routes::router(app_state)?;

    let listener = TcpListener::bind(address).await?;
    info!("Server listening on {}", address);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    let _ = stop_tx.send(true);
    if let Err(e) = worker.await {
        tracing::error!(error = ?e, "outbox worker panicked");
    }
    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = ?e, "scheduler shutdown failed");
    }
    pool.close().await;
    info!("shutdown complete");
    Ok(())
}
