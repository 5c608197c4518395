use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use lob_engine::config::Config;
use lob_engine::events::{EngineDispatcher, MarketFeed};
use rabbit_bus::{Bus, BusError};

const ORDERS_QUEUE: &str = "orders";
const TRADES_QUEUE: &str = "trades";
const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<(), Box<BusError>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    info!("connecting to bus at {}", config.rabbit_url);

    let bus = Bus::connect(&config.rabbit_url, &config.app_id)
        .await
        .map_err(Box::new)?;
    let publisher = bus.publisher(TRADES_QUEUE).await.map_err(Box::new)?;
    let mut subscriber = bus.subscriber(ORDERS_QUEUE).await.map_err(Box::new)?;

    let dispatcher = EngineDispatcher::new(Arc::new(publisher), MarketFeed::default());
    let shutdown = CancellationToken::new();

    // Periodic snapshots bound staleness while the book is idle.
    let timer_dispatcher = dispatcher.clone();
    let timer_shutdown = shutdown.clone();
    let snapshot_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(SNAPSHOT_INTERVAL);
        loop {
            tokio::select! {
                _ = timer_shutdown.cancelled() => break,
                _ = interval.tick() => timer_dispatcher.broadcast_snapshot(),
            }
        }
    });

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            signal_shutdown.cancel();
        }
    });

    info!("matching engine started, consuming from {}", ORDERS_QUEUE);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            delivery = subscriber.receive() => {
                let Some(delivery) = delivery else {
                    error!("orders consumer closed unexpectedly");
                    break;
                };
                match &delivery.content {
                    Some(content) => dispatcher.handle_raw(content).await,
                    None => info!("received empty delivery"),
                }
                if let Err(err) = subscriber.ack(&delivery).await {
                    // Log and keep consuming; a failed ack only delays redelivery.
                    error!("failed to acknowledge delivery: {}", err);
                }
            }
        }
    }

    shutdown.cancel();
    let _ = snapshot_task.await;
    if let Err(err) = subscriber.close().await {
        error!("error closing subscriber: {}", err);
    }
    if let Err(err) = bus.close().await {
        error!("error closing bus connection: {}", err);
    }
    info!("matching engine shutdown complete");
    Ok(())
}
