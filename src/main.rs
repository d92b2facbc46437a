use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;
use voucher_distributor::{
    api::{self, AppState},
    service::{LatestOutcome, QuotaQueue, QuotaWorker},
    AppConfig, Distributor, DistributorOptions, VoucherApiClient,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // missing mandatory settings stop the service here
    let config = AppConfig::load()?;
    info!("Starting distributor with config: {:?}", config);

    let distributor = Arc::new(Distributor::new(DistributorOptions {
        max_correction_passes: config.distribution.max_correction_passes,
    }));
    let source = Arc::new(VoucherApiClient::new(&config.vouchers)?);
    let latest = LatestOutcome::default();

    let (publisher, receiver) =
        QuotaQueue::channel(config.queue.name.clone(), config.queue.capacity);
    let worker = QuotaWorker::new(receiver, source, Arc::clone(&distributor), latest.clone());
    tokio::spawn(worker.run());

    let app = api::router(AppState {
        distributor,
        publisher,
        latest,
    })
    .layer(ServiceBuilder::new());

    info!("Server listening on {}", config.server.address);
    info!("API Endpoints:");
    info!("  POST /api/queues/{}          - quota messages", config.queue.name);
    info!("  POST /api/distribution       - distribute an uploaded batch");
    info!("  GET  /api/distribution/latest[/records.csv|/leftover.csv|/control.csv]");

    let listener = tokio::net::TcpListener::bind(&config.server.address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
