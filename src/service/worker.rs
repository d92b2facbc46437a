use super::distributor::Distributor;
use crate::models::{DistributionOutcome, QuotaConfiguration};
use crate::source::{RecordSource, VoucherQuery};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{error, info};

/// Latest finished run, shared with the HTTP surface
pub type LatestOutcome = Arc<RwLock<Option<Arc<DistributionOutcome>>>>;

/// Named in-process queue of quota messages.
///
/// Every message is a complete configuration and is consumed exactly once.
pub struct QuotaQueue;

impl QuotaQueue {
    pub fn channel(
        name: impl Into<String>,
        capacity: usize,
    ) -> (QuotaPublisher, mpsc::Receiver<QuotaConfiguration>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let publisher = QuotaPublisher {
            name: name.into(),
            sender,
        };
        (publisher, receiver)
    }
}

#[derive(Debug, Clone)]
pub struct QuotaPublisher {
    name: String,
    sender: mpsc::Sender<QuotaConfiguration>,
}

impl QuotaPublisher {
    pub fn queue_name(&self) -> &str {
        &self.name
    }

    /// Returns false once the worker has stopped.
    pub async fn publish(&self, quotas: QuotaConfiguration) -> bool {
        self.sender.send(quotas).await.is_ok()
    }
}

/// Re-runs the distribution from scratch for every quota message.
pub struct QuotaWorker {
    receiver: mpsc::Receiver<QuotaConfiguration>,
    source: Arc<dyn RecordSource>,
    distributor: Arc<Distributor>,
    latest: LatestOutcome,
}

impl QuotaWorker {
    pub fn new(
        receiver: mpsc::Receiver<QuotaConfiguration>,
        source: Arc<dyn RecordSource>,
        distributor: Arc<Distributor>,
        latest: LatestOutcome,
    ) -> Self {
        Self {
            receiver,
            source,
            distributor,
            latest,
        }
    }

    /// Consume messages until every publisher is dropped.
    pub async fn run(self) {
        let QuotaWorker {
            mut receiver,
            source,
            distributor,
            latest,
        } = self;

        while let Some(quotas) = receiver.recv().await {
            info!(facilities = quotas.facilities.len(), "received quota configuration");
            match process(source.as_ref(), &distributor, quotas).await {
                Ok(outcome) => *latest.write().await = Some(outcome),
                Err(e) => error!(error = %e, "distribution run failed"),
            }
        }
        info!("quota queue closed, worker stopping");
    }
}

/// Fetch a fresh snapshot and distribute it off the async runtime.
async fn process(
    source: &dyn RecordSource,
    distributor: &Arc<Distributor>,
    quotas: QuotaConfiguration,
) -> Result<Arc<DistributionOutcome>, Box<dyn std::error::Error + Send + Sync>> {
    let vouchers = source.fetch(&VoucherQuery::for_quotas(&quotas)).await?;
    let distributor = Arc::clone(distributor);
    let outcome = tokio::task::spawn_blocking(move || distributor.run(vouchers, &quotas)).await?;
    Ok(Arc::new(outcome))
}
