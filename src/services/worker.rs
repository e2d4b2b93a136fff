use crate::services::raster_service::RasterService;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

/// Periodic upload sweep, running alongside the per-request one.
pub struct BackgroundWorker {
    service: Arc<RasterService>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl BackgroundWorker {
    pub fn new(
        service: Arc<RasterService>,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            service,
            interval,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(
            "🚀 Cleanup worker started (every {}s)",
            self.interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("🛑 Cleanup worker shutting down");
                    break;
                }
                _ = sleep(self.interval) => {
                    self.perform_cleanup().await;
                }
            }
        }
    }

    async fn perform_cleanup(&self) {
        tracing::debug!("🧹 Running scheduled upload cleanup...");
        let removed = self.service.cleanup().await;
        if removed > 0 {
            tracing::info!("✅ Scheduled cleanup removed {} uploads", removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::services::upload_store::UploadStore;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_worker_sweeps_and_stops() {
        let dir = TempDir::new().unwrap();
        let mut config = ServiceConfig::development(dir.path());
        config.upload_retention = Duration::ZERO;

        let store = UploadStore::new(dir.path());
        store.init().await.unwrap();
        store.save("stale_tif", b"x").await.unwrap();

        let service = Arc::new(RasterService::with_defaults(store, config));
        let (tx, rx) = watch::channel(false);
        let worker = BackgroundWorker::new(service.clone(), Duration::from_millis(20), rx);
        let handle = tokio::spawn(worker.run());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!service.store().exists("stale_tif").await.unwrap());

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("worker must stop on shutdown")
            .unwrap();
    }
}
