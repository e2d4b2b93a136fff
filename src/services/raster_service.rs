use crate::config::ServiceConfig;
use crate::models::{BandData, RasterMetadata, ResampleMethod, ResampleTarget};
use crate::services::error::{RasterError, RasterResult};
use crate::services::raster::{DecodeError, NativeRasterReader, RasterDataset, RasterReader};
use crate::services::resampler::{ImageResampler, Resampler};
use crate::services::upload_store::UploadStore;
use crate::utils::validation::{generate_stored_name, validate_raster_id, validate_upload_filename};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::AsyncRead;
use tracing::{info, warn};

/// Optional resampling arguments of a data request, as they arrive in the path.
#[derive(Debug, Clone, Default)]
pub struct DataRequest {
    pub width: Option<String>,
    pub height: Option<String>,
    pub method: Option<String>,
}

/// Orchestrates the upload store, the raster reader and the resampler.
pub struct RasterService {
    store: UploadStore,
    reader: Arc<dyn RasterReader>,
    resampler: Arc<dyn Resampler>,
    config: ServiceConfig,
}

impl RasterService {
    pub fn new(
        store: UploadStore,
        reader: Arc<dyn RasterReader>,
        resampler: Arc<dyn Resampler>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            reader,
            resampler,
            config,
        }
    }

    /// Service wired with the native reader and the `image` resampler.
    pub fn with_defaults(store: UploadStore, config: ServiceConfig) -> Self {
        Self::new(
            store,
            Arc::new(NativeRasterReader),
            Arc::new(ImageResampler),
            config,
        )
    }

    pub fn store(&self) -> &UploadStore {
        &self.store
    }

    /// Stores an upload and keeps it only if it decodes as a raster.
    ///
    /// Returns the generated identifier.
    pub async fn upload<R>(&self, filename: &str, reader: R) -> RasterResult<String>
    where
        R: AsyncRead + Unpin + Send,
    {
        let extension = validate_upload_filename(filename)?;
        let id = generate_stored_name(extension);
        let _guard = self.store.lock(&id).await;

        self.store
            .save_stream(&id, reader)
            .await
            .map_err(|e| RasterError::Upload(e.to_string()))?;

        match self.decode(&id).await {
            Ok(dataset) => {
                info!(
                    "📦 Accepted {} as {} raster ({}x{}, {} bands)",
                    id,
                    dataset.driver,
                    dataset.width,
                    dataset.height,
                    dataset.band_count()
                );
                Ok(id)
            }
            Err(e) => {
                warn!("Rejected upload {} ({}): {}", id, filename, e);
                self.store.delete(&id).await?;
                Err(RasterError::InvalidUpload)
            }
        }
    }

    /// Sweeps expired uploads, then describes `id`.
    pub async fn metadata(&self, id: &str) -> RasterResult<RasterMetadata> {
        self.cleanup().await;

        validate_raster_id(id)?;
        let _guard = self.store.lock(id).await;
        if !self.store.exists(id).await? {
            return Err(RasterError::NotFound);
        }

        match self.decode(id).await {
            Ok(dataset) => Ok(dataset.metadata()),
            Err(e) => {
                warn!("Metadata requested for undecodable raster {}: {}", id, e);
                Err(RasterError::InvalidRaster)
            }
        }
    }

    /// Every band of `id` in source order, resampled when both dimensions are given.
    ///
    /// A file that no longer decodes is deleted.
    pub async fn data(&self, id: &str, request: DataRequest) -> RasterResult<Vec<BandData>> {
        validate_raster_id(id)?;
        let target = self.resolve_target(&request)?;

        let _guard = self.store.lock(id).await;
        if !self.store.exists(id).await? {
            return Err(RasterError::NotFound);
        }

        let dataset = match self.decode(id).await {
            Ok(dataset) => dataset,
            Err(e) => {
                warn!("Deleting undecodable raster {}: {}", id, e);
                self.store.delete(id).await?;
                return Err(RasterError::InvalidRaster);
            }
        };

        let Some(target) = target else {
            return Ok(dataset.into_bands());
        };

        info!(
            "Resampling {} to {}x{} ({})",
            id, target.width, target.height, target.method
        );
        let resampler = Arc::clone(&self.resampler);
        let bands = tokio::task::spawn_blocking(move || {
            dataset
                .into_bands()
                .iter()
                .map(|band| resampler.resample(band, target.width, target.height, target.method))
                .collect::<Result<Vec<_>, _>>()
        })
        .await??;

        Ok(bands)
    }

    /// Resampling applies only when both width and height are present.
    pub fn resolve_target(&self, request: &DataRequest) -> RasterResult<Option<ResampleTarget>> {
        let (Some(width), Some(height)) = (request.width.as_deref(), request.height.as_deref())
        else {
            return Ok(None);
        };

        let parse_dim = |value: &str| {
            value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|v| *v > 0)
                .ok_or_else(|| {
                    RasterError::InvalidRequest(format!(
                        "Width and height must be positive integers, got '{}'",
                        value
                    ))
                })
        };
        let width = parse_dim(width)?;
        let height = parse_dim(height)?;

        let pixels = (width as u64).saturating_mul(height as u64);
        if pixels > self.config.max_resample_pixels {
            return Err(RasterError::InvalidRequest(format!(
                "Requested {}x{} exceeds the limit of {} pixels",
                width, height, self.config.max_resample_pixels
            )));
        }

        let method = match request.method.as_deref() {
            Some(method) => method
                .parse::<ResampleMethod>()
                .map_err(|e| RasterError::InvalidRequest(e.to_string()))?,
            None => self.config.default_resample_method,
        };

        Ok(Some(ResampleTarget {
            width,
            height,
            method,
        }))
    }

    /// Best-effort removal of uploads older than the retention window.
    pub async fn cleanup(&self) -> usize {
        let cutoff = SystemTime::now()
            .checked_sub(self.config.upload_retention)
            .unwrap_or(UNIX_EPOCH);

        match self.store.cleanup(cutoff).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!("Upload cleanup failed: {}", e);
                0
            }
        }
    }

    /// A decoder task that panics counts as an undecodable file.
    async fn decode(&self, id: &str) -> Result<RasterDataset, DecodeError> {
        let reader = Arc::clone(&self.reader);
        let path = self.store.path_for(id);
        tokio::task::spawn_blocking(move || reader.open(&path))
            .await
            .unwrap_or_else(|e| Err(DecodeError::Aborted(e.to_string())))
    }
}
