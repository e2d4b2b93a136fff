use crate::models::ResampleMethod;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the raster upload service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory holding uploaded rasters (default: "./uploads")
    pub upload_folder: PathBuf,

    /// Age after which an upload is swept (default: 1 hour)
    pub upload_retention: Duration,

    /// Interval of the background sweep, zero disables it (default: 10 minutes)
    pub cleanup_interval: Duration,

    /// Maximum upload size in bytes (default: 256 MB)
    pub max_file_size: usize,

    /// Upper bound on width * height for a resample request (default: 4096 * 4096)
    pub max_resample_pixels: u64,

    /// Interpolation method used when a request names none (default: bilinear)
    pub default_resample_method: ResampleMethod,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            upload_folder: PathBuf::from("./uploads"),
            upload_retention: Duration::from_secs(3600),
            cleanup_interval: Duration::from_secs(600),
            max_file_size: 256 * 1024 * 1024, // 256 MB
            max_resample_pixels: 4096 * 4096,
            default_resample_method: ResampleMethod::Bilinear,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            upload_folder: env::var("UPLOAD_FOLDER")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default.upload_folder),

            upload_retention: env::var("UPLOAD_RETENTION_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.upload_retention),

            cleanup_interval: env::var("CLEANUP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.cleanup_interval),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            max_resample_pixels: env::var("MAX_RESAMPLE_PIXELS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_resample_pixels),

            default_resample_method: match env::var("DEFAULT_RESAMPLE_METHOD") {
                Ok(v) if !v.trim().is_empty() => v.parse().unwrap_or_else(|e| {
                    tracing::warn!(
                        "DEFAULT_RESAMPLE_METHOD: {}, using {}",
                        e,
                        default.default_resample_method
                    );
                    default.default_resample_method
                }),
                _ => default.default_resample_method,
            },
        }
    }

    /// Create config for development and tests (no background sweep, scoped folder)
    pub fn development(upload_folder: impl Into<PathBuf>) -> Self {
        Self {
            upload_folder: upload_folder.into(),
            cleanup_interval: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn background_cleanup_enabled(&self) -> bool {
        !self.cleanup_interval.is_zero()
    }
}
