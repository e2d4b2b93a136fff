use thiserror::Error;

/// Failure kinds of the upload-validate-serve pipeline.
///
/// The display strings are part of the HTTP contract and are returned to
/// clients verbatim.
#[derive(Error, Debug)]
pub enum RasterError {
    #[error("No file part")]
    MissingFilePart,

    #[error("No selected file")]
    EmptyFilename,

    #[error("Extension not allowed.")]
    ExtensionNotAllowed,

    /// Upload bytes that do not decode as a raster
    #[error("File is not a valid GDAL-File")]
    InvalidUpload,

    /// A stored file that no longer decodes as a raster
    #[error("Invalid GDAL-FILE")]
    InvalidRaster,

    #[error("Raster not found")]
    NotFound,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Resampling failed: {0}")]
    Resample(#[from] crate::services::resampler::ResampleError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type RasterResult<T> = Result<T, RasterError>;
