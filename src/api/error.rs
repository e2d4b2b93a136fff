use crate::services::error::RasterError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Raster(e) => match e {
                RasterError::MissingFilePart
                | RasterError::EmptyFilename
                | RasterError::ExtensionNotAllowed
                | RasterError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                RasterError::InvalidUpload | RasterError::InvalidRaster => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                RasterError::NotFound => StatusCode::NOT_FOUND,
                RasterError::Upload(_)
                | RasterError::Resample(_)
                | RasterError::Io(_)
                | RasterError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Raster(e) if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("Internal error: {:?}", e);
                "Internal Server Error".to_string()
            }
            AppError::Raster(e) => e.to_string(),
            AppError::BadRequest(msg) | AppError::PayloadTooLarge(msg) => msg,
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
