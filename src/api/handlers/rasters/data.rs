use crate::AppState;
use crate::api::error::AppError;
use crate::models::BandData;
use crate::services::raster_service::DataRequest;
use axum::{
    Json,
    extract::{Path, State},
};

use super::types::DataPath;

/// Serves `/data`, `/data/{width}/{height}` and `/data/{width}/{height}/{method}`.
#[utoipa::path(
    get,
    path = "/rasters/{id}/data/{width}/{height}/{method}",
    params(
        ("id" = String, Path, description = "Identifier returned by the upload"),
        ("width" = Option<usize>, Path, description = "Target width, resampling needs both width and height"),
        ("height" = Option<usize>, Path, description = "Target height"),
        ("method" = Option<String>, Path, description = "Interpolation order 0-5 or name (nearest, bilinear, cubic, gaussian, lanczos)")
    ),
    responses(
        (status = 200, description = "One row-major 2D array per band, in band order", body = Vec<Vec<Vec<f64>>>),
        (status = 400, description = "Invalid resampling arguments", body = super::types::ErrorResponse),
        (status = 404, description = "Unknown identifier", body = super::types::ErrorResponse),
        (status = 422, description = "Invalid GDAL-FILE, the file was removed", body = super::types::ErrorResponse)
    ),
    tag = "rasters"
)]
pub async fn raster_data(
    State(state): State<AppState>,
    Path(path): Path<DataPath>,
) -> Result<Json<Vec<BandData>>, AppError> {
    let request = DataRequest {
        width: path.width,
        height: path.height,
        method: path.method,
    };

    let bands = state.raster_service.data(&path.id, request).await?;
    Ok(Json(bands))
}
