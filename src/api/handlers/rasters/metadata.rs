use crate::AppState;
use crate::api::error::AppError;
use crate::models::RasterMetadata;
use axum::{
    Json,
    extract::{Path, State},
};

#[utoipa::path(
    get,
    path = "/rasters/{id}",
    params(
        ("id" = String, Path, description = "Identifier returned by the upload")
    ),
    responses(
        (status = 200, description = "Raster metadata", body = RasterMetadata),
        (status = 404, description = "Unknown identifier", body = super::types::ErrorResponse),
        (status = 422, description = "Invalid GDAL-FILE", body = super::types::ErrorResponse)
    ),
    tag = "rasters"
)]
pub async fn raster_metadata(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RasterMetadata>, AppError> {
    let metadata = state.raster_service.metadata(&id).await?;
    Ok(Json(metadata))
}
