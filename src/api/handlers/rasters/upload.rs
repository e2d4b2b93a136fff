use crate::AppState;
use crate::api::error::AppError;
use crate::services::error::RasterError;
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    response::Html,
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;

use super::types::*;

const UPLOAD_FORM: &str = r#"<!doctype html>
<html>
  <head><title>Upload raster</title></head>
  <body>
    <h1>Upload raster</h1>
    <form method="post" action="/rasters/" enctype="multipart/form-data">
      <input type="file" name="file">
      <input type="submit" value="Upload">
    </form>
  </body>
</html>
"#;

#[utoipa::path(
    get,
    path = "/rasters/",
    responses(
        (status = 200, description = "HTML upload form", content_type = "text/html")
    ),
    tag = "rasters"
)]
pub async fn upload_form() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}

fn multipart_error(e: MultipartError) -> AppError {
    let err_msg = e.to_string();
    if err_msg.contains("length limit exceeded") {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(err_msg)
    }
}

#[utoipa::path(
    post,
    path = "/rasters/",
    request_body(content = UploadForm, description = "Raster file", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Raster stored and validated", body = UploadResponse),
        (status = 400, description = "Missing file or extension not allowed", body = ErrorResponse),
        (status = 422, description = "File is not a valid GDAL-File", body = ErrorResponse)
    ),
    tag = "rasters"
)]
pub async fn upload_raster(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let result: Result<Json<UploadResponse>, AppError> = async {
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            if field.name() != Some("file") {
                continue;
            }

            let filename = field.file_name().unwrap_or_default().to_string();
            let reader = StreamReader::new(field.map_err(std::io::Error::other));

            let id = state
                .raster_service
                .upload(&filename, reader)
                .await
                .map_err(|e| match e {
                    RasterError::Upload(msg) if msg.contains("length limit exceeded") => {
                        AppError::PayloadTooLarge(
                            "Request body exceeds the maximum allowed limit".to_string(),
                        )
                    }
                    other => AppError::Raster(other),
                })?;

            return Ok(Json(UploadResponse::for_id(id)));
        }

        Err(RasterError::MissingFilePart.into())
    }
    .await;

    match result {
        Ok(res) => Ok(res),
        Err(e) => {
            // Drain the rest of the body so the client is not cut off mid-send
            tracing::warn!("Upload failed early: {}. Consuming remaining stream...", e);
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            Err(e)
        }
    }
}
