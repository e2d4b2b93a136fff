use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub status: u16,
    /// Identifier of the stored raster, `<uuid>_<ext>`
    pub hash: String,
    pub get_metadata: String,
    pub get_data: String,
    pub get_scaled_data: String,
}

impl UploadResponse {
    pub fn for_id(id: String) -> Self {
        Self {
            status: 200,
            get_metadata: format!("/rasters/{}", id),
            get_data: format!("/rasters/{}/data", id),
            get_scaled_data: format!("/rasters/{}/data/<width>/<height>", id),
            hash: id,
        }
    }
}

/// Multipart body of an upload.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Path segments of a data request; the trailing ones are optional.
#[derive(Debug, Deserialize)]
pub struct DataPath {
    pub id: String,
    pub width: Option<String>,
    pub height: Option<String>,
    pub method: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
