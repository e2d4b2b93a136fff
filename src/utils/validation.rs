use crate::services::error::RasterError;
use std::path::Path;
use uuid::Uuid;

/// Extensions accepted by the upload endpoint, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 8] = ["txt", "png", "jpg", "jpeg", "gif", "tif", "tiff", "pdf"];

/// Returns the part after the last dot, if any.
pub fn file_extension(filename: &str) -> Option<&str> {
    filename.rsplit_once('.').map(|(_, ext)| ext)
}

pub fn allowed_file(filename: &str) -> bool {
    file_extension(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Checks the client-supplied filename and returns its extension as given.
pub fn validate_upload_filename(filename: &str) -> Result<&str, RasterError> {
    // Only the last path component is meaningful
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if name.is_empty() {
        return Err(RasterError::EmptyFilename);
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path components stripped from upload name: {}", filename);
    }

    if !allowed_file(name) {
        return Err(RasterError::ExtensionNotAllowed);
    }

    file_extension(name).ok_or(RasterError::ExtensionNotAllowed)
}

/// Builds a fresh storage name `<uuid>_<ext>`, keeping the extension's case.
pub fn generate_stored_name(extension: &str) -> String {
    format!("{}_{}", Uuid::new_v4(), extension)
}

/// Accepts only names this service could have issued.
///
/// Anything else is reported as not found, which also keeps path traversal
/// out of the upload directory.
pub fn validate_raster_id(id: &str) -> Result<(), RasterError> {
    let (uuid_part, ext) = id.split_once('_').ok_or(RasterError::NotFound)?;

    if Uuid::parse_str(uuid_part).is_err() {
        return Err(RasterError::NotFound);
    }

    if !ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
        return Err(RasterError::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_file() {
        assert!(allowed_file("dem.tif"));
        assert!(allowed_file("DEM.TIFF"));
        assert!(allowed_file("grid.v2.txt"));
        assert!(!allowed_file("archive.zip"));
        assert!(!allowed_file("noextension"));
        assert!(!allowed_file("trailingdot."));
    }

    #[test]
    fn test_validate_upload_filename() {
        assert_eq!(validate_upload_filename("dem.TIF").unwrap(), "TIF");
        assert!(matches!(
            validate_upload_filename(""),
            Err(RasterError::EmptyFilename)
        ));
        assert!(matches!(
            validate_upload_filename("evil.exe"),
            Err(RasterError::ExtensionNotAllowed)
        ));
        assert_eq!(validate_upload_filename("../../etc/dem.png").unwrap(), "png");
    }

    #[test]
    fn test_generated_name_round_trips() {
        let name = generate_stored_name("tif");
        assert!(name.ends_with("_tif"));
        assert!(validate_raster_id(&name).is_ok());
        assert_ne!(name, generate_stored_name("tif"));
    }

    #[test]
    fn test_validate_raster_id_rejects_foreign_names() {
        assert!(validate_raster_id("../secret").is_err());
        assert!(validate_raster_id("not-a-uuid_tif").is_err());
        assert!(validate_raster_id("67e55044-10b1-426f-9247-bb680e5fe0c8_exe").is_err());
        assert!(validate_raster_id("67e55044-10b1-426f-9247-bb680e5fe0c8_TIF").is_ok());
    }
}
