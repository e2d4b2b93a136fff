pub mod data;
pub mod metadata;
pub mod types;
pub mod upload;

// Re-export all types
pub use types::*;

// Re-export all handlers
pub use data::raster_data;
pub use metadata::raster_metadata;
pub use upload::{upload_form, upload_raster};
