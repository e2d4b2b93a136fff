pub mod error;
pub mod raster;
pub mod raster_service;
pub mod resampler;
pub mod upload_store;
pub mod worker;
