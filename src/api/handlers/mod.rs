pub mod health;
pub mod rasters;
