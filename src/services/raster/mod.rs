//! Raster decoding behind the [`RasterReader`] seam.
//!
//! [`NativeRasterReader`] sniffs the file content (not the name) and hands it
//! to one of the format readers:
//!
//! - [`geotiff`]: TIFF and GeoTIFF through the `tiff` crate
//! - [`image_formats`]: PNG, JPEG and GIF through the `image` crate
//! - [`ascii_grid`]: ESRI ASCII grids
//!
//! Anything else is reported as [`DecodeError::Unrecognized`].

pub mod ascii_grid;
pub mod geotiff;
pub mod image_formats;

use crate::models::{BandData, GeoTransform, RasterMetadata};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF decoding failed: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Image decoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Malformed raster: {0}")]
    Malformed(String),

    #[error("Content is not a recognized raster format")]
    Unrecognized,

    #[error("Decoder aborted: {0}")]
    Aborted(String),
}

/// A fully decoded raster: header fields plus every band.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterDataset {
    pub driver: String,
    pub width: usize,
    pub height: usize,
    pub projection: String,
    pub geo_transform: Option<GeoTransform>,
    bands: Vec<BandData>,
}

impl RasterDataset {
    /// Builds a dataset, checking every band against the declared size.
    pub fn new(
        driver: impl Into<String>,
        width: usize,
        height: usize,
        projection: impl Into<String>,
        geo_transform: Option<GeoTransform>,
        bands: Vec<BandData>,
    ) -> Result<Self, DecodeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::Malformed(format!(
                "empty raster {}x{}",
                width, height
            )));
        }
        if bands.is_empty() {
            return Err(DecodeError::Malformed("raster has no bands".to_string()));
        }
        for (i, band) in bands.iter().enumerate() {
            if band.len() != height || band.iter().any(|row| row.len() != width) {
                return Err(DecodeError::Malformed(format!(
                    "band {} does not match {}x{}",
                    i + 1,
                    width,
                    height
                )));
            }
        }

        Ok(Self {
            driver: driver.into(),
            width,
            height,
            projection: projection.into(),
            geo_transform,
            bands,
        })
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Band by 1-based index, as raster libraries number them.
    #[cfg(test)]
    pub fn band(&self, index: usize) -> Option<&BandData> {
        index.checked_sub(1).and_then(|i| self.bands.get(i))
    }

    pub fn metadata(&self) -> RasterMetadata {
        RasterMetadata {
            driver: self.driver.clone(),
            raster_x_size: self.width,
            raster_y_size: self.height,
            raster_count: self.bands.len(),
            projection: self.projection.clone(),
            origin: self.geo_transform.map(|gt| gt.origin()),
            pixel_size: self.geo_transform.map(|gt| gt.pixel_size()),
        }
    }

    /// Bands in source order (1..N).
    pub fn into_bands(self) -> Vec<BandData> {
        self.bands
    }
}

/// Opens a file and decodes it as a raster. Implementations block.
pub trait RasterReader: Send + Sync {
    fn open(&self, path: &Path) -> Result<RasterDataset, DecodeError>;
}

/// Default reader dispatching on content sniffing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRasterReader;

impl NativeRasterReader {
    pub fn decode(&self, bytes: &[u8]) -> Result<RasterDataset, DecodeError> {
        match infer::get(bytes).map(|kind| kind.mime_type()) {
            Some("image/tiff") => geotiff::decode(bytes),
            Some("image/png") => image_formats::decode(bytes, image::ImageFormat::Png),
            Some("image/jpeg") => image_formats::decode(bytes, image::ImageFormat::Jpeg),
            Some("image/gif") => image_formats::decode(bytes, image::ImageFormat::Gif),
            _ if ascii_grid::looks_like(bytes) => ascii_grid::decode(bytes),
            _ => Err(DecodeError::Unrecognized),
        }
    }
}

impl RasterReader for NativeRasterReader {
    fn open(&self, path: &Path) -> Result<RasterDataset, DecodeError> {
        let bytes = std::fs::read(path)?;
        self.decode(&bytes)
    }
}

/// Splits pixel-interleaved samples into `samples_per_pixel` row-major bands.
pub(crate) fn deinterleave(
    samples: &[f64],
    width: usize,
    height: usize,
    samples_per_pixel: usize,
) -> Vec<BandData> {
    (0..samples_per_pixel)
        .map(|band| {
            (0..height)
                .map(|row| {
                    (0..width)
                        .map(|col| samples[(row * width + col) * samples_per_pixel + band])
                        .collect()
                })
                .collect()
        })
        .collect()
}

/// Number of interleaved samples per pixel, if the buffer length is consistent.
pub(crate) fn samples_per_pixel(len: usize, width: usize, height: usize) -> Option<usize> {
    let pixels = width.checked_mul(height)?;
    if pixels == 0 || len == 0 || len % pixels != 0 {
        return None;
    }
    Some(len / pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deinterleave_rgb() {
        // 2x1 pixels, 3 samples each
        let samples = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let bands = deinterleave(&samples, 2, 1, 3);
        assert_eq!(bands.len(), 3);
        assert_eq!(bands[0], vec![vec![1.0, 4.0]]);
        assert_eq!(bands[1], vec![vec![2.0, 5.0]]);
        assert_eq!(bands[2], vec![vec![3.0, 6.0]]);
    }

    #[test]
    fn test_samples_per_pixel() {
        assert_eq!(samples_per_pixel(12, 2, 2), Some(3));
        assert_eq!(samples_per_pixel(5, 2, 2), None);
        assert_eq!(samples_per_pixel(0, 2, 2), None);
    }

    #[test]
    fn test_dataset_rejects_mismatched_band() {
        let bands = vec![vec![vec![1.0, 2.0], vec![3.0]]];
        assert!(RasterDataset::new("MEM", 2, 2, "", None, bands).is_err());
    }

    #[test]
    fn test_band_is_one_based() {
        let bands = vec![vec![vec![1.0]], vec![vec![2.0]]];
        let ds = RasterDataset::new("MEM", 1, 1, "", None, bands).unwrap();
        assert!(ds.band(0).is_none());
        assert_eq!(ds.band(1), Some(&vec![vec![1.0]]));
        assert_eq!(ds.band(2), Some(&vec![vec![2.0]]));
        assert!(ds.band(3).is_none());
    }

    #[test]
    fn test_unrecognized_content() {
        let reader = NativeRasterReader;
        assert!(matches!(
            reader.decode(b"just some notes"),
            Err(DecodeError::Unrecognized)
        ));
        assert!(matches!(
            reader.decode(b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n"),
            Err(DecodeError::Unrecognized)
        ));
    }
}
