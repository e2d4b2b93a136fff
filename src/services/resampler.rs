use crate::models::{BandData, ResampleMethod};
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResampleError {
    #[error("Cannot resample an empty band")]
    EmptyInput,

    #[error("Band rows have different lengths")]
    Ragged,

    #[error("Target size {0}x{1} is out of range")]
    TargetOutOfRange(usize, usize),
}

/// Resizes one band to a new grid. Implementations block.
pub trait Resampler: Send + Sync {
    fn resample(
        &self,
        band: &BandData,
        width: usize,
        height: usize,
        method: ResampleMethod,
    ) -> Result<BandData, ResampleError>;
}

/// Resampler backed by `image::imageops::resize`.
///
/// Nearest neighbour copies source cells through a pixel-centre index map, so
/// every output value is a source value bit for bit. The other filters run on
/// a `Luma<f64>` buffer mapped onto [0, 1], which `image` expects for float
/// pixels, and are mapped back afterwards. Their output is clipped to the
/// source value range. Non-finite cells are treated as the band minimum.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageResampler;

impl ImageResampler {
    pub fn filter(method: ResampleMethod) -> FilterType {
        match method {
            ResampleMethod::Nearest => FilterType::Nearest,
            ResampleMethod::Bilinear => FilterType::Triangle,
            ResampleMethod::Cubic => FilterType::CatmullRom,
            ResampleMethod::Gaussian => FilterType::Gaussian,
            ResampleMethod::Lanczos => FilterType::Lanczos3,
        }
    }
}

impl Resampler for ImageResampler {
    fn resample(
        &self,
        band: &BandData,
        width: usize,
        height: usize,
        method: ResampleMethod,
    ) -> Result<BandData, ResampleError> {
        let src_height = band.len();
        let src_width = band.first().map(Vec::len).unwrap_or(0);
        if src_width == 0 || src_height == 0 {
            return Err(ResampleError::EmptyInput);
        }
        if band.iter().any(|row| row.len() != src_width) {
            return Err(ResampleError::Ragged);
        }

        let (dst_w, dst_h) = match (u32::try_from(width), u32::try_from(height)) {
            (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
            _ => return Err(ResampleError::TargetOutOfRange(width, height)),
        };
        let (src_w, src_h) = match (u32::try_from(src_width), u32::try_from(src_height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => return Err(ResampleError::TargetOutOfRange(src_width, src_height)),
        };

        if (src_w, src_h) == (dst_w, dst_h) {
            return Ok(band.clone());
        }

        if method == ResampleMethod::Nearest {
            let cols = nearest_indices(src_width, width);
            return Ok(nearest_indices(src_height, height)
                .into_iter()
                .map(|r| cols.iter().map(|&c| band[r][c]).collect())
                .collect());
        }

        let (min, max) = value_range(band);
        if max <= min {
            return Ok(vec![vec![min; width]; height]);
        }
        let span = max - min;

        let normalized: Vec<f64> = band
            .iter()
            .flatten()
            .map(|&v| if v.is_finite() { (v - min) / span } else { 0.0 })
            .collect();

        let Some(source) = ImageBuffer::<Luma<f64>, Vec<f64>>::from_raw(src_w, src_h, normalized)
        else {
            return Err(ResampleError::Ragged);
        };

        let resized = imageops::resize(&source, dst_w, dst_h, Self::filter(method));

        Ok(resized
            .into_raw()
            .chunks(width)
            .map(|row| {
                row.iter()
                    .map(|&v| (v.clamp(0.0, 1.0) * span + min).clamp(min, max))
                    .collect()
            })
            .collect())
    }
}

/// Source index for each of `dst` cells, sampling at pixel centres.
fn nearest_indices(src: usize, dst: usize) -> Vec<usize> {
    let scale = src as f64 / dst as f64;
    (0..dst)
        .map(|i| (((i as f64 + 0.5) * scale).floor() as usize).min(src - 1))
        .collect()
}

/// Min and max over finite cells; `(0, 0)` when there are none.
fn value_range(band: &BandData) -> (f64, f64) {
    let (min, max) = band
        .iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if min > max { (0.0, 0.0) } else { (min, max) }
}
