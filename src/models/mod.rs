use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use utoipa::ToSchema;

/// One band of pixel values, row-major: `band[row][column]`.
pub type BandData = Vec<Vec<f64>>;

/// A file held in the upload directory.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Generated name, `<uuid>_<ext>`
    pub id: String,
    pub path: PathBuf,
    pub modified_at: DateTime<Utc>,
}

/// Affine pixel-to-world mapping in GDAL coefficient order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    /// Upper-left corner of the upper-left pixel.
    pub fn origin(&self) -> [f64; 2] {
        [self.0[0], self.0[3]]
    }

    pub fn pixel_size(&self) -> [f64; 2] {
        [self.0[1], self.0[5]]
    }
}

/// Read-only view over a decoded raster, recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RasterMetadata {
    pub driver: String,
    #[serde(rename = "rasterXSize")]
    pub raster_x_size: usize,
    #[serde(rename = "rasterYSize")]
    pub raster_y_size: usize,
    #[serde(rename = "rasterCount")]
    pub raster_count: usize,
    pub projection: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[schema(value_type = Option<Vec<f64>>)]
    pub origin: Option<[f64; 2]>,
    #[serde(rename = "pixelSize", skip_serializing_if = "Option::is_none", default)]
    #[schema(value_type = Option<Vec<f64>>)]
    pub pixel_size: Option<[f64; 2]>,
}

/// Interpolation method for band resampling.
///
/// Accepts either a spline order (`0`..=`5`) or a method name, so both
/// `/data/10/10/3` and `/data/10/10/cubic` resolve to the same filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResampleMethod {
    Nearest,
    #[default]
    Bilinear,
    Cubic,
    Gaussian,
    Lanczos,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMethod(pub String);

impl fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown interpolation method '{}'", self.0)
    }
}

impl std::error::Error for UnknownMethod {}

impl FromStr for ResampleMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "0" | "nearest" | "nearest_neighbour" | "nearest_neighbor" => Ok(Self::Nearest),
            "1" | "linear" | "bilinear" | "triangle" => Ok(Self::Bilinear),
            "2" | "3" | "quadratic" | "biquadratic" | "cubic" | "bicubic" | "catmullrom" => {
                Ok(Self::Cubic)
            }
            "gaussian" => Ok(Self::Gaussian),
            "4" | "5" | "lanczos" | "lanczos3" => Ok(Self::Lanczos),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for ResampleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Nearest => "nearest",
            Self::Bilinear => "bilinear",
            Self::Cubic => "cubic",
            Self::Gaussian => "gaussian",
            Self::Lanczos => "lanczos",
        };
        f.write_str(name)
    }
}

/// Target grid for a data request. Only built when both dimensions are given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResampleTarget {
    pub width: usize,
    pub height: usize,
    pub method: ResampleMethod,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from_order() {
        assert_eq!("0".parse::<ResampleMethod>(), Ok(ResampleMethod::Nearest));
        assert_eq!("1".parse::<ResampleMethod>(), Ok(ResampleMethod::Bilinear));
        assert_eq!("3".parse::<ResampleMethod>(), Ok(ResampleMethod::Cubic));
        assert_eq!("5".parse::<ResampleMethod>(), Ok(ResampleMethod::Lanczos));
    }

    #[test]
    fn test_method_from_name() {
        assert_eq!("Nearest".parse::<ResampleMethod>(), Ok(ResampleMethod::Nearest));
        assert_eq!("bicubic".parse::<ResampleMethod>(), Ok(ResampleMethod::Cubic));
        assert_eq!(" gaussian ".parse::<ResampleMethod>(), Ok(ResampleMethod::Gaussian));
    }

    #[test]
    fn test_method_rejects_unknown() {
        assert!("6".parse::<ResampleMethod>().is_err());
        assert!("spline".parse::<ResampleMethod>().is_err());
    }

    #[test]
    fn test_metadata_serializes_gdal_keys() {
        let meta = RasterMetadata {
            driver: "GTiff".to_string(),
            raster_x_size: 2,
            raster_y_size: 3,
            raster_count: 1,
            projection: String::new(),
            origin: None,
            pixel_size: None,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["rasterXSize"], 2);
        assert_eq!(json["rasterYSize"], 3);
        assert_eq!(json["rasterCount"], 1);
        assert!(json.get("origin").is_none());
        assert!(json.get("pixelSize").is_none());
    }

    #[test]
    fn test_geotransform_accessors() {
        let gt = GeoTransform([10.0, 0.5, 0.0, 20.0, 0.0, -0.5]);
        assert_eq!(gt.origin(), [10.0, 20.0]);
        assert_eq!(gt.pixel_size(), [0.5, -0.5]);
    }
}
