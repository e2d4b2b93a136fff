//! TIFF / GeoTIFF decoding.
//!
//! Georeferencing comes from the GeoTIFF tags: ModelTransformation when
//! present, otherwise ModelTiepoint plus ModelPixelScale. The projection is
//! reported as `EPSG:<code>` from the GeoKeyDirectory, falling back to the
//! GeoAsciiParams citation.

use super::{DecodeError, RasterDataset, deinterleave, samples_per_pixel};
use crate::models::GeoTransform;
use std::io::Cursor;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GEO_ASCII_PARAMS: u16 = 34737;

const GT_RASTER_TYPE_GEO_KEY: u32 = 1025;
const GEOGRAPHIC_TYPE_GEO_KEY: u32 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u32 = 3072;

const RASTER_PIXEL_IS_POINT: u32 = 2;
const USER_DEFINED: u32 = 32767;

pub fn decode(bytes: &[u8]) -> Result<RasterDataset, DecodeError> {
    let mut decoder = Decoder::new(Cursor::new(bytes))?;
    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);

    let geo_keys = read_geo_keys(&mut decoder);
    let geo_transform = read_geo_transform(&mut decoder, &geo_keys);
    let projection = read_projection(&mut decoder, &geo_keys);

    let samples = into_f64(decoder.read_image()?);
    let per_pixel = samples_per_pixel(samples.len(), width, height).ok_or_else(|| {
        DecodeError::Malformed(format!(
            "{} samples do not fill a {}x{} grid",
            samples.len(),
            width,
            height
        ))
    })?;

    let bands = deinterleave(&samples, width, height, per_pixel);
    RasterDataset::new("GTiff", width, height, projection, geo_transform, bands)
}

fn into_f64(result: DecodingResult) -> Vec<f64> {
    match result {
        DecodingResult::U8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|x| x as f64).collect(),
        DecodingResult::I8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|x| x as f64).collect(),
        DecodingResult::F32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::F64(data) => data,
    }
}

// Known GeoTIFF codes map to named tag variants when reading, so resolve the
// code the same way the decoder does.
fn geotiff_tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

fn read_f64_tag<R>(decoder: &mut Decoder<R>, code: u16) -> Option<Vec<f64>>
where
    R: std::io::Read + std::io::Seek,
{
    decoder
        .find_tag(geotiff_tag(code))
        .ok()
        .flatten()
        .and_then(|value| value.into_f64_vec().ok())
}

/// GeoKeyDirectory entries with inline values, as `(key, value)` pairs.
fn read_geo_keys<R>(decoder: &mut Decoder<R>) -> Vec<(u32, u32)>
where
    R: std::io::Read + std::io::Seek,
{
    let Some(directory) = decoder
        .find_tag(geotiff_tag(GEO_KEY_DIRECTORY))
        .ok()
        .flatten()
        .and_then(|value| value.into_u32_vec().ok())
    else {
        return Vec::new();
    };

    parse_geo_key_directory(&directory)
}

pub(crate) fn parse_geo_key_directory(directory: &[u32]) -> Vec<(u32, u32)> {
    // Header: version, revision, minor revision, key count
    let Some(&count) = directory.get(3) else {
        return Vec::new();
    };

    directory[4..]
        .chunks_exact(4)
        .take(count as usize)
        .filter(|entry| entry[1] == 0) // value stored inline
        .map(|entry| (entry[0], entry[3]))
        .collect()
}

fn geo_key(keys: &[(u32, u32)], key: u32) -> Option<u32> {
    keys.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

fn read_geo_transform<R>(decoder: &mut Decoder<R>, keys: &[(u32, u32)]) -> Option<GeoTransform>
where
    R: std::io::Read + std::io::Seek,
{
    let transformation = read_f64_tag(decoder, MODEL_TRANSFORMATION);
    let tiepoint = read_f64_tag(decoder, MODEL_TIEPOINT);
    let scale = read_f64_tag(decoder, MODEL_PIXEL_SCALE);

    let gt = geo_transform_from_tags(
        transformation.as_deref(),
        tiepoint.as_deref(),
        scale.as_deref(),
    )?;

    if geo_key(keys, GT_RASTER_TYPE_GEO_KEY) == Some(RASTER_PIXEL_IS_POINT) {
        Some(shift_to_pixel_corner(gt))
    } else {
        Some(gt)
    }
}

pub(crate) fn geo_transform_from_tags(
    transformation: Option<&[f64]>,
    tiepoint: Option<&[f64]>,
    scale: Option<&[f64]>,
) -> Option<GeoTransform> {
    if let Some(m) = transformation.filter(|m| m.len() >= 16) {
        return Some(GeoTransform([m[3], m[0], m[1], m[7], m[4], m[5]]));
    }

    let tp = tiepoint.filter(|tp| tp.len() >= 6)?;
    let sc = scale.filter(|sc| sc.len() >= 2)?;
    let (i, j, x, y) = (tp[0], tp[1], tp[3], tp[4]);
    let (sx, sy) = (sc[0], sc[1]);

    Some(GeoTransform([x - i * sx, sx, 0.0, y + j * sy, 0.0, -sy]))
}

/// PixelIsPoint tiepoints reference pixel centres; move to the corner.
fn shift_to_pixel_corner(gt: GeoTransform) -> GeoTransform {
    let [x0, a, b, y0, d, e] = gt.0;
    GeoTransform([x0 - 0.5 * a - 0.5 * b, a, b, y0 - 0.5 * d - 0.5 * e, d, e])
}

fn read_projection<R>(decoder: &mut Decoder<R>, keys: &[(u32, u32)]) -> String
where
    R: std::io::Read + std::io::Seek,
{
    let epsg = geo_key(keys, PROJECTED_CS_TYPE_GEO_KEY)
        .or_else(|| geo_key(keys, GEOGRAPHIC_TYPE_GEO_KEY))
        .filter(|code| *code != 0 && *code != USER_DEFINED);

    if let Some(code) = epsg {
        return format!("EPSG:{}", code);
    }

    decoder
        .find_tag(geotiff_tag(GEO_ASCII_PARAMS))
        .ok()
        .flatten()
        .and_then(|value| value.into_string().ok())
        .map(|citation| citation.trim_end_matches(['|', '\0']).trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiff::encoder::{TiffEncoder, colortype};

    fn encode_gray_f32(width: u32, height: u32, pixels: &[f32]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        let mut encoder = TiffEncoder::new(&mut buf).unwrap();
        encoder
            .write_image::<colortype::Gray32Float>(width, height, pixels)
            .unwrap();
        buf.into_inner()
    }

    fn encode_georeferenced(width: u32, height: u32, pixels: &[u8]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        let mut encoder = TiffEncoder::new(&mut buf).unwrap();
        let mut image = encoder
            .new_image::<colortype::Gray8>(width, height)
            .unwrap();
        {
            let dir = image.encoder();
            dir.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &[30.0f64, 30.0, 0.0][..])
                .unwrap();
            dir.write_tag(
                Tag::Unknown(MODEL_TIEPOINT),
                &[0.0f64, 0.0, 0.0, 500_000.0, 4_000_000.0, 0.0][..],
            )
            .unwrap();
            dir.write_tag(
                Tag::Unknown(GEO_KEY_DIRECTORY),
                &[1u16, 1, 0, 2, 1024, 0, 1, 1, 3072, 0, 1, 32633][..],
            )
            .unwrap();
        }
        image.write_data(pixels).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_decode_plain_float_tiff() {
        let bytes = encode_gray_f32(2, 2, &[1.5, 2.5, -3.0, 4.0]);
        let ds = decode(&bytes).unwrap();
        assert_eq!(ds.driver, "GTiff");
        assert_eq!((ds.width, ds.height, ds.band_count()), (2, 2, 1));
        assert_eq!(ds.band(1).unwrap(), &vec![vec![1.5, 2.5], vec![-3.0, 4.0]]);
        assert!(ds.geo_transform.is_none());
        assert_eq!(ds.projection, "");
    }

    #[test]
    fn test_decode_georeferenced_tiff() {
        let bytes = encode_georeferenced(3, 2, &[1, 2, 3, 4, 5, 6]);
        let ds = decode(&bytes).unwrap();
        let meta = ds.metadata();
        assert_eq!(meta.origin, Some([500_000.0, 4_000_000.0]));
        assert_eq!(meta.pixel_size, Some([30.0, -30.0]));
        assert_eq!(meta.projection, "EPSG:32633");
        assert_eq!(ds.band(1).unwrap()[1], vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_transformation_matrix_wins_over_tiepoint() {
        let matrix = [
            2.0, 0.0, 0.0, 100.0, //
            0.0, -2.0, 0.0, 200.0, //
            0.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ];
        let gt = geo_transform_from_tags(
            Some(&matrix),
            Some(&[0.0, 0.0, 0.0, 1.0, 1.0, 0.0]),
            Some(&[9.0, 9.0, 0.0]),
        )
        .unwrap();
        assert_eq!(gt.0, [100.0, 2.0, 0.0, 200.0, 0.0, -2.0]);
    }

    #[test]
    fn test_tiepoint_offset_from_non_origin_pixel() {
        let gt = geo_transform_from_tags(
            None,
            Some(&[10.0, 5.0, 0.0, 1000.0, 2000.0, 0.0]),
            Some(&[2.0, 3.0, 0.0]),
        )
        .unwrap();
        assert_eq!(gt.origin(), [980.0, 2015.0]);
    }

    #[test]
    fn test_parse_geo_key_directory_skips_referenced_values() {
        let keys = parse_geo_key_directory(&[1, 1, 0, 2, 1026, 34737, 12, 0, 2048, 0, 1, 4326]);
        assert_eq!(keys, vec![(2048, 4326)]);
    }

    #[test]
    fn test_pixel_is_point_shift() {
        let gt = shift_to_pixel_corner(GeoTransform([100.0, 10.0, 0.0, 50.0, 0.0, -10.0]));
        assert_eq!(gt.origin(), [95.0, 55.0]);
    }

    #[test]
    fn test_truncated_tiff_is_error() {
        let bytes = encode_gray_f32(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        assert!(decode(&bytes[..12]).is_err());
    }
}
