use super::{DecodeError, RasterDataset, deinterleave, samples_per_pixel};
use image::{DynamicImage, ImageFormat};

/// Decodes a PNG, JPEG or GIF into one band per colour channel.
///
/// These formats carry no georeferencing, so the dataset has no geotransform
/// and an empty projection. `image` expands GIF palettes, so a GIF yields four
/// RGBA bands rather than a single palette-index band.
pub fn decode(bytes: &[u8], format: ImageFormat) -> Result<RasterDataset, DecodeError> {
    let img = image::load_from_memory_with_format(bytes, format)?;
    let (width, height) = (img.width() as usize, img.height() as usize);

    let samples = channel_samples(&img);
    let per_pixel = samples_per_pixel(samples.len(), width, height).ok_or_else(|| {
        DecodeError::Malformed(format!("unexpected sample count for {}x{}", width, height))
    })?;

    let bands = deinterleave(&samples, width, height, per_pixel);
    RasterDataset::new(driver_name(format), width, height, "", None, bands)
}

pub fn driver_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "PNG",
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::Gif => "GIF",
        _ => "Image",
    }
}

fn channel_samples(img: &DynamicImage) -> Vec<f64> {
    match img {
        DynamicImage::ImageLuma16(buf) => buf.as_raw().iter().map(|&v| f64::from(v)).collect(),
        DynamicImage::ImageLumaA16(buf) => buf.as_raw().iter().map(|&v| f64::from(v)).collect(),
        DynamicImage::ImageRgb16(buf) => buf.as_raw().iter().map(|&v| f64::from(v)).collect(),
        DynamicImage::ImageRgba16(buf) => buf.as_raw().iter().map(|&v| f64::from(v)).collect(),
        DynamicImage::ImageRgb32F(buf) => buf.as_raw().iter().map(|&v| f64::from(v)).collect(),
        DynamicImage::ImageRgba32F(buf) => buf.as_raw().iter().map(|&v| f64::from(v)).collect(),
        // 8-bit layouts: raw bytes are the samples
        other => other.as_bytes().iter().map(|&v| f64::from(v)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), format).unwrap();
        out
    }

    #[test]
    fn test_decode_gray_png() {
        let mut gray = GrayImage::new(2, 2);
        gray.put_pixel(0, 0, Luma([10]));
        gray.put_pixel(1, 0, Luma([20]));
        gray.put_pixel(0, 1, Luma([30]));
        gray.put_pixel(1, 1, Luma([40]));
        let bytes = encode(DynamicImage::ImageLuma8(gray), ImageFormat::Png);

        let ds = decode(&bytes, ImageFormat::Png).unwrap();
        assert_eq!(ds.driver, "PNG");
        assert_eq!(ds.band_count(), 1);
        assert_eq!(ds.band(1).unwrap(), &vec![vec![10.0, 20.0], vec![30.0, 40.0]]);
        assert!(ds.metadata().origin.is_none());
    }

    #[test]
    fn test_decode_rgba_png_has_four_bands() {
        let mut rgba = RgbaImage::new(3, 1);
        rgba.put_pixel(2, 0, Rgba([1, 2, 3, 255]));
        let bytes = encode(DynamicImage::ImageRgba8(rgba), ImageFormat::Png);

        let ds = decode(&bytes, ImageFormat::Png).unwrap();
        assert_eq!(ds.band_count(), 4);
        assert_eq!(ds.band(1).unwrap()[0], vec![0.0, 0.0, 1.0]);
        assert_eq!(ds.band(4).unwrap()[0], vec![0.0, 0.0, 255.0]);
    }

    #[test]
    fn test_decode_gif_yields_rgba_bands() {
        let mut rgba = RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        rgba.put_pixel(1, 0, Rgba([0, 0, 255, 255]));
        let bytes = encode(DynamicImage::ImageRgba8(rgba), ImageFormat::Gif);

        let ds = decode(&bytes, ImageFormat::Gif).unwrap();
        assert_eq!(ds.driver, "GIF");
        assert_eq!(ds.band_count(), 4);
        assert_eq!((ds.width, ds.height), (2, 1));
    }

    #[test]
    fn test_corrupt_png_is_error() {
        let mut bytes = encode(
            DynamicImage::ImageLuma8(GrayImage::new(4, 4)),
            ImageFormat::Png,
        );
        bytes.truncate(20);
        assert!(decode(&bytes, ImageFormat::Png).is_err());
    }
}
