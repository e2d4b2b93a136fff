//! ESRI ASCII grid (`AAIGrid`).
//!
//! ```text
//! ncols        2
//! nrows        2
//! xllcorner    100.0
//! yllcorner    200.0
//! cellsize     10.0
//! NODATA_value -9999
//! 1 2
//! 3 4
//! ```
//!
//! Either `cellsize` or a `dx`/`dy` pair is accepted, and the lower-left
//! reference may be a corner or a cell centre.

use super::{DecodeError, RasterDataset};
use crate::models::{BandData, GeoTransform};

const HEADER_KEYS: [&str; 10] = [
    "ncols",
    "nrows",
    "xllcorner",
    "yllcorner",
    "xllcenter",
    "yllcenter",
    "cellsize",
    "dx",
    "dy",
    "nodata_value",
];

/// True when the first token is an ASCII grid header keyword.
pub fn looks_like(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(256)];
    let text = match std::str::from_utf8(head) {
        Ok(text) => text,
        // The window may cut a multi-byte character
        Err(e) => std::str::from_utf8(&head[..e.valid_up_to()]).unwrap_or(""),
    };

    text.split_whitespace()
        .next()
        .map(|token| {
            let token = token.to_lowercase();
            token == "ncols" || token == "nrows"
        })
        .unwrap_or(false)
}

#[derive(Debug, Default)]
struct Header {
    ncols: Option<usize>,
    nrows: Option<usize>,
    xll: Option<(f64, bool)>, // (value, is_center)
    yll: Option<(f64, bool)>,
    cellsize: Option<f64>,
    dx: Option<f64>,
    dy: Option<f64>,
}

pub fn decode(bytes: &[u8]) -> Result<RasterDataset, DecodeError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| DecodeError::Malformed(format!("ASCII grid is not UTF-8: {}", e)))?;

    let mut tokens = text.split_whitespace().peekable();
    let mut header = Header::default();

    while let Some(key) = tokens.peek().map(|t| t.to_lowercase()) {
        if !HEADER_KEYS.contains(&key.as_str()) {
            break;
        }
        tokens.next();
        let value = tokens
            .next()
            .ok_or_else(|| DecodeError::Malformed(format!("header '{}' has no value", key)))?;

        match key.as_str() {
            "ncols" => header.ncols = Some(parse_count(&key, value)?),
            "nrows" => header.nrows = Some(parse_count(&key, value)?),
            "xllcorner" => header.xll = Some((parse_number(&key, value)?, false)),
            "xllcenter" => header.xll = Some((parse_number(&key, value)?, true)),
            "yllcorner" => header.yll = Some((parse_number(&key, value)?, false)),
            "yllcenter" => header.yll = Some((parse_number(&key, value)?, true)),
            "cellsize" => header.cellsize = Some(parse_number(&key, value)?),
            "dx" => header.dx = Some(parse_number(&key, value)?),
            "dy" => header.dy = Some(parse_number(&key, value)?),
            // Nodata cells are returned as stored
            _ => {}
        }
    }

    let width = header.ncols.ok_or_else(|| missing("ncols"))?;
    let height = header.nrows.ok_or_else(|| missing("nrows"))?;
    if width == 0 || height == 0 {
        return Err(DecodeError::Malformed(format!("empty grid {}x{}", width, height)));
    }
    let (xll, x_center) = header.xll.ok_or_else(|| missing("xllcorner"))?;
    let (yll, y_center) = header.yll.ok_or_else(|| missing("yllcorner"))?;
    let (dx, dy) = match (header.cellsize, header.dx, header.dy) {
        (Some(cs), _, _) => (cs, cs),
        (None, Some(dx), Some(dy)) => (dx, dy),
        _ => return Err(missing("cellsize")),
    };

    let expected = width
        .checked_mul(height)
        .ok_or_else(|| DecodeError::Malformed("grid dimensions overflow".to_string()))?;
    let values = tokens
        .map(|t| parse_number("cell", t))
        .collect::<Result<Vec<f64>, _>>()?;
    if values.len() != expected {
        return Err(DecodeError::Malformed(format!(
            "expected {} cells, found {}",
            expected,
            values.len()
        )));
    }

    let left = if x_center { xll - 0.5 * dx } else { xll };
    let bottom = if y_center { yll - 0.5 * dy } else { yll };
    let top = bottom + height as f64 * dy;
    let geo_transform = GeoTransform([left, dx, 0.0, top, 0.0, -dy]);

    let band: BandData = values.chunks(width).map(<[f64]>::to_vec).collect();
    RasterDataset::new("AAIGrid", width, height, "", Some(geo_transform), vec![band])
}

fn missing(key: &str) -> DecodeError {
    DecodeError::Malformed(format!("ASCII grid header lacks '{}'", key))
}

fn parse_count(key: &str, value: &str) -> Result<usize, DecodeError> {
    value
        .parse()
        .map_err(|_| DecodeError::Malformed(format!("invalid {} '{}'", key, value)))
}

fn parse_number(key: &str, value: &str) -> Result<f64, DecodeError> {
    value
        .parse()
        .map_err(|_| DecodeError::Malformed(format!("invalid {} '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: &str = "ncols 3\nnrows 2\nxllcorner 100\nyllcorner 200\ncellsize 10\nNODATA_value -9999\n1 2 3\n4 -9999 6.5\n";

    #[test]
    fn test_looks_like() {
        assert!(looks_like(GRID.as_bytes()));
        assert!(looks_like(b"  NROWS 1\nNCOLS 1"));
        assert!(!looks_like(b"hello world"));
        assert!(!looks_like(b"\x89PNG\r\n"));
    }

    #[test]
    fn test_decode_corner_grid() {
        let ds = decode(GRID.as_bytes()).unwrap();
        assert_eq!(ds.driver, "AAIGrid");
        assert_eq!((ds.width, ds.height, ds.band_count()), (3, 2, 1));
        assert_eq!(
            ds.band(1).unwrap(),
            &vec![vec![1.0, 2.0, 3.0], vec![4.0, -9999.0, 6.5]]
        );

        let meta = ds.metadata();
        assert_eq!(meta.origin, Some([100.0, 220.0]));
        assert_eq!(meta.pixel_size, Some([10.0, -10.0]));
    }

    #[test]
    fn test_decode_center_reference_with_dx_dy() {
        let grid = "ncols 1\nnrows 1\nxllcenter 5\nyllcenter 5\ndx 2\ndy 4\n7\n";
        let meta = decode(grid.as_bytes()).unwrap().metadata();
        assert_eq!(meta.origin, Some([4.0, 7.0]));
        assert_eq!(meta.pixel_size, Some([2.0, -4.0]));
    }

    #[test]
    fn test_cell_count_mismatch() {
        let grid = "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2 3\n";
        assert!(matches!(decode(grid.as_bytes()), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_missing_cellsize() {
        let grid = "ncols 1\nnrows 1\nxllcorner 0\nyllcorner 0\n1\n";
        assert!(decode(grid.as_bytes()).is_err());
    }
}
