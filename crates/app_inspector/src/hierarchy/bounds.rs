//! Geometry normalization for `bounds="[x1,y1][x2,y2]"` attributes

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{DriverError, Result};
use crate::model::{Bounds, WindowSize};

lazy_static! {
    static ref NUMBER: Regex = Regex::new(r"\d+").unwrap();
}

fn scale(value: u32, extent: u32) -> f64 {
    let ratio = (f64::from(value) / f64::from(extent)).clamp(0.0, 1.0);
    (ratio * 10_000.0).round() / 10_000.0
}

/// Convert a device-pixel rectangle into fractions of `size`, rounded to 4 digits.
///
/// Values are clamped to `[0, 1]`, so elements hanging off the display edge
/// stay inside the unit square.
pub fn normalize_bounds(raw: &str, size: WindowSize) -> Result<Bounds> {
    size.validate()?;

    let values = NUMBER
        .find_iter(raw)
        .map(|m| m.as_str().parse::<u32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| DriverError::MalformedGeometry(format!("{:?}: {}", raw, e)))?;

    let [x1, y1, x2, y2] = values[..] else {
        return Err(DriverError::MalformedGeometry(format!(
            "{:?}: expected 4 integers, found {}",
            raw,
            values.len()
        )));
    };

    Ok(Bounds(
        scale(x1, size.width),
        scale(y1, size.height),
        scale(x2, size.width),
        scale(y2, size.height),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHONE: WindowSize = WindowSize {
        width: 1080,
        height: 2400,
    };

    #[test]
    fn test_normalize_bounds() {
        let bounds = normalize_bounds("[883,2222][1008,2266]", PHONE).unwrap();
        assert_eq!(bounds, Bounds(0.8176, 0.9258, 0.9333, 0.9442));
    }

    #[test]
    fn test_full_screen() {
        let bounds = normalize_bounds("[0,0][1080,2400]", PHONE).unwrap();
        assert_eq!(bounds, Bounds(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn test_scales_back_within_one_pixel() {
        let samples = [
            "[0,0][1,1]",
            "[13,77][540,1201]",
            "[999,1999][1079,2399]",
            "[333,666][667,1333]",
        ];
        for raw in samples {
            let b = normalize_bounds(raw, PHONE).unwrap();
            let numbers: Vec<f64> = NUMBER
                .find_iter(raw)
                .map(|m| m.as_str().parse().unwrap())
                .collect();
            let scaled = [b.0 * 1080.0, b.1 * 2400.0, b.2 * 1080.0, b.3 * 2400.0];
            for (orig, back) in numbers.iter().zip(scaled) {
                assert!((orig - back).abs() <= 1.0, "{}: {} vs {}", raw, orig, back);
            }
            for v in [b.0, b.1, b.2, b.3] {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_offscreen_is_clamped() {
        let bounds = normalize_bounds("[1000,2300][1200,2600]", PHONE).unwrap();
        assert_eq!(bounds.2, 1.0);
        assert_eq!(bounds.3, 1.0);
    }

    #[test]
    fn test_three_integers_is_malformed() {
        let err = normalize_bounds("[1,2][3]", PHONE).unwrap_err();
        assert!(matches!(err, DriverError::MalformedGeometry(_)));
    }

    #[test]
    fn test_five_integers_is_malformed() {
        let err = normalize_bounds("[1,2][3,4][5]", PHONE).unwrap_err();
        assert!(matches!(err, DriverError::MalformedGeometry(_)));
    }

    #[test]
    fn test_overflowing_integer_is_malformed() {
        let err = normalize_bounds("[1,2][3,99999999999]", PHONE).unwrap_err();
        assert!(matches!(err, DriverError::MalformedGeometry(_)));
    }

    #[test]
    fn test_zero_window_is_rejected() {
        let size = WindowSize {
            width: 0,
            height: 2400,
        };
        let err = normalize_bounds("[0,0][10,10]", size).unwrap_err();
        assert!(matches!(err, DriverError::InvalidWindowSize { .. }));
    }
}
