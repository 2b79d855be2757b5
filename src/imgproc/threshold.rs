use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;
use kornia::imgproc;
use log::debug;

use super::{CpuAllocator, CpuImage, from_kornia_gray, to_kornia_gray};
use crate::error::{FunsetError, Result, ensure_nonzero};

const OTSU_FLAG: i32 = 8;
const TRIANGLE_FLAG: i32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdType {
    /// `maxval` above the threshold, 0 otherwise.
    Binary,
    BinaryInv,
    /// Values above the threshold are clipped to it.
    Trunc,
    /// Values at or below the threshold become 0.
    ToZero,
    ToZeroInv,
}

impl ThresholdType {
    /// Splits an integer type code into its base type and whether the Otsu flag is set.
    pub fn from_code(code: i32) -> Result<(Self, bool)> {
        if code & TRIANGLE_FLAG != 0 {
            return Err(FunsetError::InvalidArgument(
                "triangle thresholding is not supported".into(),
            ));
        }
        let kind = match code & 7 {
            0 => ThresholdType::Binary,
            1 => ThresholdType::BinaryInv,
            2 => ThresholdType::Trunc,
            3 => ThresholdType::ToZero,
            4 => ThresholdType::ToZeroInv,
            other => {
                return Err(FunsetError::InvalidArgument(format!(
                    "unknown threshold type {other}"
                )));
            }
        };
        Ok((kind, code & OTSU_FLAG != 0))
    }
}

fn saturate(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn binary_with_kornia(src: &GrayImage, thresh: u8, maxval: u8) -> Result<GrayImage> {
    let gray = to_kornia_gray(src)?;
    let mut binary = CpuImage::<u8, 1>::from_size_val(gray.size(), 0u8, CpuAllocator)?;
    imgproc::threshold::threshold_binary(&gray, &mut binary, thresh, maxval)?;
    from_kornia_gray(&binary)
}

/// Applies a fixed-level threshold, or an Otsu-chosen one when `otsu` is set.
///
/// Returns the threshold actually used together with the result.
pub fn threshold(
    src: &GrayImage,
    thresh: f64,
    maxval: f64,
    kind: ThresholdType,
    otsu: bool,
) -> Result<(f64, GrayImage)> {
    ensure_nonzero(src.width(), src.height())?;
    let thresh = if otsu {
        let level = otsu_level(src) as f64;
        debug!("otsu picked threshold {level}");
        level
    } else {
        thresh.floor()
    };
    let max = saturate(maxval);

    // Everything in 0..=255 is above a negative threshold and nothing is above 255.
    let out = match kind {
        ThresholdType::Binary if (0.0..255.0).contains(&thresh) => {
            binary_with_kornia(src, thresh as u8, max)?
        }
        _ => {
            let above = |v: u8| v as f64 > thresh;
            let t = saturate(thresh);
            GrayImage::from_fn(src.width(), src.height(), |x, y| {
                let v = src.get_pixel(x, y)[0];
                Luma([match kind {
                    ThresholdType::Binary => if above(v) { max } else { 0 },
                    ThresholdType::BinaryInv => if above(v) { 0 } else { max },
                    ThresholdType::Trunc => if above(v) { t } else { v },
                    ThresholdType::ToZero => if above(v) { v } else { 0 },
                    ThresholdType::ToZeroInv => if above(v) { 0 } else { v },
                }])
            })
        }
    };
    Ok((thresh, out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> GrayImage {
        GrayImage::from_fn(16, 16, |x, y| Luma([(y * 16 + x) as u8]))
    }

    #[test]
    fn decodes_type_codes() {
        assert_eq!(ThresholdType::from_code(8).unwrap(), (ThresholdType::Binary, true));
        assert_eq!(ThresholdType::from_code(2).unwrap(), (ThresholdType::Trunc, false));
        assert!(ThresholdType::from_code(5).is_err());
        assert!(ThresholdType::from_code(16).is_err());
    }

    #[test]
    fn binary_is_strictly_greater() {
        let (t, out) = threshold(&ramp(), 128.0, 255.0, ThresholdType::Binary, false).unwrap();
        assert_eq!(t, 128.0);
        assert_eq!(out.get_pixel(0, 8)[0], 0); // value 128
        assert_eq!(out.get_pixel(1, 8)[0], 255); // value 129
    }

    #[test]
    fn other_types() {
        let img = ramp();
        let (_, trunc) = threshold(&img, 100.0, 255.0, ThresholdType::Trunc, false).unwrap();
        assert_eq!(trunc.get_pixel(15, 15)[0], 100);
        assert_eq!(trunc.get_pixel(3, 0)[0], 3);

        let (_, inv) = threshold(&img, 100.0, 200.0, ThresholdType::BinaryInv, false).unwrap();
        assert_eq!(inv.get_pixel(3, 0)[0], 200);
        assert_eq!(inv.get_pixel(15, 15)[0], 0);

        let (_, tz) = threshold(&img, 100.0, 255.0, ThresholdType::ToZero, false).unwrap();
        assert_eq!(tz.get_pixel(15, 15)[0], 255);
        assert_eq!(tz.get_pixel(4, 6)[0], 0);

        let (_, all) = threshold(&img, -1.0, 255.0, ThresholdType::Binary, false).unwrap();
        assert!(all.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn otsu_splits_two_levels() {
        let img = GrayImage::from_fn(10, 10, |x, _| Luma([if x < 5 { 20 } else { 220 }]));
        let (t, out) = threshold(&img, 0.0, 255.0, ThresholdType::Binary, true).unwrap();
        assert!((20.0..220.0).contains(&t));
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(9, 9)[0], 255);
    }
}
