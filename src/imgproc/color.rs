use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use kornia::imgproc;
use palette::{FromColor, Hsv, Lab, Srgb};

use super::{CpuAllocator, CpuImage, from_kornia_gray, to_kornia_rgb};
use crate::error::{FunsetError, Result, ensure_nonzero};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorConversion {
    RgbToGray,
    GrayToRgb,
    /// Planar 4:2:0: a full-size Y plane followed by quarter-size U and V planes.
    RgbToYuvI420,
    RgbToYCrCb,
    RgbToHsv,
    RgbToLab,
}

/// Luma of an RGB image, computed by kornia.
pub fn to_gray(rgb: &RgbImage) -> Result<GrayImage> {
    let image = to_kornia_rgb(rgb)?;
    let mut gray = CpuImage::<u8, 1>::from_size_val(image.size(), 0u8, CpuAllocator)?;
    imgproc::color::gray_from_rgb_u8(&image, &mut gray)?;
    from_kornia_gray(&gray)
}

pub fn gray_to_rgb(gray: &GrayImage) -> RgbImage {
    RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y)[0];
        Rgb([v, v, v])
    })
}

fn saturate(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// BT.601 limited-range I420. Both dimensions must be even.
pub fn rgb_to_yuv_i420(rgb: &RgbImage) -> Result<GrayImage> {
    let (w, h) = rgb.dimensions();
    ensure_nonzero(w, h)?;
    if w % 2 != 0 || h % 2 != 0 {
        return Err(FunsetError::DimensionMismatch(format!(
            "I420 needs even dimensions, got {w}x{h}"
        )));
    }

    let (wu, hu) = (w as usize, h as usize);
    let chroma_w = wu / 2;
    let chroma_len = chroma_w * (hu / 2);
    let mut out = vec![0u8; wu * hu + 2 * chroma_len];

    for (x, y, px) in rgb.enumerate_pixels() {
        let [r, g, b] = px.0.map(i32::from);
        let luma = ((66 * r + 129 * g + 25 * b + 128) >> 8) + 16;
        out[y as usize * wu + x as usize] = luma.clamp(0, 255) as u8;
    }

    let (u_plane, v_plane) = out[wu * hu..].split_at_mut(chroma_len);
    for cy in 0..hu / 2 {
        for cx in 0..chroma_w {
            let mut sum = [0i32; 3];
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let px = rgb.get_pixel((2 * cx + dx) as u32, (2 * cy + dy) as u32);
                for ch in 0..3 {
                    sum[ch] += px[ch] as i32;
                }
            }
            let [r, g, b] = sum.map(|s| (s + 2) / 4);
            let u = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;
            let v = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;
            u_plane[cy * chroma_w + cx] = u.clamp(0, 255) as u8;
            v_plane[cy * chroma_w + cx] = v.clamp(0, 255) as u8;
        }
    }

    GrayImage::from_raw(w, h * 3 / 2, out)
        .ok_or_else(|| FunsetError::DimensionMismatch("I420 buffer size".into()))
}

/// Channels are stored as Y, Cr, Cb.
pub fn rgb_to_ycrcb(rgb: &RgbImage) -> RgbImage {
    RgbImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0.map(f32::from);
        let luma = 0.299 * r + 0.587 * g + 0.114 * b;
        Rgb([
            saturate(luma),
            saturate((r - luma) * 0.713 + 128.0),
            saturate((b - luma) * 0.564 + 128.0),
        ])
    })
}

fn to_srgb(px: &Rgb<u8>) -> Srgb<f32> {
    Srgb::new(
        px[0] as f32 / 255.0,
        px[1] as f32 / 255.0,
        px[2] as f32 / 255.0,
    )
}

/// Hue is stored as degrees / 2 so it fits a byte; S and V are scaled to 0..=255.
pub fn rgb_to_hsv(rgb: &RgbImage) -> RgbImage {
    RgbImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let hsv: Hsv = Hsv::from_color(to_srgb(rgb.get_pixel(x, y)));
        let hue = hsv.hue.into_positive_degrees();
        Rgb([
            saturate(hue / 2.0).min(179),
            saturate(hsv.saturation * 255.0),
            saturate(hsv.value * 255.0),
        ])
    })
}

/// L is scaled to 0..=255; a and b are offset by 128.
pub fn rgb_to_lab(rgb: &RgbImage) -> RgbImage {
    RgbImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let lab: Lab = Lab::from_color(to_srgb(rgb.get_pixel(x, y)));
        Rgb([
            saturate(lab.l * 255.0 / 100.0),
            saturate(lab.a + 128.0),
            saturate(lab.b + 128.0),
        ])
    })
}

pub fn cvt_color(src: &DynamicImage, code: ColorConversion) -> Result<DynamicImage> {
    ensure_nonzero(src.width(), src.height())?;
    let out = match code {
        ColorConversion::RgbToGray => DynamicImage::ImageLuma8(to_gray(&src.to_rgb8())?),
        ColorConversion::GrayToRgb => DynamicImage::ImageRgb8(gray_to_rgb(&src.to_luma8())),
        ColorConversion::RgbToYuvI420 => {
            DynamicImage::ImageLuma8(rgb_to_yuv_i420(&src.to_rgb8())?)
        }
        ColorConversion::RgbToYCrCb => DynamicImage::ImageRgb8(rgb_to_ycrcb(&src.to_rgb8())),
        ColorConversion::RgbToHsv => DynamicImage::ImageRgb8(rgb_to_hsv(&src.to_rgb8())),
        ColorConversion::RgbToLab => DynamicImage::ImageRgb8(rgb_to_lab(&src.to_rgb8())),
    };
    Ok(out)
}

/// Separates an RGB image into its three planes.
pub fn split(rgb: &RgbImage) -> [GrayImage; 3] {
    std::array::from_fn(|ch| {
        GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
            Luma([rgb.get_pixel(x, y)[ch]])
        })
    })
}

/// Interleaves exactly three equally sized planes into an RGB image.
pub fn merge(planes: &[GrayImage]) -> Result<RgbImage> {
    let [a, b, c] = planes else {
        return Err(FunsetError::InvalidArgument(format!(
            "merge needs 3 planes, got {}",
            planes.len()
        )));
    };
    if a.dimensions() != b.dimensions() || a.dimensions() != c.dimensions() {
        return Err(FunsetError::DimensionMismatch(format!(
            "plane sizes differ: {:?}, {:?}, {:?}",
            a.dimensions(),
            b.dimensions(),
            c.dimensions()
        )));
    }
    Ok(RgbImage::from_fn(a.width(), a.height(), |x, y| {
        Rgb([
            a.get_pixel(x, y)[0],
            b.get_pixel(x, y)[0],
            c.get_pixel(x, y)[0],
        ])
    }))
}
