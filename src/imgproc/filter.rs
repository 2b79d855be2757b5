use image::{GrayImage, ImageBuffer, Pixel};
use rayon::prelude::*;

use super::Border;
use crate::error::{FunsetError, Result, ensure_nonzero};

type Buf<P> = ImageBuffer<P, Vec<u8>>;

/// A dense correlation kernel stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel2D {
    pub width: u32,
    pub height: u32,
    data: Vec<f32>,
}

impl Kernel2D {
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        ensure_nonzero(width, height)?;
        if data.len() != (width * height) as usize {
            return Err(FunsetError::DimensionMismatch(format!(
                "{width}x{height} kernel needs {} weights, got {}",
                width * height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn sharpen() -> Self {
        Self {
            width: 3,
            height: 3,
            data: vec![0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0],
        }
    }

    pub fn laplacian() -> Self {
        Self {
            width: 3,
            height: 3,
            data: vec![0.0, 1.0, 0.0, 1.0, -4.0, 1.0, 0.0, 1.0, 0.0],
        }
    }

    pub fn weight(&self, x: u32, y: u32) -> f32 {
        self.data[(y * self.width + x) as usize]
    }
}

/// Correlates every channel of `src` with `kernel`, saturating to `u8`.
///
/// `anchor` defaults to the kernel center.
pub fn filter2d<P>(
    src: &Buf<P>,
    kernel: &Kernel2D,
    anchor: Option<(u32, u32)>,
    border: Border,
) -> Result<Buf<P>>
where
    P: Pixel<Subpixel = u8>,
{
    ensure_nonzero(src.width(), src.height())?;
    let (ax, ay) = anchor.unwrap_or((kernel.width / 2, kernel.height / 2));
    if ax >= kernel.width || ay >= kernel.height {
        return Err(FunsetError::InvalidArgument(format!(
            "anchor ({ax}, {ay}) outside a {}x{} kernel",
            kernel.width, kernel.height
        )));
    }

    let taps: Vec<(isize, isize, f32)> = (0..kernel.height)
        .flat_map(|ky| (0..kernel.width).map(move |kx| (kx, ky)))
        .map(|(kx, ky)| (kx as isize - ax as isize, ky as isize - ay as isize, kernel.weight(kx, ky)))
        .filter(|&(_, _, w)| w != 0.0)
        .collect();

    let (w, h) = (src.width() as usize, src.height() as usize);
    let channels = P::CHANNEL_COUNT as usize;
    let raw = src.as_raw();
    let fill = border.constant_value() as f32;
    let mut dst = Buf::<P>::new(src.width(), src.height());

    let rows: &mut [u8] = &mut dst;
    rows.par_chunks_mut(w * channels)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(channels).enumerate() {
                for (ch, out) in px.iter_mut().enumerate() {
                    let mut acc = 0.0f32;
                    for &(dx, dy, weight) in &taps {
                        let sx = border.map(x as isize + dx, w);
                        let sy = border.map(y as isize + dy, h);
                        let v = match (sx, sy) {
                            (Some(sx), Some(sy)) => raw[(sy * w + sx) * channels + ch] as f32,
                            _ => fill,
                        };
                        acc += weight * v;
                    }
                    *out = acc.round().clamp(0.0, 255.0) as u8;
                }
            }
        });
    Ok(dst)
}

/// Aperture-1 Laplacian with negative responses clipped to 0.
pub fn laplacian(src: &GrayImage) -> Result<GrayImage> {
    filter2d(src, &Kernel2D::laplacian(), None, Border::Reflect101)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    #[test]
    fn kernel_size_is_checked() {
        assert!(Kernel2D::new(3, 3, vec![0.0; 8]).is_err());
        assert!(Kernel2D::new(0, 3, vec![]).is_err());
        assert_eq!(Kernel2D::new(1, 2, vec![1.0, 2.0]).unwrap().weight(0, 1), 2.0);
    }

    #[test]
    fn sharpen_leaves_flat_regions() {
        let img = RgbImage::from_pixel(6, 5, Rgb([10, 100, 250]));
        let out = filter2d(&img, &Kernel2D::sharpen(), None, Border::default()).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn sharpen_boosts_a_peak() {
        let mut img = GrayImage::from_pixel(5, 5, Luma([50]));
        img.put_pixel(2, 2, Luma([100]));
        let out = filter2d(&img, &Kernel2D::sharpen(), None, Border::Reflect101).unwrap();
        assert_eq!(out.get_pixel(2, 2)[0], 255); // 5*100 - 4*50 saturates
        assert_eq!(out.get_pixel(2, 1)[0], 0); // 5*50 - 100 - 3*50
    }

    #[test]
    fn shifted_anchor_translates() {
        let mut img = GrayImage::new(4, 4);
        img.put_pixel(1, 1, Luma([77]));
        let k = Kernel2D::new(2, 1, vec![0.0, 1.0]).unwrap();
        let out = filter2d(&img, &k, Some((0, 0)), Border::Constant(0)).unwrap();
        assert_eq!(out.get_pixel(0, 1)[0], 77);
        assert!(filter2d(&img, &k, Some((2, 0)), Border::Constant(0)).is_err());
    }

    #[test]
    fn laplacian_of_a_dot() {
        let mut img = GrayImage::new(5, 5);
        img.put_pixel(2, 2, Luma([10]));
        let out = laplacian(&img).unwrap();
        assert_eq!(out.get_pixel(2, 2)[0], 0);
        assert_eq!(out.get_pixel(2, 1)[0], 10);
        assert_eq!(out.get_pixel(1, 1)[0], 0);
    }
}
