//! Discrete Fourier transform of gray images and its log-magnitude view.

use image::{GrayImage, Luma};
use log::debug;
use num_complex::Complex32;
use rustfft::{FftPlanner, num_traits::Zero};

use super::Border;
use crate::error::{FunsetError, Result, ensure_nonzero};

/// Smallest size `>= n` whose only prime factors are 2, 3 and 5.
pub fn optimal_dft_size(n: usize) -> usize {
    let mut candidate = n.max(1);
    loop {
        let mut rest = candidate;
        for p in [2, 3, 5] {
            while rest % p == 0 {
                rest /= p;
            }
        }
        if rest == 1 {
            return candidate;
        }
        candidate += 1;
    }
}

/// Pads `src` on each side, filling the new pixels according to `border`.
pub fn copy_make_border(
    src: &GrayImage,
    top: u32,
    bottom: u32,
    left: u32,
    right: u32,
    border: Border,
) -> Result<GrayImage> {
    ensure_nonzero(src.width(), src.height())?;
    let (w, h) = (src.width() as usize, src.height() as usize);
    let fill = border.constant_value();
    Ok(GrayImage::from_fn(
        src.width() + left + right,
        src.height() + top + bottom,
        |x, y| {
            let sx = border.map(x as isize - left as isize, w);
            let sy = border.map(y as isize - top as isize, h);
            match (sx, sy) {
                (Some(sx), Some(sy)) => *src.get_pixel(sx as u32, sy as u32),
                _ => Luma([fill]),
            }
        },
    ))
}

/// Forward, unnormalised 2-D DFT of a row-major `width x height` grid.
pub fn dft2d(data: &[Complex32], width: usize, height: usize) -> Result<Vec<Complex32>> {
    if width == 0 || height == 0 || data.len() != width * height {
        return Err(FunsetError::DimensionMismatch(format!(
            "{} samples do not form a {width}x{height} grid",
            data.len()
        )));
    }
    let mut planner = FftPlanner::<f32>::new();
    let mut out = data.to_vec();

    let row_fft = planner.plan_fft_forward(width);
    for row in out.chunks_exact_mut(width) {
        row_fft.process(row);
    }

    let col_fft = planner.plan_fft_forward(height);
    let mut column = vec![Complex32::zero(); height];
    for x in 0..width {
        for (y, c) in column.iter_mut().enumerate() {
            *c = out[y * width + x];
        }
        col_fft.process(&mut column);
        for (y, c) in column.iter().enumerate() {
            out[y * width + x] = *c;
        }
    }
    Ok(out)
}

/// A real-valued plane, typically a spectrum scaled to `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl Spectrum {
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Swaps diagonal quadrants so the zero frequency lands in the center.
    /// Both dimensions must be even.
    fn shift_quadrants(&mut self) {
        let (cx, cy) = (self.width / 2, self.height / 2);
        for y in 0..cy {
            for x in 0..self.width {
                let nx = (x + cx) % self.width;
                self.data.swap(y * self.width + x, (y + cy) * self.width + nx);
            }
        }
    }

    fn normalize_min_max(&mut self) {
        let (min, max) = self
            .data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let range = max - min;
        for v in &mut self.data {
            *v = if range > 0.0 { (*v - min) / range } else { 0.0 };
        }
    }

    /// Maps `[0, 1]` onto `0..=255`.
    pub fn to_gray_image(&self) -> Result<GrayImage> {
        let bytes = self
            .data
            .iter()
            .map(|v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
            .collect();
        GrayImage::from_raw(self.width as u32, self.height as u32, bytes).ok_or_else(|| {
            FunsetError::DimensionMismatch(format!(
                "spectrum buffer does not fit {}x{}",
                self.width, self.height
            ))
        })
    }
}

/// Centered `log(1 + |F|)` spectrum of `src`, min-max scaled to `[0, 1]`.
///
/// The image is zero-padded to optimal DFT sizes first, and the result is
/// cropped to even dimensions.
pub fn magnitude_spectrum(src: &GrayImage) -> Result<Spectrum> {
    ensure_nonzero(src.width(), src.height())?;
    let rows = optimal_dft_size(src.height() as usize);
    let cols = optimal_dft_size(src.width() as usize);
    debug!(
        "dft: padding {}x{} to {cols}x{rows}",
        src.width(),
        src.height()
    );
    let padded = copy_make_border(
        src,
        0,
        rows as u32 - src.height(),
        0,
        cols as u32 - src.width(),
        Border::Constant(0),
    )?;

    let input: Vec<Complex32> = padded
        .as_raw()
        .iter()
        .map(|&v| Complex32::new(v as f32, 0.0))
        .collect();
    let freq = dft2d(&input, cols, rows)?;

    let (width, height) = (cols & !1, rows & !1);
    if width == 0 || height == 0 {
        return Err(FunsetError::DimensionMismatch(format!(
            "spectrum of a {cols}x{rows} image is empty after cropping"
        )));
    }
    let mut spectrum = Spectrum {
        width,
        height,
        data: (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| (1.0 + freq[y * cols + x].norm()).ln())
            .collect(),
    };
    spectrum.shift_quadrants();
    spectrum.normalize_min_max();
    Ok(spectrum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimal_sizes() {
        assert_eq!(optimal_dft_size(480), 480);
        assert_eq!(optimal_dft_size(7), 8);
        assert_eq!(optimal_dft_size(641), 648);
        assert_eq!(optimal_dft_size(97), 100);
        assert_eq!(optimal_dft_size(0), 1);
    }

    #[test]
    fn border_padding() {
        let img = GrayImage::from_fn(3, 2, |x, y| Luma([(10 * y + x) as u8 + 1]));
        let out = copy_make_border(&img, 1, 0, 0, 2, Border::Constant(0)).unwrap();
        assert_eq!(out.dimensions(), (5, 3));
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(0, 1)[0], 1);
        assert_eq!(out.get_pixel(4, 2)[0], 0);

        let rep = copy_make_border(&img, 0, 0, 2, 0, Border::Replicate).unwrap();
        assert_eq!(rep.get_pixel(0, 1)[0], 11);
    }

    #[test]
    fn dft_of_a_constant_is_a_single_peak() {
        let data = vec![Complex32::new(2.0, 0.0); 4 * 3];
        let out = dft2d(&data, 4, 3).unwrap();
        assert!((out[0].re - 24.0).abs() < 1e-4);
        assert!(out[1..].iter().all(|c| c.norm() < 1e-4));
        assert!(dft2d(&data, 5, 3).is_err());
    }

    #[test]
    fn spectrum_is_centered_and_normalised() {
        let img = GrayImage::from_pixel(8, 6, Luma([100]));
        let s = magnitude_spectrum(&img).unwrap();
        assert_eq!((s.width, s.height), (8, 6));
        assert_eq!(s.get(4, 3), 1.0);
        assert!(s.get(0, 0) < 1e-3);
        let gray = s.to_gray_image().unwrap();
        assert_eq!(gray.get_pixel(4, 3)[0], 255);
    }

    #[test]
    fn odd_padded_sizes_are_cropped() {
        let img = GrayImage::from_pixel(5, 9, Luma([7]));
        let s = magnitude_spectrum(&img).unwrap();
        // 5 and 9 are already optimal, then cropped to even.
        assert_eq!((s.width, s.height), (4, 8));
    }
}
