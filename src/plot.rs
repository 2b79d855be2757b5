use image::{Rgb, RgbImage};
use plotters::prelude::*;

use crate::error::{FunsetError, Result, ensure_nonzero};

/// One color per cluster index, reused cyclically.
pub const CLUSTER_COLORS: [Rgb<u8>; 5] = [
    Rgb([255, 0, 0]),
    Rgb([0, 255, 0]),
    Rgb([100, 100, 255]),
    Rgb([255, 0, 255]),
    Rgb([255, 255, 0]),
];

fn to_plotters(c: Rgb<u8>) -> RGBColor {
    RGBColor(c[0], c[1], c[2])
}

fn plot_err(e: impl std::fmt::Display) -> FunsetError {
    FunsetError::Plot(e.to_string())
}

/// Renders labelled 2-D points as small filled dots on a black canvas.
///
/// Point coordinates are pixel positions; points outside the canvas are
/// clipped by the backend.
pub fn render_clusters(
    width: u32,
    height: u32,
    points: &[[f64; 2]],
    labels: &[usize],
    palette: &[Rgb<u8>],
) -> Result<RgbImage> {
    ensure_nonzero(width, height)?;
    if points.len() != labels.len() {
        return Err(FunsetError::DimensionMismatch(format!(
            "{} points but {} labels",
            points.len(),
            labels.len()
        )));
    }
    if palette.is_empty() {
        return Err(FunsetError::InvalidArgument("empty cluster palette".into()));
    }

    let pixel_count = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| plot_err("width*height overflow"))?;
    let mut rgb = vec![0u8; pixel_count * 3];

    {
        let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
        root.fill(&BLACK).map_err(plot_err)?;

        for (p, &label) in points.iter().zip(labels) {
            let color = to_plotters(palette[label % palette.len()]);
            let center = (p[0].round() as i32, p[1].round() as i32);
            root.draw(&Circle::new(center, 2, color.filled()))
                .map_err(plot_err)?;
        }

        root.present().map_err(plot_err)?;
    }

    RgbImage::from_raw(width, height, rgb).ok_or_else(|| plot_err("bitmap size mismatch"))
}
