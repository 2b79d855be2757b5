//! Geometric transforms on the portrait image.

use image::{DynamicImage, GrayImage};
use nalgebra::{DMatrix, Point2};

use super::{DemoContext, DemoReport};
use crate::error::Result;
use crate::fixtures::LENA;
use crate::imgproc::geometry::{
    self, RemapMaps, RemapPattern, get_affine_transform, get_perspective_transform,
    get_rotation_matrix_2d, warp_affine as warp_affine_with,
    warp_perspective as warp_perspective_with,
};
use crate::imgproc::{Border, FlipCode, Interpolation, to_gray};
use crate::linalg::format_mat;

const ROTATION_DEG: f64 = -50.0;
const ROTATION_SCALE: f64 = 0.6;

fn format_column_major(column_major: &[f64], rows: usize, cols: usize) -> String {
    format_mat(&DMatrix::from_column_slice(rows, cols, column_major))
}

/// Rotates about the integer center of `src`, keeping its size.
fn rotate_about_center(src: &GrayImage) -> Result<GrayImage> {
    let center = Point2::new((src.width() / 2) as f64, (src.height() / 2) as f64);
    let m = get_rotation_matrix_2d(center, ROTATION_DEG, ROTATION_SCALE);
    warp_affine_with(
        src,
        &m,
        src.width(),
        src.height(),
        Interpolation::Linear,
        Border::Constant(0),
    )
}

pub fn resize(ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("resize");
    let lena = ctx.load_rgb(LENA)?;
    let small = geometry::resize(&lena, 23, 11, Interpolation::Lanczos)?;
    report.line(format!(
        "resized {}x{} to {}x{}",
        lena.width(),
        lena.height(),
        small.width(),
        small.height()
    ));
    ctx.save(&mut report, "resize.png", &DynamicImage::ImageRgb8(small))?;
    Ok(report)
}

/// Warps into a half-size canvas, then rotates the warped result.
pub fn warp_affine(ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("warp_affine");
    let src = to_gray(&ctx.load_rgb(LENA)?)?;
    let (cols, rows) = (src.width() as f64, src.height() as f64);

    let src_tri = [
        Point2::new(0.0, 0.0),
        Point2::new(cols - 1.0, 0.0),
        Point2::new(0.0, rows - 1.0),
    ];
    let dst_tri = [
        Point2::new(cols * 0.0, rows * 0.33),
        Point2::new(cols * 0.85, rows * 0.25),
        Point2::new(cols * 0.15, rows * 0.7),
    ];
    let m = get_affine_transform(src_tri, dst_tri)?;
    let (w, h) = ((src.width() / 2).max(1), (src.height() / 2).max(1));
    let warped = warp_affine_with(&src, &m, w, h, Interpolation::Linear, Border::Constant(0))?;
    let rotated = rotate_about_center(&warped)?;

    report.line(format!("affine matrix: {}", format_column_major(m.as_slice(), 2, 3)));
    ctx.save(&mut report, "warp_affine.png", &DynamicImage::ImageLuma8(warped))?;
    ctx.save(&mut report, "warp_affine_rotate.png", &DynamicImage::ImageLuma8(rotated))?;
    Ok(report)
}

pub fn rotate(ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("rotate");
    let src = to_gray(&ctx.load_rgb(LENA)?)?;
    let rotated = rotate_about_center(&src)?;
    report.line(format!("rotated by {ROTATION_DEG} deg, scale {ROTATION_SCALE}"));
    ctx.save(&mut report, "rotate.png", &DynamicImage::ImageLuma8(rotated))?;
    Ok(report)
}

pub fn warp_perspective(ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("warp_perspective");
    let src = ctx.load_rgb(LENA)?;
    let (cols, rows) = (src.width() as f64, src.height() as f64);
    let (icols, irows) = (src.width() as i64, src.height() as i64);

    let src_quad = [
        Point2::new(0.0, 0.0),
        Point2::new(cols - 5.0, 0.0),
        Point2::new(cols - 10.0, rows - 1.0),
        Point2::new(8.0, rows - 13.0),
    ];
    let dst_quad = [
        Point2::new(17.0, 21.0),
        Point2::new(cols - 23.0, 19.0),
        Point2::new((icols / 2 + 5) as f64, (irows / 3 + 7) as f64),
        Point2::new(55.0, (irows / 5 + 33) as f64),
    ];
    let m = get_perspective_transform(src_quad, dst_quad)?;
    let warped = warp_perspective_with(
        &src,
        &m,
        src.width(),
        src.height(),
        Interpolation::Nearest,
        Border::Constant(0),
    )?;

    report.line(format!("perspective matrix: {}", format_column_major(m.as_slice(), 3, 3)));
    ctx.save(&mut report, "warp_perspective.png", &DynamicImage::ImageRgb8(warped))?;
    Ok(report)
}

/// Applies the cycling map patterns, one output frame per pattern step.
pub fn remap(ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("remap");
    let src = ctx.load_rgb(LENA)?;

    for i in 0..ctx.config.remap_frames {
        let pattern = RemapPattern::from_index(i);
        let maps = RemapMaps::pattern(src.width(), src.height(), pattern);
        let dst = geometry::remap(&src, &maps, Interpolation::Linear, Border::Constant(0))?;
        report.line(format!("frame {i}: {pattern:?}"));
        ctx.save(&mut report, &format!("remap_{i}.png"), &DynamicImage::ImageRgb8(dst))?;
    }
    Ok(report)
}

pub fn transpose(ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("transpose");
    let src = ctx.load_rgb(LENA)?;
    let dst = geometry::transpose(&src);
    report.line(format!("transposed to {}x{}", dst.width(), dst.height()));
    ctx.save(&mut report, "transpose.png", &DynamicImage::ImageRgb8(dst))?;
    Ok(report)
}

pub fn flip(ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("flip");
    let src = ctx.load_rgb(LENA)?;
    let dst = geometry::flip(&src, FlipCode::from_code(-1));
    report.line("flipped around both axes");
    ctx.save(&mut report, "flip.png", &DynamicImage::ImageRgb8(dst))?;
    Ok(report)
}
