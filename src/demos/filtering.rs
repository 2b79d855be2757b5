//! Neighbourhood filters, morphology, thresholding and the spectrum demo.

use image::DynamicImage;

use super::{DemoContext, DemoReport};
use crate::error::Result;
use crate::fixtures::{LENA, PHOTO_1};
use crate::imgproc::dft::magnitude_spectrum;
use crate::imgproc::filter::{self, Kernel2D, filter2d as correlate};
use crate::imgproc::geometry::resize;
use crate::imgproc::morph::{
    self, MorphBorder, MorphOp, MorphShape, StructuringElement, morphology_ex as morph_ex,
};
use crate::imgproc::threshold::{ThresholdType, threshold as apply_threshold};
use crate::imgproc::{Border, Interpolation, to_gray};

const MORPH_BORDER: MorphBorder = MorphBorder::Constant(128);

pub fn laplacian(ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("laplacian");
    let src = ctx.load_gray(LENA)?;
    let small = resize(&src, 100, 100, Interpolation::Linear)?;
    let dst = filter::laplacian(&small)?;
    ctx.save(&mut report, "laplacian_lena.png", &DynamicImage::ImageLuma8(dst))?;
    report.line("laplacian of a 100x100 grayscale portrait");
    Ok(report)
}

pub fn dilate(ctx: &DemoContext) -> Result<DemoReport> {
    const SIZE: u32 = 5;

    let mut report = DemoReport::new("dilate");
    let src = ctx.load_rgb(LENA)?;
    let element = StructuringElement::new(
        MorphShape::Rect,
        2 * SIZE + 1,
        2 * SIZE + 1,
        Some((SIZE, SIZE)),
    )?;
    let dst = morph::dilate(&src, &element, 2, MORPH_BORDER)?;
    ctx.save(&mut report, "dilate.png", &DynamicImage::ImageRgb8(dst))?;
    report.line(format!("dilated twice with a {0}x{0} rect", 2 * SIZE + 1));
    Ok(report)
}

pub fn erode(ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("erode");
    let src = ctx.load_rgb(LENA)?;
    let dst = morph::erode(&src, &StructuringElement::default(), 1, MorphBorder::Default)?;
    ctx.save(&mut report, "erode.png", &DynamicImage::ImageRgb8(dst))?;
    report.line("eroded once with the default 3x3 element");
    Ok(report)
}

pub fn morphology_ex(ctx: &DemoContext) -> Result<DemoReport> {
    const SIZE: u32 = 1;

    let mut report = DemoReport::new("morphology_ex");
    let src = to_gray(&ctx.load_rgb(LENA)?)?;
    // Operator 0 of the open..blackhat range.
    let op = MorphOp::from_code(2)?;
    let element = StructuringElement::new(
        MorphShape::Rect,
        2 * SIZE + 1,
        2 * SIZE + 1,
        Some((SIZE, SIZE)),
    )?;
    let dst = morph_ex(&src, op, &element, 2, MORPH_BORDER)?;
    ctx.save(&mut report, "morphology_ex.png", &DynamicImage::ImageLuma8(dst))?;
    report.line(format!("{op:?} applied twice"));
    Ok(report)
}

pub fn threshold(ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("threshold");
    let src = to_gray(&ctx.load_rgb(LENA)?)?;
    let (kind, otsu) = ThresholdType::from_code(8)?;
    let (used, dst) = apply_threshold(&src, 128.0, 255.0, kind, otsu)?;
    ctx.save(&mut report, "threshold.png", &DynamicImage::ImageLuma8(dst))?;
    report.line(format!("threshold used: {used}"));
    Ok(report)
}

pub fn dft(ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("dft");
    let src = to_gray(&ctx.load_rgb(PHOTO_1)?)?;
    let spectrum = magnitude_spectrum(&src)?;
    report.line(format!(
        "spectrum {}x{} from a {}x{} input",
        spectrum.width,
        spectrum.height,
        src.width(),
        src.height()
    ));
    let preview = spectrum.to_gray_image()?;
    ctx.save(&mut report, "dft_input.png", &DynamicImage::ImageLuma8(src))?;
    ctx.save(&mut report, "dft_spectrum.png", &DynamicImage::ImageLuma8(preview))?;
    Ok(report)
}

pub fn filter2d(ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("filter2d");
    let src = ctx.load_rgb(PHOTO_1)?;
    let dst = correlate(&src, &Kernel2D::sharpen(), None, Border::Reflect101)?;
    ctx.save(&mut report, "filter2d.png", &DynamicImage::ImageRgb8(dst))?;
    report.line("sharpened with [0, -1, 0; -1, 5, -1; 0, -1, 0]");
    Ok(report)
}
