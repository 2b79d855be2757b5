//! Color space conversion and channel plumbing.

use image::DynamicImage;

use super::{DemoContext, DemoReport};
use crate::error::Result;
use crate::fixtures::{LENA, PHOTO_1, PHOTO_2};
use crate::imgproc::geometry::resize;
use crate::imgproc::{
    ColorConversion, Interpolation, cvt_color as convert, merge as merge_planes,
    split as split_planes, to_gray,
};

pub fn cvt_color(ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("cvt_color");
    let lena = ctx.load_rgb(LENA)?;
    let small = resize(&lena, 20, 60, Interpolation::Linear)?;
    let yuv = convert(&DynamicImage::ImageRgb8(small), ColorConversion::RgbToYuvI420)?;
    report.line(format!("I420 plane: {}x{}", yuv.width(), yuv.height()));
    ctx.save(&mut report, "cvt_color_i420.png", &yuv)?;
    Ok(report)
}

pub fn split(ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("split");
    let lena = ctx.load_rgb(LENA)?;
    for (plane, name) in split_planes(&lena).into_iter().zip(["r", "g", "b"]) {
        ctx.save(
            &mut report,
            &format!("split_{name}.png"),
            &DynamicImage::ImageLuma8(plane),
        )?;
    }
    report.line(format!("split into 3 planes of {}x{}", lena.width(), lena.height()));
    Ok(report)
}

pub fn merge(ctx: &DemoContext) -> Result<DemoReport> {
    const WIDTH: u32 = 500;
    const HEIGHT: u32 = 600;

    let mut report = DemoReport::new("merge");
    let mut planes = Vec::with_capacity(3);
    for name in [LENA, PHOTO_1, PHOTO_2] {
        let gray = to_gray(&ctx.load_rgb(name)?)?;
        planes.push(resize(&gray, WIDTH, HEIGHT, Interpolation::Linear)?);
    }
    let merged = merge_planes(&planes)?;
    ctx.save(&mut report, "merge.png", &DynamicImage::ImageRgb8(merged))?;
    report.line(format!("merged 3 planes into {WIDTH}x{HEIGHT}"));
    Ok(report)
}
