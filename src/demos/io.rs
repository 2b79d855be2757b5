//! Video container and image codec round trips.

use std::fs;

use image::DynamicImage;
use log::debug;

use super::{DemoContext, DemoReport};
use crate::codec::{ReadMode, imdecode, imencode, imread, same_pixels};
use crate::error::{FunsetError, Result};
use crate::fixtures::PHOTO_1;
use crate::imgproc::Interpolation;
use crate::imgproc::geometry::resize;
use crate::video::{AviReader, AviWriter, FourCc, VideoCapture};

/// Writes a still image as a short clip, then re-encodes that clip frame by frame.
pub fn read_write_video(ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("read_write_video");
    let cfg = &ctx.config;
    let size = (cfg.video_width, cfg.video_height);
    // The first frame plus `video_frames` more.
    let frame_budget = cfg.video_frames.checked_add(1).ok_or_else(|| {
        FunsetError::InvalidArgument(format!("video_frames {} is too large", cfg.video_frames))
    })?;

    let still = ctx.load_rgb(PHOTO_1)?;
    let first_path = ctx.output("video_1.avi");
    {
        let frame = DynamicImage::ImageRgb8(resize(&still, size.0, size.1, Interpolation::Linear)?);
        let mut writer =
            AviWriter::create(&first_path, FourCc::MJPG, cfg.video_fps, size, true, cfg.jpeg_quality)?;
        for _ in 0..frame_budget {
            writer.write(&frame)?;
        }
        writer.finish()?;
    }
    report.written.push(first_path.clone());

    let mut capture = AviReader::open(&first_path)?;
    if !capture.is_opened() {
        return Err(FunsetError::Video(format!(
            "can't open video {}",
            first_path.display()
        )));
    }
    let Some(first) = capture.read()? else {
        return Err(FunsetError::Video("read video frame fail".into()));
    };
    report.line(format!("src frame size: ({}, {})", first.width(), first.height()));

    let second_path = ctx.output("video_2.avi");
    let mut writer =
        AviWriter::create(&second_path, FourCc::MJPG, cfg.video_fps, size, true, cfg.jpeg_quality)?;
    let mut last_size = (0, 0);
    while writer.frame_count() < frame_budget {
        let Some(frame) = capture.read()? else {
            break;
        };
        let scaled = resize(&frame, size.0, size.1, Interpolation::Linear)?;
        last_size = scaled.dimensions();
        writer.write(&DynamicImage::ImageRgb8(scaled))?;
    }
    debug!("re-encoded {} frames", writer.frame_count());
    writer.finish()?;
    report.written.push(second_path);
    report.line(format!("dst frame size: ({}, {})", last_size.0, last_size.1));
    Ok(report)
}

/// Saves one photo three ways and checks that all three decode to the same pixels.
pub fn encode_decode(ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("encode_decode");
    let source = ctx.input(PHOTO_1);

    let read = imread(&source, ReadMode::Color)?;
    let via_imwrite = ctx.save(&mut report, "1_1.jpg", &read)?;

    let bytes = fs::read(&source).map_err(|_| FunsetError::Read {
        path: source.clone(),
    })?;
    let decoded = imdecode(&bytes, ReadMode::Color)?;
    let via_imdecode = ctx.save(&mut report, "2_1.jpg", &decoded)?;

    let encoded = imencode(".jpg", &read, ctx.config.jpeg_quality)?;
    let via_imencode = ctx.output("2_2.jpg");
    fs::write(&via_imencode, &encoded)?;
    report.written.push(via_imencode.clone());

    let a = imread(&via_imwrite, ReadMode::Color)?;
    let b = imread(&via_imdecode, ReadMode::Color)?;
    let c = imread(&via_imencode, ReadMode::Color)?;
    if same_size(&a, &b) && same_size(&a, &c) {
        if !same_pixels(&a, &b) || !same_pixels(&a, &c) {
            return Err(FunsetError::Verification("their value are different".into()));
        }
    } else {
        return Err(FunsetError::Verification("their size are different".into()));
    }

    report.line("test image encode/decode, imread/imwrite finish");
    Ok(report)
}

fn same_size(a: &DynamicImage, b: &DynamicImage) -> bool {
    a.width() == b.width() && a.height() == b.height()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DemoConfig;

    #[test]
    fn frame_count_overflow_is_rejected_before_any_io() {
        let config = DemoConfig {
            video_frames: usize::MAX,
            images_dir: "does/not/exist".into(),
            output_dir: "does/not/exist/either".into(),
            ..DemoConfig::default()
        };
        let ctx = DemoContext::new(config);
        assert!(matches!(
            read_write_video(&ctx),
            Err(FunsetError::InvalidArgument(msg)) if msg.contains("video_frames")
        ));
    }
}
