//! Synthetic stand-ins for the demo input images.
//!
//! The demos expect a handful of photos under the images directory. When a
//! file is missing it is generated here, so every demo can run on a clean
//! checkout.

use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use log::info;

use crate::codec::imwrite;
use crate::error::Result;

pub const LENA: &str = "lena.png";
pub const PHOTO_1: &str = "1.jpg";
pub const PHOTO_2: &str = "2.jpg";
pub const PCA_SHAPES: &str = "pca_test1.jpg";

/// A 512x512-style portrait substitute: smooth color ramps with a few
/// hard-edged shapes so filters and warps have something to bite on.
pub fn portrait(width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::from_fn(width, height, |x, y| {
        let fx = x as f32 / width.max(1) as f32;
        let fy = y as f32 / height.max(1) as f32;
        let wave = ((fx * 12.0).sin() * (fy * 9.0).cos() * 40.0) as i32;
        Rgb([
            (180.0 * (1.0 - fy) + 60.0) as u8,
            ((90.0 + 100.0 * fx) as i32 + wave).clamp(0, 255) as u8,
            (70.0 + 120.0 * fx * fy) as u8,
        ])
    });

    let (w, h) = (width as i32, height as i32);
    draw_filled_circle_mut(&mut img, (w / 2, h / 2), w.min(h) / 5, Rgb([230, 190, 160]));
    draw_filled_circle_mut(&mut img, (w / 2 - w / 14, h / 2 - h / 20), w.min(h) / 40 + 1, Rgb([30, 20, 20]));
    draw_filled_circle_mut(&mut img, (w / 2 + w / 14, h / 2 - h / 20), w.min(h) / 40 + 1, Rgb([30, 20, 20]));
    draw_filled_rect_mut(
        &mut img,
        Rect::at(w / 8, h * 3 / 4).of_size((width / 4).max(1), (height / 10).max(1)),
        Rgb([20, 40, 120]),
    );
    img
}

/// A landscape-like test photo: sky gradient, ground band and a sun.
pub fn landscape(width: u32, height: u32, hue_shift: u8) -> RgbImage {
    let horizon = height * 3 / 5;
    let mut img = RgbImage::from_fn(width, height, |x, y| {
        if y < horizon {
            let t = y as f32 / horizon.max(1) as f32;
            Rgb([
                (40.0 + 100.0 * t) as u8,
                (110.0 + 80.0 * t) as u8,
                (220.0 - 40.0 * t) as u8,
            ])
        } else {
            let stripe = if (x / 16 + y / 16) % 2 == 0 { 20 } else { 0 };
            Rgb([
                60u8.wrapping_add(hue_shift),
                (120 + stripe) as u8,
                40,
            ])
        }
    });
    let (w, h) = (width as i32, height as i32);
    draw_filled_circle_mut(&mut img, (w * 3 / 4, h / 5), w.min(h) / 10 + 1, Rgb([255, 230, 90]));
    img
}

/// Bright, rotated ellipses on black, for orientation analysis.
pub fn ellipses(width: u32, height: u32) -> RgbImage {
    // (cx, cy, semi-major, semi-minor, angle in degrees), relative to a 640x480 canvas.
    const SHAPES: [(f32, f32, f32, f32, f32); 4] = [
        (160.0, 120.0, 70.0, 22.0, 30.0),
        (470.0, 140.0, 60.0, 18.0, -45.0),
        (200.0, 350.0, 55.0, 20.0, 80.0),
        (480.0, 360.0, 65.0, 25.0, 10.0),
    ];
    let sx = width as f32 / 640.0;
    let sy = height as f32 / 480.0;

    let mut img = RgbImage::new(width, height);
    for &(cx, cy, a, b, deg) in &SHAPES {
        let (sin, cos) = deg.to_radians().sin_cos();
        let (cx, cy, a, b) = (cx * sx, cy * sy, a * sx.min(sy), b * sx.min(sy));
        for (x, y, px) in img.enumerate_pixels_mut() {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let u = dx * cos + dy * sin;
            let v = -dx * sin + dy * cos;
            if (u * u) / (a * a) + (v * v) / (b * b) <= 1.0 {
                *px = Rgb([235, 235, 235]);
            }
        }
    }
    img
}

/// Writes every missing demo input under `images_dir` and returns the paths created.
pub fn ensure_fixtures(images_dir: &Path, jpeg_quality: u8) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(images_dir)?;
    let wanted: [(&str, fn() -> RgbImage); 4] = [
        (LENA, || portrait(512, 512)),
        (PHOTO_1, || landscape(640, 480, 0)),
        (PHOTO_2, || landscape(480, 360, 40)),
        (PCA_SHAPES, || ellipses(640, 480)),
    ];

    let mut created = Vec::new();
    for (name, generate) in wanted {
        let path = images_dir.join(name);
        if path.exists() {
            continue;
        }
        imwrite(&path, &DynamicImage::ImageRgb8(generate()), jpeg_quality)?;
        info!("generated fixture {}", path.display());
        created.push(path);
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generators_honour_the_size() {
        assert_eq!(portrait(64, 48).dimensions(), (64, 48));
        assert_eq!(landscape(30, 20, 5).dimensions(), (30, 20));
        let shapes = ellipses(640, 480);
        assert_eq!(*shapes.get_pixel(160, 120), Rgb([235, 235, 235]));
        assert_eq!(*shapes.get_pixel(0, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn only_missing_files_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let first = ensure_fixtures(dir.path(), 90).unwrap();
        assert_eq!(first.len(), 4);
        assert!(dir.path().join(LENA).is_file());
        let second = ensure_fixtures(dir.path(), 90).unwrap();
        assert!(second.is_empty());
    }
}
