//! Image file and in-memory encode/decode.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat};
use log::debug;

use crate::error::{FunsetError, Result};

/// How a decoded image is normalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Three-channel 8-bit.
    #[default]
    Color,
    /// Single-channel 8-bit.
    Grayscale,
    /// Whatever the decoder produced.
    Unchanged,
}

fn apply_mode(img: DynamicImage, mode: ReadMode) -> DynamicImage {
    match mode {
        ReadMode::Color => DynamicImage::ImageRgb8(img.to_rgb8()),
        ReadMode::Grayscale => DynamicImage::ImageLuma8(img.to_luma8()),
        ReadMode::Unchanged => img,
    }
}

pub fn imread(path: &Path, mode: ReadMode) -> Result<DynamicImage> {
    match image::open(path) {
        Ok(img) => Ok(apply_mode(img, mode)),
        Err(e) => {
            debug!("imread {}: {e}", path.display());
            Err(FunsetError::Read {
                path: path.to_path_buf(),
            })
        }
    }
}

pub fn imdecode(bytes: &[u8], mode: ReadMode) -> Result<DynamicImage> {
    let img = image::load_from_memory(bytes)?;
    Ok(apply_mode(img, mode))
}

fn format_for_extension(ext: &str) -> Result<ImageFormat> {
    let ext = ext.trim_start_matches('.');
    ImageFormat::from_extension(ext)
        .ok_or_else(|| FunsetError::InvalidArgument(format!("unknown image extension {ext:?}")))
}

/// Encodes `img` in the format named by `ext` (".jpg", "png", ...).
///
/// JPEG drops alpha and is written with the given quality; the encoder is
/// deterministic, so equal pixels always yield equal bytes.
pub fn imencode(ext: &str, img: &DynamicImage, jpeg_quality: u8) -> Result<Vec<u8>> {
    let format = format_for_extension(ext)?;
    let mut buf = Vec::new();
    if format == ImageFormat::Jpeg {
        let encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality);
        match img {
            DynamicImage::ImageLuma8(gray) => encoder.write_image(
                gray.as_raw(),
                gray.width(),
                gray.height(),
                ExtendedColorType::L8,
            )?,
            other => {
                let rgb = other.to_rgb8();
                encoder.write_image(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    ExtendedColorType::Rgb8,
                )?
            }
        }
    } else {
        img.write_to(&mut Cursor::new(&mut buf), format)?;
    }
    Ok(buf)
}

/// Writes `img` to `path`, picking the codec from the extension.
pub fn imwrite(path: &Path, img: &DynamicImage, jpeg_quality: u8) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| FunsetError::InvalidArgument(format!("no extension on {}", path.display())))?;
    let bytes = imencode(ext, img, jpeg_quality)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

/// True when both images share size, color type and every byte.
pub fn same_pixels(a: &DynamicImage, b: &DynamicImage) -> bool {
    a.width() == b.width()
        && a.height() == b.height()
        && a.color() == b.color()
        && a.as_bytes() == b.as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn gradient() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(16, 8, |x, y| {
            Rgb([(x * 15) as u8, (y * 30) as u8, 128])
        }))
    }

    #[test]
    fn png_is_lossless() {
        let img = gradient();
        let bytes = imencode(".png", &img, 95).unwrap();
        let back = imdecode(&bytes, ReadMode::Color).unwrap();
        assert!(same_pixels(&img, &back));
    }

    #[test]
    fn jpeg_encoding_is_deterministic() {
        let img = gradient();
        let a = imencode("jpg", &img, 90).unwrap();
        let b = imencode(".jpg", &img, 90).unwrap();
        assert_eq!(a, b);
        assert_eq!(&a[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(matches!(
            imencode(".nope", &gradient(), 95),
            Err(FunsetError::InvalidArgument(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = imread(Path::new("does/not/exist.png"), ReadMode::Color).unwrap_err();
        assert!(err.to_string().contains("exist.png"));
    }

    #[test]
    fn grayscale_mode_yields_single_channel() {
        let bytes = imencode("png", &gradient(), 95).unwrap();
        let gray = imdecode(&bytes, ReadMode::Grayscale).unwrap();
        assert_eq!(gray.color(), image::ColorType::L8);
    }
}
