//! Image processing operations on `image` buffers.
//!
//! Gray conversion and binary thresholding go through kornia; the buffers
//! are bridged in and out with the helpers below.

pub mod border;
pub mod color;
pub mod contours;
pub mod dft;
pub mod filter;
pub mod geometry;
pub mod morph;
pub mod threshold;

pub use border::Border;
pub use color::{ColorConversion, cvt_color, merge, split, to_gray};
pub use geometry::{FlipCode, Interpolation};

use image::{GrayImage, RgbImage};
use kornia::image::{Image, ImageSize, allocator::CpuAllocator};

use crate::error::{FunsetError, Result, ensure_nonzero};

pub(crate) type CpuImage<T, const C: usize> = Image<T, C, CpuAllocator>;

pub(crate) fn to_kornia_rgb(rgb: &RgbImage) -> Result<CpuImage<u8, 3>> {
    ensure_nonzero(rgb.width(), rgb.height())?;
    let image = CpuImage::<u8, 3>::new(
        ImageSize {
            width: rgb.width() as usize,
            height: rgb.height() as usize,
        },
        rgb.as_raw().clone(),
        CpuAllocator,
    )?;
    Ok(image)
}

pub(crate) fn to_kornia_gray(gray: &GrayImage) -> Result<CpuImage<u8, 1>> {
    ensure_nonzero(gray.width(), gray.height())?;
    let image = CpuImage::<u8, 1>::new(
        ImageSize {
            width: gray.width() as usize,
            height: gray.height() as usize,
        },
        gray.as_raw().clone(),
        CpuAllocator,
    )?;
    Ok(image)
}

pub(crate) fn from_kornia_gray(image: &CpuImage<u8, 1>) -> Result<GrayImage> {
    let size = image.size();
    GrayImage::from_raw(
        size.width as u32,
        size.height as u32,
        image.as_slice().to_vec(),
    )
    .ok_or_else(|| {
        FunsetError::DimensionMismatch(format!(
            "kornia buffer does not fit {}x{}",
            size.width, size.height
        ))
    })
}
