//! Minimal AVI (RIFF) video container support.
//!
//! Frames are stored either as Motion-JPEG or as uncompressed bottom-up BGR
//! DIBs, one video stream per file, with an `idx1` index.

mod reader;
mod writer;

pub use reader::AviReader;
pub use writer::AviWriter;

use std::fmt;

use image::RgbImage;

use crate::error::{FunsetError, Result};

pub(crate) const AVIF_HASINDEX: u32 = 0x10;
pub(crate) const AVIIF_KEYFRAME: u32 = 0x10;
pub(crate) const AVIH_LEN: u32 = 56;
pub(crate) const STRH_LEN: u32 = 56;
pub(crate) const BITMAPINFOHEADER_LEN: u32 = 40;
pub(crate) const FRAME_CHUNK_ID: [u8; 4] = *b"00dc";

/// Four-character codec code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const MJPG: FourCc = FourCc(*b"MJPG");
    /// Uncompressed 24-bit DIB frames.
    pub const RAW: FourCc = FourCc(*b"DIB ");

    /// Value of `biCompression` in the stream format header.
    pub(crate) fn compression(self) -> [u8; 4] {
        if self == FourCc::RAW { [0; 4] } else { self.0 }
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// A source of decoded RGB frames.
pub trait VideoCapture {
    fn is_opened(&self) -> bool;

    /// Frame width and height in pixels.
    fn frame_size(&self) -> (u32, u32);

    /// Advances to the next frame; `false` once the stream is exhausted.
    fn grab(&mut self) -> Result<bool>;

    /// Decodes the most recently grabbed frame.
    fn retrieve(&mut self) -> Result<RgbImage>;

    fn read(&mut self) -> Result<Option<RgbImage>> {
        if self.grab()? {
            self.retrieve().map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Bytes per row of a 24-bit DIB, padded to four bytes.
pub(crate) fn dib_stride(width: u32) -> usize {
    (width as usize * 3 + 3) & !3
}

pub(crate) fn read_u32(data: &[u8], at: usize) -> Result<u32> {
    data.get(at..at + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| truncated(at))
}

pub(crate) fn read_i32(data: &[u8], at: usize) -> Result<i32> {
    read_u32(data, at).map(|v| v as i32)
}

pub(crate) fn read_u16(data: &[u8], at: usize) -> Result<u16> {
    data.get(at..at + 2)
        .and_then(|b| b.try_into().ok())
        .map(u16::from_le_bytes)
        .ok_or_else(|| truncated(at))
}

pub(crate) fn read_fourcc(data: &[u8], at: usize) -> Result<[u8; 4]> {
    data.get(at..at + 4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| truncated(at))
}

pub(crate) fn truncated(at: usize) -> FunsetError {
    FunsetError::Video(format!("file truncated at byte {at}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fourcc_display_and_compression() {
        assert_eq!(FourCc::MJPG.to_string(), "MJPG");
        assert_eq!(FourCc([1, b'a', b'b', b'c']).to_string(), "?abc");
        assert_eq!(FourCc::RAW.compression(), [0; 4]);
        assert_eq!(FourCc::MJPG.compression(), *b"MJPG");
    }

    #[test]
    fn stride_is_four_byte_aligned() {
        assert_eq!(dib_stride(4), 12);
        assert_eq!(dib_stride(5), 16);
        assert_eq!(dib_stride(1), 4);
    }

    #[test]
    fn bounds_checked_reads() {
        let data = [1, 0, 0, 0, 2, 0];
        assert_eq!(read_u32(&data, 0).unwrap(), 1);
        assert_eq!(read_u16(&data, 4).unwrap(), 2);
        assert!(read_u32(&data, 3).is_err());
    }
}
