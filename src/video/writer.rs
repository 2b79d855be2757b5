use std::fs::{self, File};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbImage};
use log::{debug, warn};

use super::{
    AVIF_HASINDEX, AVIH_LEN, AVIIF_KEYFRAME, BITMAPINFOHEADER_LEN, FRAME_CHUNK_ID, FourCc, STRH_LEN,
    dib_stride,
};
use crate::codec::imencode;
use crate::error::{FunsetError, Result};

/// Rate is stored as `rate / scale` frames per second.
const RATE_SCALE: u32 = 1000;

/// Offsets of the header fields that are only known once every frame is written.
#[derive(Debug, Default)]
struct Placeholders {
    riff_size: u64,
    total_frames: u64,
    avih_buffer_size: u64,
    stream_length: u64,
    strh_buffer_size: u64,
    movi_size: u64,
    movi_fourcc: u64,
}

struct IndexEntry {
    offset: u32,
    size: u32,
}

/// Writes frames of a fixed size into an AVI file.
///
/// Sizes and the index are patched in by [`AviWriter::finish`]; dropping an
/// unfinished writer finishes it and logs any failure.
pub struct AviWriter<W: Write + Seek = BufWriter<File>> {
    out: W,
    path: PathBuf,
    fourcc: FourCc,
    width: u32,
    height: u32,
    is_color: bool,
    jpeg_quality: u8,
    at: Placeholders,
    index: Vec<IndexEntry>,
    max_chunk: u32,
    /// Where `idx1` starts, fixed by the first call to `finish`.
    movi_end: Option<u64>,
    finished: bool,
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn too_large() -> FunsetError {
    FunsetError::Video("AVI file exceeds 4 GiB".into())
}

fn check_stream(fourcc: FourCc, fps: f64, (width, height): (u32, u32)) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(FunsetError::Video(format!(
            "frame size must be non-zero, got {width}x{height}"
        )));
    }
    if !(fps.is_finite() && fps > 0.0) {
        return Err(FunsetError::Video(format!("fps must be positive, got {fps}")));
    }
    if fourcc != FourCc::MJPG && fourcc != FourCc::RAW {
        return Err(FunsetError::Video(format!("unsupported codec {fourcc}")));
    }
    Ok(())
}

impl AviWriter {
    /// Creates (or truncates) `path`, making parent directories as needed.
    pub fn create(
        path: &Path,
        fourcc: FourCc,
        fps: f64,
        frame_size: (u32, u32),
        is_color: bool,
        jpeg_quality: u8,
    ) -> Result<Self> {
        check_stream(fourcc, fps, frame_size)?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let out = BufWriter::new(File::create(path)?);
        AviWriter::from_writer(out, path, fourcc, fps, frame_size, is_color, jpeg_quality)
    }
}

impl<W: Write + Seek> AviWriter<W> {
    /// Starts a stream in `out`, which must be positioned at offset 0.
    /// `path` only names the stream in log and error messages.
    pub fn from_writer(
        mut out: W,
        path: &Path,
        fourcc: FourCc,
        fps: f64,
        frame_size: (u32, u32),
        is_color: bool,
        jpeg_quality: u8,
    ) -> Result<Self> {
        check_stream(fourcc, fps, frame_size)?;
        let (width, height) = frame_size;

        let mut at = Placeholders::default();
        let mut hdr = Vec::with_capacity(256);
        hdr.extend_from_slice(b"RIFF");
        at.riff_size = hdr.len() as u64;
        push_u32(&mut hdr, 0);
        hdr.extend_from_slice(b"AVI ");

        let strl_len = 4 + (8 + STRH_LEN) + (8 + BITMAPINFOHEADER_LEN);
        let hdrl_len = 4 + (8 + AVIH_LEN) + (8 + strl_len);
        hdr.extend_from_slice(b"LIST");
        push_u32(&mut hdr, hdrl_len);
        hdr.extend_from_slice(b"hdrl");

        let frame_micros = (1_000_000.0 / fps).round() as u32;
        hdr.extend_from_slice(b"avih");
        push_u32(&mut hdr, AVIH_LEN);
        push_u32(&mut hdr, frame_micros);
        push_u32(&mut hdr, 0); // max bytes per second
        push_u32(&mut hdr, 0); // padding granularity
        push_u32(&mut hdr, AVIF_HASINDEX);
        at.total_frames = hdr.len() as u64;
        push_u32(&mut hdr, 0);
        push_u32(&mut hdr, 0); // initial frames
        push_u32(&mut hdr, 1); // streams
        at.avih_buffer_size = hdr.len() as u64;
        push_u32(&mut hdr, 0);
        push_u32(&mut hdr, width);
        push_u32(&mut hdr, height);
        hdr.extend_from_slice(&[0; 16]);

        hdr.extend_from_slice(b"LIST");
        push_u32(&mut hdr, strl_len);
        hdr.extend_from_slice(b"strl");

        hdr.extend_from_slice(b"strh");
        push_u32(&mut hdr, STRH_LEN);
        hdr.extend_from_slice(b"vids");
        hdr.extend_from_slice(&fourcc.0);
        push_u32(&mut hdr, 0); // flags
        push_u16(&mut hdr, 0); // priority
        push_u16(&mut hdr, 0); // language
        push_u32(&mut hdr, 0); // initial frames
        push_u32(&mut hdr, RATE_SCALE);
        push_u32(&mut hdr, (fps * RATE_SCALE as f64).round() as u32);
        push_u32(&mut hdr, 0); // start
        at.stream_length = hdr.len() as u64;
        push_u32(&mut hdr, 0);
        at.strh_buffer_size = hdr.len() as u64;
        push_u32(&mut hdr, 0);
        push_u32(&mut hdr, u32::MAX); // default quality
        push_u32(&mut hdr, 0); // sample size
        push_u16(&mut hdr, 0);
        push_u16(&mut hdr, 0);
        push_u16(&mut hdr, width.min(u16::MAX as u32) as u16);
        push_u16(&mut hdr, height.min(u16::MAX as u32) as u16);

        hdr.extend_from_slice(b"strf");
        push_u32(&mut hdr, BITMAPINFOHEADER_LEN);
        push_u32(&mut hdr, BITMAPINFOHEADER_LEN);
        push_u32(&mut hdr, width);
        push_u32(&mut hdr, height); // positive: bottom-up rows
        push_u16(&mut hdr, 1); // planes
        push_u16(&mut hdr, if is_color || fourcc == FourCc::RAW { 24 } else { 8 });
        hdr.extend_from_slice(&fourcc.compression());
        push_u32(&mut hdr, (dib_stride(width) * height as usize) as u32);
        hdr.extend_from_slice(&[0; 16]);

        hdr.extend_from_slice(b"LIST");
        at.movi_size = hdr.len() as u64;
        push_u32(&mut hdr, 0);
        at.movi_fourcc = hdr.len() as u64;
        hdr.extend_from_slice(b"movi");

        out.write_all(&hdr)?;
        debug!(
            "avi: opened {} ({fourcc}, {width}x{height} @ {fps} fps)",
            path.display()
        );

        Ok(Self {
            out,
            path: path.to_path_buf(),
            fourcc,
            width,
            height,
            is_color,
            jpeg_quality,
            at,
            index: Vec::new(),
            max_chunk: 0,
            movi_end: None,
            finished: false,
        })
    }

    pub fn is_opened(&self) -> bool {
        !self.finished
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn frame_count(&self) -> usize {
        self.index.len()
    }

    fn encode(&self, frame: &DynamicImage) -> Result<Vec<u8>> {
        if self.fourcc == FourCc::MJPG {
            let frame = if self.is_color {
                DynamicImage::ImageRgb8(frame.to_rgb8())
            } else {
                DynamicImage::ImageLuma8(frame.to_luma8())
            };
            return imencode(".jpg", &frame, self.jpeg_quality);
        }

        let rgb: RgbImage = if self.is_color {
            frame.to_rgb8()
        } else {
            DynamicImage::ImageLuma8(frame.to_luma8()).to_rgb8()
        };
        let stride = dib_stride(self.width);
        let mut bytes = vec![0u8; stride * self.height as usize];
        for (y, row) in rgb.rows().enumerate() {
            let start = (self.height as usize - 1 - y) * stride;
            for (x, px) in row.enumerate() {
                let [r, g, b] = px.0;
                bytes[start + 3 * x..start + 3 * x + 3].copy_from_slice(&[b, g, r]);
            }
        }
        Ok(bytes)
    }

    /// Appends one frame; its size must match the declared frame size.
    pub fn write(&mut self, frame: &DynamicImage) -> Result<()> {
        if self.finished || self.movi_end.is_some() {
            return Err(FunsetError::Video(format!(
                "{} is already finished",
                self.path.display()
            )));
        }
        if (frame.width(), frame.height()) != (self.width, self.height) {
            return Err(FunsetError::Video(format!(
                "frame is {}x{}, stream expects {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }

        let payload = self.encode(frame)?;
        let size = u32::try_from(payload.len()).map_err(|_| too_large())?;
        let chunk_start = self.out.stream_position()?;
        let offset = u32::try_from(chunk_start - self.at.movi_fourcc).map_err(|_| too_large())?;

        self.out.write_all(&FRAME_CHUNK_ID)?;
        self.out.write_all(&size.to_le_bytes())?;
        self.out.write_all(&payload)?;
        if payload.len() % 2 == 1 {
            self.out.write_all(&[0])?;
        }

        self.index.push(IndexEntry { offset, size });
        self.max_chunk = self.max_chunk.max(size);
        Ok(())
    }

    fn patch(&mut self, at: u64, value: u32) -> Result<()> {
        self.out.seek(SeekFrom::Start(at))?;
        self.out.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    /// Writes the index and fills in every size field.
    ///
    /// Safe to call again, including after a failed attempt, which rewrites
    /// the index from the same offset.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }

        let movi_end = match self.movi_end {
            Some(at) => {
                self.out.seek(SeekFrom::Start(at))?;
                at
            }
            None => {
                let at = self.out.stream_position()?;
                self.movi_end = Some(at);
                at
            }
        };
        self.out.write_all(b"idx1")?;
        self.out.write_all(&((self.index.len() * 16) as u32).to_le_bytes())?;
        for entry in &self.index {
            self.out.write_all(&FRAME_CHUNK_ID)?;
            self.out.write_all(&AVIIF_KEYFRAME.to_le_bytes())?;
            self.out.write_all(&entry.offset.to_le_bytes())?;
            self.out.write_all(&entry.size.to_le_bytes())?;
        }
        let file_end = self.out.stream_position()?;

        let frames = self.index.len() as u32;
        let riff_size = u32::try_from(file_end - 8).map_err(|_| too_large())?;
        let movi_size = u32::try_from(movi_end - self.at.movi_size - 4).map_err(|_| too_large())?;
        self.patch(self.at.riff_size, riff_size)?;
        self.patch(self.at.total_frames, frames)?;
        self.patch(self.at.avih_buffer_size, self.max_chunk)?;
        self.patch(self.at.stream_length, frames)?;
        self.patch(self.at.strh_buffer_size, self.max_chunk)?;
        self.patch(self.at.movi_size, movi_size)?;
        self.out.seek(SeekFrom::Start(file_end))?;
        self.out.flush()?;
        self.finished = true;

        debug!("avi: finished {} ({frames} frames)", self.path.display());
        Ok(())
    }
}

impl<W: Write + Seek> Drop for AviWriter<W> {
    fn drop(&mut self) {
        if !self.finished
            && let Err(e) = self.finish()
        {
            warn!("failed to finalize {}: {e}", self.path.display());
        }
    }
}
