use std::fs;
use std::ops::Range;
use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use log::{debug, warn};

use super::{FourCc, VideoCapture, dib_stride, read_fourcc, read_i32, read_u16, read_u32, truncated};
use crate::error::{FunsetError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameCodec {
    Mjpeg,
    /// 24-bit BGR rows; `bottom_up` when the stored height is positive.
    Dib { bottom_up: bool },
}

/// Reads the first video stream of an AVI file held in memory.
#[derive(Debug)]
pub struct AviReader {
    data: Vec<u8>,
    frames: Vec<Range<usize>>,
    next: usize,
    current: Option<usize>,
    fourcc: FourCc,
    codec: FrameCodec,
    width: u32,
    height: u32,
    fps: f64,
}

struct Chunk {
    id: [u8; 4],
    /// Payload range, excluding the 8-byte header.
    body: Range<usize>,
}

/// Walks the chunks laid out back to back in `range`.
fn chunks(data: &[u8], range: Range<usize>) -> Result<Vec<Chunk>> {
    let mut out = Vec::new();
    let mut pos = range.start;
    while pos + 8 <= range.end {
        let id = read_fourcc(data, pos)?;
        let size = read_u32(data, pos + 4)? as usize;
        let body = pos + 8..pos + 8 + size;
        if body.end > range.end {
            return Err(truncated(body.end));
        }
        out.push(Chunk {
            id,
            body: body.clone(),
        });
        pos = body.end + (size & 1);
    }
    Ok(out)
}

fn is_list(chunk: &Chunk, data: &[u8], kind: &[u8; 4]) -> bool {
    &chunk.id == b"LIST" && data.get(chunk.body.start..chunk.body.start + 4) == Some(&kind[..])
}

fn list_body(chunk: &Chunk) -> Range<usize> {
    chunk.body.start + 4..chunk.body.end
}

fn is_video_chunk(id: &[u8; 4]) -> bool {
    &id[2..] == b"dc" || &id[2..] == b"db"
}

impl AviReader {
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read(path)
            .map_err(|e| FunsetError::Video(format!("open {}: {e}", path.display())))?;
        let reader = Self::from_bytes(data)?;
        debug!(
            "avi: {} has {} frames ({}, {}x{} @ {:.2} fps)",
            path.display(),
            reader.frames.len(),
            reader.fourcc,
            reader.width,
            reader.height,
            reader.fps
        );
        Ok(reader)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if data.len() < 12 || &data[0..4] != b"RIFF" || &data[8..12] != b"AVI " {
            return Err(FunsetError::Video("not an AVI file".into()));
        }
        let riff_end = (read_u32(&data, 4)? as usize + 8).min(data.len());
        let top = chunks(&data, 12..riff_end)?;

        let hdrl = top
            .iter()
            .find(|c| is_list(c, &data, b"hdrl"))
            .ok_or_else(|| FunsetError::Video("missing hdrl list".into()))?;
        let movi = top
            .iter()
            .find(|c| is_list(c, &data, b"movi"))
            .ok_or_else(|| FunsetError::Video("missing movi list".into()))?;

        let header = chunks(&data, list_body(hdrl))?;
        let avih = header
            .iter()
            .find(|c| &c.id == b"avih")
            .ok_or_else(|| FunsetError::Video("missing avih header".into()))?;
        let micros_per_frame = read_u32(&data, avih.body.start)?;

        let strl = header
            .iter()
            .find(|c| is_list(c, &data, b"strl"))
            .ok_or_else(|| FunsetError::Video("missing stream list".into()))?;
        let stream = chunks(&data, list_body(strl))?;
        let strh = stream
            .iter()
            .find(|c| &c.id == b"strh")
            .ok_or_else(|| FunsetError::Video("missing strh header".into()))?;
        let strf = stream
            .iter()
            .find(|c| &c.id == b"strf")
            .ok_or_else(|| FunsetError::Video("missing strf header".into()))?;

        if &read_fourcc(&data, strh.body.start)? != b"vids" {
            return Err(FunsetError::Video("first stream is not video".into()));
        }
        let fourcc = FourCc(read_fourcc(&data, strh.body.start + 4)?);
        let scale = read_u32(&data, strh.body.start + 20)?;
        let rate = read_u32(&data, strh.body.start + 24)?;
        let fps = if scale > 0 && rate > 0 {
            rate as f64 / scale as f64
        } else if micros_per_frame > 0 {
            1_000_000.0 / micros_per_frame as f64
        } else {
            0.0
        };

        let bih = strf.body.start;
        let width = read_i32(&data, bih + 4)?;
        let height = read_i32(&data, bih + 8)?;
        let bit_count = read_u16(&data, bih + 14)?;
        let compression = read_fourcc(&data, bih + 16)?;
        if width <= 0 || height == 0 {
            return Err(FunsetError::Video(format!(
                "bad frame size {width}x{height}"
            )));
        }

        let codec = match &compression {
            b"MJPG" | b"mjpg" => FrameCodec::Mjpeg,
            [0, 0, 0, 0] if bit_count == 24 => FrameCodec::Dib {
                bottom_up: height > 0,
            },
            other => {
                return Err(FunsetError::Video(format!(
                    "unsupported codec {} ({bit_count} bpp)",
                    FourCc(*other)
                )));
            }
        };

        let movi_fourcc = movi.body.start;
        let indexed = top
            .iter()
            .find(|c| &c.id == b"idx1")
            .map(|idx| Self::frames_from_index(&data, idx, movi_fourcc))
            .transpose()?;
        let frames = match indexed {
            Some(frames) if !frames.is_empty() => frames,
            _ => Self::frames_from_movi(&data, list_body(movi))?,
        };

        Ok(Self {
            data,
            frames,
            next: 0,
            current: None,
            fourcc,
            codec,
            width: width as u32,
            height: height.unsigned_abs(),
            fps,
        })
    }

    /// Resolves `idx1` entries; offsets may be relative to `movi` or absolute.
    fn frames_from_index(data: &[u8], idx: &Chunk, movi_fourcc: usize) -> Result<Vec<Range<usize>>> {
        let mut frames = Vec::new();
        for entry in idx.body.clone().step_by(16) {
            if entry + 16 > idx.body.end {
                break;
            }
            let id = read_fourcc(data, entry)?;
            if !is_video_chunk(&id) {
                continue;
            }
            let offset = read_u32(data, entry + 8)? as usize;
            let size = read_u32(data, entry + 12)? as usize;
            let start = [movi_fourcc + offset, offset]
                .into_iter()
                .find(|&at| read_fourcc(data, at).is_ok_and(|found| found == id))
                .ok_or_else(|| FunsetError::Video(format!("index entry points nowhere: {offset}")))?;
            let body = start + 8..start + 8 + size;
            if body.end > data.len() {
                return Err(truncated(body.end));
            }
            frames.push(body);
        }
        Ok(frames)
    }

    fn frames_from_movi(data: &[u8], range: Range<usize>) -> Result<Vec<Range<usize>>> {
        let mut frames = Vec::new();
        for chunk in chunks(data, range)? {
            if is_list(&chunk, data, b"rec ") {
                frames.extend(Self::frames_from_movi(data, list_body(&chunk))?);
            } else if is_video_chunk(&chunk.id) {
                frames.push(chunk.body);
            }
        }
        if frames.is_empty() {
            warn!("avi: movi list holds no video frames");
        }
        Ok(frames)
    }

    pub fn fourcc(&self) -> FourCc {
        self.fourcc
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn decode(&self, body: Range<usize>) -> Result<RgbImage> {
        let bytes = &self.data[body];
        match self.codec {
            FrameCodec::Mjpeg => {
                let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)?;
                Ok(img.to_rgb8())
            }
            FrameCodec::Dib { bottom_up } => {
                let stride = dib_stride(self.width);
                let needed = stride * self.height as usize;
                if bytes.len() < needed {
                    return Err(FunsetError::Video(format!(
                        "raw frame holds {} bytes, expected {needed}",
                        bytes.len()
                    )));
                }
                Ok(RgbImage::from_fn(self.width, self.height, |x, y| {
                    let row = if bottom_up { self.height - 1 - y } else { y };
                    let at = row as usize * stride + 3 * x as usize;
                    Rgb([bytes[at + 2], bytes[at + 1], bytes[at]])
                }))
            }
        }
    }
}

impl VideoCapture for AviReader {
    /// A file without any video frame counts as not opened.
    fn is_opened(&self) -> bool {
        !self.frames.is_empty()
    }

    fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn grab(&mut self) -> Result<bool> {
        if self.next >= self.frames.len() {
            self.current = None;
            return Ok(false);
        }
        self.current = Some(self.next);
        self.next += 1;
        Ok(true)
    }

    fn retrieve(&mut self) -> Result<RgbImage> {
        let index = self
            .current
            .ok_or_else(|| FunsetError::Video("no frame grabbed".into()))?;
        self.decode(self.frames[index].clone())
    }
}
