use image::{ImageBuffer, Pixel};
use rayon::prelude::*;

use crate::error::{FunsetError, Result, ensure_nonzero};

type Buf<P> = ImageBuffer<P, Vec<u8>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphShape {
    Rect,
    Cross,
    Ellipse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphOp {
    Erode,
    Dilate,
    Open,
    Close,
    Gradient,
    TopHat,
    BlackHat,
}

impl MorphOp {
    /// Decodes the integer operation codes 0..=6.
    pub fn from_code(code: i32) -> Result<Self> {
        Ok(match code {
            0 => MorphOp::Erode,
            1 => MorphOp::Dilate,
            2 => MorphOp::Open,
            3 => MorphOp::Close,
            4 => MorphOp::Gradient,
            5 => MorphOp::TopHat,
            6 => MorphOp::BlackHat,
            other => {
                return Err(FunsetError::InvalidArgument(format!(
                    "unknown morphology op {other}"
                )));
            }
        })
    }
}

/// How pixels outside the image take part in a min/max.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MorphBorder {
    /// Outside pixels never win: they are skipped.
    #[default]
    Default,
    Constant(u8),
    Replicate,
}

/// A binary neighbourhood mask with its anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    pub width: u32,
    pub height: u32,
    pub anchor: (u32, u32),
    mask: Vec<bool>,
}

impl Default for StructuringElement {
    fn default() -> Self {
        Self {
            width: 3,
            height: 3,
            anchor: (1, 1),
            mask: vec![true; 9],
        }
    }
}

impl StructuringElement {
    /// Builds a `width x height` element; `anchor` defaults to the center.
    pub fn new(shape: MorphShape, width: u32, height: u32, anchor: Option<(u32, u32)>) -> Result<Self> {
        ensure_nonzero(width, height)?;
        let anchor = anchor.unwrap_or((width / 2, height / 2));
        if anchor.0 >= width || anchor.1 >= height {
            return Err(FunsetError::InvalidArgument(format!(
                "anchor {anchor:?} outside a {width}x{height} element"
            )));
        }

        let (w, h) = (width as usize, height as usize);
        let mut mask = vec![false; w * h];
        match shape {
            MorphShape::Rect => mask.fill(true),
            MorphShape::Cross => {
                for y in 0..h {
                    for x in 0..w {
                        mask[y * w + x] = x == anchor.0 as usize || y == anchor.1 as usize;
                    }
                }
            }
            MorphShape::Ellipse => {
                let r = (h / 2) as i64;
                let c = (w / 2) as i64;
                let inv_r2 = if r > 0 { 1.0 / (r * r) as f64 } else { 0.0 };
                for y in 0..h {
                    let dy = y as i64 - r;
                    if dy.abs() > r {
                        continue;
                    }
                    let dx = (c as f64 * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round() as i64;
                    let x1 = (c - dx).max(0) as usize;
                    let x2 = ((c + dx + 1) as usize).min(w);
                    mask[y * w + x1..y * w + x2].fill(true);
                }
            }
        }
        Ok(Self {
            width,
            height,
            anchor,
            mask,
        })
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.mask[(y * self.width + x) as usize]
    }

    /// Offsets of the set cells relative to the anchor.
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        let (ax, ay) = (self.anchor.0 as isize, self.anchor.1 as isize);
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|&(x, y)| self.contains(x, y))
            .map(|(x, y)| (x as isize - ax, y as isize - ay))
            .collect()
    }
}

#[derive(Clone, Copy)]
enum Extremum {
    Min,
    Max,
}

impl Extremum {
    fn identity(self) -> u8 {
        match self {
            Extremum::Min => u8::MAX,
            Extremum::Max => u8::MIN,
        }
    }

    fn pick(self, a: u8, b: u8) -> u8 {
        match self {
            Extremum::Min => a.min(b),
            Extremum::Max => a.max(b),
        }
    }
}

fn apply_once<P>(src: &Buf<P>, offsets: &[(isize, isize)], border: MorphBorder, op: Extremum) -> Buf<P>
where
    P: Pixel<Subpixel = u8>,
{
    let (w, h) = (src.width() as isize, src.height() as isize);
    let channels = P::CHANNEL_COUNT as usize;
    let raw = src.as_raw();
    let mut dst = Buf::<P>::new(src.width(), src.height());

    let rows: &mut [u8] = &mut dst;
    rows.par_chunks_mut(w as usize * channels)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as isize;
            for (x, px) in row.chunks_exact_mut(channels).enumerate() {
                let x = x as isize;
                for (ch, out) in px.iter_mut().enumerate() {
                    let mut acc = op.identity();
                    for &(dx, dy) in offsets {
                        let (sx, sy) = (x + dx, y + dy);
                        let inside = (0..w).contains(&sx) && (0..h).contains(&sy);
                        let v = match (inside, border) {
                            (true, _) => raw[(sy * w + sx) as usize * channels + ch],
                            (false, MorphBorder::Default) => continue,
                            (false, MorphBorder::Constant(c)) => c,
                            (false, MorphBorder::Replicate) => {
                                let cx = sx.clamp(0, w - 1);
                                let cy = sy.clamp(0, h - 1);
                                raw[(cy * w + cx) as usize * channels + ch]
                            }
                        };
                        acc = op.pick(acc, v);
                    }
                    *out = acc;
                }
            }
        });
    dst
}

fn apply<P>(
    src: &Buf<P>,
    element: &StructuringElement,
    iterations: u32,
    border: MorphBorder,
    op: Extremum,
) -> Result<Buf<P>>
where
    P: Pixel<Subpixel = u8>,
{
    ensure_nonzero(src.width(), src.height())?;
    let offsets = element.offsets();
    let mut out = src.clone();
    for _ in 0..iterations {
        out = apply_once(&out, &offsets, border, op);
    }
    Ok(out)
}

/// Local minimum over the element, repeated `iterations` times.
pub fn erode<P>(src: &Buf<P>, element: &StructuringElement, iterations: u32, border: MorphBorder) -> Result<Buf<P>>
where
    P: Pixel<Subpixel = u8>,
{
    apply(src, element, iterations, border, Extremum::Min)
}

/// Local maximum over the element, repeated `iterations` times.
pub fn dilate<P>(src: &Buf<P>, element: &StructuringElement, iterations: u32, border: MorphBorder) -> Result<Buf<P>>
where
    P: Pixel<Subpixel = u8>,
{
    apply(src, element, iterations, border, Extremum::Max)
}

fn saturating_diff<P>(a: &Buf<P>, b: &Buf<P>) -> Buf<P>
where
    P: Pixel<Subpixel = u8>,
{
    let mut out = a.clone();
    for (o, v) in out.iter_mut().zip(b.iter()) {
        *o = o.saturating_sub(*v);
    }
    out
}

pub fn morphology_ex<P>(
    src: &Buf<P>,
    op: MorphOp,
    element: &StructuringElement,
    iterations: u32,
    border: MorphBorder,
) -> Result<Buf<P>>
where
    P: Pixel<Subpixel = u8>,
{
    let opened = |img: &Buf<P>| -> Result<Buf<P>> {
        let eroded = erode(img, element, iterations, border)?;
        dilate(&eroded, element, iterations, border)
    };
    let closed = |img: &Buf<P>| -> Result<Buf<P>> {
        let dilated = dilate(img, element, iterations, border)?;
        erode(&dilated, element, iterations, border)
    };

    match op {
        MorphOp::Erode => erode(src, element, iterations, border),
        MorphOp::Dilate => dilate(src, element, iterations, border),
        MorphOp::Open => opened(src),
        MorphOp::Close => closed(src),
        MorphOp::Gradient => {
            let dilated = dilate(src, element, iterations, border)?;
            let eroded = erode(src, element, iterations, border)?;
            Ok(saturating_diff(&dilated, &eroded))
        }
        MorphOp::TopHat => Ok(saturating_diff(src, &opened(src)?)),
        MorphOp::BlackHat => Ok(saturating_diff(&closed(src)?, src)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn dot(w: u32, h: u32, x: u32, y: u32) -> GrayImage {
        let mut img = GrayImage::new(w, h);
        img.put_pixel(x, y, Luma([255]));
        img
    }

    #[test]
    fn element_shapes() {
        let cross = StructuringElement::new(MorphShape::Cross, 3, 3, None).unwrap();
        assert_eq!(cross.offsets().len(), 5);
        assert!(!cross.contains(0, 0));

        let ellipse = StructuringElement::new(MorphShape::Ellipse, 5, 5, None).unwrap();
        assert!(ellipse.contains(2, 0));
        assert!(!ellipse.contains(0, 0));
        assert!(ellipse.contains(0, 2));

        let rect = StructuringElement::new(MorphShape::Rect, 11, 11, Some((5, 5))).unwrap();
        assert_eq!(rect.offsets().len(), 121);
        assert!(StructuringElement::new(MorphShape::Rect, 3, 3, Some((3, 0))).is_err());
        assert_eq!(StructuringElement::default().offsets().len(), 9);
    }

    #[test]
    fn dilate_grows_and_erode_shrinks() {
        let img = dot(9, 9, 4, 4);
        let el = StructuringElement::default();
        let grown = dilate(&img, &el, 2, MorphBorder::Default).unwrap();
        assert_eq!(grown.get_pixel(2, 2)[0], 255);
        assert_eq!(grown.get_pixel(1, 1)[0], 0);

        let back = erode(&grown, &el, 2, MorphBorder::Default).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn constant_border_takes_part() {
        let img = GrayImage::from_pixel(4, 4, Luma([200]));
        let el = StructuringElement::default();
        let eroded = erode(&img, &el, 1, MorphBorder::Constant(128)).unwrap();
        assert_eq!(eroded.get_pixel(0, 0)[0], 128);
        assert_eq!(eroded.get_pixel(1, 1)[0], 200);
        let kept = erode(&img, &el, 1, MorphBorder::Default).unwrap();
        assert_eq!(kept.get_pixel(0, 0)[0], 200);
    }

    #[test]
    fn open_removes_specks_per_channel() {
        let mut img = RgbImage::new(7, 7);
        img.put_pixel(3, 3, Rgb([255, 10, 0]));
        let el = StructuringElement::default();
        let opened = morphology_ex(&img, MorphOp::Open, &el, 1, MorphBorder::Default).unwrap();
        assert!(opened.pixels().all(|p| p.0 == [0, 0, 0]));

        let top = morphology_ex(&img, MorphOp::TopHat, &el, 1, MorphBorder::Default).unwrap();
        assert_eq!(top.get_pixel(3, 3).0, [255, 10, 0]);
    }

    #[test]
    fn gradient_outlines_a_block() {
        let mut img = GrayImage::new(9, 9);
        for y in 3..6 {
            for x in 3..6 {
                img.put_pixel(x, y, Luma([100]));
            }
        }
        let el = StructuringElement::default();
        let g = morphology_ex(&img, MorphOp::Gradient, &el, 1, MorphBorder::Default).unwrap();
        assert_eq!(g.get_pixel(4, 4)[0], 0);
        assert_eq!(g.get_pixel(3, 3)[0], 100);
        assert_eq!(g.get_pixel(2, 2)[0], 100);
        assert_eq!(MorphOp::from_code(2).unwrap(), MorphOp::Open);
        assert!(MorphOp::from_code(9).is_err());
    }
}
