use image::imageops::{self, FilterType};
use image::{ImageBuffer, Pixel};
use nalgebra::{Matrix2x3, Matrix3, Point2, SMatrix, SVector};
use rayon::prelude::*;

use super::Border;
use crate::error::{FunsetError, Result, ensure_nonzero};

type Buf<P> = ImageBuffer<P, Vec<u8>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    Nearest,
    #[default]
    Linear,
    /// Bicubic with a = -0.75.
    Cubic,
    /// Lanczos over an 8x8 neighbourhood.
    Lanczos,
}

impl Interpolation {
    fn filter(self) -> FilterType {
        match self {
            Interpolation::Nearest => FilterType::Nearest,
            Interpolation::Linear => FilterType::Triangle,
            Interpolation::Cubic => FilterType::CatmullRom,
            Interpolation::Lanczos => FilterType::Lanczos3,
        }
    }
}

/// Which axes [`flip`] mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipCode {
    /// Around the x axis (rows reversed).
    Vertical,
    /// Around the y axis (columns reversed).
    Horizontal,
    Both,
}

impl FlipCode {
    /// Decodes the integer convention: 0 vertical, positive horizontal, negative both.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => FlipCode::Vertical,
            c if c > 0 => FlipCode::Horizontal,
            _ => FlipCode::Both,
        }
    }
}

pub fn resize<P>(src: &Buf<P>, width: u32, height: u32, interpolation: Interpolation) -> Result<Buf<P>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    ensure_nonzero(width, height)?;
    ensure_nonzero(src.width(), src.height())?;
    Ok(imageops::resize(src, width, height, interpolation.filter()))
}

pub fn transpose<P>(src: &Buf<P>) -> Buf<P>
where
    P: Pixel<Subpixel = u8>,
{
    ImageBuffer::from_fn(src.height(), src.width(), |x, y| *src.get_pixel(y, x))
}

pub fn flip<P>(src: &Buf<P>, code: FlipCode) -> Buf<P>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    match code {
        FlipCode::Vertical => imageops::flip_vertical(src),
        FlipCode::Horizontal => imageops::flip_horizontal(src),
        FlipCode::Both => imageops::rotate180(src),
    }
}

/// Affine map taking each `src[i]` onto `dst[i]`.
pub fn get_affine_transform(src: [Point2<f64>; 3], dst: [Point2<f64>; 3]) -> Result<Matrix2x3<f64>> {
    let a = Matrix3::from_fn(|r, c| match c {
        0 => src[r].x,
        1 => src[r].y,
        _ => 1.0,
    });
    let lu = a.lu();
    let bx = nalgebra::Vector3::new(dst[0].x, dst[1].x, dst[2].x);
    let by = nalgebra::Vector3::new(dst[0].y, dst[1].y, dst[2].y);
    let (Some(cx), Some(cy)) = (lu.solve(&bx), lu.solve(&by)) else {
        return Err(FunsetError::Singular(
            "affine source points are collinear".into(),
        ));
    };
    Ok(Matrix2x3::new(cx[0], cx[1], cx[2], cy[0], cy[1], cy[2]))
}

/// Homography taking each `src[i]` onto `dst[i]`, normalised so that `h33 == 1`.
pub fn get_perspective_transform(src: [Point2<f64>; 4], dst: [Point2<f64>; 4]) -> Result<Matrix3<f64>> {
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();
    for i in 0..4 {
        let (x, y) = (src[i].x, src[i].y);
        let (u, v) = (dst[i].x, dst[i].y);
        let r = 2 * i;
        a[(r, 0)] = x;
        a[(r, 1)] = y;
        a[(r, 2)] = 1.0;
        a[(r, 6)] = -x * u;
        a[(r, 7)] = -y * u;
        b[r] = u;
        a[(r + 1, 3)] = x;
        a[(r + 1, 4)] = y;
        a[(r + 1, 5)] = 1.0;
        a[(r + 1, 6)] = -x * v;
        a[(r + 1, 7)] = -y * v;
        b[r + 1] = v;
    }
    let h = a.lu().solve(&b).ok_or_else(|| {
        FunsetError::Singular("perspective points are degenerate".into())
    })?;
    Ok(Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0))
}

/// Rotation by `angle_deg` (counter-clockwise for positive angles on screen)
/// plus isotropic scaling about `center`.
pub fn get_rotation_matrix_2d(center: Point2<f64>, angle_deg: f64, scale: f64) -> Matrix2x3<f64> {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let alpha = scale * cos;
    let beta = scale * sin;
    Matrix2x3::new(
        alpha,
        beta,
        (1.0 - alpha) * center.x - beta * center.y,
        -beta,
        alpha,
        beta * center.x + (1.0 - alpha) * center.y,
    )
}

fn to_homogeneous(m: &Matrix2x3<f64>) -> Matrix3<f64> {
    Matrix3::new(
        m[(0, 0)],
        m[(0, 1)],
        m[(0, 2)],
        m[(1, 0)],
        m[(1, 1)],
        m[(1, 2)],
        0.0,
        0.0,
        1.0,
    )
}

fn transform_point(m: &Matrix3<f64>, x: f64, y: f64) -> (f32, f32) {
    let w = m[(2, 0)] * x + m[(2, 1)] * y + m[(2, 2)];
    let w = if w.abs() > 1e-12 { w } else { 1.0 };
    (
        ((m[(0, 0)] * x + m[(0, 1)] * y + m[(0, 2)]) / w) as f32,
        ((m[(1, 0)] * x + m[(1, 1)] * y + m[(1, 2)]) / w) as f32,
    )
}

pub fn warp_affine<P>(
    src: &Buf<P>,
    matrix: &Matrix2x3<f64>,
    width: u32,
    height: u32,
    interpolation: Interpolation,
    border: Border,
) -> Result<Buf<P>>
where
    P: Pixel<Subpixel = u8>,
{
    warp_perspective(src, &to_homogeneous(matrix), width, height, interpolation, border)
}

/// Samples `dst(x, y) = src(M⁻¹ · (x, y, 1))`.
pub fn warp_perspective<P>(
    src: &Buf<P>,
    matrix: &Matrix3<f64>,
    width: u32,
    height: u32,
    interpolation: Interpolation,
    border: Border,
) -> Result<Buf<P>>
where
    P: Pixel<Subpixel = u8>,
{
    let inv = matrix
        .try_inverse()
        .ok_or_else(|| FunsetError::Singular("warp matrix is not invertible".into()))?;
    sample_into(src, width, height, interpolation, border, |x, y| {
        transform_point(&inv, x as f64, y as f64)
    })
}

/// Per-pixel source coordinates for [`remap`].
#[derive(Debug, Clone, PartialEq)]
pub struct RemapMaps {
    pub width: u32,
    pub height: u32,
    pub map_x: Vec<f32>,
    pub map_y: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemapPattern {
    /// The central half of the image blown up to full size.
    ZoomCenter,
    FlipVertical,
    FlipHorizontal,
    FlipBoth,
}

impl RemapPattern {
    pub const CYCLE: [RemapPattern; 4] = [
        RemapPattern::ZoomCenter,
        RemapPattern::FlipVertical,
        RemapPattern::FlipHorizontal,
        RemapPattern::FlipBoth,
    ];

    pub fn from_index(index: usize) -> Self {
        Self::CYCLE[index % Self::CYCLE.len()]
    }
}

impl RemapMaps {
    pub fn new(width: u32, height: u32, map_x: Vec<f32>, map_y: Vec<f32>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if map_x.len() != expected || map_y.len() != expected {
            return Err(FunsetError::DimensionMismatch(format!(
                "maps must hold {expected} entries for {width}x{height}, got {} and {}",
                map_x.len(),
                map_y.len()
            )));
        }
        Ok(Self {
            width,
            height,
            map_x,
            map_y,
        })
    }

    /// Builds one of the demo map patterns for a `width x height` source.
    ///
    /// The flips read `rows - y` / `cols - x`, so the first mirrored row or
    /// column falls one past the edge and takes the border value.
    pub fn pattern(width: u32, height: u32, pattern: RemapPattern) -> Self {
        let (cols, rows) = (width as f32, height as f32);
        let len = width as usize * height as usize;
        let mut map_x = Vec::with_capacity(len);
        let mut map_y = Vec::with_capacity(len);
        for j in 0..height {
            for i in 0..width {
                let (x, y) = (i as f32, j as f32);
                let (mx, my) = match pattern {
                    RemapPattern::ZoomCenter => {
                        let inside = x > cols * 0.25
                            && x < cols * 0.75
                            && y > rows * 0.25
                            && y < rows * 0.75;
                        if inside {
                            (2.0 * (x - cols * 0.25) + 0.5, 2.0 * (y - rows * 0.25) + 0.5)
                        } else {
                            (0.0, 0.0)
                        }
                    }
                    RemapPattern::FlipVertical => (x, rows - y),
                    RemapPattern::FlipHorizontal => (cols - x, y),
                    RemapPattern::FlipBoth => (cols - x, rows - y),
                };
                map_x.push(mx);
                map_y.push(my);
            }
        }
        Self {
            width,
            height,
            map_x,
            map_y,
        }
    }
}

pub fn remap<P>(
    src: &Buf<P>,
    maps: &RemapMaps,
    interpolation: Interpolation,
    border: Border,
) -> Result<Buf<P>>
where
    P: Pixel<Subpixel = u8>,
{
    let expected = maps.width as usize * maps.height as usize;
    if maps.map_x.len() != expected || maps.map_y.len() != expected {
        return Err(FunsetError::DimensionMismatch(
            "remap maps do not match their declared size".into(),
        ));
    }
    let stride = maps.width as usize;
    sample_into(src, maps.width, maps.height, interpolation, border, |x, y| {
        let idx = y * stride + x;
        (maps.map_x[idx], maps.map_y[idx])
    })
}

fn sample_into<P, F>(
    src: &Buf<P>,
    width: u32,
    height: u32,
    interpolation: Interpolation,
    border: Border,
    locate: F,
) -> Result<Buf<P>>
where
    P: Pixel<Subpixel = u8>,
    F: Fn(usize, usize) -> (f32, f32) + Sync,
{
    ensure_nonzero(width, height)?;
    ensure_nonzero(src.width(), src.height())?;
    let channels = P::CHANNEL_COUNT as usize;
    let sampler = Sampler {
        raw: src.as_raw(),
        width: src.width() as usize,
        height: src.height() as usize,
        channels,
        border,
    };

    let mut dst = Buf::<P>::new(width, height);
    let rows: &mut [u8] = &mut dst;
    rows.par_chunks_mut(width as usize * channels)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(channels).enumerate() {
                let (sx, sy) = locate(x, y);
                sampler.sample(sx, sy, interpolation, px);
            }
        });
    Ok(dst)
}

struct Sampler<'a> {
    raw: &'a [u8],
    width: usize,
    height: usize,
    channels: usize,
    border: Border,
}

impl Sampler<'_> {
    fn fetch(&self, x: isize, y: isize, ch: usize) -> f32 {
        match (self.border.map(x, self.width), self.border.map(y, self.height)) {
            (Some(ix), Some(iy)) => self.raw[(iy * self.width + ix) * self.channels + ch] as f32,
            _ => self.border.constant_value() as f32,
        }
    }

    fn sample(&self, x: f32, y: f32, interpolation: Interpolation, out: &mut [u8]) {
        if !x.is_finite() || !y.is_finite() {
            out.fill(self.border.constant_value());
            return;
        }
        if interpolation == Interpolation::Nearest {
            let (xi, yi) = (x.round() as isize, y.round() as isize);
            for (ch, v) in out.iter_mut().enumerate() {
                *v = self.fetch(xi, yi, ch) as u8;
            }
            return;
        }

        let (x0, wx, taps) = kernel_taps(interpolation, x);
        let (y0, wy, _) = kernel_taps(interpolation, y);
        for (ch, v) in out.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (j, wyj) in wy[..taps].iter().enumerate() {
                let mut row = 0.0;
                for (i, wxi) in wx[..taps].iter().enumerate() {
                    row += wxi * self.fetch(x0 + i as isize, y0 + j as isize, ch);
                }
                acc += wyj * row;
            }
            *v = acc.round().clamp(0.0, 255.0) as u8;
        }
    }
}

fn cubic_weight(d: f32) -> f32 {
    const A: f32 = -0.75;
    let d = d.abs();
    if d <= 1.0 {
        ((A + 2.0) * d - (A + 3.0)) * d * d + 1.0
    } else if d < 2.0 {
        ((A * d - 5.0 * A) * d + 8.0 * A) * d - 4.0 * A
    } else {
        0.0
    }
}

fn lanczos_weight(d: f32) -> f32 {
    const A: f32 = 4.0;
    if d.abs() < 1e-6 {
        return 1.0;
    }
    if d.abs() >= A {
        return 0.0;
    }
    let pd = std::f32::consts::PI * d;
    A * pd.sin() * (pd / A).sin() / (pd * pd)
}

/// First tap position, weights and tap count for sampling at `v`.
fn kernel_taps(interpolation: Interpolation, v: f32) -> (isize, [f32; 8], usize) {
    let base = v.floor();
    let f = v - base;
    let base = base as isize;
    let mut w = [0.0f32; 8];
    match interpolation {
        Interpolation::Nearest | Interpolation::Linear => {
            w[0] = 1.0 - f;
            w[1] = f;
            (base, w, 2)
        }
        Interpolation::Cubic => {
            for (i, wi) in w.iter_mut().take(4).enumerate() {
                *wi = cubic_weight(i as f32 - 1.0 - f);
            }
            (base - 1, w, 4)
        }
        Interpolation::Lanczos => {
            for (i, wi) in w.iter_mut().enumerate() {
                *wi = lanczos_weight(i as f32 - 3.0 - f);
            }
            let sum: f32 = w.iter().sum();
            if sum.abs() > 1e-6 {
                w.iter_mut().for_each(|wi| *wi /= sum);
            }
            (base - 3, w, 8)
        }
    }
}
