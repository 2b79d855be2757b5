use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_circle_mut, draw_line_segment_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;
use nalgebra::{DMatrix, Point2, Vector2};

use crate::error::{FunsetError, Result};
use crate::linalg::Pca;

pub const CONTOUR_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const CENTER_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
pub const MAJOR_AXIS_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const MINOR_AXIS_COLOR: Rgb<u8> = Rgb([0, 255, 255]);

/// Every border of every foreground (non-zero) region, outer and hole alike.
pub fn find_contours(binary: &GrayImage) -> Vec<Vec<Point<i32>>> {
    imageproc::contours::find_contours::<i32>(binary)
        .into_iter()
        .map(|c| c.points)
        .collect()
}

/// Enclosed area of a closed polygon (shoelace formula).
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    (twice as f64 / 2.0).abs()
}

/// Principal axes of a point set.
#[derive(Debug, Clone, PartialEq)]
pub struct Orientation {
    pub center: Point2<f64>,
    /// Angle of the major axis in radians, measured in image coordinates.
    pub angle: f64,
    pub eigenvectors: [Vector2<f64>; 2],
    pub eigenvalues: [f64; 2],
}

pub fn orientation(points: &[Point<i32>]) -> Result<Orientation> {
    if points.is_empty() {
        return Err(FunsetError::InvalidArgument(
            "orientation of an empty contour".into(),
        ));
    }
    let data = DMatrix::from_fn(points.len(), 2, |r, c| {
        if c == 0 {
            points[r].x as f64
        } else {
            points[r].y as f64
        }
    });
    let pca = Pca::compute(&data, Some(2))?;
    let major = Vector2::new(pca.eigenvectors[(0, 0)], pca.eigenvectors[(0, 1)]);
    let minor = Vector2::new(pca.eigenvectors[(1, 0)], pca.eigenvectors[(1, 1)]);
    Ok(Orientation {
        center: Point2::new(pca.mean[0], pca.mean[1]),
        angle: major.y.atan2(major.x),
        eigenvectors: [major, minor],
        eigenvalues: [pca.eigenvalues[0], pca.eigenvalues[1]],
    })
}

/// Paints the contour two pixels wide.
pub fn draw_contour(img: &mut RgbImage, points: &[Point<i32>], color: Rgb<u8>) {
    for p in points {
        draw_filled_rect_mut(img, Rect::at(p.x, p.y).of_size(2, 2), color);
    }
}

/// Draws `p -> q` stretched by `scale`, with two 9px hooks at the tip.
fn draw_axis(img: &mut RgbImage, p: (i32, i32), q: (i32, i32), color: Rgb<u8>, scale: f64) {
    let angle = ((p.1 - q.1) as f64).atan2((p.0 - q.0) as f64);
    let hypotenuse = (((p.1 - q.1) as f64).powi(2) + ((p.0 - q.0) as f64).powi(2)).sqrt();
    let tip = (
        (p.0 as f64 - scale * hypotenuse * angle.cos()) as i32,
        (p.1 as f64 - scale * hypotenuse * angle.sin()) as i32,
    );
    let as_f32 = |pt: (i32, i32)| (pt.0 as f32, pt.1 as f32);
    draw_line_segment_mut(img, as_f32(p), as_f32(tip), color);
    for hook in [angle + std::f64::consts::FRAC_PI_4, angle - std::f64::consts::FRAC_PI_4] {
        let end = (
            (tip.0 as f64 + 9.0 * hook.cos()) as i32,
            (tip.1 as f64 + 9.0 * hook.sin()) as i32,
        );
        draw_line_segment_mut(img, as_f32(end), as_f32(tip), color);
    }
}

/// Marks the center and both principal axes, each axis scaled by its eigenvalue.
pub fn draw_orientation(img: &mut RgbImage, o: &Orientation) {
    let center = (o.center.x as i32, o.center.y as i32);
    for radius in [3, 4] {
        draw_hollow_circle_mut(img, center, radius, CENTER_COLOR);
    }

    let axis_end = |v: &Vector2<f64>, value: f64, sign: f64| {
        let dx = (v.x * value) as i32;
        let dy = (v.y * value) as i32;
        (
            center.0 + (sign * 0.02 * dx as f64).round() as i32,
            center.1 + (sign * 0.02 * dy as f64).round() as i32,
        )
    };
    let major = axis_end(&o.eigenvectors[0], o.eigenvalues[0], 1.0);
    let minor = axis_end(&o.eigenvectors[1], o.eigenvalues[1], -1.0);
    draw_axis(img, center, major, MAJOR_AXIS_COLOR, 1.0);
    draw_axis(img, center, minor, MINOR_AXIS_COLOR, 5.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn filled_rect(w: u32, h: u32, x0: u32, y0: u32, rw: u32, rh: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            let inside = (x0..x0 + rw).contains(&x) && (y0..y0 + rh).contains(&y);
            Luma([if inside { 255 } else { 0 }])
        })
    }

    #[test]
    fn area_of_a_square() {
        let square = [
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert_eq!(contour_area(&square), 100.0);
        assert_eq!(contour_area(&square[..2]), 0.0);
    }

    #[test]
    fn finds_one_contour_per_blob() {
        let img = filled_rect(40, 30, 5, 5, 20, 10);
        let contours = find_contours(&img);
        assert_eq!(contours.len(), 1);
        let area = contour_area(&contours[0]);
        // Boundary pixels trace a 19x9 polygon.
        assert!((area - 171.0).abs() < 1e-9, "area {area}");
    }

    #[test]
    fn wide_rectangle_is_horizontal() {
        let img = filled_rect(60, 30, 5, 10, 40, 6);
        let contours = find_contours(&img);
        let o = orientation(&contours[0]).unwrap();
        assert!((o.center.x - 24.5).abs() < 0.5);
        assert!((o.center.y - 12.5).abs() < 0.5);
        let tilt = o.angle.sin().abs();
        assert!(tilt < 1e-6, "angle {}", o.angle);
        assert!(o.eigenvalues[0] > o.eigenvalues[1]);
        assert!(orientation(&[]).is_err());
    }

    #[test]
    fn drawing_marks_center_and_axes() {
        let mut canvas = RgbImage::new(60, 30);
        let img = filled_rect(60, 30, 5, 10, 40, 6);
        let contours = find_contours(&img);
        draw_contour(&mut canvas, &contours[0], CONTOUR_COLOR);
        assert_eq!(*canvas.get_pixel(5, 10), CONTOUR_COLOR);
        let o = orientation(&contours[0]).unwrap();
        draw_orientation(&mut canvas, &o);
        for color in [CENTER_COLOR, MAJOR_AXIS_COLOR, MINOR_AXIS_COLOR] {
            assert!(canvas.pixels().any(|p| *p == color), "{color:?} missing");
        }
    }
}
