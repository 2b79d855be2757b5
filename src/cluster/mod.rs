//! K-means clustering and synthetic sample generation.

pub mod kmeans;

pub use kmeans::{KMeansInit, KMeansResult, TermCriteria, kmeans};

use nalgebra::DMatrix;
use rand::Rng;
use rand::seq::SliceRandom;
use rand_distr::{Distribution, Normal};

use crate::error::{FunsetError, Result};

/// Draws `count` 2-D points from `clusters` Gaussian blobs on a `width x height` canvas.
///
/// Points are split evenly between blobs, with the last blob taking the
/// remainder. Each blob has a uniformly placed center and a standard
/// deviation of `sigma_frac` times the canvas size on each axis. The
/// returned points are shuffled.
pub fn sample_gaussian_blobs<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    clusters: usize,
    width: u32,
    height: u32,
    sigma_frac: f64,
) -> Result<Vec<[f64; 2]>> {
    if clusters == 0 || clusters > count {
        return Err(FunsetError::InvalidArgument(format!(
            "cannot split {count} samples into {clusters} clusters"
        )));
    }
    if width == 0 || height == 0 {
        return Err(FunsetError::InvalidArgument("canvas must be non-empty".into()));
    }

    let mut points = Vec::with_capacity(count);
    for k in 0..clusters {
        let cx = rng.gen_range(0..width) as f64;
        let cy = rng.gen_range(0..height) as f64;
        let nx = Normal::new(cx, width as f64 * sigma_frac)
            .map_err(|e| FunsetError::InvalidArgument(format!("bad x spread: {e}")))?;
        let ny = Normal::new(cy, height as f64 * sigma_frac)
            .map_err(|e| FunsetError::InvalidArgument(format!("bad y spread: {e}")))?;

        let start = k * count / clusters;
        let end = if k == clusters - 1 {
            count
        } else {
            (k + 1) * count / clusters
        };
        for _ in start..end {
            points.push([nx.sample(rng), ny.sample(rng)]);
        }
    }
    points.shuffle(rng);
    Ok(points)
}

/// Stacks 2-D points into an `n x 2` sample matrix.
pub fn points_to_matrix(points: &[[f64; 2]]) -> DMatrix<f64> {
    DMatrix::from_fn(points.len(), 2, |r, c| points[r][c])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn blob_sampling_is_reproducible() {
        let a = sample_gaussian_blobs(&mut StdRng::seed_from_u64(12345), 100, 3, 500, 500, 0.05)
            .unwrap();
        let b = sample_gaussian_blobs(&mut StdRng::seed_from_u64(12345), 100, 3, 500, 500, 0.05)
            .unwrap();
        assert_eq!(a.len(), 100);
        assert_eq!(a, b);
    }

    #[test]
    fn blob_sampling_rejects_more_clusters_than_points() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(sample_gaussian_blobs(&mut rng, 2, 3, 10, 10, 0.05).is_err());
        assert!(sample_gaussian_blobs(&mut rng, 5, 0, 10, 10, 0.05).is_err());
    }

    #[test]
    fn matrix_layout() {
        let m = points_to_matrix(&[[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(m.shape(), (2, 2));
        assert_eq!(m[(1, 0)], 3.0);
    }
}
