use nalgebra::{DMatrix, DVector};

use super::decomp::eigen;
use super::stats::{CovarFlags, calc_covar_matrix};
use crate::error::{FunsetError, Result};

/// Principal component analysis over row samples.
#[derive(Debug, Clone)]
pub struct Pca {
    pub mean: DVector<f64>,
    /// Variances along each component, largest first.
    pub eigenvalues: DVector<f64>,
    /// One unit component per row.
    pub eigenvectors: DMatrix<f64>,
}

impl Pca {
    /// Fits the components of `data` (one sample per row).
    ///
    /// `max_components` keeps only the leading components; `None` keeps all.
    pub fn compute(data: &DMatrix<f64>, max_components: Option<usize>) -> Result<Self> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(FunsetError::InvalidArgument("PCA of an empty data set".into()));
        }
        let flags = CovarFlags {
            scale: true,
            ..CovarFlags::default()
        };
        let (covar, mean) = calc_covar_matrix(data, flags)?;
        let decomposition = eigen(&covar)?;

        let keep = max_components
            .unwrap_or(data.ncols())
            .clamp(1, data.ncols());
        Ok(Self {
            mean: DVector::from_row_slice(mean.as_slice()),
            eigenvalues: decomposition.values.rows(0, keep).into_owned(),
            eigenvectors: decomposition.vectors.rows(0, keep).into_owned(),
        })
    }

    pub fn components(&self) -> usize {
        self.eigenvectors.nrows()
    }

    /// Coordinates of each row of `data` in component space.
    pub fn project(&self, data: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        self.check_width(data.ncols())?;
        let centered = DMatrix::from_fn(data.nrows(), data.ncols(), |r, c| {
            data[(r, c)] - self.mean[c]
        });
        Ok(centered * self.eigenvectors.transpose())
    }

    /// Maps component-space rows back to the input space.
    pub fn back_project(&self, coords: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        if coords.ncols() != self.components() {
            return Err(FunsetError::DimensionMismatch(format!(
                "expected {} components, got {}",
                self.components(),
                coords.ncols()
            )));
        }
        let mut out = coords * &self.eigenvectors;
        for r in 0..out.nrows() {
            for c in 0..out.ncols() {
                out[(r, c)] += self.mean[c];
            }
        }
        Ok(out)
    }

    fn check_width(&self, cols: usize) -> Result<()> {
        if cols != self.mean.len() {
            return Err(FunsetError::DimensionMismatch(format!(
                "expected {} columns, got {cols}",
                self.mean.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_points() -> DMatrix<f64> {
        // Points along y = 2x with a little perpendicular spread.
        let pts: Vec<(f64, f64)> = (0..20)
            .map(|i| {
                let t = i as f64;
                let off = if i % 2 == 0 { 0.1 } else { -0.1 };
                (t - 2.0 * off / 5.0_f64.sqrt(), 2.0 * t + off / 5.0_f64.sqrt())
            })
            .collect();
        DMatrix::from_fn(pts.len(), 2, |r, c| if c == 0 { pts[r].0 } else { pts[r].1 })
    }

    #[test]
    fn leading_component_follows_the_line() {
        let pca = Pca::compute(&line_points(), None).unwrap();
        let v = pca.eigenvectors.row(0);
        let angle = v[1].atan2(v[0]);
        let expected = 2.0f64.atan2(1.0);
        let diff = (angle - expected).rem_euclid(std::f64::consts::PI);
        assert!(diff < 1e-2 || (std::f64::consts::PI - diff) < 1e-2);
        assert!(pca.eigenvalues[0] > 100.0 * pca.eigenvalues[1]);
    }

    #[test]
    fn project_back_project_with_all_components() {
        let data = line_points();
        let pca = Pca::compute(&data, None).unwrap();
        let coords = pca.project(&data).unwrap();
        let back = pca.back_project(&coords).unwrap();
        assert!((back - data).abs().max() < 1e-9);
    }

    #[test]
    fn truncation_and_errors() {
        let pca = Pca::compute(&line_points(), Some(1)).unwrap();
        assert_eq!(pca.components(), 1);
        assert!(pca.project(&DMatrix::zeros(2, 3)).is_err());
        assert!(Pca::compute(&DMatrix::zeros(0, 2), None).is_err());
    }
}
