use nalgebra::{DMatrix, DVector, SymmetricEigen};

use super::require_square;
use crate::error::{FunsetError, Result};

/// Thin singular value decomposition `m = u * diag(w) * vt`.
#[derive(Debug, Clone)]
pub struct Svd {
    /// Singular values, largest first.
    pub w: DVector<f64>,
    pub u: DMatrix<f64>,
    pub vt: DMatrix<f64>,
}

impl Svd {
    pub fn reconstruct(&self) -> DMatrix<f64> {
        &self.u * DMatrix::from_diagonal(&self.w) * &self.vt
    }
}

pub fn svd(m: &DMatrix<f64>) -> Result<Svd> {
    if m.is_empty() {
        return Err(FunsetError::InvalidArgument("SVD of an empty matrix".into()));
    }
    let decomposition = m.clone().svd(true, true);
    let u = decomposition
        .u
        .ok_or_else(|| FunsetError::InvalidArgument("SVD did not produce U".into()))?;
    let vt = decomposition
        .v_t
        .ok_or_else(|| FunsetError::InvalidArgument("SVD did not produce Vt".into()))?;
    let values = decomposition.singular_values;

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let w = DVector::from_fn(order.len(), |i, _| values[order[i]]);
    let u = DMatrix::from_fn(u.nrows(), order.len(), |r, c| u[(r, order[c])]);
    let vt = DMatrix::from_fn(order.len(), vt.ncols(), |r, c| vt[(order[r], c)]);
    Ok(Svd { w, u, vt })
}

/// Moore-Penrose pseudo-inverse through the SVD.
///
/// Singular values below `eps * max(rows, cols) * sigma_max` count as zero.
pub fn pseudo_inverse(m: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let Svd { w, u, vt } = svd(m)?;
    let sigma_max = w.iter().cloned().fold(0.0, f64::max);
    let tolerance = f64::EPSILON * m.nrows().max(m.ncols()) as f64 * sigma_max;
    let inv_w = DVector::from_fn(w.len(), |i, _| {
        if w[i] > tolerance { 1.0 / w[i] } else { 0.0 }
    });
    Ok(vt.transpose() * DMatrix::from_diagonal(&inv_w) * u.transpose())
}

/// Eigen decomposition of a symmetric matrix.
#[derive(Debug, Clone)]
pub struct Eigen {
    /// Eigenvalues, largest first.
    pub values: DVector<f64>,
    /// One eigenvector per row, in the order of `values`.
    pub vectors: DMatrix<f64>,
}

pub fn eigen(m: &DMatrix<f64>) -> Result<Eigen> {
    require_square(m, "eigen")?;
    let scale = m.iter().fold(1.0f64, |acc, v| acc.max(v.abs()));
    if (m - m.transpose()).iter().any(|d| d.abs() > 1e-9 * scale) {
        return Err(FunsetError::InvalidArgument(
            "eigen needs a symmetric matrix".into(),
        ));
    }

    let decomposition = SymmetricEigen::new(m.clone());
    let n = decomposition.eigenvalues.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        decomposition.eigenvalues[b].total_cmp(&decomposition.eigenvalues[a])
    });

    let values = DVector::from_fn(n, |i, _| decomposition.eigenvalues[order[i]]);
    let vectors = DMatrix::from_fn(n, n, |r, c| decomposition.eigenvectors[(c, order[r])]);
    Ok(Eigen { values, vectors })
}

pub fn inverse(m: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    require_square(m, "inverse")?;
    m.clone()
        .try_inverse()
        .ok_or_else(|| FunsetError::Singular(format!("{}x{} matrix has no inverse", m.nrows(), m.ncols())))
}

pub fn determinant(m: &DMatrix<f64>) -> Result<f64> {
    require_square(m, "determinant")?;
    Ok(m.determinant())
}
