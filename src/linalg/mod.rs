//! Dense matrix routines on `nalgebra::DMatrix<f64>`.

pub mod decomp;
pub mod pca;
pub mod stats;

pub use decomp::{Eigen, Svd, determinant, eigen, inverse, pseudo_inverse, svd};
pub use pca::Pca;
pub use stats::{
    CovarFlags, CovarLayout, NormType, calc_covar_matrix, mean_std_dev, norm, trace,
};

use nalgebra::DMatrix;

use crate::error::{FunsetError, Result};

/// Builds a matrix from row slices; every row must have the same length.
pub fn mat_from_rows(rows: &[&[f64]]) -> Result<DMatrix<f64>> {
    let cols = rows.first().map(|r| r.len()).unwrap_or(0);
    if let Some(bad) = rows.iter().position(|r| r.len() != cols) {
        return Err(FunsetError::DimensionMismatch(format!(
            "row {bad} has {} columns, expected {cols}",
            rows[bad].len()
        )));
    }
    Ok(DMatrix::from_fn(rows.len(), cols, |r, c| rows[r][c]))
}

/// Builds a square matrix from a row-major buffer of length `n * n`.
pub fn square_from_slice(n: usize, data: &[f64]) -> Result<DMatrix<f64>> {
    if data.len() != n * n {
        return Err(FunsetError::DimensionMismatch(format!(
            "vec must be N^2: got {} values for N = {n}",
            data.len()
        )));
    }
    Ok(DMatrix::from_row_slice(n, n, data))
}

/// Formats a matrix as `[a, b;\n c, d]`.
pub fn format_mat(m: &DMatrix<f64>) -> String {
    let rows: Vec<String> = (0..m.nrows())
        .map(|r| {
            (0..m.ncols())
                .map(|c| format!("{}", m[(r, c)]))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect();
    format!("[{}]", rows.join(";\n "))
}

pub(crate) fn require_square(m: &DMatrix<f64>, what: &str) -> Result<()> {
    if !m.is_square() {
        return Err(FunsetError::DimensionMismatch(format!(
            "{what} needs a square matrix, got {}x{}",
            m.nrows(),
            m.ncols()
        )));
    }
    Ok(())
}
