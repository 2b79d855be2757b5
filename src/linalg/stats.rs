use nalgebra::DMatrix;

use crate::error::{FunsetError, Result};

/// Which axis of the input holds the samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CovarLayout {
    /// One sample per row.
    #[default]
    Rows,
    /// One sample per column.
    Cols,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CovarFlags {
    pub layout: CovarLayout,
    /// Produce the `n x n` sample-space matrix instead of the `d x d` one.
    pub scrambled: bool,
    /// Divide by the number of samples.
    pub scale: bool,
}

/// Covariance of a sample set, returned together with the mean sample.
///
/// With row layout the mean is `1 x d`; with column layout it is `d x 1`.
pub fn calc_covar_matrix(
    samples: &DMatrix<f64>,
    flags: CovarFlags,
) -> Result<(DMatrix<f64>, DMatrix<f64>)> {
    if samples.is_empty() {
        return Err(FunsetError::InvalidArgument(
            "covariance of an empty sample set".into(),
        ));
    }

    let (rows, cols) = samples.shape();
    let (mean, centered) = match flags.layout {
        CovarLayout::Rows => {
            let mean = DMatrix::from_fn(1, cols, |_, c| samples.column(c).mean());
            let centered = DMatrix::from_fn(rows, cols, |r, c| samples[(r, c)] - mean[(0, c)]);
            (mean, centered)
        }
        CovarLayout::Cols => {
            let mean = DMatrix::from_fn(rows, 1, |r, _| samples.row(r).mean());
            let centered = DMatrix::from_fn(rows, cols, |r, c| samples[(r, c)] - mean[(r, 0)]);
            (mean, centered)
        }
    };

    let sample_space = match flags.layout {
        CovarLayout::Rows => flags.scrambled,
        CovarLayout::Cols => !flags.scrambled,
    };
    let mut covar = if sample_space {
        &centered * centered.transpose()
    } else {
        centered.transpose() * &centered
    };

    if flags.scale {
        let n = match flags.layout {
            CovarLayout::Rows => samples.nrows(),
            CovarLayout::Cols => samples.ncols(),
        };
        covar /= n as f64;
    }

    Ok((covar, mean))
}

/// Mean and population standard deviation over every element.
pub fn mean_std_dev(m: &DMatrix<f64>) -> Result<(f64, f64)> {
    if m.is_empty() {
        return Err(FunsetError::InvalidArgument("mean of an empty matrix".into()));
    }
    let n = m.len() as f64;
    let mean = m.sum() / n;
    let var = m.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Ok((mean, var.sqrt()))
}

/// Sum of the main diagonal; rectangular matrices use `min(rows, cols)`.
pub fn trace(m: &DMatrix<f64>) -> f64 {
    (0..m.nrows().min(m.ncols())).map(|i| m[(i, i)]).sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormType {
    Inf,
    L1,
    L2,
    L2Sqr,
}

impl NormType {
    pub fn label(self) -> &'static str {
        match self {
            NormType::Inf => "Inf",
            NormType::L1 => "L1",
            NormType::L2 => "L2",
            NormType::L2Sqr => "L2Sqr",
        }
    }
}

/// Element-wise norm, treating the matrix as one flat vector.
pub fn norm(m: &DMatrix<f64>, kind: NormType) -> f64 {
    match kind {
        NormType::Inf => m.iter().fold(0.0f64, |acc, v| acc.max(v.abs())),
        NormType::L1 => m.iter().map(|v| v.abs()).sum(),
        NormType::L2 => m.iter().map(|v| v * v).sum::<f64>().sqrt(),
        NormType::L2Sqr => m.iter().map(|v| v * v).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::mat_from_rows;

    fn literal() -> DMatrix<f64> {
        mat_from_rows(&[
            &[1.2, 2.5, 5.6, -2.5],
            &[-3.6, 9.2, 0.5, 7.2],
            &[4.3, 1.3, 9.4, -3.4],
        ])
        .unwrap()
    }

    #[test]
    fn covar_rows_normal() {
        let (covar, mean) = calc_covar_matrix(&literal(), CovarFlags::default()).unwrap();
        assert_eq!(covar.shape(), (4, 4));
        assert_eq!(mean.shape(), (1, 4));
        assert!((mean[(0, 0)] - 0.633_333).abs() < 1e-5);
        assert!((covar[(0, 0)] - 31.686_667).abs() < 1e-4);
        assert!((&covar - covar.transpose()).abs().max() < 1e-12);
    }

    #[test]
    fn covar_scrambled_and_scaled() {
        let flags = CovarFlags {
            scrambled: true,
            scale: true,
            ..CovarFlags::default()
        };
        let (covar, _) = calc_covar_matrix(&literal(), flags).unwrap();
        assert_eq!(covar.shape(), (3, 3));

        let (cols_covar, cols_mean) = calc_covar_matrix(
            &literal().transpose(),
            CovarFlags {
                layout: CovarLayout::Cols,
                scale: true,
                ..CovarFlags::default()
            },
        )
        .unwrap();
        assert_eq!(cols_mean.shape(), (4, 1));
        let (rows_covar, _) = calc_covar_matrix(
            &literal(),
            CovarFlags {
                scale: true,
                ..CovarFlags::default()
            },
        )
        .unwrap();
        assert!((cols_covar - rows_covar).abs().max() < 1e-12);
    }

    #[test]
    fn mean_and_stddev() {
        let m = mat_from_rows(&[&[2.0, 4.0], &[4.0, 6.0]]).unwrap();
        let (mean, sd) = mean_std_dev(&m).unwrap();
        assert_eq!(mean, 4.0);
        assert!((sd - 2.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn trace_of_rectangular() {
        assert!((trace(&literal()) - (1.2 + 9.2 + 9.4)).abs() < 1e-12);
    }

    #[test]
    fn vector_norms() {
        let v = mat_from_rows(&[&[-2.0, 3.0, 1.0]]).unwrap();
        assert_eq!(norm(&v, NormType::Inf), 3.0);
        assert_eq!(norm(&v, NormType::L1), 6.0);
        assert!((norm(&v, NormType::L2) - 14.0f64.sqrt()).abs() < 1e-12);
        assert_eq!(norm(&v, NormType::L2Sqr), 14.0);
    }
}
