//! Demos over small literal matrices.

use nalgebra::{DMatrix, DVector};

use super::{DemoContext, DemoReport};
use crate::error::{FunsetError, Result};
use crate::linalg::{self, CovarFlags, CovarLayout, NormType, format_mat, mat_from_rows};

const SAMPLES: [&[f64]; 3] = [
    &[1.2, 2.5, 5.6, -2.5],
    &[-3.6, 9.2, 0.5, 7.2],
    &[4.3, 1.3, 9.4, -3.4],
];

const TALL: [&[f64]; 3] = [&[0.68, 0.597], &[-0.211, 0.823], &[0.566, -0.605]];

const SYMMETRIC: [f64; 9] = [1.23, 2.12, -4.2, 2.12, -5.6, 1.79, -4.2, 1.79, -7.3];

const NORM_VECTOR: [f64; 3] = [-2.0, 3.0, 1.0];
const NORM_MATRIX: [f64; 9] = [-3.0, 2.0, 0.0, 5.0, 6.0, 2.0, 7.0, 4.0, 8.0];

const INVERTIBLE: [f64; 16] = [
    5.0, -2.0, 2.0, 7.0, 1.0, 0.0, 0.0, 3.0, -3.0, 1.0, 5.0, 0.0, 3.0, -1.0, -9.0, 4.0,
];

fn samples() -> Result<DMatrix<f64>> {
    mat_from_rows(&SAMPLES)
}

fn vector_line(v: &DVector<f64>) -> String {
    format_mat(&DMatrix::from_column_slice(1, v.len(), v.as_slice()))
}

pub fn calc_covar(_ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("calc_covar");
    let mat = samples()?;
    report.line(format_mat(&mat));

    let flags = CovarFlags {
        layout: CovarLayout::Rows,
        scrambled: false,
        scale: false,
    };
    let (covar, mean) = linalg::calc_covar_matrix(&mat, flags)?;
    report.line("covariance matrix:");
    report.line(format_mat(&covar));
    report.line("mean values: ");
    report.line(format_mat(&mean));
    Ok(report)
}

pub fn mean_std_dev(_ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("mean_std_dev");
    let (mean, stddev) = linalg::mean_std_dev(&samples()?)?;
    report.line(format!("mean: {mean:.6}, stddev: {stddev:.6}"));
    Ok(report)
}

pub fn trace(_ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("trace");
    let trace = linalg::trace(&samples()?);
    report.line(format!("trace: {trace:.6}"));
    Ok(report)
}

pub fn pseudo_inverse(_ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("pseudo_inverse");
    let pinv = linalg::pseudo_inverse(&mat_from_rows(&TALL)?)?;
    report.line("pseudo-inverse:");
    report.line(format_mat(&pinv));
    Ok(report)
}

pub fn svd(_ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("svd");
    let svd = linalg::svd(&mat_from_rows(&TALL)?)?;
    report.line("w:");
    report.line(vector_line(&svd.w));
    report.line("u:");
    report.line(format_mat(&svd.u));
    report.line("vt:");
    report.line(format_mat(&svd.vt));
    Ok(report)
}

pub fn eigen(_ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("eigen");
    let m = DMatrix::from_row_slice(3, 3, &SYMMETRIC);
    let eigen = linalg::eigen(&m)
        .map_err(|e| FunsetError::InvalidArgument(format!("fail to run eigen: {e}")))?;
    report.line("eigen values:");
    report.line(vector_line(&eigen.values));
    report.line("eigen vectors:");
    report.line(format_mat(&eigen.vectors));
    Ok(report)
}

pub fn norm(_ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("norm");
    let vector = DMatrix::from_row_slice(1, NORM_VECTOR.len(), &NORM_VECTOR);
    let matrix = DMatrix::from_row_slice(3, 3, &NORM_MATRIX);
    let kinds = [NormType::Inf, NormType::L1, NormType::L2];

    for kind in kinds {
        report.line(format!("vector: {}: {:.6}", kind.label(), linalg::norm(&vector, kind)));
    }
    for kind in kinds {
        report.line(format!("matrix: {}: {:.6}", kind.label(), linalg::norm(&matrix, kind)));
    }
    Ok(report)
}

pub fn inverse(_ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("inverse");
    let m = linalg::square_from_slice(4, &INVERTIBLE)?;
    let inv = linalg::inverse(&m)?;
    report.line("inverse matrix:");
    report.line(format_mat(&inv));
    Ok(report)
}

pub fn determinant(_ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("determinant");
    let values: Vec<f64> = (0..16).map(|i| (3 + 5 * i) as f64).collect();
    let m = linalg::square_from_slice(4, &values)?;
    let det = linalg::determinant(&m)?;
    report.line(format!("matrix's determinant: {det:.6}"));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> DemoContext {
        DemoContext::default()
    }

    #[test]
    fn norm_reports_all_six_values() {
        let report = norm(&ctx()).unwrap();
        assert_eq!(report.lines.len(), 6);
        assert_eq!(report.lines[0], "vector: Inf: 3.000000");
        assert_eq!(report.lines[1], "vector: L1: 6.000000");
        assert!(report.lines[5].starts_with("matrix: L2: 14.387"));
        assert!(report.written.is_empty());
    }

    #[test]
    fn arithmetic_progression_is_singular() {
        let report = determinant(&ctx()).unwrap();
        let value: f64 = report.lines[0]
            .trim_start_matches("matrix's determinant: ")
            .parse()
            .unwrap();
        assert!(value.abs() < 1e-6);
    }

    #[test]
    fn trace_sums_the_leading_diagonal() {
        let report = trace(&ctx()).unwrap();
        assert_eq!(report.lines, vec!["trace: 19.800000".to_string()]);
    }

    #[test]
    fn every_matrix_demo_succeeds() {
        let demos: [fn(&DemoContext) -> Result<DemoReport>; 6] =
            [calc_covar, mean_std_dev, pseudo_inverse, svd, eigen, inverse];
        for demo in demos {
            let report = demo(&ctx()).unwrap();
            assert!(!report.lines.is_empty());
        }
    }
}
