use cv_funset::FunsetError;
use cv_funset::linalg::{self, Pca, mat_from_rows, square_from_slice};
use nalgebra::DMatrix;

fn close(a: &DMatrix<f64>, b: &DMatrix<f64>, tol: f64) -> bool {
    a.shape() == b.shape() && a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < tol)
}

#[test]
fn pseudo_inverse_is_a_left_inverse_of_a_tall_matrix() {
    let a = mat_from_rows(&[&[0.68, 0.597], &[-0.211, 0.823], &[0.566, -0.605]]).unwrap();
    let pinv = linalg::pseudo_inverse(&a).unwrap();
    assert_eq!(pinv.shape(), (2, 3));
    assert!(close(&(&pinv * &a), &DMatrix::identity(2, 2), 1e-9));

    let svd = linalg::svd(&a).unwrap();
    assert!(svd.w[0] >= svd.w[1]);
    assert!(close(&svd.reconstruct(), &a, 1e-9));
}

#[test]
fn inverse_round_trips_and_singular_input_fails() {
    let data = [
        5.0, -2.0, 2.0, 7.0, 1.0, 0.0, 0.0, 3.0, -3.0, 1.0, 5.0, 0.0, 3.0, -1.0, -9.0, 4.0,
    ];
    let m = square_from_slice(4, &data).unwrap();
    let inv = linalg::inverse(&m).unwrap();
    assert!(close(&(&m * &inv), &DMatrix::identity(4, 4), 1e-9));
    assert!((linalg::determinant(&m).unwrap() - 88.0).abs() < 1e-9);

    let singular = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
    assert!(matches!(linalg::inverse(&singular), Err(FunsetError::Singular(_))));
    assert!(matches!(
        square_from_slice(3, &data),
        Err(FunsetError::DimensionMismatch(_))
    ));
}

#[test]
fn eigenvectors_diagonalize_a_symmetric_matrix() {
    let m = DMatrix::from_row_slice(
        3,
        3,
        &[1.23, 2.12, -4.2, 2.12, -5.6, 1.79, -4.2, 1.79, -7.3],
    );
    let e = linalg::eigen(&m).unwrap();
    for i in 0..3 {
        let v = e.vectors.row(i).transpose();
        let mv = &m * &v;
        let lv = &v * e.values[i];
        assert!(mv.iter().zip(lv.iter()).all(|(a, b)| (a - b).abs() < 1e-9));
    }
    assert!(e.values[0] >= e.values[1] && e.values[1] >= e.values[2]);
}

#[test]
fn pca_on_a_line_has_one_dominant_component() {
    let data = DMatrix::from_fn(20, 2, |r, c| if c == 0 { r as f64 } else { 2.0 * r as f64 + 1.0 });
    let pca = Pca::compute(&data, None).unwrap();
    assert!(pca.eigenvalues[1].abs() < 1e-9);
    let coords = pca.project(&data).unwrap();
    let back = pca.back_project(&coords).unwrap();
    assert!(close(&back, &data, 1e-9));
}
