use na::linalg::SymmetricEigen;
use nd::{Array, ArrayBase, Data, Ix2};

use crate::{check_square, from_nalgebra, to_dmatrix};
use crate::error::{Error, Result};

const MAX_SWEEPS: usize = 1000;

/// `S` with `S S^T = A`, for a symmetric positive semi-definite `A`, from
/// the eigendecomposition: `S = V sqrt(Lambda)`. Eigenvalues within rounding
/// of zero count as zero, so a zero (or rank deficient) covariance still has
/// a factor; that is what sampling from `N(0, A)` needs.
pub fn semidefinite_factor<S>(a: &ArrayBase<S, Ix2>) -> Result<Array<f64, Ix2>>
  where S: Data<Elem = f64>,
{
  let n = check_square(a)?;

  let eigen = SymmetricEigen::try_new(to_dmatrix(a), f64::EPSILON, MAX_SWEEPS)
    .ok_or(Error::NoConvergence)?;

  let lambda = eigen.eigenvalues;
  let max = lambda.iter()
    .fold(0.0f64, |m, &v| m.max(v.abs()) );
  let floor = max * n as f64 * f64::EPSILON.sqrt();
  if let Some(&min) = lambda.iter().find(|&&v| v < -floor ) {
    return Err(Error::Indefinite { eigenvalue: min, });
  }

  let mut s = eigen.eigenvectors;
  for (mut col, &l) in s.column_iter_mut().zip(lambda.iter()) {
    col *= l.max(0.0).sqrt();
  }

  Ok(from_nalgebra(&s))
}

#[cfg(test)]
mod test {
  use super::*;
  use nd::{arr2, Array2};

  fn assert_reproduces(a: &Array2<f64>) {
    let s = semidefinite_factor(a).unwrap();
    let back = s.dot(&s.t());
    for (s, e) in back.iter().zip(a.iter()) {
      assert_abs_diff_eq!(*s, *e, epsilon = 1e-12);
    }
  }

  #[test]
  fn diagonal() {
    assert_reproduces(&arr2(&[
      [4.0, 0.0, 0.0],
      [0.0, 0.0, 0.0],
      [0.0, 0.0, 9.0],
    ]));
  }

  #[test]
  fn full_rank() {
    assert_reproduces(&arr2(&[
      [4.0, 12.0, -16.0],
      [12.0, 37.0, -43.0],
      [-16.0, -43.0, 98.0],
    ]));
  }

  #[test]
  fn rank_deficient() {
    assert_reproduces(&arr2(&[
      [1.0, 2.0, 0.0],
      [2.0, 4.0, 0.0],
      [0.0, 0.0, 2.0],
    ]));
  }

  #[test]
  fn zero_matrix_has_zero_factor() {
    let z: Array2<f64> = Array2::zeros((3, 3));
    let s = semidefinite_factor(&z).unwrap();
    assert!(s.iter().all(|&v| v == 0.0));
  }

  #[test]
  fn rejects_indefinite() {
    let a = arr2(&[
      [1.0, 0.0],
      [0.0, -1.0],
    ]);
    match semidefinite_factor(&a) {
      Err(Error::Indefinite { eigenvalue }) => {
        assert_abs_diff_eq!(eigenvalue, -1.0, epsilon = 1e-12);
      },
      r => panic!("unexpected {:?}", r),
    }

    let a: Array2<f64> = Array2::zeros((3, 2));
    assert_eq!(semidefinite_factor(&a), Err(Error::NotSquare { rows: 3, cols: 2 }));
  }
}
