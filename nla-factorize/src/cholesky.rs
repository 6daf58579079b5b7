use na::{linalg, Dyn};
use nd::{Array, ArrayBase, Data, Ix2};

use crate::{check_square, from_nalgebra, to_dmatrix};
use crate::error::{Error, Result};

pub trait Cholesky {
  /// Factors a symmetric positive definite matrix, `A = L L^T`. Only the
  /// lower triangle is read.
  fn cholesky(&self) -> Result<CholeskyFactor>;
}

impl<S> Cholesky for ArrayBase<S, Ix2>
  where S: Data<Elem = f64>,
{
  fn cholesky(&self) -> Result<CholeskyFactor> {
    let n = check_square(self)?;
    let floor = self.diag()
      .iter()
      .fold(0.0f64, |m, &v| m.max(v.abs()) ) * n as f64 * f64::EPSILON;

    let chol = linalg::Cholesky::new(to_dmatrix(self))
      .ok_or(Error::NotPositiveDefinite)?;

    // pivots which only survived by rounding
    let l = chol.l_dirty();
    if (0..n).any(|k| !(l[(k, k)] * l[(k, k)] > floor) ) {
      return Err(Error::NotPositiveDefinite);
    }

    Ok(CholeskyFactor(chol))
  }
}

#[derive(Clone, Debug)]
pub struct CholeskyFactor(linalg::Cholesky<f64, Dyn>);
impl CholeskyFactor {
  pub fn dim(&self) -> usize { self.0.l_dirty().nrows() }

  /// Solves `A X = B`.
  pub fn solve<S>(&self, b: &ArrayBase<S, Ix2>) -> Result<Array<f64, Ix2>>
    where S: Data<Elem = f64>,
  {
    let n = self.dim();
    if b.nrows() != n {
      return Err(Error::RhsRows { expected: n, actual: b.nrows(), });
    }

    let x = self.0.solve(&to_dmatrix(b));
    Ok(from_nalgebra(&x))
  }
}
