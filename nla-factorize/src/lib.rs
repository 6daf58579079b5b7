extern crate nalgebra as na;
extern crate ndarray as nd;
#[cfg(test)]
#[macro_use]
extern crate approx;

use na::{DMatrix, Dyn, Matrix};
use na::storage::RawStorage;
use nd::{Array, ArrayBase, Data, Ix2};

pub use cholesky::{Cholesky, CholeskyFactor};
pub use error::{Error, Result};
pub use sqrt::semidefinite_factor;

pub mod cholesky;
pub mod error;
pub mod sqrt;

fn to_dmatrix<S>(a: &ArrayBase<S, Ix2>) -> DMatrix<f64>
  where S: Data<Elem = f64>,
{
  DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]] )
}

fn from_nalgebra<S>(m: &Matrix<f64, Dyn, Dyn, S>) -> Array<f64, Ix2>
  where S: RawStorage<f64, Dyn, Dyn>,
{
  Array::from_shape_fn(m.shape(), |(i, j)| m[(i, j)] )
}

fn check_square<S>(a: &ArrayBase<S, Ix2>) -> Result<usize>
  where S: Data<Elem = f64>,
{
  let (m, n) = a.dim();
  if m != n {
    return Err(Error::NotSquare { rows: m, cols: n, });
  }
  if a.iter().any(|v| !v.is_finite() ) {
    return Err(Error::NotFinite);
  }

  Ok(n)
}
