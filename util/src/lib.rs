
extern crate ndarray as nd;
extern crate rand;
extern crate pbr;
extern crate na_core;
extern crate na_discrete_filtering as na_df;
extern crate na_quadrature as na_q;
extern crate nla_factorize as nla;

#[cfg(test)]
#[macro_use]
extern crate approx;
#[cfg(test)]
extern crate rand_isaac;

use nd::{Array, ArrayView, Ix1, Ix2, Axis};

use na_core::check_dim;

pub mod data;
pub mod progress;

pub trait ModelTruth<E> {
  /// `(n, time points)`
  fn truth(&self) -> ArrayView<E, Ix2>;
  /// `(p, cycles)`
  fn observations(&self) -> ArrayView<E, Ix2>;
}

/// Root mean square error of each column of `estimate` against the same
/// column of `truth`.
pub fn rmse(estimate: ArrayView<f64, Ix2>,
            truth: ArrayView<f64, Ix2>) -> na_core::Result<Array<f64, Ix1>> {
  check_dim("estimate rows", truth.nrows(), estimate.nrows())?;
  check_dim("estimate columns", truth.ncols(), estimate.ncols())?;

  let n = truth.nrows() as f64;
  let out = (&estimate - &truth)
    .mapv_into(|v| v * v )
    .sum_axis(Axis(0))
    .mapv_into(|v| (v / n).sqrt() );

  Ok(out)
}

#[cfg(test)]
mod test {
  use super::*;
  use nd::arr2;

  #[test]
  fn rmse_per_column() {
    let t = arr2(&[
      [0.0, 1.0],
      [0.0, 1.0],
    ]);
    let e = arr2(&[
      [3.0, 1.0],
      [-4.0, 1.0],
    ]);
    let r = rmse(e.view(), t.view()).unwrap();
    assert_abs_diff_eq!(r[0], (12.5f64).sqrt(), epsilon = 1e-12);
    assert_eq!(r[1], 0.0);
  }

  #[test]
  fn rmse_shape_mismatch() {
    let t = Array::<f64, Ix2>::zeros((3, 4));
    let e = Array::<f64, Ix2>::zeros((3, 5));
    assert!(rmse(e.view(), t.view()).is_err());
  }
}
