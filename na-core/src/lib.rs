
extern crate ndarray as nd;
extern crate num_traits;

use nd::prelude::*;
use nd::linalg::general_mat_vec_mul;
use nd::{Data, LinalgScalar};

use num_traits::{One, Zero};

pub use error::{Result, Error, check_dim};

pub mod error;

/// The right hand side of a first order ODE system, `y' = f(t, y)`.
pub trait Model: Send + Sync {
  /// Length of the state vector.
  fn dimension(&self) -> usize;
  fn run_model(&self, t: f64,
               y: ArrayView<f64, Ix1>,
               yp: ArrayViewMut<f64, Ix1>);
}
impl<'a, M> Model for &'a M
  where M: Model + ?Sized,
{
  fn dimension(&self) -> usize { (**self).dimension() }
  fn run_model(&self, t: f64,
               y: ArrayView<f64, Ix1>,
               yp: ArrayViewMut<f64, Ix1>) {
    (**self).run_model(t, y, yp)
  }
}

#[derive(Debug, Clone)]
pub struct ModelStats<M> {
  pub model: M,
  pub calls: u64,
}
impl<M> From<M> for ModelStats<M> {
  fn from(v: M) -> ModelStats<M> {
    ModelStats {
      model: v,
      calls: 0,
    }
  }
}

pub trait Operator<E>: Send + Sync {
  fn operator_input_dim(&self) -> usize;
  fn operator_output_dim(&self) -> usize;
  fn eval_at(&self, x: ArrayView<E, Ix1>,
             out: ArrayViewMut<E, Ix1>) -> Result<()>;
}

impl<D, E> Operator<E> for ArrayBase<D, Ix2>
  where D: Data<Elem = E> + Send + Sync,
        E: LinalgScalar + Send + Sync,
{
  fn operator_input_dim(&self) -> usize { self.ncols() }
  fn operator_output_dim(&self) -> usize { self.nrows() }
  fn eval_at(&self, x: ArrayView<E, Ix1>,
             mut out: ArrayViewMut<E, Ix1>) -> Result<()> {
    check_dim("operator input", self.ncols(), x.len())?;
    check_dim("operator output", self.nrows(), out.len())?;

    general_mat_vec_mul(One::one(),
                        self, &x, Zero::zero(),
                        &mut out);

    Ok(())
  }
}

/// Builds the 0/1 selection matrix which picks `components` (in order) out
/// of a state vector of length `n`.
pub fn observation_operator(components: &[usize], n: usize) -> Result<Array<f64, Ix2>> {
  let mut h = Array::zeros((components.len(), n));
  for (row, &c) in components.iter().enumerate() {
    if c >= n {
      return Err(Error::ComponentIndex {
        index: c,
        dimension: n,
      });
    }
    h[[row, c]] = 1.0;
  }

  Ok(h)
}
