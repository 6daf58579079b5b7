
extern crate ndarray as nd;
extern crate na_core;
#[cfg(test)]
#[macro_use]
extern crate approx;

use nd::{Array, ArrayView, ArrayViewMut, Ix1, Ix2, Axis};

use na_core::{Model, check_dim};

pub use error::{Error, Result};

pub mod error;
pub mod rk4;

/// Fails unless `time` is non-empty and strictly increasing.
pub fn check_time_grid(time: ArrayView<f64, Ix1>) -> Result<()> {
  if time.is_empty() {
    return Err(Error::EmptyTimeGrid);
  }

  for i in 1..time.len() {
    // also catches NaN
    if !(time[i] > time[i - 1]) {
      return Err(Error::NotIncreasing { index: i, });
    }
  }

  Ok(())
}

/// Integrates `model` from `y0` over every point of `time` with RK4. Column
/// `i` of the result is the state at `time[i]`; column 0 is `y0`.
pub fn integrate<M>(model: &M,
                    y0: ArrayView<f64, Ix1>,
                    time: ArrayView<f64, Ix1>)
  -> Result<Array<f64, Ix2>>
  where M: Model + ?Sized,
{
  let mut dest = Array::zeros((y0.len(), time.len()));
  integrate_into(model, y0, time, dest.view_mut())?;
  Ok(dest)
}

/// Same as `integrate`, but writes into `dest` (shape `(n, time.len())`).
/// Returns the number of model evaluations.
pub fn integrate_into<M>(model: &M,
                         y0: ArrayView<f64, Ix1>,
                         time: ArrayView<f64, Ix1>,
                         mut dest: ArrayViewMut<f64, Ix2>)
  -> Result<u64>
  where M: Model + ?Sized,
{
  check_dim("initial state", model.dimension(), y0.len())?;
  check_time_grid(time)?;
  check_dim("trajectory rows", y0.len(), dest.nrows())?;
  check_dim("trajectory columns", time.len(), dest.ncols())?;

  dest.column_mut(0).assign(&y0);

  let mut state = rk4::new(time[0], y0.to_owned());
  for (i, mut column) in dest.axis_iter_mut(Axis(1)).enumerate().skip(1) {
    state.step_to(model, time[i]);
    column.assign(state.y());
  }

  Ok(state.total_model_calls())
}
