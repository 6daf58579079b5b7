
#[macro_use]
extern crate log;
#[macro_use]
extern crate ndarray as nd;
extern crate ndarray_rand as nd_rand;
extern crate rand;
extern crate rayon;
extern crate na_core;
extern crate na_quadrature as na_q;
extern crate nla_factorize as nla;

#[cfg(test)]
#[macro_use]
extern crate approx;
#[cfg(test)]
extern crate rand_isaac;

use nd::{ArrayBase, ArrayViewMut, Data, Ix1, Ix2, Axis};
use rand::Rng;

pub use na_core::{Model, ModelStats, Operator};
pub use error::{Result, Error};

pub mod ensemble;
pub mod error;
pub mod kalman;
pub mod utils;

/// Source of the observation for each assimilation cycle.
pub trait Observer<E> {
  fn observation_dim(&self) -> usize;
  /// Number of assimilation cycles this observer can serve.
  fn observation_count(&self) -> usize;
  /// Returns false if there is no observation for `idx`.
  fn observe_into(&self, idx: u64,
                  out: ArrayViewMut<E, Ix1>) -> bool;
}

/// Observations stored one column per assimilation cycle.
impl<S> Observer<f64> for ArrayBase<S, Ix2>
  where S: Data<Elem = f64>,
{
  fn observation_dim(&self) -> usize { self.nrows() }
  fn observation_count(&self) -> usize { self.ncols() }
  fn observe_into(&self, idx: u64,
                  mut out: ArrayViewMut<f64, Ix1>) -> bool {
    let idx = idx as usize;
    if idx >= self.ncols() || out.len() != self.nrows() {
      return false;
    }

    out.assign(&self.index_axis(Axis(1), idx));
    true
  }
}

pub trait Workspace<I>: Sized {
  fn alloc<R>(i: I, rand: &mut R, total_steps: u64) -> Result<Self>
    where R: Rng;
}

pub trait Algorithm<M, Ob>: Sized
  where M: Model,
        Ob: Observer<f64>,
{
  type Init;
  type WS;

  /// Validates `i` against the model and observer.
  fn init(i: &Self::Init,
          model: &ModelStats<M>,
          observer: &Ob,
          total_steps: u64) -> Result<Self>;

  fn next_step<R>(&self,
                  current_step: u64,
                  total_steps: u64,
                  rand: &mut R,
                  workspace: &mut Self::WS,
                  model: &mut ModelStats<M>,
                  observer: &Ob)
                  -> Result<()>
    where R: Rng;
}
