use nd::{Array, ArrayView, Ix1, Ix2, Axis};
use rand::Rng;

use na_core::{check_dim, Model, Operator};
use na_df::{Error, Result};
use na_df::utils::make_2d_randn;
use na_q::integrate;
use nla::semidefinite_factor;

use crate::ModelTruth;

/// A true trajectory and the noisy observations drawn from it.
#[derive(Clone, Debug)]
pub struct Data {
  pub time: Array<f64, Ix1>,
  /// `(n, time.len())`
  pub truth: Array<f64, Ix2>,
  /// Time of each observation column; every `gap`th point of `time`.
  pub observation_times: Array<f64, Ix1>,
  /// `(p, cycles)`
  pub observations: Array<f64, Ix2>,
}

impl ModelTruth<f64> for Data {
  fn truth(&self) -> ArrayView<f64, Ix2> { self.truth.view() }
  fn observations(&self) -> ArrayView<f64, Ix2> { self.observations.view() }
}

/// Integrates `model` from `x0` over `time`, then observes the truth every
/// `gap` steps (never at `time[0]`): `y_k = H x(t_k) + S eta`, `S S^T = R`.
pub fn generate_model_truth_and_observation<M, Op, R>(model: &M,
                                                      x0: ArrayView<f64, Ix1>,
                                                      time: ArrayView<f64, Ix1>,
                                                      gap: usize,
                                                      obs_op: &Op,
                                                      obs_covariance: ArrayView<f64, Ix2>,
                                                      rand: &mut R)
  -> Result<Data>
  where M: Model + ?Sized,
        Op: Operator<f64>,
        R: Rng,
{
  if gap == 0 {
    return Err(Error::Schedule("gap must be at least one step"));
  }

  let truth = integrate(model, x0, time)?;

  let p = obs_op.operator_output_dim();
  check_dim("observation covariance rows", p, obs_covariance.nrows())?;
  check_dim("observation covariance columns", p, obs_covariance.ncols())?;
  let factor = semidefinite_factor(&obs_covariance)?;

  let cycles = (time.len() - 1) / gap;
  let noise = make_2d_randn(cycles, &factor, rand);

  let mut observations = Array::zeros((p, cycles));
  let mut observation_times = Array::zeros(cycles);
  for (k, (mut obs, noise)) in observations.axis_iter_mut(Axis(1))
    .zip(noise.axis_iter(Axis(0)))
    .enumerate()
  {
    let idx = (k + 1) * gap;
    obs_op.eval_at(truth.column(idx), obs.view_mut())?;
    obs += &noise;
    observation_times[k] = time[idx];
  }

  Ok(Data {
    time: time.to_owned(),
    truth: truth,
    observation_times: observation_times,
    observations: observations,
  })
}
