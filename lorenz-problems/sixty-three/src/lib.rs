
#[macro_use]
extern crate log;
extern crate ndarray as nd;
extern crate rand;
extern crate na_core;
extern crate na_discrete_filtering as na_df;
extern crate na_quadrature as na_q;
extern crate util;

#[cfg(test)]
#[macro_use]
extern crate approx;
#[cfg(test)]
extern crate rand_isaac;

use nd::prelude::*;
use rand::Rng;

use na_core::observation_operator;
use na_df::{Model, ModelStats};
use na_df::ensemble::StateSteps;
use na_df::kalman::{enkf, EnsembleInit, Schedule};
use na_q::integrate;
use util::ModelTruth;
use util::data::{generate_model_truth_and_observation, Data};

/// Lorenz (1963):
///
/// ```text
/// dX/dt = -Pr (X - Y)
/// dY/dt = -X Z + r X - Y
/// dZ/dt =  X Y - b Z
/// ```
#[derive(Debug, Clone)]
pub struct L63Model {
  /// Pr
  pub prandtl: f64,
  /// r
  pub rayleigh: f64,
  /// b
  pub beta: f64,
}
impl Model for L63Model {
  fn dimension(&self) -> usize { 3 }
  fn run_model(&self, _: f64,
               y: ArrayView<f64, Ix1>,
               mut yp: ArrayViewMut<f64, Ix1>) {
    debug_assert!(y.len() == 3);
    debug_assert!(yp.len() == 3);

    yp[0] = -self.prandtl * (y[0] - y[1]);
    yp[1] = -y[0] * y[2] + self.rayleigh * y[0] - y[1];
    yp[2] = y[0] * y[1] - self.beta * y[2];
  }
}
impl Default for L63Model {
  fn default() -> Self {
    L63Model {
      prandtl: 10.0,
      rayleigh: 28.0,
      beta: 8.0 / 3.0,
    }
  }
}

/// RK4 trajectory of `model` from `x0`, one column per entry of `time`.
pub fn forward_model(x0: ArrayView<f64, Ix1>,
                     time: ArrayView<f64, Ix1>,
                     model: &L63Model) -> na_q::Result<Array<f64, Ix2>> {
  integrate(model, x0, time)
}

/// Twin experiment parameters: a truth run from `true_initial`, observed
/// every `gap` steps, assimilated by an ensemble started around
/// `initial_mean`.
#[derive(Debug, Clone)]
pub struct L63Setup {
  pub model: L63Model,
  pub initial_time: f64,
  pub dt: f64,
  pub gap: usize,
  pub cycles: usize,
  pub true_initial: Array<f64, Ix1>,
  pub initial_mean: Array<f64, Ix1>,
  pub initial_covariance: Array<f64, Ix2>,
  /// Observed state components.
  pub observed: Vec<usize>,
  pub observation_covariance: Array<f64, Ix2>,
  pub ensemble_count: usize,
}
impl Default for L63Setup {
  fn default() -> L63Setup {
    L63Setup {
      model: Default::default(),
      initial_time: 0.0,
      dt: 0.01,
      gap: 10,
      cycles: 100,
      true_initial: arr1(&[0.0, 1.0, 0.0]),
      initial_mean: arr1(&[1.0, 2.0, 1.0]),
      initial_covariance: Array::eye(3) * 2.0,
      observed: vec![0, 2],
      observation_covariance: Array::eye(2) * 2.0,
      ensemble_count: 20,
    }
  }
}
impl L63Setup {
  pub fn steps(&self) -> usize { self.cycles * self.gap }

  /// Integration grid of the whole run.
  pub fn time(&self) -> Array<f64, Ix1> {
    let steps = self.steps();
    Array::linspace(self.initial_time,
                    self.initial_time + steps as f64 * self.dt,
                    steps + 1)
  }

  /// Runs the truth and draws its observations.
  pub fn generate<R>(&self, rand: &mut R) -> na_df::Result<L63Experiment>
    where R: Rng,
  {
    let h = observation_operator(&self.observed[..], 3)?;
    let time = self.time();
    let data = generate_model_truth_and_observation(&self.model,
                                                    self.true_initial.view(),
                                                    time.view(),
                                                    self.gap,
                                                    &h,
                                                    self.observation_covariance.view(),
                                                    rand)?;
    info!("generated {} observations of components {:?}",
          data.observations.ncols(), self.observed);

    Ok(L63Experiment {
      setup: self.clone(),
      observation_operator: h,
      data: data,
    })
  }
}

#[derive(Debug, Clone)]
pub struct L63Experiment {
  pub setup: L63Setup,
  /// H
  pub observation_operator: Array<f64, Ix2>,
  pub data: Data,
}
impl L63Experiment {
  pub fn init(&self) -> EnsembleInit {
    let s = &self.setup;
    EnsembleInit {
      initial_mean: s.initial_mean.view(),
      initial_covariance: s.initial_covariance.view(),
      observation_operator: self.observation_operator.view(),
      observation_covariance: s.observation_covariance.view(),
      ensemble_count: s.ensemble_count,
      schedule: Schedule {
        initial_time: s.initial_time,
        dt: s.dt,
        gap: s.gap,
        steps: s.steps(),
        assimilation_times: self.data.observation_times.view(),
      },
    }
  }

  /// Filters every observation of the experiment.
  pub fn assimilate<R>(&self, rand: &mut R) -> na_df::Result<(StateSteps, u64)>
    where R: Rng,
  {
    let mut model = ModelStats::from(self.setup.model.clone());
    let states = enkf::run(self.init(), &mut model,
                           &self.data.observations(), rand)?;
    Ok((states, model.calls))
  }

  /// The initial mean run without any observations.
  pub fn free_run(&self) -> na_q::Result<Array<f64, Ix2>> {
    forward_model(self.setup.initial_mean.view(),
                  self.data.time.view(),
                  &self.setup.model)
  }
}
