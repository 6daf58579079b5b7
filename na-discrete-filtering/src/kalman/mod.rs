
use nd::prelude::*;

use na_core::check_dim;
use na_q::check_time_grid;

use crate::{Error, Result};

pub mod enkf;

/// When the assimilation times fall on the integration grid.
#[derive(Debug, Clone)]
pub struct Schedule<'a> {
  pub initial_time: f64,
  /// Integration step size.
  pub dt: f64,
  /// Integration steps between consecutive assimilation times.
  pub gap: usize,
  /// Total integration steps; `assimilation_times.len() * gap`.
  pub steps: usize,
  pub assimilation_times: ArrayView<'a, f64, Ix1>,
}
impl<'a> Schedule<'a> {
  pub fn cycles(&self) -> usize { self.assimilation_times.len() }

  pub fn check(&self) -> Result<()> {
    if self.gap == 0 {
      return Err(Error::Schedule("gap must be at least one step"));
    }
    if !(self.dt > 0.0) {
      return Err(Error::Schedule("step size must be positive"));
    }
    if self.steps != self.cycles() * self.gap {
      return Err(Error::Schedule("step count must equal cycles * gap"));
    }
    check_time_grid(self.assimilation_times)?;
    if !(self.assimilation_times[0] > self.initial_time) {
      return Err(Error::Schedule("first assimilation time must follow the initial time"));
    }

    let window = self.gap as f64 * self.dt;
    for (k, &t) in self.assimilation_times.iter().enumerate() {
      let expected = self.initial_time + (k + 1) as f64 * window;
      if (t - expected).abs() > 1e-6 * window {
        return Err(Error::Schedule("assimilation times must be gap * dt apart"));
      }
    }

    Ok(())
  }

  /// Integration grid of window `cycle`, both ends included.
  pub fn window(&self, cycle: usize) -> Array<f64, Ix1> {
    let start = if cycle == 0 {
      self.initial_time
    } else {
      self.assimilation_times[cycle - 1]
    };
    Array::linspace(start, self.assimilation_times[cycle], self.gap + 1)
  }
}

#[derive(Debug, Clone)]
pub struct EnsembleInit<'a> {
  pub initial_mean: ArrayView<'a, f64, Ix1>,
  pub initial_covariance: ArrayView<'a, f64, Ix2>,
  /// H
  pub observation_operator: ArrayView<'a, f64, Ix2>,
  /// R
  pub observation_covariance: ArrayView<'a, f64, Ix2>,
  pub ensemble_count: usize,
  pub schedule: Schedule<'a>,
}
impl<'a> EnsembleInit<'a> {
  pub fn state_dim(&self) -> usize { self.initial_mean.len() }
  pub fn observation_dim(&self) -> usize { self.observation_operator.nrows() }

  /// Shape checks against a model of dimension `n`.
  pub fn check(&self, n: usize) -> Result<()> {
    if self.ensemble_count == 0 {
      return Err(Error::EnsembleSize(self.ensemble_count));
    }

    let p = self.observation_dim();
    check_dim("initial mean", n, self.initial_mean.len())?;
    check_dim("initial covariance rows", n, self.initial_covariance.nrows())?;
    check_dim("initial covariance columns", n, self.initial_covariance.ncols())?;
    check_dim("observation operator columns", n, self.observation_operator.ncols())?;
    check_dim("observation covariance rows", p, self.observation_covariance.nrows())?;
    check_dim("observation covariance columns", p, self.observation_covariance.ncols())?;

    self.schedule.check()
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use nd::arr1;

  fn schedule(times: &Array<f64, Ix1>) -> Schedule {
    Schedule {
      initial_time: 0.0,
      dt: 0.01,
      gap: 5,
      steps: 5 * times.len(),
      assimilation_times: times.view(),
    }
  }

  #[test]
  fn consistent_schedule() {
    let times = arr1(&[0.05, 0.1, 0.15]);
    let s = schedule(&times);
    assert_eq!(s.cycles(), 3);
    assert_eq!(s.check(), Ok(()));

    let w = s.window(1);
    assert_eq!(w.len(), 6);
    assert_eq!(w[0], 0.05);
    assert_abs_diff_eq!(w[5], 0.1, epsilon = 1e-15);
  }

  #[test]
  fn inconsistent_schedules() {
    let times = arr1(&[0.05, 0.1, 0.15]);

    let mut s = schedule(&times);
    s.steps = 14;
    assert!(s.check().is_err());

    let mut s = schedule(&times);
    s.gap = 0;
    s.steps = 0;
    assert!(s.check().is_err());

    let skewed = arr1(&[0.05, 0.12, 0.15]);
    assert!(schedule(&skewed).check().is_err());

    let backwards = arr1(&[0.05, 0.0, 0.15]);
    assert_eq!(schedule(&backwards).check(),
               Err(Error::Quadrature(na_q::Error::NotIncreasing { index: 1 })));
  }
}
