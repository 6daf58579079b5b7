//! Common stuffs for ensembles

use nd::{Array, ArrayView, ArrayViewMut, Ix1, Ix2, Ix3, Axis};
use rayon::prelude::*;

use na_q::integrate_into;

use crate::{Model, ModelStats, Result};

pub trait EnsembleWorkspace {
  fn mean_view(&self) -> ArrayView<f64, Ix1>;
  fn covariance_view(&self) -> ArrayView<f64, Ix2>;
  /// One member per row.
  fn ensembles_view(&self) -> ArrayView<f64, Ix2>;
}

/// Per-step record of the most recent assimilation window.
pub trait EnsembleWindow: EnsembleWorkspace {
  /// Index of the window's first integration step.
  fn window_start(&self) -> usize;
  /// `(n, gap + 1)`
  fn window_mean_view(&self) -> ArrayView<f64, Ix2>;
  /// `(ensemble_count, n, gap + 1)`
  fn window_view(&self) -> ArrayView<f64, Ix3>;
}

#[derive(Debug)]
pub struct EnsemblePredictModelStuff<'a> {
  /// Integration grid of the window, endpoints included.
  pub time: ArrayView<'a, f64, Ix1>,
  pub ensembles: ArrayView<'a, f64, Ix2>,
  /// Members at the end of the window.
  pub ensemble_predict: ArrayViewMut<'a, f64, Ix2>,
  /// Member trajectories over the window.
  pub window: ArrayViewMut<'a, f64, Ix3>,
  pub estimator: Option<ArrayViewMut<'a, f64, Ix2>>,
}

pub trait EnsemblePredict {
  fn ensemble_predict_stuff(&mut self) -> EnsemblePredictModelStuff;

  /// Runs the forward model for every member over the window. Members are
  /// independent and run in parallel; nothing is written to the ensemble
  /// itself.
  fn ensemble_predict<M>(&mut self, model: &mut ModelStats<M>) -> Result<()>
    where M: Model,
  {
    let EnsemblePredictModelStuff {
      time, ensembles,
      mut ensemble_predict,
      mut window,
      mut estimator,
    } = self.ensemble_predict_stuff();

    assert_eq!(ensembles.dim(), ensemble_predict.dim());
    assert_eq!(window.dim().0, ensembles.nrows());
    assert_eq!(window.dim().2, time.len());

    let m = &model.model;
    let calls: Vec<u64> = ensembles.axis_iter(Axis(0))
      .into_par_iter()
      .zip(window.axis_iter_mut(Axis(0)).into_par_iter())
      .zip(ensemble_predict.axis_iter_mut(Axis(0)).into_par_iter())
      .map(|((ensemble, mut path), mut out)| -> Result<u64> {
        let calls = integrate_into(m, ensemble, time, path.view_mut())?;
        out.assign(&path.index_axis(Axis(1), time.len() - 1));
        Ok(calls)
      })
      .collect::<Result<Vec<u64>>>()?;

    if let Some(ref mut estimator) = estimator {
      let n_e = ensembles.nrows() as f64;
      estimator.assign(&window.sum_axis(Axis(0)));
      estimator.mapv_inplace(|v| v / n_e );
    }

    model.calls += calls.into_iter().sum::<u64>();
    Ok(())
  }
}

pub fn ensemble_mean(ensembles: ArrayView<f64, Ix2>) -> Array<f64, Ix1> {
  let n_e = ensembles.nrows() as f64;
  ensembles
    .sum_axis(Axis(0))
    .mapv_into(|v| v / n_e )
}

/// Unbiased sample covariance (`1 / (N_e - 1)`) of the rows of `ensembles`
/// around `mean`. A single member has no spread to estimate from, so its
/// covariance is defined as zero.
pub fn sample_covariance(ensembles: ArrayView<f64, Ix2>,
                         mean: ArrayView<f64, Ix1>) -> Array<f64, Ix2> {
  let (n_e, n) = ensembles.dim();
  if n_e < 2 {
    return Array::zeros((n, n));
  }

  let centered = &ensembles - &mean;
  let c = centered.t().dot(&centered) / (n_e - 1) as f64;

  // exact symmetry
  (&c + &c.t()) * 0.5
}

/// Largest per-component standard deviation of the ensemble.
pub fn spread(covariance: ArrayView<f64, Ix2>) -> f64 {
  covariance.diag()
    .iter()
    .fold(0.0f64, |m, &v| m.max(v.max(0.0).sqrt()) )
}

/// Full-run record: every integration step of the mean and of every member,
/// plus per-cycle diagnostics.
#[derive(Clone, Debug)]
pub struct StateSteps {
  /// `(n, steps + 1)`
  pub means: Array<f64, Ix2>,
  /// `(n, steps + 1, ensemble_count)`
  pub ensembles: Array<f64, Ix3>,
  /// Analysis mean after each cycle, `(n, cycles)`.
  pub analysis_means: Array<f64, Ix2>,
  /// Forecast covariance of each cycle, `(cycles, n, n)`.
  pub covariances: Array<f64, Ix3>,
}
impl StateSteps {
  pub fn new(steps: usize, cycles: usize, ensemble_count: usize, n: usize) -> StateSteps {
    StateSteps {
      means: Array::zeros((n, steps + 1)),
      ensembles: Array::zeros((n, steps + 1, ensemble_count)),
      analysis_means: Array::zeros((n, cycles)),
      covariances: Array::zeros((cycles, n, n)),
    }
  }

  pub fn store_initial<WS>(&mut self, ws: &WS)
    where WS: EnsembleWorkspace,
  {
    self.means
      .column_mut(0)
      .assign(&ws.mean_view());
    self.ensembles
      .index_axis_mut(Axis(1), 0)
      .assign(&ws.ensembles_view().t());
  }

  pub fn store_cycle<WS>(&mut self, cycle: usize, ws: &WS)
    where WS: EnsembleWindow,
  {
    let start = ws.window_start();
    let window_mean = ws.window_mean_view();
    let stop = start + window_mean.ncols();

    self.means
      .slice_mut(s![.., start..stop])
      .assign(&window_mean);
    self.ensembles
      .slice_mut(s![.., start..stop, ..])
      .assign(&ws.window_view().permuted_axes([1, 2, 0]));

    self.analysis_means
      .column_mut(cycle)
      .assign(&ws.mean_view());
    self.covariances
      .index_axis_mut(Axis(0), cycle)
      .assign(&ws.covariance_view());
  }
}
