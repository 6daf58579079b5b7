//! Stochastic ensemble Kalman filter, perturbed observation variant.
//!
//! See e.g. Evensen, Ocean Dynamics (2003), Eqs. 44--54, and Burgers et
//! al. (1998) for why each member gets its own noisy copy of the
//! observation.
//!
//! There is no model error term: members differ only by their initial
//! conditions and by the perturbed observations they are corrected towards.

use nd::{Array, ArrayView, Ix1, Ix2, Ix3, Axis};
use nd::linalg::general_mat_mul;
use rand::Rng;

use na_core::check_dim;
use nla::{Cholesky, semidefinite_factor};

use crate::{Algorithm, Error, Model, ModelStats, Observer, Result, Workspace};
use crate::ensemble::{ensemble_mean, sample_covariance, spread,
                      EnsemblePredict, EnsemblePredictModelStuff,
                      EnsembleWindow, EnsembleWorkspace, StateSteps};
use crate::utils::make_2d_randn;

pub use super::EnsembleInit as Init;
pub use super::Schedule;

#[derive(Debug)]
pub struct OwnedWorkspace {
  /// Analysis mean.
  mean: Array<f64, Ix1>,
  /// Forecast covariance of the last cycle; `P0` before the first.
  covariance: Array<f64, Ix2>,
  /// One member per row.
  ensembles: Array<f64, Ix2>,

  /// S, with S S^T = R
  observation_factor: Array<f64, Ix2>,
  /// y
  observation: Array<f64, Ix1>,
  /// D, one perturbed observation per row
  perturbed_observations: Array<f64, Ix2>,
  /// P H^T
  covariance_obs: Array<f64, Ix2>,
  /// H P H^T + R
  innovation_covariance: Array<f64, Ix2>,
  /// K^T
  kalman_gain_t: Array<f64, Ix2>,

  /// Uhat
  ensemble_predict: Array<f64, Ix2>,
  /// mhat
  estimator_predict: Array<f64, Ix1>,

  time: Array<f64, Ix1>,
  window_start: usize,
  window: Array<f64, Ix3>,
  window_mean: Array<f64, Ix2>,
}

impl<'a> Workspace<Init<'a>> for OwnedWorkspace {
  /// Draws the initial ensemble `x0 + L xi`, `L L^T = P0`.
  fn alloc<R>(i: Init<'a>, rand: &mut R, _: u64) -> Result<OwnedWorkspace>
    where R: Rng,
  {
    let Init {
      initial_mean,
      initial_covariance,
      observation_operator,
      observation_covariance,
      ensemble_count,
      schedule,
    } = i;

    if ensemble_count == 0 {
      return Err(Error::EnsembleSize(ensemble_count));
    }

    let n = initial_mean.len();
    let p = observation_operator.nrows();
    let points = schedule.gap + 1;

    let sp = semidefinite_factor(&initial_covariance)?;
    let mut ensembles = make_2d_randn(ensemble_count, &sp, rand);
    ensembles += &initial_mean;
    let m0 = ensemble_mean(ensembles.view());

    let sr = semidefinite_factor(&observation_covariance)?;

    Ok(OwnedWorkspace {
      mean: m0,
      covariance: initial_covariance.to_owned(),
      ensembles: ensembles,

      observation_factor: sr,
      observation: Array::zeros(p),
      perturbed_observations: Array::zeros((ensemble_count, p)),
      covariance_obs: Array::zeros((n, p)),
      innovation_covariance: Array::zeros((p, p)),
      kalman_gain_t: Array::zeros((p, n)),

      ensemble_predict: Array::zeros((ensemble_count, n)),
      estimator_predict: Array::zeros(n),

      time: Array::zeros(points),
      window_start: 0,
      window: Array::zeros((ensemble_count, n, points)),
      window_mean: Array::zeros((n, points)),
    })
  }
}

impl EnsembleWorkspace for OwnedWorkspace {
  fn mean_view(&self) -> ArrayView<f64, Ix1> { self.mean.view() }
  fn covariance_view(&self) -> ArrayView<f64, Ix2> { self.covariance.view() }
  fn ensembles_view(&self) -> ArrayView<f64, Ix2> { self.ensembles.view() }
}
impl EnsembleWindow for OwnedWorkspace {
  fn window_start(&self) -> usize { self.window_start }
  fn window_mean_view(&self) -> ArrayView<f64, Ix2> { self.window_mean.view() }
  fn window_view(&self) -> ArrayView<f64, Ix3> { self.window.view() }
}
impl EnsemblePredict for OwnedWorkspace {
  fn ensemble_predict_stuff(&mut self) -> EnsemblePredictModelStuff {
    EnsemblePredictModelStuff {
      time: self.time.view(),
      ensembles: self.ensembles.view(),
      ensemble_predict: self.ensemble_predict.view_mut(),
      window: self.window.view_mut(),
      estimator: Some(self.window_mean.view_mut()),
    }
  }
}

#[derive(Debug, Clone)]
pub struct Algo<'a> {
  ensemble_count: usize,
  observation_operator: ArrayView<'a, f64, Ix2>,
  observation_covariance: ArrayView<'a, f64, Ix2>,
  schedule: Schedule<'a>,
}

impl<'a, M, Ob> Algorithm<M, Ob> for Algo<'a>
  where M: Model,
        Ob: Observer<f64>,
{
  type Init = Init<'a>;
  type WS = OwnedWorkspace;

  fn init(i: &Init<'a>,
          model: &ModelStats<M>,
          observer: &Ob,
          total_steps: u64) -> Result<Self>
  {
    i.check(model.model.dimension())?;
    check_dim("observation length",
              i.observation_dim(),
              observer.observation_dim())?;

    let cycles = i.schedule.cycles();
    if observer.observation_count() < cycles {
      return Err(Error::MissingObservation {
        cycle: observer.observation_count(),
      });
    }
    if total_steps != cycles as u64 {
      return Err(Error::Schedule("one algorithm step per assimilation time"));
    }

    if i.ensemble_count == 1 {
      warn!("ensemble of one member: its sample covariance is zero, \
             so no observation will correct it");
    }

    Ok(Algo {
      ensemble_count: i.ensemble_count,
      observation_operator: i.observation_operator.clone(),
      observation_covariance: i.observation_covariance.clone(),
      schedule: i.schedule.clone(),
    })
  }

  /// Propagates to assimilation time `current_step`, then corrects.
  fn next_step<R>(&self,
                  current_step: u64,
                  _total_steps: u64,
                  rand: &mut R,
                  workspace: &mut OwnedWorkspace,
                  model: &mut ModelStats<M>,
                  observer: &Ob)
                  -> Result<()>
    where R: Rng,
  {
    let cycle = current_step as usize;
    if cycle >= self.schedule.cycles() {
      return Err(Error::ScheduleExhausted { cycle: cycle, });
    }

    let h = self.observation_operator;

    // predict

    workspace.time.assign(&self.schedule.window(cycle));
    workspace.window_start = cycle * self.schedule.gap;
    workspace.ensemble_predict(model)?;
    // the window starts on the previous analysis
    workspace.window_mean
      .column_mut(0)
      .assign(&workspace.mean);

    workspace.estimator_predict = ensemble_mean(workspace.ensemble_predict.view());
    workspace.covariance = sample_covariance(workspace.ensemble_predict.view(),
                                             workspace.estimator_predict.view());

    // perturb

    if !observer.observe_into(current_step, workspace.observation.view_mut()) {
      return Err(Error::MissingObservation { cycle: cycle, });
    }
    workspace.perturbed_observations = make_2d_randn(self.ensemble_count,
                                                     &workspace.observation_factor,
                                                     rand);
    workspace.perturbed_observations += &workspace.observation;

    // gain

    general_mat_mul(1.0,
                    &workspace.covariance, &h.t(),
                    0.0,
                    &mut workspace.covariance_obs);
    workspace.innovation_covariance.assign(&self.observation_covariance);
    general_mat_mul(1.0,
                    &h, &workspace.covariance_obs,
                    1.0,
                    &mut workspace.innovation_covariance);

    let factor = workspace.innovation_covariance
      .cholesky()
      .map_err(|e| Error::SingularInnovation { cycle: cycle, source: e, })?;
    // K^T = (H P H^T + R)^-1 H P
    workspace.kalman_gain_t = factor.solve(&workspace.covariance_obs.t())?;

    // analyze

    {
      let mut d = workspace.perturbed_observations.view_mut();
      general_mat_mul(-1.0,
                      &workspace.ensemble_predict, &h.t(),
                      1.0,
                      &mut d);
    }

    workspace.ensembles.assign(&workspace.ensemble_predict);
    general_mat_mul(1.0,
                    &workspace.perturbed_observations, &workspace.kalman_gain_t,
                    1.0,
                    &mut workspace.ensembles);
    workspace.mean = ensemble_mean(workspace.ensembles.view());

    // the window ends on the analysis
    let last = self.schedule.gap;
    workspace.window
      .index_axis_mut(Axis(2), last)
      .assign(&workspace.ensembles);
    workspace.window_mean
      .column_mut(last)
      .assign(&workspace.mean);

    if log_enabled!(::log::Level::Debug) {
      let innovation = &workspace.observation - &h.dot(&workspace.estimator_predict);
      debug!("cycle {}: t = {}, |y - H mhat| = {:.3e}, forecast spread = {:.3e}",
             cycle, self.schedule.assimilation_times[cycle],
             innovation.dot(&innovation).sqrt(),
             spread(workspace.covariance.view()));
    }

    Ok(())
  }
}

/// Runs the filter through every assimilation time of `init.schedule`.
pub fn run<M, Ob, R>(init: Init,
                     model: &mut ModelStats<M>,
                     observer: &Ob,
                     rand: &mut R) -> Result<StateSteps>
  where M: Model,
        Ob: Observer<f64>,
        R: Rng,
{
  let cycles = init.schedule.cycles();
  let algo = <Algo as Algorithm<M, Ob>>::init(&init, model, observer,
                                              cycles as u64)?;

  let mut states = StateSteps::new(init.schedule.steps, cycles,
                                   init.ensemble_count, init.state_dim());
  let mut workspace = OwnedWorkspace::alloc(init, rand, cycles as u64)?;
  states.store_initial(&workspace);

  for i in 0..cycles as u64 {
    algo.next_step(i, cycles as u64,
                   rand,
                   &mut workspace,
                   model,
                   observer)?;
    states.store_cycle(i as usize, &workspace);
  }

  Ok(states)
}

#[cfg(test)]
mod test {
  use super::*;
  use nd::{arr1, ArrayViewMut};
  use rand::SeedableRng;
  use rand_isaac::Isaac64Rng;

  use na_q::integrate;

  struct Lorenz63;
  impl Model for Lorenz63 {
    fn dimension(&self) -> usize { 3 }
    fn run_model(&self, _: f64, y: ArrayView<f64, Ix1>, mut yp: ArrayViewMut<f64, Ix1>) {
      yp[0] = -10.0 * (y[0] - y[1]);
      yp[1] = -y[0] * y[2] + 28.0 * y[0] - y[1];
      yp[2] = y[0] * y[1] - 8.0 / 3.0 * y[2];
    }
  }

  const DT: f64 = 0.01;
  const GAP: usize = 5;

  struct Setup {
    x0: Array<f64, Ix1>,
    p0: Array<f64, Ix2>,
    h: Array<f64, Ix2>,
    r: Array<f64, Ix2>,
    times: Array<f64, Ix1>,
    ensemble_count: usize,
  }
  impl Setup {
    fn new(cycles: usize, ensemble_count: usize) -> Setup {
      Setup {
        x0: arr1(&[1.0, 1.0, 1.0]),
        p0: Array::eye(3),
        h: Array::eye(3),
        r: Array::<f64, Ix2>::eye(3) * 1e-4,
        times: (1..cycles + 1).map(|k| (k * GAP) as f64 * DT).collect(),
        ensemble_count: ensemble_count,
      }
    }
    fn init(&self) -> Init {
      Init {
        initial_mean: self.x0.view(),
        initial_covariance: self.p0.view(),
        observation_operator: self.h.view(),
        observation_covariance: self.r.view(),
        ensemble_count: self.ensemble_count,
        schedule: Schedule {
          initial_time: 0.0,
          dt: DT,
          gap: GAP,
          steps: GAP * self.times.len(),
          assimilation_times: self.times.view(),
        },
      }
    }
    /// Truth sampled at every integration step, and at the assimilation times.
    fn truth(&self, x0: &Array<f64, Ix1>) -> (Array<f64, Ix2>, Array<f64, Ix2>) {
      let steps = GAP * self.times.len();
      let t = Array::linspace(0.0, steps as f64 * DT, steps + 1);
      let truth = integrate(&Lorenz63, x0.view(), t.view()).unwrap();
      let obs = truth.select(Axis(1), &(1..self.times.len() + 1)
                                         .map(|k| k * GAP)
                                         .collect::<Vec<_>>());
      (truth, obs)
    }
  }

  #[test]
  fn tracks_truth_with_accurate_observations() {
    let setup = Setup::new(20, 30);
    let (truth, obs) = setup.truth(&arr1(&[2.0, 2.5, 0.0]));
    let mut model = ModelStats::from(Lorenz63);
    let mut rand = Isaac64Rng::seed_from_u64(1);

    let states = run(setup.init(), &mut model, &obs, &mut rand).unwrap();
    assert_eq!(states.means.dim(), (3, 101));
    assert_eq!(states.ensembles.dim(), (3, 101, 30));
    assert_eq!(states.analysis_means.dim(), (3, 20));
    assert_eq!(model.calls, 4 * 100 * 30);

    for k in 3..20 {
      let step = (k + 1) * GAP;
      for c in 0..3 {
        let err = (states.analysis_means[[c, k]] - truth[[c, step]]).abs();
        assert!(err < 0.1, "cycle {} component {} error {}", k, c, err);
        assert_eq!(states.means[[c, step]], states.analysis_means[[c, k]]);
      }
    }

    assert_eq!(states.covariances.dim(), (20, 3, 3));
    for c in states.covariances.axis_iter(Axis(0)) {
      assert_eq!(c, c.t());
      assert!(semidefinite_factor(&c).is_ok());
    }
  }

  #[test]
  fn zero_spread_stays_degenerate() {
    // two copies of x0 average back to x0 exactly
    let mut setup = Setup::new(6, 2);
    setup.p0.fill(0.0);
    setup.h = na_core::observation_operator(&[0, 2], 3).unwrap();
    setup.r = Array::<f64, Ix2>::eye(2) * 0.5;
    let (_, obs) = setup.truth(&arr1(&[-3.0, 0.5, 20.0]));
    let obs = setup.h.dot(&obs);

    let mut model = ModelStats::from(Lorenz63);
    let mut rand = Isaac64Rng::seed_from_u64(5);
    let states = run(setup.init(), &mut model, &obs, &mut rand).unwrap();

    for step in states.ensembles.axis_iter(Axis(1)) {
      for member in step.axis_iter(Axis(1)) {
        assert_eq!(member, step.index_axis(Axis(1), 0));
      }
    }
    assert!(states.covariances.iter().all(|&v| v == 0.0));
    // the single shared trajectory is a free run from x0
    let t = Array::linspace(0.0, 30.0 * DT, 31);
    let free = integrate(&Lorenz63, setup.x0.view(), t.view()).unwrap();
    for (a, b) in states.means.iter().zip(free.iter()) {
      assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
    }
  }

  #[test]
  fn single_member_is_a_free_run() {
    let setup = Setup::new(4, 1);
    let (_, obs) = setup.truth(&arr1(&[5.0, 5.0, 5.0]));
    let mut model = ModelStats::from(Lorenz63);
    let mut rand = Isaac64Rng::seed_from_u64(9);
    let states = run(setup.init(), &mut model, &obs, &mut rand).unwrap();

    assert!(states.covariances.iter().all(|&v| v == 0.0));
    let start = states.ensembles.slice(s![.., 0, 0]).to_owned();
    let t = Array::linspace(0.0, 20.0 * DT, 21);
    let free = integrate(&Lorenz63, start.view(), t.view()).unwrap();
    for (a, b) in states.ensembles.slice(s![.., .., 0]).iter().zip(free.iter()) {
      assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
    }
    assert_eq!(states.means, states.ensembles.index_axis(Axis(2), 0));
  }

  #[test]
  fn initial_state_is_recorded() {
    let setup = Setup::new(2, 4);
    let (_, obs) = setup.truth(&setup.x0);
    let mut model = ModelStats::from(Lorenz63);
    let mut rand = Isaac64Rng::seed_from_u64(2);
    let states = run(setup.init(), &mut model, &obs, &mut rand).unwrap();

    let members = states.ensembles.index_axis(Axis(1), 0);
    let mean = members.sum_axis(Axis(1)) / 4.0;
    for (a, b) in states.means.column(0).iter().zip(mean.iter()) {
      assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
    }
  }

  #[test]
  fn seeded_runs_repeat() {
    let setup = Setup::new(3, 6);
    let (_, obs) = setup.truth(&arr1(&[0.0, 1.0, 0.0]));
    let go = || {
      let mut model = ModelStats::from(Lorenz63);
      let mut rand = Isaac64Rng::seed_from_u64(42);
      run(setup.init(), &mut model, &obs, &mut rand).unwrap()
    };
    let (a, b) = (go(), go());
    assert_eq!(a.means, b.means);
    assert_eq!(a.ensembles, b.ensembles);
  }

  #[test]
  fn singular_innovation_is_fatal() {
    let mut setup = Setup::new(3, 2);
    setup.p0.fill(0.0);
    setup.r.fill(0.0);
    let (_, obs) = setup.truth(&setup.x0);
    let mut model = ModelStats::from(Lorenz63);
    let mut rand = Isaac64Rng::seed_from_u64(1);

    assert_eq!(run(setup.init(), &mut model, &obs, &mut rand).err(),
               Some(Error::SingularInnovation {
                 cycle: 0,
                 source: nla::Error::NotPositiveDefinite,
               }));
  }

  #[test]
  fn shape_errors_fail_fast() {
    let mut model = ModelStats::from(Lorenz63);
    let mut rand = Isaac64Rng::seed_from_u64(1);

    let mut setup = Setup::new(3, 5);
    let (_, obs) = setup.truth(&setup.x0);
    setup.x0 = arr1(&[1.0, 2.0]);
    match run(setup.init(), &mut model, &obs, &mut rand) {
      Err(Error::Core(na_core::Error::Dimension { expected: 3, actual: 2, .. })) => {},
      r => panic!("unexpected {:?}", r.map(|_| () )),
    }

    // two observed components, three-row observation record
    let mut setup = Setup::new(3, 5);
    setup.h = na_core::observation_operator(&[0, 1], 3).unwrap();
    setup.r = Array::eye(2);
    match run(setup.init(), &mut model, &obs, &mut rand) {
      Err(Error::Core(na_core::Error::Dimension { expected: 2, actual: 3, .. })) => {},
      r => panic!("unexpected {:?}", r.map(|_| () )),
    }

    let setup = Setup::new(3, 0);
    assert_eq!(run(setup.init(), &mut model, &obs, &mut rand).err(),
               Some(Error::EnsembleSize(0)));

    let setup = Setup::new(4, 5);
    assert_eq!(run(setup.init(), &mut model, &obs, &mut rand).err(),
               Some(Error::MissingObservation { cycle: 3 }));
    assert_eq!(model.calls, 0);
  }
}
