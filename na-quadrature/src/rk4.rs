//! Classical fourth order explicit Runge-Kutta, fixed step.
//! Local truncation error is O(h^5), global error O(h^4).

use nd::{Array, ArrayBase, DataMut, Ix1, Zip};

use na_core::Model;

pub fn new<S>(t: f64, y: ArrayBase<S, Ix1>) -> State<S>
  where S: DataMut<Elem = f64>,
{
  State::new(t, y)
}

pub struct State<S>
  where S: DataMut<Elem = f64>,
{
  calls: u64,
  steps: u64,

  t: f64,
  y: ArrayBase<S, Ix1>,

  k1: Array<f64, Ix1>,
  k2: Array<f64, Ix1>,
  k3: Array<f64, Ix1>,
  k4: Array<f64, Ix1>,
  /// stage input
  ys: Array<f64, Ix1>,
}
impl<S> State<S>
  where S: DataMut<Elem = f64>,
{
  pub fn new(t: f64, y: ArrayBase<S, Ix1>) -> State<S> {
    let n = y.len();
    State {
      calls: 0,
      steps: 0,

      t: t,
      y: y,

      k1: Array::zeros(n),
      k2: Array::zeros(n),
      k3: Array::zeros(n),
      k4: Array::zeros(n),
      ys: Array::zeros(n),
    }
  }
  pub fn t(&self) -> f64 { self.t }
  pub fn y(&self) -> &ArrayBase<S, Ix1> { &self.y }

  pub fn total_model_calls(&self) -> u64 { self.calls }
  pub fn total_steps(&self) -> u64 { self.steps }

  /// Advances `y` from `t` to `t + h`.
  pub fn step<M>(&mut self, model: &M, h: f64)
    where M: Model + ?Sized,
  {
    let half_h = 0.5 * h;
    let t = self.t;

    model.run_model(t, self.y.view(), self.k1.view_mut());

    Zip::from(&mut self.ys)
      .and(&self.y)
      .and(&self.k1)
      .for_each(|ys, &y, &k| *ys = y + half_h * k );
    model.run_model(t + half_h, self.ys.view(), self.k2.view_mut());

    Zip::from(&mut self.ys)
      .and(&self.y)
      .and(&self.k2)
      .for_each(|ys, &y, &k| *ys = y + half_h * k );
    model.run_model(t + half_h, self.ys.view(), self.k3.view_mut());

    Zip::from(&mut self.ys)
      .and(&self.y)
      .and(&self.k3)
      .for_each(|ys, &y, &k| *ys = y + h * k );
    model.run_model(t + h, self.ys.view(), self.k4.view_mut());

    let sixth_h = h / 6.0;
    Zip::from(&mut self.y)
      .and(&self.k1)
      .and(&self.k2)
      .and(&self.k3)
      .and(&self.k4)
      .for_each(|y, &k1, &k2, &k3, &k4| {
        *y += sixth_h * (k1 + 2.0 * k2 + 2.0 * k3 + k4);
      });

    self.t = t + h;
    self.calls += 4;
    self.steps += 1;
  }

  /// Steps to exactly `t_next`.
  pub fn step_to<M>(&mut self, model: &M, t_next: f64)
    where M: Model + ?Sized,
  {
    let h = t_next - self.t;
    self.step(model, h);
    self.t = t_next;
  }
}
