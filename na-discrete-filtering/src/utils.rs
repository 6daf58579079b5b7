use nd::{Array, ArrayBase, Data, Ix2};
use nd_rand::RandomExt;
use nd_rand::rand_distr::StandardNormal;

use rand::Rng;

/// `rows` independent draws from `N(0, F F^T)`, one per row, where `factor`
/// is `F`. Draws are taken row by row from `rand`.
pub fn make_2d_randn<S, R>(rows: usize,
                           factor: &ArrayBase<S, Ix2>,
                           rand: &mut R) -> Array<f64, Ix2>
  where S: Data<Elem = f64>,
        R: Rng,
{
  let r: Array<f64, Ix2> =
    Array::random_using((rows, factor.ncols()), StandardNormal, rand);

  r.dot(&factor.t())
}

#[cfg(test)]
mod test {
  use super::*;
  use nd::arr2;
  use rand::SeedableRng;
  use rand_isaac::Isaac64Rng;

  use crate::ensemble::{ensemble_mean, sample_covariance};

  #[test]
  fn randn_matches_covariance() {
    let mut rand = Isaac64Rng::seed_from_u64(3);
    let c = arr2(&[
      [4.0, 1.0],
      [1.0, 2.0],
    ]);
    let f = nla::semidefinite_factor(&c).unwrap();

    let draws = make_2d_randn(20000, &f, &mut rand);
    assert_eq!(draws.dim(), (20000, 2));

    let m = ensemble_mean(draws.view());
    let sample = sample_covariance(draws.view(), m.view());
    assert_abs_diff_eq!(m[0], 0.0, epsilon = 0.06);
    assert_abs_diff_eq!(m[1], 0.0, epsilon = 0.06);
    for (s, e) in sample.iter().zip(c.iter()) {
      assert_abs_diff_eq!(*s, *e, epsilon = 0.2);
    }
  }

  #[test]
  fn zero_factor_gives_zero_draws() {
    let mut rand = Isaac64Rng::seed_from_u64(3);
    let f: Array<f64, Ix2> = Array::zeros((3, 3));
    let draws = make_2d_randn(4, &f, &mut rand);
    assert!(draws.iter().all(|&v| v == 0.0));
  }

  #[test]
  fn seeded_draws_repeat() {
    let f: Array<f64, Ix2> = Array::eye(2);
    let a = make_2d_randn(5, &f, &mut Isaac64Rng::seed_from_u64(11));
    let b = make_2d_randn(5, &f, &mut Isaac64Rng::seed_from_u64(11));
    assert_eq!(a, b);
  }
}
