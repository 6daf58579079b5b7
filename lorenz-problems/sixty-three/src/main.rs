
#[macro_use]
extern crate log;
#[macro_use]
extern crate ndarray as nd;
extern crate rand;
extern crate rand_isaac;
extern crate clap;
extern crate pretty_env_logger;
extern crate na_discrete_filtering as na_df;
extern crate sixty_three;
extern crate util;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use nd::{Array, Axis};
use rand::SeedableRng;
use rand_isaac::Isaac64Rng;

use na_df::{Algorithm, ModelStats, Workspace};
use na_df::ensemble::{spread, StateSteps};
use na_df::kalman::enkf;

use sixty_three::{L63Model, L63Setup};
use util::progress::ReportingIterator;
use util::{rmse, ModelTruth};

/// Lorenz-63 twin experiment with a perturbed observation ensemble Kalman
/// filter.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
  /// Ensemble members
  #[arg(short, long, default_value_t = 20)]
  ensemble: usize,
  /// Assimilation cycles
  #[arg(short, long, default_value_t = 100)]
  cycles: usize,
  /// Integration steps between observations
  #[arg(short, long, default_value_t = 10)]
  gap: usize,
  #[arg(long, default_value_t = 0.01)]
  dt: f64,
  /// Observed state components, comma separated
  #[arg(long, value_delimiter = ',', default_value = "0,2")]
  observed: Vec<usize>,
  /// Observation noise variance
  #[arg(long, default_value_t = 2.0)]
  noise: f64,
  /// Initial ensemble variance
  #[arg(long, default_value_t = 2.0)]
  spread: f64,
  #[arg(long, default_value_t = 28.0)]
  rayleigh: f64,
  #[arg(long, default_value_t = 10.0)]
  prandtl: f64,
  #[arg(long, default_value_t = 8.0 / 3.0)]
  beta: f64,
  #[arg(long, default_value_t = 1)]
  seed: u64,
  /// Write `t truth mean` rows here
  #[arg(short, long)]
  output: Option<PathBuf>,
  /// No progress bar
  #[arg(short, long)]
  quiet: bool,
}

fn main() {
  if pretty_env_logger::try_init().is_err() {
    println!("could not init env_logger");
  }

  let args = Args::parse();

  let p = args.observed.len();
  let setup = L63Setup {
    model: L63Model {
      prandtl: args.prandtl,
      rayleigh: args.rayleigh,
      beta: args.beta,
    },
    dt: args.dt,
    gap: args.gap,
    cycles: args.cycles,
    initial_covariance: Array::eye(3) * args.spread,
    observed: args.observed.clone(),
    observation_covariance: Array::eye(p) * args.noise,
    ensemble_count: args.ensemble,
    ..Default::default()
  };
  debug!("{:?}", setup);

  let mut rand = Isaac64Rng::seed_from_u64(args.seed);
  let experiment = setup.generate(&mut rand)
    .expect("failed to generate truth and observations");

  let init = experiment.init();
  let cycles = init.schedule.cycles();
  let observations = experiment.data.observations();
  let mut model = ModelStats::from(setup.model.clone());

  let algo = <enkf::Algo as Algorithm<_, _>>::init(&init, &model,
                                                   &observations,
                                                   cycles as u64)
    .expect("invalid filter setup");
  let mut states = StateSteps::new(setup.steps(), cycles,
                                   setup.ensemble_count, 3);
  let mut workspace = enkf::OwnedWorkspace::alloc(init, &mut rand,
                                                  cycles as u64)
    .expect("failed to draw the initial ensemble");
  states.store_initial(&workspace);

  let iter = if args.quiet {
    ReportingIterator::quiet(0..cycles, "EnKF".into())
  } else {
    ReportingIterator::new(0..cycles, "EnKF".into())
  };

  println!("Starting algorithm loop");
  for i in iter {
    algo.next_step(i as u64, cycles as u64,
                   &mut rand,
                   &mut workspace,
                   &mut model,
                   &observations)
      .expect("algorithm step failed");

    states.store_cycle(i, &workspace);
  }
  println!("Algorithm run done");
  let states = states;

  let truth = experiment.data.truth();
  let free = experiment.free_run()
    .expect("free run failed");

  let err = rmse(states.means.view(), truth)
    .expect("shape mismatch");
  let free_err = rmse(free.view(), truth)
    .expect("shape mismatch");
  let analysis_err = rmse(states.analysis_means.view(),
                          truth.slice(s![.., setup.gap..;setup.gap]))
    .expect("shape mismatch");
  let mean_spread = states.covariances
    .axis_iter(Axis(0))
    .map(|c| spread(c) )
    .sum::<f64>() / cycles.max(1) as f64;

  println!("model calls: {}", model.calls);
  println!("rmse, whole run: {:.4} (free run: {:.4})",
           err.mean().unwrap_or(0.0),
           free_err.mean().unwrap_or(0.0));
  println!("rmse, analyses: {:.4}", analysis_err.mean().unwrap_or(0.0));
  println!("mean forecast spread: {:.4}", mean_spread);

  if let Some(path) = args.output {
    let file = File::create(&path)
      .expect("failed to create output file");
    let mut out = BufWriter::new(file);
    for (j, &t) in experiment.data.time.iter().enumerate() {
      write!(out, "{:.6}", t).expect("write failed");
      for v in truth.column(j).iter().chain(states.means.column(j).iter()) {
        write!(out, " {:.9}", v).expect("write failed");
      }
      writeln!(out).expect("write failed");
    }
    out.flush().expect("write failed");
    println!("wrote {}", path.display());
  }
}

