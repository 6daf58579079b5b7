
use std::error::Error as StdError;
use std::fmt;


pub type Result<T> = ::std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
  Core(na_core::Error),
  Quadrature(na_quadrature::Error),
  Factorize(nla_factorize::Error),
  /// Ensembles need at least one member.
  EnsembleSize(usize),
  /// The assimilation schedule is inconsistent.
  Schedule(&'static str),
  /// Every assimilation time has already been processed.
  ScheduleExhausted {
    cycle: usize,
  },
  MissingObservation {
    cycle: usize,
  },
  /// `H P H^T + R` could not be factored at this cycle.
  SingularInnovation {
    cycle: usize,
    source: nla_factorize::Error,
  },
}

impl From<na_core::Error> for Error {
  fn from(v: na_core::Error) -> Error {
    Error::Core(v)
  }
}
impl From<na_quadrature::Error> for Error {
  fn from(v: na_quadrature::Error) -> Error {
    Error::Quadrature(v)
  }
}
impl From<nla_factorize::Error> for Error {
  fn from(v: nla_factorize::Error) -> Error {
    Error::Factorize(v)
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      &Error::Core(ref e) => write!(f, "{}", e),
      &Error::Quadrature(ref e) => write!(f, "forward model: {}", e),
      &Error::Factorize(ref e) => write!(f, "factorization: {}", e),
      &Error::EnsembleSize(n) => {
        write!(f, "ensemble size must be at least 1, got {}", n)
      },
      &Error::Schedule(what) => write!(f, "bad assimilation schedule: {}", what),
      &Error::ScheduleExhausted { cycle } => {
        write!(f, "no assimilation time left for cycle {}", cycle)
      },
      &Error::MissingObservation { cycle } => {
        write!(f, "no observation for cycle {}", cycle)
      },
      &Error::SingularInnovation { cycle, ref source } => {
        write!(f, "innovation covariance is singular at cycle {}: {}",
               cycle, source)
      },
    }
  }
}

impl StdError for Error {
  fn source(&self) -> Option<&(dyn StdError + 'static)> {
    match self {
      &Error::Core(ref e) => Some(e),
      &Error::Quadrature(ref e) => Some(e),
      &Error::Factorize(ref e) => Some(e),
      &Error::SingularInnovation { ref source, .. } => Some(source),
      _ => None,
    }
  }
}
