
use std::fmt;

pub type Result<T> = ::std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
  NotSquare {
    rows: usize,
    cols: usize,
  },
  /// NaN or infinite entries.
  NotFinite,
  /// Singular or indefinite, to working precision.
  NotPositiveDefinite,
  /// An eigenvalue is negative beyond rounding.
  Indefinite {
    eigenvalue: f64,
  },
  /// The symmetric eigensolver ran out of iterations.
  NoConvergence,
  RhsRows {
    expected: usize,
    actual: usize,
  },
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      &Error::NotSquare { rows, cols } => {
        write!(f, "matrix is not square ({}x{})", rows, cols)
      },
      &Error::NotFinite => write!(f, "matrix has non-finite entries"),
      &Error::NotPositiveDefinite => write!(f, "matrix is not positive definite"),
      &Error::Indefinite { eigenvalue } => {
        write!(f, "matrix is not positive semi-definite (eigenvalue {:e})", eigenvalue)
      },
      &Error::NoConvergence => write!(f, "eigendecomposition did not converge"),
      &Error::RhsRows { expected, actual } => {
        write!(f, "right hand side has {} rows, expected {}", actual, expected)
      },
    }
  }
}

impl ::std::error::Error for Error { }
