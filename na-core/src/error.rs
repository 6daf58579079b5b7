
use std::fmt;

pub type Result<T> = ::std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
  /// An input did not have the length the operation needs.
  Dimension {
    what: &'static str,
    expected: usize,
    actual: usize,
  },
  /// An observed component index is outside the state vector.
  ComponentIndex {
    index: usize,
    dimension: usize,
  },
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      &Error::Dimension { what, expected, actual } => {
        write!(f, "dimension mismatch for {}: expected {}, got {}",
               what, expected, actual)
      },
      &Error::ComponentIndex { index, dimension } => {
        write!(f, "state component {} out of range for dimension {}",
               index, dimension)
      },
    }
  }
}

impl ::std::error::Error for Error { }

/// Fails with `Error::Dimension` unless `actual == expected`.
pub fn check_dim(what: &'static str, expected: usize, actual: usize) -> Result<()> {
  if expected == actual {
    Ok(())
  } else {
    Err(Error::Dimension {
      what: what,
      expected: expected,
      actual: actual,
    })
  }
}
