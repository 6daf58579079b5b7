
use std::error::Error as StdError;
use std::fmt;


pub type Result<T> = ::std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
  Core(na_core::Error),
  EmptyTimeGrid,
  /// `time[index]` is not strictly greater than `time[index - 1]`.
  NotIncreasing {
    index: usize,
  },
}

impl From<na_core::Error> for Error {
  fn from(v: na_core::Error) -> Error {
    Error::Core(v)
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      &Error::Core(ref e) => write!(f, "{}", e),
      &Error::EmptyTimeGrid => write!(f, "time grid is empty"),
      &Error::NotIncreasing { index } => {
        write!(f, "time grid is not strictly increasing at index {}", index)
      },
    }
  }
}

impl StdError for Error {
  fn source(&self) -> Option<&(dyn StdError + 'static)> {
    match self {
      &Error::Core(ref e) => Some(e),
      _ => None,
    }
  }
}
