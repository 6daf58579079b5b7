use std::borrow::Cow;
use std::io::{stderr, Stderr};
use std::iter::ExactSizeIterator;
use std::time::{Duration, Instant};

use pbr::ProgressBar;

/// Wraps an iterator of known length with a progress bar on stderr, so that
/// stdout stays free for results.
pub struct ReportingIterator<I>
  where I: ExactSizeIterator,
{
  name: Cow<'static, str>,
  progress: Option<ProgressBar<Stderr>>,
  started: Instant,
  inner: I,
}
impl<I> ReportingIterator<I>
  where I: ExactSizeIterator,
{
  pub fn new(inner: I, name: Cow<'static, str>) -> ReportingIterator<I> {
    let mut p = ProgressBar::on(stderr(), inner.len() as u64);
    p.show_speed = true;
    p.show_percent = true;
    p.show_counter = true;
    p.show_time_left = true;

    let fps = Duration::new(1, 0) / 30;
    p.set_max_refresh_rate(Some(fps));

    let msg = format!("{}: ", name);
    p.message(&msg[..]);
    ReportingIterator {
      name: name,
      progress: Some(p),
      started: Instant::now(),
      inner: inner,
    }
  }

  /// Same iteration, nothing drawn.
  pub fn quiet(inner: I, name: Cow<'static, str>) -> ReportingIterator<I> {
    ReportingIterator {
      name: name,
      progress: None,
      started: Instant::now(),
      inner: inner,
    }
  }

  pub fn elapsed(&self) -> Duration { self.started.elapsed() }
}

impl<I> Iterator for ReportingIterator<I>
  where I: ExactSizeIterator,
{
  type Item = I::Item;
  fn next(&mut self) -> Option<Self::Item> {
    match self.inner.next() {
      Some(v) => {
        if let Some(ref mut p) = self.progress {
          p.inc();
        }
        Some(v)
      },
      None => {
        if let Some(mut p) = self.progress.take() {
          let msg = format!("{} done in {:.2?}\n", self.name, self.elapsed());
          p.finish_println(&msg);
        }

        None
      },
    }
  }

  fn size_hint(&self) -> (usize, Option<usize>) { self.inner.size_hint() }
}
impl<I> ExactSizeIterator for ReportingIterator<I>
  where I: ExactSizeIterator,
{ }
