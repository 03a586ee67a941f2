use crate::log::*;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
/// In-flight UDP query counter, an increment-only pair of counters
pub struct ConnCounter {
  /// total number of incoming queries
  cnt_in: AtomicUsize,
  /// total number of served queries
  cnt_out: AtomicUsize,
}

impl ConnCounter {
  #[cfg(test)]
  /// output difference between cnt_in and cnt_out as current in-flight query count
  pub fn get_current(&self) -> isize {
    self.cnt_in.load(Ordering::Relaxed) as isize - self.cnt_out.load(Ordering::Relaxed) as isize
  }

  /// increment cnt_in and output current in-flight query count
  pub fn increment(&self) -> isize {
    let total_in = self.cnt_in.fetch_add(1, Ordering::Relaxed) as isize;
    let c = total_in + 1 - self.cnt_out.load(Ordering::Relaxed) as isize;
    debug!("UDP query count++: {}", c);
    c
  }

  /// increment cnt_out and output current in-flight query count
  pub fn decrement(&self) -> isize {
    let total_out = self.cnt_out.fetch_add(1, Ordering::Relaxed) as isize;
    let c = self.cnt_in.load(Ordering::Relaxed) as isize - total_out - 1;
    debug!("UDP query count--: {}", c);
    c
  }
}
