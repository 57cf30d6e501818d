//! Fixed-interval frame pacing for the terminal replay loop.

use std::time::{Duration, Instant};

/// Paces frames at a fixed interval without drifting.
#[derive(Debug)]
pub struct Ticker {
  interval: Duration,
  next_at:  Instant,
}

impl Ticker {
  pub fn new(interval: Duration, now: Instant) -> Self {
    let interval = interval.max(Duration::from_millis(1));
    Self {
      interval,
      next_at: now + interval,
    }
  }

  /// How long the input poll may block before the next frame is due.
  pub fn timeout(&self, now: Instant) -> Duration {
    self.next_at.saturating_duration_since(now)
  }

  /// Returns `true` once per elapsed interval. After a stall the schedule
  /// restarts from `now` rather than firing a burst of catch-up frames.
  pub fn due(&mut self, now: Instant) -> bool {
    if now < self.next_at {
      return false;
    }
    self.next_at += self.interval;
    if self.next_at <= now {
      self.next_at = now + self.interval;
    }
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fires_once_per_interval() {
    let start = Instant::now();
    let mut ticker = Ticker::new(Duration::from_millis(16), start);
    assert!(!ticker.due(start));
    assert_eq!(ticker.timeout(start), Duration::from_millis(16));
    assert!(ticker.due(start + Duration::from_millis(16)));
    assert!(!ticker.due(start + Duration::from_millis(20)));
    assert!(ticker.due(start + Duration::from_millis(32)));
  }

  #[test]
  fn stall_does_not_burst() {
    let start = Instant::now();
    let mut ticker = Ticker::new(Duration::from_millis(10), start);
    let late = start + Duration::from_millis(500);
    assert!(ticker.due(late));
    assert!(!ticker.due(late));
    assert_eq!(ticker.timeout(late), Duration::from_millis(10));
  }
}
