use std::time::{Duration, Instant};

use colored::Colorize;

/// Wall-clock timer that reports its lifetime on stderr when debug logging
/// is enabled.
pub struct Profile {
  start: Instant,
  name:  String
}

impl Profile {
  pub fn new(name: impl Into<String>) -> Self {
    Self { start: Instant::now(), name: name.into() }
  }

  pub fn elapsed(&self) -> Duration {
    self.start.elapsed()
  }
}

impl Drop for Profile {
  fn drop(&mut self) {
    if log::log_enabled!(log::Level::Debug) {
      eprintln!("{}: {:.2?}", self.name.blue(), self.elapsed());
    }
  }
}

/// Times the rest of the enclosing block.
#[macro_export]
macro_rules! profile {
  ($name:expr) => {
    let _profile = $crate::profiling::Profile::new($name);
  };
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_elapsed_grows() {
    let profile = Profile::new("test");
    let first = profile.elapsed();
    std::thread::sleep(Duration::from_millis(5));
    assert!(profile.elapsed() > first);
  }

  #[test]
  fn test_macro_in_block() {
    profile!("span");
    assert_eq!(1 + 1, 2);
  }
}
