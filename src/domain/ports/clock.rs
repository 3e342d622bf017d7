//! Clock port
//!
//! The monitor reads time and sleeps only through this trait so tests can
//! run whole rollouts in virtual time.

use std::time::Duration;

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn sleep(&self, duration: Duration);

    /// Time elapsed since `start`, zero if the clock went backwards.
    fn elapsed_since(&self, start: DateTime<Utc>) -> Duration {
        (self.now() - start).to_std().unwrap_or_default()
    }
}
