//! How long an action waits for its rollout to settle

use std::fmt;
use std::time::Duration;

use crate::error::ValidationError;

/// CLI sentinel meaning "submit and return immediately".
pub const NO_WAIT_SENTINEL: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTimeout {
    /// Do not monitor at all.
    NoWait,
    /// Monitor until the deadline.
    Bounded(Duration),
}

impl WaitTimeout {
    /// Interpret a timeout given in seconds, where `-1` means no wait.
    pub fn from_seconds(value: i64) -> Result<Self, ValidationError> {
        match value {
            NO_WAIT_SENTINEL => Ok(WaitTimeout::NoWait),
            v if v >= 0 => Ok(WaitTimeout::Bounded(Duration::from_secs(v as u64))),
            v => Err(ValidationError::InvalidTimeout { value: v }),
        }
    }
}

impl fmt::Display for WaitTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitTimeout::NoWait => write!(f, "no wait"),
            WaitTimeout::Bounded(d) => write!(f, "{}s", d.as_secs()),
        }
    }
}
