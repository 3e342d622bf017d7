//! Classification labels for service events

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Placement,
    Capacity,
    HealthCheck,
    Other,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventCategory::Placement => "placement",
            EventCategory::Capacity => "capacity",
            EventCategory::HealthCheck => "health_check",
            EventCategory::Other => "other",
        };
        f.write_str(s)
    }
}

/// What a matched event does to the rollout. `Warning` is reported and
/// polling continues; `Error` fails unless warnings are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    Warning,
    #[default]
    Error,
}
