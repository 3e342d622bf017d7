//! Event policy
//!
//! Classifies service event messages with an ordered list of regex rules.
//! The first matching rule decides category and severity; a message no rule
//! matches is not a failure signal.

use regex::Regex;

use crate::domain::value_objects::{EventCategory, EventSeverity};
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct EventRule {
    pattern: Regex,
    pub category: EventCategory,
    pub severity: EventSeverity,
}

impl EventRule {
    pub fn new(
        pattern: &str,
        category: EventCategory,
        severity: EventSeverity,
    ) -> Result<Self, ConfigError> {
        let pattern = Regex::new(pattern).map_err(|e| ConfigError::InvalidEventRule {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            pattern,
            category,
            severity,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn matches(&self, message: &str) -> bool {
        self.pattern.is_match(message)
    }
}

/// A message matched by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: EventCategory,
    pub severity: EventSeverity,
}

#[derive(Debug, Clone)]
pub struct EventPolicy {
    rules: Vec<EventRule>,
}

const DEFAULT_RULES: &[(&str, EventCategory)] = &[
    (r"(?i)unable to place", EventCategory::Placement),
    (
        r"(?i)insufficient (memory|cpu|capacity)|no container instances",
        EventCategory::Capacity,
    ),
    (
        r"(?i)health ?checks?\b.*\bfail|fail.*\bhealth ?checks?|unhealthy",
        EventCategory::HealthCheck,
    ),
];

impl EventPolicy {
    pub fn new(rules: Vec<EventRule>) -> Self {
        Self { rules }
    }

    /// Placement, capacity and health-check failures, all at error severity.
    pub fn default_rules() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .filter_map(|(pattern, category)| {
                EventRule::new(pattern, *category, EventSeverity::Error).ok()
            })
            .collect();
        Self { rules }
    }

    pub fn rules(&self) -> &[EventRule] {
        &self.rules
    }

    pub fn classify(&self, message: &str) -> Option<Classification> {
        self.rules
            .iter()
            .find(|rule| rule.matches(message))
            .map(|rule| Classification {
                category: rule.category,
                severity: rule.severity,
            })
    }
}

impl Default for EventPolicy {
    fn default() -> Self {
        Self::default_rules()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_all_compile() {
        assert_eq!(EventPolicy::default_rules().rules().len(), DEFAULT_RULES.len());
    }

    #[test]
    fn classifies_placement_failures() {
        let policy = EventPolicy::default();
        let hit = policy
            .classify("(service web) was unable to place a task because no container instance met all of its requirements.")
            .unwrap();
        assert_eq!(hit.category, EventCategory::Placement);
        assert_eq!(hit.severity, EventSeverity::Error);
    }

    #[test]
    fn classifies_capacity_failures() {
        let policy = EventPolicy::default();
        let hit = policy
            .classify("The closest matching container-instance has insufficient memory available.")
            .unwrap();
        // "unable to place" is absent, so capacity wins
        assert_eq!(hit.category, EventCategory::Capacity);
    }

    #[test]
    fn classifies_health_check_failures() {
        let policy = EventPolicy::default();
        let hit = policy
            .classify("(service web) (task 1234) failed container health checks.")
            .unwrap();
        assert_eq!(hit.category, EventCategory::HealthCheck);
    }

    #[test]
    fn routine_messages_are_not_classified() {
        let policy = EventPolicy::default();
        assert!(policy.classify("(service web) has reached a steady state.").is_none());
        assert!(policy
            .classify("(service web) has started 2 tasks: (task a) (task b).")
            .is_none());
    }

    #[test]
    fn first_matching_rule_wins() {
        let policy = EventPolicy::new(vec![
            EventRule::new("(?i)draining", EventCategory::Other, EventSeverity::Warning).unwrap(),
            EventRule::new("(?i)drain", EventCategory::Capacity, EventSeverity::Error).unwrap(),
        ]);
        let hit = policy.classify("connection draining started").unwrap();
        assert_eq!(hit.category, EventCategory::Other);
        assert_eq!(hit.severity, EventSeverity::Warning);
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        let err = EventRule::new("(unclosed", EventCategory::Other, EventSeverity::Error)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEventRule { ref pattern, .. } if pattern == "(unclosed"));
    }
}
