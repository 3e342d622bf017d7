//! Deploy Result

use crate::domain::entities::{DeploymentOutcome, RevisionChange, RevisionId};

/// Result of a deploy operation
#[derive(Debug, Clone)]
pub struct DeployResult {
    /// Revision the service ran before the update
    pub previous: RevisionId,
    /// Revision registered and rolled out
    pub revision: RevisionId,
    pub changes: Vec<RevisionChange>,
    pub outcome: DeploymentOutcome,
    /// Set when the previous revision was deregistered
    pub deregistered: Option<RevisionId>,
}

impl DeployResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}
