//! Update Use Case
//!
//! Registers a new revision of a task definition without touching any
//! service.

use crate::domain::entities::{OverrideSet, RevisionChange, RevisionId};
use crate::domain::value_objects::{ModuleVersion, TaskRef};
use crate::error::RolloutResult;

use super::context::RolloutContext;
use super::revision::{deregister, select_base, RevisionPlan};

#[derive(Debug, Clone)]
pub struct UpdateOptions {
    pub task: TaskRef,
    pub module_version: Option<ModuleVersion>,
    /// Deregister the base revision after registering
    pub deregister: bool,
}

#[derive(Debug, Clone)]
pub struct UpdateResult {
    pub base: RevisionId,
    pub revision: RevisionId,
    pub changes: Vec<RevisionChange>,
    pub deregistered: Option<RevisionId>,
}

pub struct UpdateUseCase<'a> {
    ctx: &'a RolloutContext,
}

impl<'a> UpdateUseCase<'a> {
    pub fn new(ctx: &'a RolloutContext) -> Self {
        Self { ctx }
    }

    pub fn execute(
        &self,
        options: &UpdateOptions,
        overrides: &OverrideSet,
    ) -> RolloutResult<UpdateResult> {
        let task = select_base(self.ctx, &options.task, options.module_version.as_ref())?;
        let plan = RevisionPlan::resolve(self.ctx, &task, overrides)?;
        let revision = plan.register(self.ctx)?;

        let deregistered = if options.deregister {
            deregister(self.ctx, &plan.base_id)?;
            Some(plan.base_id.clone())
        } else {
            None
        };

        Ok(UpdateResult {
            base: plan.base_id,
            revision,
            changes: plan.changes,
            deregistered,
        })
    }
}
