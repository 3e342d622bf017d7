//! Cron Use Case
//!
//! Registers a new revision and points a scheduled rule's target at it.

use tracing::info;

use crate::domain::entities::{OverrideSet, RevisionChange, RevisionId};
use crate::domain::ports::DeployEvent;
use crate::domain::value_objects::{ModuleVersion, TaskRef};
use crate::error::RolloutResult;

use super::context::RolloutContext;
use super::revision::{deregister, select_base, RevisionPlan};

#[derive(Debug, Clone)]
pub struct CronOptions {
    pub cluster: String,
    pub rule: String,
    pub task: TaskRef,
    pub module_version: Option<ModuleVersion>,
    pub deregister: bool,
}

#[derive(Debug, Clone)]
pub struct CronResult {
    pub rule: String,
    pub target_id: String,
    pub base: RevisionId,
    pub revision: RevisionId,
    pub changes: Vec<RevisionChange>,
    pub deregistered: Option<RevisionId>,
}

pub struct CronUseCase<'a> {
    ctx: &'a RolloutContext,
}

impl<'a> CronUseCase<'a> {
    pub fn new(ctx: &'a RolloutContext) -> Self {
        Self { ctx }
    }

    pub fn execute(
        &self,
        options: &CronOptions,
        overrides: &OverrideSet,
    ) -> RolloutResult<CronResult> {
        let ctx = self.ctx;
        let task = select_base(ctx, &options.task, options.module_version.as_ref())?;
        let plan = RevisionPlan::resolve(ctx, &task, overrides)?;
        let revision = plan.register(ctx)?;

        let target_id =
            ctx.client()
                .update_scheduled_rule_target(&options.cluster, &options.rule, &revision)?;
        info!(
            rule = %options.rule,
            target = %target_id,
            revision = %revision,
            "rule target updated"
        );
        ctx.emit(DeployEvent::RuleUpdated {
            rule: options.rule.clone(),
            target_id: target_id.clone(),
        });

        let deregistered = if options.deregister {
            deregister(ctx, &plan.base_id)?;
            Some(plan.base_id.clone())
        } else {
            None
        };

        Ok(CronResult {
            rule: options.rule.clone(),
            target_id,
            base: plan.base_id,
            revision,
            changes: plan.changes,
            deregistered,
        })
    }
}
