//! Deploy Use Case
//!
//! Orchestrates the deployment flow:
//! 1. Describe the service to find its current revision
//! 2. Merge the overrides onto that revision (or `--task`)
//! 3. Register the merged revision
//! 4. Point the service at it
//! 5. Watch the rollout
//! 6. Optionally deregister the previous revision
//!
//! Every validation happens in steps 1-2, before the first mutating call.

use tracing::info;

use crate::application::context::RolloutContext;
use crate::application::revision::{deregister, previous_revision, RevisionPlan};
use crate::domain::entities::{DeploymentOutcome, OverrideSet};
use crate::domain::ports::DeployEvent;
use crate::domain::value_objects::TaskRef;
use crate::error::RolloutResult;

use super::options::DeployOptions;
use super::result::DeployResult;

pub struct DeployUseCase<'a> {
    ctx: &'a RolloutContext,
}

impl<'a> DeployUseCase<'a> {
    pub fn new(ctx: &'a RolloutContext) -> Self {
        Self { ctx }
    }

    pub fn execute(
        &self,
        options: &DeployOptions,
        overrides: &OverrideSet,
    ) -> RolloutResult<DeployResult> {
        let ctx = self.ctx;
        let service = ctx
            .client()
            .describe_service(&options.cluster, &options.service)?;
        let current = TaskRef::Arn(service.task_definition_arn.clone());

        let plan = RevisionPlan::resolve(ctx, &current, overrides)?;
        let revision = plan.register(ctx)?;

        ctx.client().update_service(
            &options.cluster,
            &options.service,
            Some(&revision),
            None,
        )?;
        info!(
            cluster = %options.cluster,
            service = %options.service,
            revision = %revision,
            "service updated"
        );
        ctx.emit(DeployEvent::ServiceUpdated {
            cluster: options.cluster.clone(),
            service: options.service.clone(),
            revision: Some(revision.clone()),
            desired_count: None,
        });

        let outcome = ctx.monitor().watch_service(
            &options.cluster,
            &options.service,
            &revision.arn,
            &service.events,
            options.timeout,
            options.ignore_warnings,
        )?;

        let previous = previous_revision(ctx, &plan, &service.task_definition_arn)?;
        let deregistered = if options.deregister
            && matches!(outcome, DeploymentOutcome::Succeeded { .. })
        {
            deregister(ctx, &previous)?;
            Some(previous.clone())
        } else {
            None
        };

        Ok(DeployResult {
            previous,
            revision,
            changes: plan.changes,
            outcome,
            deregistered,
        })
    }
}
