//! Blue/Green Deploy Use Case
//!
//! Builds a new revision from the deployment group's service and hands it
//! to the blue/green service, then watches the deployment's states.

use tracing::info;

use crate::domain::entities::{
    DeploymentGroupInfo, DeploymentOutcome, OverrideSet, RevisionChange, RevisionId,
};
use crate::domain::ports::DeployEvent;
use crate::domain::value_objects::{TaskRef, WaitTimeout};
use crate::error::RolloutResult;

use super::context::RolloutContext;
use super::revision::{deregister, previous_revision, RevisionPlan};

#[derive(Debug, Clone)]
pub struct CodeDeployOptions {
    pub application: String,
    pub deployment_group: String,
    pub timeout: WaitTimeout,
    /// Container and port receiving load balancer traffic, when the group
    /// does not say
    pub load_balancer_target: Option<(String, u16)>,
    pub deregister: bool,
}

#[derive(Debug, Clone)]
pub struct CodeDeployResult {
    pub deployment_id: String,
    pub group: DeploymentGroupInfo,
    pub previous: RevisionId,
    pub revision: RevisionId,
    pub changes: Vec<RevisionChange>,
    pub outcome: DeploymentOutcome,
    pub deregistered: Option<RevisionId>,
}

pub struct CodeDeployUseCase<'a> {
    ctx: &'a RolloutContext,
}

impl<'a> CodeDeployUseCase<'a> {
    pub fn new(ctx: &'a RolloutContext) -> Self {
        Self { ctx }
    }

    pub fn execute(
        &self,
        options: &CodeDeployOptions,
        overrides: &OverrideSet,
    ) -> RolloutResult<CodeDeployResult> {
        let ctx = self.ctx;
        let mut group = ctx
            .client()
            .describe_deployment_group(&options.application, &options.deployment_group)?;
        if let Some((name, port)) = &options.load_balancer_target {
            group.container_name = Some(name.clone());
            group.container_port = Some(*port);
        }

        let service = ctx.client().describe_service(&group.cluster, &group.service)?;
        let current = TaskRef::Arn(service.task_definition_arn.clone());
        let plan = RevisionPlan::resolve(ctx, &current, overrides)?;
        let revision = plan.register(ctx)?;

        let deployment_id = ctx.client().create_deployment(&group, &revision)?;
        info!(
            deployment = %deployment_id,
            group = %group.deployment_group,
            revision = %revision,
            "blue/green deployment created"
        );
        ctx.emit(DeployEvent::BlueGreenCreated {
            deployment_id: deployment_id.clone(),
        });

        let outcome = ctx
            .monitor()
            .watch_blue_green(&deployment_id, &group, options.timeout)?;

        let previous = previous_revision(ctx, &plan, &service.task_definition_arn)?;
        let deregistered = if options.deregister
            && matches!(outcome, DeploymentOutcome::Succeeded { .. })
        {
            deregister(ctx, &previous)?;
            Some(previous.clone())
        } else {
            None
        };

        Ok(CodeDeployResult {
            deployment_id,
            group,
            previous,
            revision,
            changes: plan.changes,
            outcome,
            deregistered,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{fixture, APPLICATION, GROUP};
    use crate::error::exit_codes;
    use crate::infrastructure::registry::BlueGreenOutcome;
    use std::time::Duration;

    fn options() -> CodeDeployOptions {
        CodeDeployOptions {
            application: APPLICATION.to_string(),
            deployment_group: GROUP.to_string(),
            timeout: WaitTimeout::Bounded(Duration::from_secs(60)),
            load_balancer_target: None,
            deregister: false,
        }
    }

    fn set_outcome(fx: &crate::application::test_support::Fixture, outcome: BlueGreenOutcome) {
        fx.registry.edit(|state| state.deployment_groups[0].outcome = outcome);
    }

    #[test]
    fn successful_deployment_moves_the_service() {
        let fx = fixture();
        let result = CodeDeployUseCase::new(&fx.ctx)
            .execute(
                &CodeDeployOptions {
                    deregister: true,
                    ..options()
                },
                &OverrideSet::builder().image("web", "web:9").build().unwrap(),
            )
            .unwrap();

        assert!(matches!(result.outcome, DeploymentOutcome::Succeeded { .. }));
        assert_eq!(fx.service_arn(), result.revision.arn);
        assert_eq!(result.deregistered.as_ref(), Some(&result.previous));
        assert!(fx
            .events
            .events()
            .iter()
            .any(|e| matches!(e, DeployEvent::BlueGreenCreated { .. })));
    }

    #[test]
    fn stopped_deployment_fails_with_its_message() {
        let fx = fixture();
        set_outcome(
            &fx,
            BlueGreenOutcome::Stop {
                message: "stopped by alarm".to_string(),
            },
        );

        let result = CodeDeployUseCase::new(&fx.ctx)
            .execute(
                &CodeDeployOptions {
                    deregister: true,
                    ..options()
                },
                &OverrideSet::default(),
            )
            .unwrap();

        match &result.outcome {
            DeploymentOutcome::Failed { reason, .. } => assert!(reason.contains("stopped by alarm")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(result.outcome.exit_code(), exit_codes::DEPLOYMENT_FAILED);
        assert!(result.deregistered.is_none());
    }

    #[test]
    fn load_balancer_target_overrides_the_group() {
        let fx = fixture();
        let result = CodeDeployUseCase::new(&fx.ctx)
            .execute(
                &CodeDeployOptions {
                    load_balancer_target: Some(("web".to_string(), 9090)),
                    ..options()
                },
                &OverrideSet::default(),
            )
            .unwrap();
        assert_eq!(result.group.container_port, Some(9090));
    }
}
