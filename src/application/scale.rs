//! Scale Use Case
//!
//! Changes a service's desired count and watches it settle on the revision
//! it already runs.

use tracing::info;

use crate::domain::entities::DeploymentOutcome;
use crate::domain::ports::DeployEvent;
use crate::domain::value_objects::WaitTimeout;
use crate::error::RolloutResult;

use super::context::RolloutContext;

#[derive(Debug, Clone)]
pub struct ScaleOptions {
    pub cluster: String,
    pub service: String,
    pub desired_count: u32,
    pub timeout: WaitTimeout,
    pub ignore_warnings: bool,
}

#[derive(Debug, Clone)]
pub struct ScaleResult {
    /// Revision the service runs
    pub task_definition_arn: String,
    pub previous_count: u32,
    pub desired_count: u32,
    pub outcome: DeploymentOutcome,
}

pub struct ScaleUseCase<'a> {
    ctx: &'a RolloutContext,
}

impl<'a> ScaleUseCase<'a> {
    pub fn new(ctx: &'a RolloutContext) -> Self {
        Self { ctx }
    }

    pub fn execute(&self, options: &ScaleOptions) -> RolloutResult<ScaleResult> {
        let ctx = self.ctx;
        let service = ctx
            .client()
            .describe_service(&options.cluster, &options.service)?;

        ctx.client().update_service(
            &options.cluster,
            &options.service,
            None,
            Some(options.desired_count),
        )?;
        info!(
            cluster = %options.cluster,
            service = %options.service,
            from = service.desired_count,
            to = options.desired_count,
            "desired count updated"
        );
        ctx.emit(DeployEvent::ServiceUpdated {
            cluster: options.cluster.clone(),
            service: options.service.clone(),
            revision: None,
            desired_count: Some(options.desired_count),
        });

        let outcome = ctx.monitor().watch_service(
            &options.cluster,
            &options.service,
            &service.task_definition_arn,
            &service.events,
            options.timeout,
            options.ignore_warnings,
        )?;

        Ok(ScaleResult {
            task_definition_arn: service.task_definition_arn,
            previous_count: service.desired_count,
            desired_count: options.desired_count,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{fixture, CLUSTER, SERVICE};
    use crate::infrastructure::registry::RolloutBehavior;
    use std::time::Duration;

    fn options(count: u32, timeout_secs: u64) -> ScaleOptions {
        ScaleOptions {
            cluster: CLUSTER.to_string(),
            service: SERVICE.to_string(),
            desired_count: count,
            timeout: WaitTimeout::Bounded(Duration::from_secs(timeout_secs)),
            ignore_warnings: false,
        }
    }

    #[test]
    fn scales_up_on_the_current_revision() {
        let fx = fixture();
        let arn = fx.service_arn();

        let result = ScaleUseCase::new(&fx.ctx).execute(&options(5, 60)).unwrap();

        assert_eq!(result.previous_count, 2);
        assert_eq!(result.task_definition_arn, arn);
        assert_eq!(
            result.outcome,
            DeploymentOutcome::Succeeded {
                final_task_count: 5
            }
        );
        assert_eq!(fx.registry.snapshot().unwrap().task_definitions.len(), 2);
    }

    #[test]
    fn scale_to_zero_converges() {
        let fx = fixture();
        let result = ScaleUseCase::new(&fx.ctx).execute(&options(0, 60)).unwrap();
        assert_eq!(
            result.outcome,
            DeploymentOutcome::Succeeded {
                final_task_count: 0
            }
        );
    }

    #[test]
    fn failing_scale_reports_the_event() {
        let fx = fixture();
        fx.set_rollout(RolloutBehavior::Fail {
            message: "(service web) was unable to place a task because of insufficient memory"
                .to_string(),
        });

        let result = ScaleUseCase::new(&fx.ctx).execute(&options(4, 60)).unwrap();
        assert!(matches!(result.outcome, DeploymentOutcome::Failed { .. }));
    }
}
