//! Run Use Case
//!
//! Starts one-off tasks. Without `register`, the overrides travel as
//! per-container run overrides on the existing revision, so only command,
//! environment and secret changes are allowed. With `register`, the merged
//! revision is registered first and run as-is.

use tracing::{info, warn};

use crate::domain::entities::{
    ContainerOverride, NetworkConfiguration, OverrideSet, RevisionChange, RevisionId,
    RunTaskRequest, TaskLaunch,
};
use crate::domain::ports::DeployEvent;
use crate::domain::value_objects::{LaunchType, ModuleVersion, TaskRef};
use crate::error::{exit_codes, RolloutResult, ValidationError};

use super::context::RolloutContext;
use super::revision::{select_base, RevisionPlan};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub cluster: String,
    pub task: TaskRef,
    /// Select the newest revision of the `task` family tagged with a
    /// compatible module version
    pub module_version: Option<ModuleVersion>,
    pub count: u32,
    pub launch_type: LaunchType,
    /// Subnets and security groups from the command line; falls back to
    /// the revision's own network configuration when empty.
    pub network: NetworkConfiguration,
    pub platform_version: Option<String>,
    pub started_by: Option<String>,
    /// Register the merged revision instead of sending run overrides
    pub register: bool,
}

impl RunOptions {
    pub fn new(cluster: impl Into<String>, task: TaskRef) -> Self {
        Self {
            cluster: cluster.into(),
            task,
            module_version: None,
            count: 1,
            launch_type: LaunchType::default(),
            network: NetworkConfiguration::default(),
            platform_version: None,
            started_by: None,
            register: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunResult {
    /// ARN the tasks were started from
    pub task_definition_arn: String,
    /// Set when a new revision was registered for this run
    pub registered: Option<RevisionId>,
    pub changes: Vec<RevisionChange>,
    pub launches: Vec<TaskLaunch>,
}

impl RunResult {
    pub fn started(&self) -> impl Iterator<Item = &str> {
        self.launches.iter().filter_map(|l| match l {
            TaskLaunch::Started { task_arn } => Some(task_arn.as_str()),
            TaskLaunch::Failed { .. } => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &str> {
        self.launches.iter().filter_map(|l| match l {
            TaskLaunch::Failed { reason, .. } => Some(reason.as_str()),
            TaskLaunch::Started { .. } => None,
        })
    }

    /// Every requested task started.
    pub fn is_success(&self) -> bool {
        !self.launches.is_empty() && self.launches.iter().all(TaskLaunch::is_started)
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            exit_codes::OK
        } else {
            exit_codes::DEPLOYMENT_FAILED
        }
    }
}

pub struct RunUseCase<'a> {
    ctx: &'a RolloutContext,
}

impl<'a> RunUseCase<'a> {
    pub fn new(ctx: &'a RolloutContext) -> Self {
        Self { ctx }
    }

    pub fn execute(
        &self,
        options: &RunOptions,
        overrides: &OverrideSet,
    ) -> RolloutResult<RunResult> {
        let ctx = self.ctx;
        if options.count == 0 {
            return Err(ValidationError::InvalidTaskCount.into());
        }
        if !options.register {
            if let Some(what) = overrides.unsupported_as_container_override() {
                return Err(ValidationError::UnsupportedRunOverride {
                    what: what.to_string(),
                }
                .into());
            }
        }

        let task = select_base(ctx, &options.task, options.module_version.as_ref())?;
        let plan = RevisionPlan::resolve(ctx, &task, overrides)?;
        let network = resolve_network(options, &plan)?;

        let (registered, task_definition_arn, container_overrides) = if options.register {
            let revision = plan.register(ctx)?;
            let arn = revision.arn.clone();
            (Some(revision), arn, Vec::new())
        } else {
            let overrides = container_overrides(&plan, overrides);
            (None, plan.base_id.arn.clone(), overrides)
        };

        let request = RunTaskRequest {
            cluster: options.cluster.clone(),
            task_definition: task_definition_arn.clone(),
            count: options.count,
            started_by: options.started_by.clone(),
            launch_type: options.launch_type,
            network_configuration: network,
            platform_version: options.platform_version.clone(),
            container_overrides,
        };
        let launches = ctx.client().run_task(&request)?;

        for launch in &launches {
            match launch {
                TaskLaunch::Started { task_arn } => {
                    info!(task = %task_arn, "task started");
                    ctx.emit(DeployEvent::TaskStarted {
                        task_arn: task_arn.clone(),
                    });
                }
                TaskLaunch::Failed { arn, reason } => {
                    warn!(arn = ?arn, %reason, "task failed to start");
                    ctx.emit(DeployEvent::TaskFailed {
                        reason: reason.clone(),
                    });
                }
            }
        }

        Ok(RunResult {
            task_definition_arn,
            registered,
            changes: plan.changes,
            launches,
        })
    }
}

/// Flags win; otherwise the revision's own configuration is used.
fn resolve_network(
    options: &RunOptions,
    plan: &RevisionPlan,
) -> RolloutResult<Option<NetworkConfiguration>> {
    let from_flags = !options.network.subnets.is_empty()
        || !options.network.security_groups.is_empty();
    let network = if from_flags {
        Some(options.network.clone())
    } else {
        plan.merged.network_configuration.clone()
    };

    if options.launch_type.requires_network_configuration()
        && !network.as_ref().is_some_and(NetworkConfiguration::is_complete)
    {
        return Err(ValidationError::MissingNetworkConfiguration {
            launch_type: options.launch_type.to_string(),
        }
        .into());
    }
    Ok(network)
}

/// Per-container overrides carrying the full merged values of whatever the
/// override set touched.
fn container_overrides(plan: &RevisionPlan, overrides: &OverrideSet) -> Vec<ContainerOverride> {
    plan.merged
        .containers
        .iter()
        .map(|container| {
            let name = container.name.as_str();
            let touches_env = overrides.env_upserts.iter().any(|u| u.container == name);
            let touches_secrets = overrides.secret_upserts.iter().any(|u| u.container == name);
            ContainerOverride {
                name: container.name.clone(),
                command: if overrides.command_overrides.contains_key(name) {
                    container.command.clone()
                } else {
                    None
                },
                environment: touches_env.then(|| container.environment.clone()),
                secrets: touches_secrets.then(|| container.secrets.clone()),
            }
        })
        .filter(|o| !o.is_empty())
        .collect()
}
