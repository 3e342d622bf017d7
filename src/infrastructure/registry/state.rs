//! Local registry state
//!
//! The whole registry as one serializable document. `FileRegistry` keeps it
//! in a JSON file and `InMemoryRegistry` in a mutex. A service update settles
//! at once according to the service's `rollout` behaviour, so a monitor sees
//! the final picture on its first poll.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{
    BlueGreenState, BlueGreenStatus, ContainerOverride, DeploymentGroupInfo, RevisionId,
    RunTaskRequest, ServiceDeployment, ServiceEvent, ServiceSnapshot, TagFilter,
    TaskDefinitionSpec, TaskLaunch, TaskSummary,
};
use crate::domain::ports::{RegistryError, RegistryResult};
use crate::domain::value_objects::{LaunchType, TaskRef};

/// Account id used in every generated ARN.
pub const ACCOUNT_ID: &str = "000000000000";

pub fn task_definition_arn(region: &str, family: &str, revision: u32) -> String {
    format!("arn:aws:ecs:{region}:{ACCOUNT_ID}:task-definition/{family}:{revision}")
}

fn task_arn(region: &str, cluster: &str, sequence: u64, index: u32) -> String {
    format!("arn:aws:ecs:{region}:{ACCOUNT_ID}:task/{cluster}/{sequence:016x}{index:08x}")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RevisionStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRevision {
    #[serde(flatten)]
    pub spec: TaskDefinitionSpec,
    #[serde(default)]
    pub status: RevisionStatus,
}

/// How a service reacts to an update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RolloutBehavior {
    /// Every task moves to the new revision immediately
    #[default]
    Converge,
    /// The new deployment starts but no task ever moves
    Stall,
    /// Like `Stall`, plus a service event with `message`
    Fail { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredService {
    pub cluster: String,
    pub name: String,
    pub task_definition_arn: String,
    pub desired_count: u32,
    #[serde(default)]
    pub rollout: RolloutBehavior,
    #[serde(default)]
    pub tasks: Vec<TaskSummary>,
    #[serde(default)]
    pub deployments: Vec<ServiceDeployment>,
    #[serde(default)]
    pub events: Vec<ServiceEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRule {
    pub cluster: String,
    pub name: String,
    pub target_id: String,
    pub task_definition_arn: String,
}

/// Final state a blue/green deployment in this group reaches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BlueGreenOutcome {
    #[default]
    Succeed,
    Fail { message: String },
    Stop { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDeploymentGroup {
    #[serde(flatten)]
    pub info: DeploymentGroupInfo,
    #[serde(default)]
    pub outcome: BlueGreenOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDeployment {
    pub id: String,
    pub application: String,
    pub deployment_group: String,
    pub task_definition_arn: String,
    pub state: BlueGreenState,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTaskRun {
    pub task_arn: String,
    pub cluster: String,
    pub task_definition_arn: String,
    #[serde(default)]
    pub started_by: Option<String>,
    pub launch_type: LaunchType,
    #[serde(default)]
    pub container_overrides: Vec<ContainerOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryState {
    #[serde(default)]
    pub task_definitions: Vec<StoredRevision>,
    #[serde(default)]
    pub services: Vec<StoredService>,
    #[serde(default)]
    pub scheduled_rules: Vec<StoredRule>,
    #[serde(default)]
    pub deployment_groups: Vec<StoredDeploymentGroup>,
    #[serde(default)]
    pub deployments: Vec<StoredDeployment>,
    #[serde(default)]
    pub task_runs: Vec<StoredTaskRun>,
    /// Tasks beyond this many per run-task call fail with `RESOURCE:MEMORY`
    #[serde(default)]
    pub run_capacity: Option<u32>,
    /// Last id handed out
    #[serde(default)]
    pub sequence: u64,
}

impl RegistryState {
    fn next_id(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    fn revision_by_arn(&self, arn: &str) -> Option<&StoredRevision> {
        self.task_definitions
            .iter()
            .find(|r| r.spec.arn.as_deref() == Some(arn))
    }

    fn deployment_group(
        &self,
        application: &str,
        deployment_group: &str,
    ) -> Option<&StoredDeploymentGroup> {
        self.deployment_groups.iter().find(|g| {
            g.info.application == application && g.info.deployment_group == deployment_group
        })
    }

    fn service_index(&self, cluster: &str, service: &str) -> RegistryResult<usize> {
        self.services
            .iter()
            .position(|s| s.cluster == cluster && s.name == service)
            .ok_or_else(|| RegistryError::NotFound {
                resource: format!("service {service} in cluster {cluster}"),
            })
    }

    pub fn describe_task_definition(&self, task: &TaskRef) -> RegistryResult<TaskDefinitionSpec> {
        let found = match task {
            TaskRef::Arn(arn) => self.revision_by_arn(arn),
            TaskRef::FamilyRevision { family, revision } => self
                .task_definitions
                .iter()
                .find(|r| r.spec.family == *family && r.spec.revision == Some(*revision)),
            TaskRef::Family(family) => self
                .task_definitions
                .iter()
                .filter(|r| r.spec.family == *family && r.status == RevisionStatus::Active)
                .max_by_key(|r| r.spec.revision),
        };
        found
            .map(|r| r.spec.clone())
            .ok_or_else(|| RegistryError::NotFound {
                resource: format!("task definition {task}"),
            })
    }

    pub fn find_task_definitions(&self, filters: &[TagFilter]) -> Vec<String> {
        self.task_definitions
            .iter()
            .filter(|r| filters.iter().all(|f| f.matches(&r.spec.tags)))
            .filter_map(|r| r.spec.arn.clone())
            .collect()
    }

    pub fn register_task_definition(
        &mut self,
        spec: &TaskDefinitionSpec,
        region: &str,
    ) -> RegistryResult<RevisionId> {
        if spec.containers.is_empty() {
            return Err(rejected(
                "RegisterTaskDefinition",
                "at least one container definition is required",
            ));
        }
        if !spec.has_unique_container_names() {
            return Err(rejected(
                "RegisterTaskDefinition",
                "container names must be unique",
            ));
        }

        let revision = self
            .task_definitions
            .iter()
            .filter(|r| r.spec.family == spec.family)
            .filter_map(|r| r.spec.revision)
            .max()
            .unwrap_or(0)
            + 1;
        let arn = task_definition_arn(region, &spec.family, revision);
        let mut stored = spec.to_draft();
        stored.revision = Some(revision);
        stored.arn = Some(arn.clone());
        self.task_definitions.push(StoredRevision {
            spec: stored,
            status: RevisionStatus::Active,
        });

        Ok(RevisionId {
            family: spec.family.clone(),
            revision,
            arn,
        })
    }

    pub fn deregister_task_definition(&mut self, revision: &RevisionId) -> RegistryResult<()> {
        let stored = self
            .task_definitions
            .iter_mut()
            .find(|r| r.spec.arn.as_deref() == Some(revision.arn.as_str()))
            .ok_or_else(|| RegistryError::NotFound {
                resource: format!("task definition {revision}"),
            })?;
        stored.status = RevisionStatus::Inactive;
        Ok(())
    }

    pub fn update_service(
        &mut self,
        cluster: &str,
        service: &str,
        revision: Option<&RevisionId>,
        desired_count: Option<u32>,
        region: &str,
        now: DateTime<Utc>,
    ) -> RegistryResult<()> {
        let index = self.service_index(cluster, service)?;
        if let Some(revision) = revision {
            if self.revision_by_arn(&revision.arn).is_none() {
                return Err(rejected(
                    "UpdateService",
                    &format!("task definition {} does not exist", revision.arn),
                ));
            }
        }
        let sequence = self.next_id();

        let service = &mut self.services[index];
        let previous_arn = service.task_definition_arn.clone();
        if let Some(revision) = revision {
            service.task_definition_arn = revision.arn.clone();
        }
        if let Some(count) = desired_count {
            service.desired_count = count;
        }
        let target = service.task_definition_arn.clone();
        let desired = service.desired_count;

        let primary = ServiceDeployment {
            id: format!("ecs-svc/{sequence:019}"),
            status: "PRIMARY".to_string(),
            task_definition_arn: target.clone(),
            desired_count: desired,
            running_count: 0,
            created_at: Some(now),
        };

        match service.rollout.clone() {
            RolloutBehavior::Converge => {
                service.tasks = (0..desired)
                    .map(|i| TaskSummary {
                        arn: task_arn(region, cluster, sequence, i),
                        task_definition_arn: target.clone(),
                        last_status: "RUNNING".to_string(),
                    })
                    .collect();
                service.deployments = vec![ServiceDeployment {
                    running_count: desired,
                    ..primary
                }];
                let message = format!("(service {}) has reached a steady state.", service.name);
                push_event(service, sequence, now, message);
            }
            RolloutBehavior::Stall => stall(service, primary, previous_arn),
            RolloutBehavior::Fail { message } => {
                stall(service, primary, previous_arn);
                push_event(service, sequence, now, message);
            }
        }
        Ok(())
    }

    pub fn describe_service(
        &self,
        cluster: &str,
        service: &str,
    ) -> RegistryResult<ServiceSnapshot> {
        let service = &self.services[self.service_index(cluster, service)?];
        Ok(ServiceSnapshot {
            cluster: service.cluster.clone(),
            service_name: service.name.clone(),
            task_definition_arn: service.task_definition_arn.clone(),
            desired_count: service.desired_count,
            running_count: service.tasks.iter().filter(|t| t.is_running()).count() as u32,
            pending_count: 0,
            deployments: service.deployments.clone(),
            tasks: service.tasks.clone(),
            events: service.events.clone(),
        })
    }

    pub fn run_task(
        &mut self,
        request: &RunTaskRequest,
        region: &str,
    ) -> RegistryResult<Vec<TaskLaunch>> {
        let task = TaskRef::parse(&request.task_definition)
            .map_err(|e| rejected("RunTask", &e.to_string()))?;
        let spec = self.describe_task_definition(&task)?;
        let arn = spec.arn.clone().unwrap_or_default();
        if request.launch_type.requires_network_configuration()
            && !request
                .network_configuration
                .as_ref()
                .is_some_and(|n| n.is_complete())
        {
            return Err(rejected(
                "RunTask",
                "Network Configuration must be provided when networkMode 'awsvpc' is specified.",
            ));
        }

        let sequence = self.next_id();
        let mut launches = Vec::new();
        for index in 0..request.count {
            if self.run_capacity.is_some_and(|capacity| index >= capacity) {
                launches.push(TaskLaunch::Failed {
                    arn: None,
                    reason: "RESOURCE:MEMORY".to_string(),
                });
                continue;
            }
            let task_arn = task_arn(region, &request.cluster, sequence, index);
            self.task_runs.push(StoredTaskRun {
                task_arn: task_arn.clone(),
                cluster: request.cluster.clone(),
                task_definition_arn: arn.clone(),
                started_by: request.started_by.clone(),
                launch_type: request.launch_type,
                container_overrides: request.container_overrides.clone(),
            });
            launches.push(TaskLaunch::Started { task_arn });
        }
        Ok(launches)
    }

    pub fn update_scheduled_rule_target(
        &mut self,
        cluster: &str,
        rule: &str,
        revision: &RevisionId,
    ) -> RegistryResult<String> {
        let stored = self
            .scheduled_rules
            .iter_mut()
            .find(|r| r.cluster == cluster && r.name == rule)
            .ok_or_else(|| RegistryError::NotFound {
                resource: format!("rule {rule}"),
            })?;
        stored.task_definition_arn = revision.arn.clone();
        Ok(stored.target_id.clone())
    }

    pub fn describe_deployment_group(
        &self,
        application: &str,
        deployment_group: &str,
    ) -> RegistryResult<DeploymentGroupInfo> {
        self.deployment_group(application, deployment_group)
            .map(|g| g.info.clone())
            .ok_or_else(|| RegistryError::NotFound {
                resource: format!(
                    "deployment group {deployment_group} of application {application}"
                ),
            })
    }

    pub fn create_deployment(
        &mut self,
        group: &DeploymentGroupInfo,
        revision: &RevisionId,
        region: &str,
        now: DateTime<Utc>,
    ) -> RegistryResult<String> {
        let outcome = self
            .deployment_group(&group.application, &group.deployment_group)
            .map(|g| g.outcome.clone())
            .ok_or_else(|| RegistryError::NotFound {
                resource: format!("deployment group {}", group.deployment_group),
            })?;

        let (state, error_message) = match outcome {
            BlueGreenOutcome::Succeed => {
                self.update_service(
                    &group.cluster,
                    &group.service,
                    Some(revision),
                    None,
                    region,
                    now,
                )?;
                (BlueGreenState::Succeeded, None)
            }
            BlueGreenOutcome::Fail { message } => (BlueGreenState::Failed, Some(message)),
            BlueGreenOutcome::Stop { message } => (BlueGreenState::Stopped, Some(message)),
        };

        let id = format!("d-{:09}", self.next_id());
        self.deployments.push(StoredDeployment {
            id: id.clone(),
            application: group.application.clone(),
            deployment_group: group.deployment_group.clone(),
            task_definition_arn: revision.arn.clone(),
            state,
            error_message,
        });
        Ok(id)
    }

    pub fn describe_deployment(&self, deployment_id: &str) -> RegistryResult<BlueGreenStatus> {
        self.deployments
            .iter()
            .find(|d| d.id == deployment_id)
            .map(|d| BlueGreenStatus {
                deployment_id: d.id.clone(),
                state: d.state,
                error_message: d.error_message.clone(),
            })
            .ok_or_else(|| RegistryError::NotFound {
                resource: format!("deployment {deployment_id}"),
            })
    }
}

fn rejected(operation: &str, message: &str) -> RegistryError {
    RegistryError::Rejected {
        operation: operation.to_string(),
        message: message.to_string(),
    }
}

/// New primary deployment that never gains a task.
fn stall(service: &mut StoredService, primary: ServiceDeployment, previous_arn: String) {
    let running_old = service.tasks.iter().filter(|t| t.is_running()).count() as u32;
    let mut deployments = vec![primary];
    if previous_arn != service.task_definition_arn {
        deployments.push(ServiceDeployment {
            id: format!("{}-previous", deployments[0].id),
            status: "ACTIVE".to_string(),
            task_definition_arn: previous_arn,
            desired_count: running_old,
            running_count: running_old,
            created_at: None,
        });
    }
    service.deployments = deployments;
}

fn push_event(service: &mut StoredService, sequence: u64, now: DateTime<Utc>, message: String) {
    service.events.insert(
        0,
        ServiceEvent {
            id: format!("{sequence:08x}-{}", service.events.len()),
            created_at: now,
            message,
        },
    );
}
