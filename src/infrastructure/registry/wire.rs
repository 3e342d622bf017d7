//! JSON shapes exchanged with the container, events, tagging and blue/green
//! services
//!
//! Only the fields the rollout engine reads or writes are typed; everything
//! else on a task or container definition is kept in `extra` and sent back
//! unchanged on registration.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::entities;
use crate::domain::entities::{
    ContainerOverride, ContainerSpec, NetworkConfiguration, RevisionId, ServiceDeployment,
    ServiceEvent, TaskDefinitionSpec, TaskSummary,
};

/// Attributes the service sets on describe that must not be sent back on
/// registration.
const READ_ONLY_ATTRIBUTES: &[&str] = &[
    "status",
    "compatibilities",
    "requiresAttributes",
    "registeredAt",
    "registeredBy",
    "deregisteredAt",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValuePair {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    pub name: String,
    pub value_from: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDefinition {
    pub name: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<KeyValuePair>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<Secret>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_definition_arn: Option<String>,
    pub family: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,
    pub container_definitions: Vec<ContainerDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires_compatibilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl TaskDefinition {
    pub fn into_spec(self, tags: Vec<Tag>) -> TaskDefinitionSpec {
        let containers = self
            .container_definitions
            .into_iter()
            .map(|c| ContainerSpec {
                name: c.name,
                image: c.image,
                command: c.command,
                environment: c.environment.into_iter().map(|e| (e.name, e.value)).collect(),
                secrets: c
                    .secrets
                    .into_iter()
                    .map(|s| (s.name, s.value_from))
                    .collect(),
                extra_attributes: c.extra,
            })
            .collect();

        let mut extra = self.extra;
        for key in READ_ONLY_ATTRIBUTES {
            extra.remove(*key);
        }

        TaskDefinitionSpec {
            family: self.family,
            revision: self.revision,
            arn: self.task_definition_arn,
            containers,
            task_role_arn: self.task_role_arn.filter(|r| !r.is_empty()),
            execution_role_arn: self.execution_role_arn.filter(|r| !r.is_empty()),
            network_mode: self.network_mode,
            requires_compatibilities: self.requires_compatibilities,
            cpu: self.cpu,
            memory: self.memory,
            network_configuration: None,
            tags: tags.into_iter().map(|t| (t.key, t.value)).collect(),
            extra_attributes: extra,
        }
    }

    pub fn revision_id(&self) -> Option<RevisionId> {
        Some(RevisionId {
            family: self.family.clone(),
            revision: self.revision?,
            arn: self.task_definition_arn.clone()?,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeTaskDefinitionRequest<'a> {
    pub task_definition: &'a str,
    pub include: [&'static str; 1],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeTaskDefinitionResponse {
    pub task_definition: TaskDefinition,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTaskDefinitionRequest {
    #[serde(flatten)]
    pub task_definition: TaskDefinition,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl RegisterTaskDefinitionRequest {
    pub fn from_spec(spec: &TaskDefinitionSpec) -> Self {
        let container_definitions = spec
            .containers
            .iter()
            .map(|c| ContainerDefinition {
                name: c.name.clone(),
                image: c.image.clone(),
                command: c.command.clone(),
                environment: c
                    .environment
                    .iter()
                    .map(|(name, value)| KeyValuePair {
                        name: name.clone(),
                        value: value.clone(),
                    })
                    .collect(),
                secrets: c
                    .secrets
                    .iter()
                    .map(|(name, value_from)| Secret {
                        name: name.clone(),
                        value_from: value_from.clone(),
                    })
                    .collect(),
                extra: c.extra_attributes.clone(),
            })
            .collect();

        Self {
            task_definition: TaskDefinition {
                task_definition_arn: None,
                family: spec.family.clone(),
                revision: None,
                container_definitions,
                task_role_arn: spec.task_role_arn.clone(),
                execution_role_arn: spec.execution_role_arn.clone(),
                network_mode: spec.network_mode.clone(),
                requires_compatibilities: spec.requires_compatibilities.clone(),
                cpu: spec.cpu.clone(),
                memory: spec.memory.clone(),
                extra: spec.extra_attributes.clone(),
            },
            tags: spec
                .tags
                .iter()
                .map(|(key, value)| Tag {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinitionResponse {
    pub task_definition: TaskDefinition,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeregisterTaskDefinitionRequest<'a> {
    pub task_definition: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest<'a> {
    pub cluster: &'a str,
    pub service: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_definition: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_count: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeServicesRequest<'a> {
    pub cluster: &'a str,
    pub services: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeServicesResponse {
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub failures: Vec<Failure>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub service_name: String,
    pub task_definition: String,
    pub desired_count: u32,
    pub running_count: u32,
    #[serde(default)]
    pub pending_count: u32,
    #[serde(default)]
    pub deployments: Vec<Deployment>,
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: String,
    pub status: String,
    pub task_definition: String,
    pub desired_count: u32,
    pub running_count: u32,
    #[serde(default, deserialize_with = "epoch_seconds_opt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Deployment> for ServiceDeployment {
    fn from(d: Deployment) -> Self {
        ServiceDeployment {
            id: d.id,
            status: d.status,
            task_definition_arn: d.task_definition,
            desired_count: d.desired_count,
            running_count: d.running_count,
            created_at: d.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    #[serde(deserialize_with = "epoch_seconds")]
    pub created_at: DateTime<Utc>,
    pub message: String,
}

impl From<Event> for ServiceEvent {
    fn from(e: Event) -> Self {
        ServiceEvent {
            id: e.id,
            created_at: e.created_at,
            message: e.message,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Failure {
    #[serde(default)]
    pub arn: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksRequest<'a> {
    pub cluster: &'a str,
    pub service_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksResponse {
    #[serde(default)]
    pub task_arns: Vec<String>,
    /// Present while more pages remain
    #[serde(default)]
    pub next_token: Option<String>,
}

/// Resource type of task definitions in the tagging API
pub const TASK_DEFINITION_RESOURCE_TYPE: &str = "ecs:task-definition";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetResourcesRequest<'a> {
    pub resource_type_filters: [&'static str; 1],
    pub tag_filters: &'a [TagFilter<'a>],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination_token: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TagFilter<'a> {
    pub key: &'a str,
    pub values: &'a [String],
}

impl<'a> From<&'a entities::TagFilter> for TagFilter<'a> {
    fn from(filter: &'a entities::TagFilter) -> Self {
        TagFilter {
            key: &filter.key,
            values: &filter.values,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetResourcesResponse {
    /// Empty or absent on the last page
    #[serde(default)]
    pub pagination_token: Option<String>,
    #[serde(default)]
    pub resource_tag_mapping_list: Vec<ResourceTagMapping>,
}

#[derive(Debug, Deserialize)]
pub struct ResourceTagMapping {
    #[serde(rename = "ResourceARN")]
    pub resource_arn: String,
}

#[derive(Debug, Serialize)]
pub struct DescribeTasksRequest<'a> {
    pub cluster: &'a str,
    pub tasks: &'a [String],
}

#[derive(Debug, Deserialize)]
pub struct DescribeTasksResponse {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_arn: String,
    pub task_definition_arn: String,
    #[serde(default)]
    pub last_status: String,
}

impl From<Task> for TaskSummary {
    fn from(t: Task) -> Self {
        TaskSummary {
            arn: t.task_arn,
            task_definition_arn: t.task_definition_arn,
            last_status: t.last_status,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsVpcConfiguration {
    pub subnets: Vec<String>,
    pub security_groups: Vec<String>,
    pub assign_public_ip: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfigurationShape {
    pub awsvpc_configuration: AwsVpcConfiguration,
}

impl From<&NetworkConfiguration> for NetworkConfigurationShape {
    fn from(n: &NetworkConfiguration) -> Self {
        Self {
            awsvpc_configuration: AwsVpcConfiguration {
                subnets: n.subnets.iter().cloned().collect(),
                security_groups: n.security_groups.iter().cloned().collect(),
                assign_public_ip: if n.assign_public_ip {
                    "ENABLED"
                } else {
                    "DISABLED"
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerOverrideShape {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Vec<KeyValuePair>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Vec<Secret>>,
}

impl From<&ContainerOverride> for ContainerOverrideShape {
    fn from(o: &ContainerOverride) -> Self {
        Self {
            name: o.name.clone(),
            command: o.command.clone(),
            environment: o.environment.as_ref().map(|env| {
                env.iter()
                    .map(|(name, value)| KeyValuePair {
                        name: name.clone(),
                        value: value.clone(),
                    })
                    .collect()
            }),
            secrets: o.secrets.as_ref().map(|secrets| {
                secrets
                    .iter()
                    .map(|(name, value_from)| Secret {
                        name: name.clone(),
                        value_from: value_from.clone(),
                    })
                    .collect()
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOverride {
    pub container_overrides: Vec<ContainerOverrideShape>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTaskRequestShape<'a> {
    pub cluster: &'a str,
    pub task_definition: &'a str,
    pub count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_by: Option<&'a str>,
    pub launch_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_configuration: Option<NetworkConfigurationShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<&'a str>,
    pub overrides: TaskOverride,
}

#[derive(Debug, Deserialize)]
pub struct RunTaskResponse {
    #[serde(default)]
    pub tasks: Vec<StartedTask>,
    #[serde(default)]
    pub failures: Vec<Failure>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedTask {
    pub task_arn: String,
}

// Scheduled-event rules use PascalCase.

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListTargetsByRuleRequest<'a> {
    pub rule: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListTargetsByRuleResponse {
    #[serde(default)]
    pub targets: Vec<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutTargetsRequest<'a> {
    pub rule: &'a str,
    pub targets: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutTargetsResponse {
    #[serde(default)]
    pub failed_entry_count: u32,
    #[serde(default)]
    pub failed_entries: Vec<Value>,
}

// Blue/green deployments.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDeploymentGroupRequest<'a> {
    pub application_name: &'a str,
    pub deployment_group_name: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDeploymentGroupResponse {
    pub deployment_group_info: DeploymentGroupShape,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentGroupShape {
    #[serde(default)]
    pub ecs_services: Vec<EcsServiceShape>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EcsServiceShape {
    pub service_name: String,
    pub cluster_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeploymentRequest<'a> {
    pub application_name: &'a str,
    pub deployment_group_name: &'a str,
    pub revision: AppSpecRevision,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSpecRevision {
    pub revision_type: &'static str,
    pub app_spec_content: AppSpecContent,
}

#[derive(Debug, Serialize)]
pub struct AppSpecContent {
    pub content: String,
}

impl AppSpecRevision {
    /// Appspec pointing the group's service at `task_definition_arn`.
    pub fn for_task_definition(
        task_definition_arn: &str,
        container: Option<(&str, u16)>,
    ) -> Self {
        let mut properties = serde_json::json!({ "TaskDefinition": task_definition_arn });
        if let Some((name, port)) = container {
            properties["LoadBalancerInfo"] = serde_json::json!({
                "ContainerName": name,
                "ContainerPort": port,
            });
        }
        let appspec = serde_json::json!({
            "version": 0.0,
            "Resources": [{
                "TargetService": {
                    "Type": "AWS::ECS::Service",
                    "Properties": properties,
                }
            }]
        });
        Self {
            revision_type: "AppSpecContent",
            app_spec_content: AppSpecContent {
                content: appspec.to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeploymentResponse {
    pub deployment_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDeploymentRequest<'a> {
    pub deployment_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDeploymentResponse {
    pub deployment_info: DeploymentInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentInfo {
    pub deployment_id: String,
    pub status: String,
    #[serde(default)]
    pub error_information: Option<ErrorInformation>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorInformation {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body shared by all three services.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "__type", default)]
    pub error_type: String,
    #[serde(alias = "Message", default)]
    pub message: String,
}

impl ErrorBody {
    /// `com.amazonaws...#ThrottlingException` → `ThrottlingException`
    pub fn short_type(&self) -> &str {
        self.error_type
            .rsplit_once('#')
            .map_or(self.error_type.as_str(), |(_, name)| name)
    }
}

fn from_epoch(seconds: f64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)
}

fn epoch_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let seconds = f64::deserialize(deserializer)?;
    from_epoch(seconds).ok_or_else(|| serde::de::Error::custom("timestamp out of range"))
}

fn epoch_seconds_opt<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.and_then(from_epoch))
}
