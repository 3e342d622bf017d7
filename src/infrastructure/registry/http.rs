//! HTTP registry client
//!
//! Speaks the JSON 1.1 protocol (one POST endpoint, operation named by the
//! `X-Amz-Target` header) for the container service, scheduled events,
//! resource tags and blue/green deployments. List calls follow their page
//! tokens to the end. Requests are not signed; point the endpoint at
//! a signing proxy or a local emulator.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

use crate::domain::entities::{
    BlueGreenState, BlueGreenStatus, DeploymentGroupInfo, RevisionId, RunTaskRequest,
    ServiceSnapshot, TagFilter, TaskDefinitionSpec, TaskLaunch, TaskSummary,
};
use crate::domain::ports::{RegistryClient, RegistryError, RegistryResult};
use crate::domain::value_objects::{LaunchType, TaskRef};

use super::wire;

const CONTENT_TYPE_JSON_1_1: &str = "application/x-amz-json-1.1";
const DEFAULT_PLATFORM_VERSION: &str = "LATEST";
/// Most tasks a single describe-tasks call accepts.
const DESCRIBE_TASKS_BATCH: usize = 100;

#[derive(Debug, Clone, Copy)]
enum Api {
    Containers,
    Events,
    BlueGreen,
    Tagging,
}

impl Api {
    fn target_prefix(self) -> &'static str {
        match self {
            Api::Containers => "AmazonEC2ContainerServiceV20141113",
            Api::Events => "AWSEvents",
            Api::BlueGreen => "CodeDeploy_20141006",
            Api::Tagging => "ResourceGroupsTaggingAPI_20170126",
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpRegistryClient {
    client: Client,
    endpoint: String,
    region: String,
}

impl HttpRegistryClient {
    pub fn new(
        endpoint: impl Into<String>,
        region: impl Into<String>,
        timeout: Duration,
    ) -> RegistryResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport)?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_owned(),
            region: region.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn call<Req, Resp>(&self, api: Api, operation: &str, body: &Req) -> RegistryResult<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let target = format!("{}.{operation}", api.target_prefix());
        debug!(%target, endpoint = %self.endpoint, "registry call");

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Amz-Target", &target)
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON_1_1)
            .json(body)
            .send()
            .map_err(transport)?;

        let status = response.status();
        let text = response.text().map_err(transport)?;
        trace!(%target, %status, body = %text, "registry response");

        if !status.is_success() {
            return Err(error_from_response(operation, status, &text));
        }

        serde_json::from_str(&text).map_err(|e| RegistryError::Protocol {
            operation: operation.to_string(),
            message: format!("unexpected response body: {e}"),
        })
    }

    fn list_service_tasks(&self, cluster: &str, service: &str) -> RegistryResult<Vec<TaskSummary>> {
        let task_arns = follow_pages("ListTasks", |next_token| {
            let page: wire::ListTasksResponse = self.call(
                Api::Containers,
                "ListTasks",
                &wire::ListTasksRequest {
                    cluster,
                    service_name: service,
                    next_token,
                },
            )?;
            Ok((page.task_arns, page.next_token))
        })?;

        let mut tasks = Vec::with_capacity(task_arns.len());
        for batch in task_arns.chunks(DESCRIBE_TASKS_BATCH) {
            let described: wire::DescribeTasksResponse = self.call(
                Api::Containers,
                "DescribeTasks",
                &wire::DescribeTasksRequest {
                    cluster,
                    tasks: batch,
                },
            )?;
            tasks.extend(described.tasks.into_iter().map(TaskSummary::from));
        }
        Ok(tasks)
    }
}

impl RegistryClient for HttpRegistryClient {
    fn describe_task_definition(&self, task: &TaskRef) -> RegistryResult<TaskDefinitionSpec> {
        let reference = task.to_string();
        let response: wire::DescribeTaskDefinitionResponse = self.call(
            Api::Containers,
            "DescribeTaskDefinition",
            &wire::DescribeTaskDefinitionRequest {
                task_definition: &reference,
                include: ["TAGS"],
            },
        )?;
        Ok(response.task_definition.into_spec(response.tags))
    }

    fn register_task_definition(&self, spec: &TaskDefinitionSpec) -> RegistryResult<RevisionId> {
        let response: wire::TaskDefinitionResponse = self.call(
            Api::Containers,
            "RegisterTaskDefinition",
            &wire::RegisterTaskDefinitionRequest::from_spec(spec),
        )?;
        response
            .task_definition
            .revision_id()
            .ok_or_else(|| RegistryError::Protocol {
                operation: "RegisterTaskDefinition".to_string(),
                message: "response carries no revision or ARN".to_string(),
            })
    }

    fn deregister_task_definition(&self, revision: &RevisionId) -> RegistryResult<()> {
        let _: serde_json::Value = self.call(
            Api::Containers,
            "DeregisterTaskDefinition",
            &wire::DeregisterTaskDefinitionRequest {
                task_definition: &revision.arn,
            },
        )?;
        Ok(())
    }

    fn find_task_definitions(&self, filters: &[TagFilter]) -> RegistryResult<Vec<String>> {
        let tag_filters: Vec<wire::TagFilter<'_>> =
            filters.iter().map(wire::TagFilter::from).collect();
        follow_pages("GetResources", |pagination_token| {
            let page: wire::GetResourcesResponse = self.call(
                Api::Tagging,
                "GetResources",
                &wire::GetResourcesRequest {
                    resource_type_filters: [wire::TASK_DEFINITION_RESOURCE_TYPE],
                    tag_filters: &tag_filters,
                    pagination_token,
                },
            )?;
            let arns = page
                .resource_tag_mapping_list
                .into_iter()
                .map(|m| m.resource_arn)
                .collect();
            Ok((arns, page.pagination_token))
        })
    }

    fn update_service(
        &self,
        cluster: &str,
        service: &str,
        revision: Option<&RevisionId>,
        desired_count: Option<u32>,
    ) -> RegistryResult<()> {
        let _: serde_json::Value = self.call(
            Api::Containers,
            "UpdateService",
            &wire::UpdateServiceRequest {
                cluster,
                service,
                task_definition: revision.map(|r| r.arn.as_str()),
                desired_count,
            },
        )?;
        Ok(())
    }

    fn describe_service(&self, cluster: &str, service: &str) -> RegistryResult<ServiceSnapshot> {
        let response: wire::DescribeServicesResponse = self.call(
            Api::Containers,
            "DescribeServices",
            &wire::DescribeServicesRequest {
                cluster,
                services: [service],
            },
        )?;

        let Some(described) = response.services.into_iter().next() else {
            let reason = response
                .failures
                .into_iter()
                .find_map(|f| f.reason)
                .unwrap_or_else(|| "MISSING".to_string());
            return Err(RegistryError::NotFound {
                resource: format!("service {service} in cluster {cluster} ({reason})"),
            });
        };

        let tasks = self.list_service_tasks(cluster, service)?;

        Ok(ServiceSnapshot {
            cluster: cluster.to_string(),
            service_name: described.service_name,
            task_definition_arn: described.task_definition,
            desired_count: described.desired_count,
            running_count: described.running_count,
            pending_count: described.pending_count,
            deployments: described.deployments.into_iter().map(Into::into).collect(),
            tasks,
            events: described.events.into_iter().map(Into::into).collect(),
        })
    }

    fn run_task(&self, request: &RunTaskRequest) -> RegistryResult<Vec<TaskLaunch>> {
        let is_fargate = request.launch_type == LaunchType::Fargate;
        let platform_version = match (&request.platform_version, is_fargate) {
            (Some(version), _) => Some(version.as_str()),
            (None, true) => Some(DEFAULT_PLATFORM_VERSION),
            (None, false) => None,
        };

        let body = wire::RunTaskRequestShape {
            cluster: &request.cluster,
            task_definition: &request.task_definition,
            count: request.count,
            started_by: request.started_by.as_deref(),
            launch_type: request.launch_type.as_str(),
            network_configuration: request.network_configuration.as_ref().map(Into::into),
            platform_version,
            overrides: wire::TaskOverride {
                container_overrides: request.container_overrides.iter().map(Into::into).collect(),
            },
        };
        let response: wire::RunTaskResponse = self.call(Api::Containers, "RunTask", &body)?;

        let started = response.tasks.into_iter().map(|t| TaskLaunch::Started {
            task_arn: t.task_arn,
        });
        let failed = response.failures.into_iter().map(|f| TaskLaunch::Failed {
            arn: f.arn,
            reason: f.reason.unwrap_or_else(|| "unknown".to_string()),
        });
        Ok(started.chain(failed).collect())
    }

    fn update_scheduled_rule_target(
        &self,
        cluster: &str,
        rule: &str,
        revision: &RevisionId,
    ) -> RegistryResult<String> {
        let listed: wire::ListTargetsByRuleResponse = self.call(
            Api::Events,
            "ListTargetsByRule",
            &wire::ListTargetsByRuleRequest { rule },
        )?;
        let mut target = listed
            .targets
            .into_iter()
            .next()
            .ok_or_else(|| RegistryError::NotFound {
                resource: format!("target of scheduled rule {rule}"),
            })?;

        let target_id = target
            .get("Id")
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .ok_or_else(|| RegistryError::Protocol {
                operation: "ListTargetsByRule".to_string(),
                message: format!("target of rule {rule} has no Id"),
            })?;

        // arn:...:task-definition/web:3 → arn:...:cluster/<cluster>
        let arn_prefix = revision
            .arn
            .split_once("task-definition")
            .map_or(revision.arn.as_str(), |(prefix, _)| prefix);
        target["Arn"] = format!("{arn_prefix}cluster/{cluster}").into();
        if !target["EcsParameters"].is_object() {
            target["EcsParameters"] = serde_json::json!({});
        }
        target["EcsParameters"]["TaskDefinitionArn"] = revision.arn.clone().into();

        let response: wire::PutTargetsResponse = self.call(
            Api::Events,
            "PutTargets",
            &wire::PutTargetsRequest {
                rule,
                targets: vec![target],
            },
        )?;
        if response.failed_entry_count > 0 {
            return Err(RegistryError::Rejected {
                operation: "PutTargets".to_string(),
                message: serde_json::Value::from(response.failed_entries).to_string(),
            });
        }
        Ok(target_id)
    }

    fn describe_deployment_group(
        &self,
        application: &str,
        deployment_group: &str,
    ) -> RegistryResult<DeploymentGroupInfo> {
        let response: wire::GetDeploymentGroupResponse = self.call(
            Api::BlueGreen,
            "GetDeploymentGroup",
            &wire::GetDeploymentGroupRequest {
                application_name: application,
                deployment_group_name: deployment_group,
            },
        )?;
        let service = response
            .deployment_group_info
            .ecs_services
            .into_iter()
            .next()
            .ok_or_else(|| RegistryError::Protocol {
                operation: "GetDeploymentGroup".to_string(),
                message: format!("deployment group {deployment_group} targets no service"),
            })?;

        Ok(DeploymentGroupInfo {
            application: application.to_string(),
            deployment_group: deployment_group.to_string(),
            cluster: service.cluster_name,
            service: service.service_name,
            container_name: None,
            container_port: None,
        })
    }

    fn create_deployment(
        &self,
        group: &DeploymentGroupInfo,
        revision: &RevisionId,
    ) -> RegistryResult<String> {
        let container = group
            .container_name
            .as_deref()
            .zip(group.container_port);
        let response: wire::CreateDeploymentResponse = self.call(
            Api::BlueGreen,
            "CreateDeployment",
            &wire::CreateDeploymentRequest {
                application_name: &group.application,
                deployment_group_name: &group.deployment_group,
                revision: wire::AppSpecRevision::for_task_definition(&revision.arn, container),
            },
        )?;
        Ok(response.deployment_id)
    }

    fn describe_deployment(&self, deployment_id: &str) -> RegistryResult<BlueGreenStatus> {
        let response: wire::GetDeploymentResponse = self.call(
            Api::BlueGreen,
            "GetDeployment",
            &wire::GetDeploymentRequest { deployment_id },
        )?;
        let info = response.deployment_info;
        let state = BlueGreenState::from_api(&info.status).ok_or_else(|| {
            RegistryError::Protocol {
                operation: "GetDeployment".to_string(),
                message: format!("unknown deployment status '{}'", info.status),
            }
        })?;
        let error_message = info.error_information.and_then(|e| match (e.code, e.message) {
            (Some(code), Some(message)) => Some(format!("{code}: {message}")),
            (None, message) => message,
            (code, None) => code,
        });

        Ok(BlueGreenStatus {
            deployment_id: info.deployment_id,
            state,
            error_message,
        })
    }
}

/// Keep requesting pages until the token runs out. `fetch` gets the token
/// of the page to load and returns its items plus the next token.
fn follow_pages<F>(operation: &str, mut fetch: F) -> RegistryResult<Vec<String>>
where
    F: FnMut(Option<&str>) -> RegistryResult<(Vec<String>, Option<String>)>,
{
    let mut items = Vec::new();
    let mut tokens = HashSet::new();
    let mut next_token: Option<String> = None;
    loop {
        let (page, token) = fetch(next_token.as_deref())?;
        items.extend(page);
        match token.filter(|t| !t.is_empty()) {
            Some(token) if !tokens.insert(token.clone()) => {
                return Err(RegistryError::Protocol {
                    operation: operation.to_string(),
                    message: format!("pagination token '{token}' returned twice"),
                });
            }
            Some(token) => {
                trace!(operation, listed = items.len(), "fetching next page");
                next_token = Some(token);
            }
            None => return Ok(items),
        }
    }
}

fn transport(err: reqwest::Error) -> RegistryError {
    RegistryError::Transport {
        message: err.to_string(),
    }
}

fn error_from_response(operation: &str, status: StatusCode, body: &str) -> RegistryError {
    let parsed: Option<wire::ErrorBody> = serde_json::from_str(body).ok();
    let (error_type, message) = match &parsed {
        Some(error) => (error.short_type(), error.message.clone()),
        None => ("", body.trim().to_string()),
    };

    match error_type {
        "ThrottlingException"
        | "ThrottledException"
        | "TooManyRequestsException"
        | "RequestLimitExceeded" => RegistryError::Throttled { message },
        "ServiceNotFoundException"
        | "ClusterNotFoundException"
        | "ResourceNotFoundException"
        | "ApplicationDoesNotExistException"
        | "DeploymentGroupDoesNotExistException"
        | "DeploymentDoesNotExistException" => RegistryError::NotFound { resource: message },
        "ClientException" if is_missing_task_definition(&message) => {
            RegistryError::NotFound { resource: message }
        }
        _ if status == StatusCode::TOO_MANY_REQUESTS => RegistryError::Throttled { message },
        _ if status.is_server_error() => RegistryError::Transport {
            message: format!("{operation} failed ({status}): {message}"),
        },
        _ => RegistryError::Rejected {
            operation: operation.to_string(),
            message: if error_type.is_empty() {
                format!("{status}: {message}")
            } else {
                format!("{error_type}: {message}")
            },
        },
    }
}

fn is_missing_task_definition(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    lowered.contains("unable to describe task definition")
        || lowered.contains("task definition does not exist")
}
