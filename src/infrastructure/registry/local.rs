//! Registry backed by a local [`RegistryState`]
//!
//! The state lives behind a [`StateStore`]: a mutex for tests and embedding,
//! a locked JSON file for the CLI's offline mode.

use std::sync::Arc;

use crate::domain::entities::{
    BlueGreenStatus, DeploymentGroupInfo, RevisionId, RunTaskRequest, ServiceSnapshot, TagFilter,
    TaskDefinitionSpec, TaskLaunch,
};
use crate::domain::ports::{Clock, RegistryClient, RegistryResult};
use crate::domain::value_objects::TaskRef;

use super::state::RegistryState;

pub const DEFAULT_REGION: &str = "us-east-1";

/// Where a [`LocalRegistry`] keeps its state.
pub trait StateStore: Send + Sync {
    /// Run `f` against a consistent view of the state.
    fn view<T>(&self, f: impl FnOnce(&RegistryState) -> RegistryResult<T>) -> RegistryResult<T>;

    /// Run `f` against the state and persist it if `f` succeeds.
    fn update<T>(
        &self,
        f: impl FnOnce(&mut RegistryState) -> RegistryResult<T>,
    ) -> RegistryResult<T>;
}

pub struct LocalRegistry<S: StateStore> {
    store: S,
    region: String,
    clock: Arc<dyn Clock>,
}

impl<S: StateStore> LocalRegistry<S> {
    pub fn with_store(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            region: DEFAULT_REGION.to_string(),
            clock,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> RegistryResult<RegistryState> {
        self.store.view(|state| Ok(state.clone()))
    }

    pub(super) fn store(&self) -> &S {
        &self.store
    }
}

impl<S: StateStore> RegistryClient for LocalRegistry<S> {
    fn describe_task_definition(&self, task: &TaskRef) -> RegistryResult<TaskDefinitionSpec> {
        self.store.view(|state| state.describe_task_definition(task))
    }

    fn register_task_definition(&self, spec: &TaskDefinitionSpec) -> RegistryResult<RevisionId> {
        self.store
            .update(|state| state.register_task_definition(spec, &self.region))
    }

    fn deregister_task_definition(&self, revision: &RevisionId) -> RegistryResult<()> {
        self.store
            .update(|state| state.deregister_task_definition(revision))
    }

    fn find_task_definitions(&self, filters: &[TagFilter]) -> RegistryResult<Vec<String>> {
        self.store
            .view(|state| Ok(state.find_task_definitions(filters)))
    }

    fn update_service(
        &self,
        cluster: &str,
        service: &str,
        revision: Option<&RevisionId>,
        desired_count: Option<u32>,
    ) -> RegistryResult<()> {
        let now = self.clock.now();
        self.store.update(|state| {
            state.update_service(cluster, service, revision, desired_count, &self.region, now)
        })
    }

    fn describe_service(&self, cluster: &str, service: &str) -> RegistryResult<ServiceSnapshot> {
        self.store
            .view(|state| state.describe_service(cluster, service))
    }

    fn run_task(&self, request: &RunTaskRequest) -> RegistryResult<Vec<TaskLaunch>> {
        self.store
            .update(|state| state.run_task(request, &self.region))
    }

    fn update_scheduled_rule_target(
        &self,
        cluster: &str,
        rule: &str,
        revision: &RevisionId,
    ) -> RegistryResult<String> {
        self.store
            .update(|state| state.update_scheduled_rule_target(cluster, rule, revision))
    }

    fn describe_deployment_group(
        &self,
        application: &str,
        deployment_group: &str,
    ) -> RegistryResult<DeploymentGroupInfo> {
        self.store
            .view(|state| state.describe_deployment_group(application, deployment_group))
    }

    fn create_deployment(
        &self,
        group: &DeploymentGroupInfo,
        revision: &RevisionId,
    ) -> RegistryResult<String> {
        let now = self.clock.now();
        self.store
            .update(|state| state.create_deployment(group, revision, &self.region, now))
    }

    fn describe_deployment(&self, deployment_id: &str) -> RegistryResult<BlueGreenStatus> {
        self.store
            .view(|state| state.describe_deployment(deployment_id))
    }
}
