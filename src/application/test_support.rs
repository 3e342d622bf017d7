//! Shared fixture for use-case tests: an in-memory registry with one
//! service, one scheduled rule and one blue/green group.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use crate::domain::entities::{ContainerSpec, DeploymentGroupInfo, TaskDefinitionSpec};
use crate::domain::ports::deploy_events::testing::RecordingEventSink;
use crate::domain::services::MonitorSettings;
use crate::infrastructure::registry::{
    RegistryState, RolloutBehavior, StoredDeploymentGroup, StoredRule, StoredService,
    DEFAULT_REGION,
};
use crate::infrastructure::{InMemoryRegistry, ManualClock};

use super::context::RolloutContext;

pub const CLUSTER: &str = "prod";
pub const SERVICE: &str = "web";
pub const WEB_FAMILY: &str = "web";
pub const RULE: &str = "nightly";
pub const APPLICATION: &str = "shop";
pub const GROUP: &str = "shop-web";

pub struct Fixture {
    pub ctx: RolloutContext,
    pub registry: Arc<InMemoryRegistry>,
    pub clock: Arc<ManualClock>,
    pub events: RecordingEventSink,
}

impl Fixture {
    pub fn set_rollout(&self, behavior: RolloutBehavior) {
        self.registry.edit(|state| {
            for service in &mut state.services {
                service.rollout = behavior.clone();
            }
        });
    }

    pub fn service_arn(&self) -> String {
        self.registry.snapshot().unwrap().services[0]
            .task_definition_arn
            .clone()
    }
}

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn seeded_state() -> RegistryState {
    let mut state = RegistryState::default();
    let web = TaskDefinitionSpec::new(
        WEB_FAMILY,
        vec![
            ContainerSpec::new("web", "registry.example.com:5000/web:1.0")
                .with_env("LOG_LEVEL", "info")
                .with_secret("DB_URL", "arn:ssm:db"),
            ContainerSpec::new("worker", "worker:1.0").with_command(vec!["run".to_string()]),
        ],
    );
    let web_id = state
        .register_task_definition(&web, DEFAULT_REGION)
        .unwrap();

    let mut batch =
        TaskDefinitionSpec::new("batch", vec![ContainerSpec::new("job", "job:1.0")]);
    batch.network_mode = Some("awsvpc".to_string());
    batch.requires_compatibilities = vec!["FARGATE".to_string()];
    let batch_id = state
        .register_task_definition(&batch, DEFAULT_REGION)
        .unwrap();

    state.services.push(StoredService {
        cluster: CLUSTER.to_string(),
        name: SERVICE.to_string(),
        task_definition_arn: web_id.arn,
        desired_count: 2,
        rollout: RolloutBehavior::Converge,
        tasks: Vec::new(),
        deployments: Vec::new(),
        events: Vec::new(),
    });
    state
        .update_service(CLUSTER, SERVICE, None, None, DEFAULT_REGION, start())
        .unwrap();

    state.scheduled_rules.push(StoredRule {
        cluster: CLUSTER.to_string(),
        name: RULE.to_string(),
        target_id: "nightly-batch".to_string(),
        task_definition_arn: batch_id.arn,
    });
    state.deployment_groups.push(StoredDeploymentGroup {
        info: DeploymentGroupInfo {
            application: APPLICATION.to_string(),
            deployment_group: GROUP.to_string(),
            cluster: CLUSTER.to_string(),
            service: SERVICE.to_string(),
            container_name: Some("web".to_string()),
            container_port: Some(8080),
        },
        outcome: Default::default(),
    });
    state
}

pub fn fixture() -> Fixture {
    let clock = Arc::new(ManualClock::new(start()));
    let registry = Arc::new(InMemoryRegistry::with_clock(seeded_state(), clock.clone()));
    let events = RecordingEventSink::default();
    let ctx = RolloutContext::new(registry.clone(), clock.clone())
        .with_events(Arc::new(events.clone()))
        .with_monitor_settings(MonitorSettings {
            poll_interval: Duration::from_secs(5),
            max_transient_retries: 2,
            backoff_initial: Duration::from_secs(1),
            backoff_max: Duration::from_secs(2),
            ..MonitorSettings::default()
        });
    Fixture {
        ctx,
        registry,
        clock,
        events,
    }
}
