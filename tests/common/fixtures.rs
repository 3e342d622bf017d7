//! Reusable registry fixtures.
//!
//! `standard_state()` seeds:
//! - `web:1` with containers `web` and `worker`, running as service `prod/web`
//! - `batch:1`, an awsvpc Fargate definition with no network configuration
//! - rule `prod/nightly` pointing at `batch:1`
//! - `shop:1` behind deployment group `shop/shop-web`
//!
//! `state_with_tagged_batch()` adds `batch` revisions carrying `Family` and
//! `ModuleVersion` resource tags.

use chrono::Utc;
use ecs_rollout::domain::entities::{ContainerSpec, DeploymentGroupInfo, TaskDefinitionSpec};
use ecs_rollout::infrastructure::registry::{
    BlueGreenOutcome, RegistryState, RolloutBehavior, StoredDeploymentGroup, StoredRule,
    StoredService, DEFAULT_REGION,
};

pub const WEB_IMAGE: &str = "registry.example.com:5000/web:1.0";
pub const PLACEMENT_FAILURE: &str = "(service web) was unable to place a task because no \
     container instance met all of its requirements.";

pub fn web_definition() -> TaskDefinitionSpec {
    TaskDefinitionSpec::new(
        "web",
        vec![
            ContainerSpec::new("web", WEB_IMAGE)
                .with_env("LOG_LEVEL", "info")
                .with_secret("DB_URL", "arn:aws:ssm:us-east-1:000000000000:parameter/db"),
            ContainerSpec::new("worker", "worker:1.0")
                .with_command(vec!["bin/worker".to_string(), "--queue".to_string()]),
        ],
    )
}

pub fn batch_definition() -> TaskDefinitionSpec {
    let mut spec = TaskDefinitionSpec::new(
        "batch",
        vec![ContainerSpec::new("job", "batch:3.1").with_env("MODE", "full")],
    );
    spec.network_mode = Some("awsvpc".to_string());
    spec.requires_compatibilities = vec!["FARGATE".to_string()];
    spec
}

pub fn shop_definition() -> TaskDefinitionSpec {
    TaskDefinitionSpec::new("shop", vec![ContainerSpec::new("shop", "shop:7")])
}

fn register(state: &mut RegistryState, spec: &TaskDefinitionSpec) -> String {
    state
        .register_task_definition(spec, DEFAULT_REGION)
        .expect("fixture registration")
        .arn
}

fn add_service(state: &mut RegistryState, cluster: &str, name: &str, arn: String, count: u32) {
    state.services.push(StoredService {
        cluster: cluster.to_string(),
        name: name.to_string(),
        task_definition_arn: arn,
        desired_count: count,
        rollout: RolloutBehavior::Converge,
        tasks: Vec::new(),
        deployments: Vec::new(),
        events: Vec::new(),
    });
    // Settle the service so it starts out running
    state
        .update_service(cluster, name, None, None, DEFAULT_REGION, Utc::now())
        .expect("fixture service");
}

pub fn standard_state() -> RegistryState {
    let mut state = RegistryState::default();

    let web = register(&mut state, &web_definition());
    add_service(&mut state, "prod", "web", web, 2);

    let batch = register(&mut state, &batch_definition());
    state.scheduled_rules.push(StoredRule {
        cluster: "prod".to_string(),
        name: "nightly".to_string(),
        target_id: "nightly-batch".to_string(),
        task_definition_arn: batch,
    });

    let shop = register(&mut state, &shop_definition());
    add_service(&mut state, "prod", "shop", shop, 1);
    state.deployment_groups.push(StoredDeploymentGroup {
        info: DeploymentGroupInfo {
            application: "shop".to_string(),
            deployment_group: "shop-web".to_string(),
            cluster: "prod".to_string(),
            service: "shop".to_string(),
            container_name: Some("shop".to_string()),
            container_port: Some(8080),
        },
        outcome: BlueGreenOutcome::Succeed,
    });

    state
}

/// `standard_state()` with `prod/web` reacting to updates with `rollout`.
pub fn state_with_web_rollout(rollout: RolloutBehavior) -> RegistryState {
    let mut state = standard_state();
    for service in &mut state.services {
        if service.name == "web" {
            service.rollout = rollout.clone();
        }
    }
    state
}

/// `standard_state()` with the `shop-web` group ending in `outcome`.
pub fn state_with_blue_green_outcome(outcome: BlueGreenOutcome) -> RegistryState {
    let mut state = standard_state();
    for group in &mut state.deployment_groups {
        group.outcome = outcome.clone();
    }
    state
}

/// `standard_state()` plus one `batch` revision per entry of `versions`,
/// tagged with that module version (`batch:2`, `batch:3`, ...).
pub fn state_with_tagged_batch(versions: &[&str]) -> RegistryState {
    let mut state = standard_state();
    for version in versions {
        let spec = batch_definition()
            .with_tag("Family", "batch")
            .with_tag("ModuleVersion", *version);
        register(&mut state, &spec);
    }
    state
}
