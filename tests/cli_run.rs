//! `ecs run`

mod common;

use common::*;
use ecs_rollout::domain::value_objects::LaunchType;

#[test]
fn run_starts_tasks_from_latest_revision() {
    let env = TestEnv::new();

    let result = env.run(&["ecs", "run", "prod", "web", "2", "--started-by", "nightly-ci"]);

    assert_exit_code!(result, 0);
    assert_output_contains!(result, "Started 2 task(s)");
    let runs = env.state().task_runs;
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|r| r.task_definition_arn.ends_with("web:1")));
    assert!(runs.iter().all(|r| r.started_by.as_deref() == Some("nightly-ci")));
    assert!(runs.iter().all(|r| r.launch_type == LaunchType::Ec2));
}

#[test]
fn run_env_override_is_sent_without_registering() {
    let env = TestEnv::new();

    let result = env.run(&["ecs", "run", "prod", "web", "-e", "web", "ONE_OFF", "yes"]);

    assert_exit_code!(result, 0);
    assert_eq!(env.revision_count("web"), 1);
    let runs = env.state().task_runs;
    let web = runs[0]
        .container_overrides
        .iter()
        .find(|o| o.name == "web")
        .expect("override for web");
    let environment = web.environment.as_ref().expect("environment override");
    assert_eq!(environment["ONE_OFF"], "yes");
    assert_eq!(environment["LOG_LEVEL"], "info");
}

#[test]
fn run_image_override_requires_register() {
    let env = TestEnv::new();

    let result = env.run(&["ecs", "run", "prod", "web", "-i", "web", "web:debug"]);

    assert_exit_code!(result, 2);
    assert_output_contains!(result, "--register");
    assert!(env.state().task_runs.is_empty());
}

#[test]
fn run_with_register_runs_the_new_revision() {
    let env = TestEnv::new();

    let result = env.run(&["ecs", "run", "prod", "web", "-i", "web", "web:debug", "--register"]);

    assert_exit_code!(result, 0);
    assert_eq!(env.revision("web", 2).spec.container("web").unwrap().image, "web:debug");
    let runs = env.state().task_runs;
    assert_eq!(runs.len(), 1);
    assert!(runs[0].task_definition_arn.ends_with("web:2"));
    assert!(runs[0].container_overrides.is_empty());
}

#[test]
fn fargate_without_network_is_rejected_before_launch() {
    let env = TestEnv::new();

    let result = env.run(&["ecs", "run", "prod", "batch", "--launch-type", "FARGATE"]);

    assert_exit_code!(result, 2);
    assert_output_contains!(result, "--subnet");
    assert!(env.state().task_runs.is_empty());
}

#[test]
fn fargate_with_network_flags_starts() {
    let env = TestEnv::new();

    let result = env.run(&[
        "ecs",
        "run",
        "prod",
        "batch:1",
        "--launch-type",
        "FARGATE",
        "--subnet",
        "subnet-1",
        "--security-group",
        "sg-1",
    ]);

    assert_exit_code!(result, 0);
    let runs = env.state().task_runs;
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].launch_type, LaunchType::Fargate);
}

#[test]
fn partial_capacity_reports_failures() {
    let mut state = standard_state();
    state.run_capacity = Some(2);
    let env = TestEnv::with_state(state);

    let result = env.run(&["ecs", "run", "prod", "web", "3"]);

    assert_exit_code!(result, 3);
    assert_output_contains!(result, "1 of 3 task(s) failed");
    assert_output_contains!(result, "RESOURCE:MEMORY");
    assert_eq!(env.state().task_runs.len(), 2);
}

#[test]
fn run_zero_count_registers_nothing() {
    let env = TestEnv::new();

    let result = env.run(&["ecs", "run", "prod", "web", "0", "-t", "2.0", "--register"]);

    assert_exit_code!(result, 2);
    assert_eq!(env.revision_count("web"), 1);
    assert!(env.state().task_runs.is_empty());
}
