//! Command dispatch
//!
//! Parsing happens in two steps: flags become an [`Invocation`] (every
//! validation error surfaces here, before a registry client exists), then the
//! invocation runs against a [`RolloutContext`].

use std::io;
use std::path::Path;
use std::sync::Arc;

use is_terminal::IsTerminal;
use tracing::debug;

use crate::application::{
    CodeDeployOptions, CodeDeployUseCase, CronOptions, CronUseCase, DeployOptions, DeployUseCase,
    RolloutContext, RunOptions, RunUseCase, ScaleOptions, ScaleUseCase, UpdateOptions,
    UpdateUseCase,
};
use crate::config::{load_layered, Config};
use crate::domain::entities::{NetworkConfiguration, OverrideSet};
use crate::domain::ports::{DeployEventSink, StopSignal};
use crate::domain::value_objects::{LaunchType, ModuleVersion, TaskRef, WaitTimeout};
use crate::error::{RolloutError, RolloutResult, ValidationError};
use crate::infrastructure::JsonEventSink;

use super::cli::{Cli, CodeDeployCommand, Commands, EcsCommand, LaunchArgs, WaitArgs};
use super::console::ConsoleEventSink;
use super::factory::{create_context, create_registry_client, resolve_registry, RegistryFlags};
use super::output::{render_error, render_report, OutputFormat, Report};
use super::terminal::detect_capabilities;
use super::theme::{Icon, Style};

/// A fully validated command, ready to run.
#[derive(Debug, Clone)]
pub enum Invocation {
    Deploy(DeployOptions, OverrideSet),
    Scale(ScaleOptions),
    Run(RunOptions, OverrideSet),
    Update(UpdateOptions, OverrideSet),
    Cron(CronOptions, OverrideSet),
    CodeDeploy(CodeDeployOptions, OverrideSet),
}

fn wait_timeout(wait: &WaitArgs, config: &Config) -> Result<WaitTimeout, ValidationError> {
    match wait.timeout {
        Some(seconds) => WaitTimeout::from_seconds(seconds),
        None => config.default_timeout(),
    }
}

fn network(launch: &LaunchArgs) -> NetworkConfiguration {
    NetworkConfiguration {
        subnets: launch.subnet.iter().cloned().collect(),
        security_groups: launch.security_group.iter().cloned().collect(),
        assign_public_ip: launch.public_ip,
    }
}

/// Parse the positional task reference and the optional module version.
/// A module version selects by tags, so it only combines with a bare family.
fn base_task(
    task: &str,
    module_version: Option<&str>,
) -> Result<(TaskRef, Option<ModuleVersion>), ValidationError> {
    let task = TaskRef::parse(task)?;
    let Some(version) = module_version else {
        return Ok((task, None));
    };
    let version = ModuleVersion::parse(version)?;
    if !matches!(task, TaskRef::Family(_)) {
        return Err(ValidationError::ModuleVersionNeedsFamily {
            task: task.to_string(),
        });
    }
    Ok((task, Some(version)))
}

impl Invocation {
    /// Validate `command` against `config`.
    pub fn from_command(command: &Commands, config: &Config) -> Result<Self, ValidationError> {
        let invocation = match command {
            Commands::Ecs { action } => match action {
                EcsCommand::Deploy {
                    cluster,
                    service,
                    overrides,
                    wait,
                    deregister,
                } => Invocation::Deploy(
                    DeployOptions::new(cluster.as_str(), service.as_str())
                        .with_timeout(wait_timeout(wait, config)?)
                        .with_ignore_warnings(wait.ignore_warnings)
                        .with_deregister(*deregister),
                    overrides.to_override_set()?,
                ),
                EcsCommand::Scale {
                    cluster,
                    service,
                    desired_count,
                    wait,
                } => Invocation::Scale(ScaleOptions {
                    cluster: cluster.clone(),
                    service: service.clone(),
                    desired_count: *desired_count,
                    timeout: wait_timeout(wait, config)?,
                    ignore_warnings: wait.ignore_warnings,
                }),
                EcsCommand::Run {
                    cluster,
                    task,
                    module_version,
                    count,
                    overrides,
                    launch,
                    register,
                } => {
                    let (task, module_version) = base_task(task, module_version.as_deref())?;
                    let mut options = RunOptions::new(cluster.as_str(), task);
                    options.module_version = module_version;
                    options.count = *count;
                    options.launch_type = launch.launch_type.parse::<LaunchType>()?;
                    options.network = network(launch);
                    options.platform_version = launch
                        .platform_version
                        .clone()
                        .or_else(|| config.run.platform_version.clone());
                    options.started_by = launch
                        .started_by
                        .clone()
                        .or_else(|| config.run.started_by.clone());
                    options.register = *register;
                    Invocation::Run(options, overrides.to_override_set()?)
                }
                EcsCommand::Update {
                    task,
                    module_version,
                    overrides,
                    deregister,
                } => {
                    let (task, module_version) = base_task(task, module_version.as_deref())?;
                    Invocation::Update(
                        UpdateOptions {
                            task,
                            module_version,
                            deregister: *deregister,
                        },
                        overrides.to_override_set()?,
                    )
                }
                EcsCommand::Cron {
                    cluster,
                    task,
                    rule,
                    module_version,
                    overrides,
                    deregister,
                } => {
                    let (task, module_version) = base_task(task, module_version.as_deref())?;
                    Invocation::Cron(
                        CronOptions {
                            cluster: cluster.clone(),
                            rule: rule.clone(),
                            task,
                            module_version,
                            deregister: *deregister,
                        },
                        overrides.to_override_set()?,
                    )
                }
            },
            Commands::CodeDeploy { action } => match action {
                CodeDeployCommand::Deploy {
                    application,
                    deployment_group,
                    overrides,
                    wait,
                    container_name,
                    container_port,
                    deregister,
                } => Invocation::CodeDeploy(
                    CodeDeployOptions {
                        application: application.clone(),
                        deployment_group: deployment_group.clone(),
                        timeout: wait_timeout(wait, config)?,
                        load_balancer_target: container_name.clone().zip(*container_port),
                        deregister: *deregister,
                    },
                    overrides.to_override_set()?,
                ),
            },
        };
        Ok(invocation)
    }

    /// Run the use case this invocation names.
    pub fn run(&self, ctx: &RolloutContext) -> RolloutResult<Box<dyn Report>> {
        let report: Box<dyn Report> = match self {
            Invocation::Deploy(options, overrides) => {
                Box::new(DeployUseCase::new(ctx).execute(options, overrides)?)
            }
            Invocation::Scale(options) => Box::new(ScaleUseCase::new(ctx).execute(options)?),
            Invocation::Run(options, overrides) => {
                Box::new(RunUseCase::new(ctx).execute(options, overrides)?)
            }
            Invocation::Update(options, overrides) => {
                Box::new(UpdateUseCase::new(ctx).execute(options, overrides)?)
            }
            Invocation::Cron(options, overrides) => {
                Box::new(CronUseCase::new(ctx).execute(options, overrides)?)
            }
            Invocation::CodeDeploy(options, overrides) => {
                Box::new(CodeDeployUseCase::new(ctx).execute(options, overrides)?)
            }
        };
        Ok(report)
    }
}

/// Run `cli` to completion and return the process exit code.
pub fn execute(cli: &Cli, stop: StopSignal) -> i32 {
    let caps = detect_capabilities(cli.no_color);
    let err_style = Style {
        color: caps.supports_color,
        unicode: caps.supports_unicode,
    };
    let out_style = Style {
        color: caps.supports_color && io::stdout().is_terminal(),
        unicode: caps.supports_unicode,
    };
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let command = cli.command.name();

    match dispatch(cli, err_style, stop) {
        Ok(report) => {
            println!("{}", render_report(report.as_ref(), format, command, out_style));
            report.exit_code()
        }
        Err(err) => {
            debug!(command, error = ?err, "command failed");
            let rendered = render_error(&err, format, command, err_style);
            match format {
                OutputFormat::Json => println!("{rendered}"),
                OutputFormat::Text => eprintln!("{rendered}"),
            }
            err.exit_code()
        }
    }
}

fn dispatch(cli: &Cli, style: Style, stop: StopSignal) -> RolloutResult<Box<dyn Report>> {
    let cwd = std::env::current_dir()?;
    let config = load_config(cli.config.as_deref(), &cwd, style)?;

    let invocation = Invocation::from_command(&cli.command, &config)?;
    debug!(?invocation, "validated command");

    let target = resolve_registry(
        &config,
        RegistryFlags {
            endpoint: cli.endpoint.as_deref(),
            state_file: cli.state_file.as_deref(),
            region: cli.region.as_deref(),
        },
    )?;
    let client = create_registry_client(&target, &config)?;

    let events: Arc<dyn DeployEventSink> = if cli.json {
        Arc::new(JsonEventSink::stdout(cli.command.name()))
    } else {
        Arc::new(
            ConsoleEventSink::stderr(style)
                .with_diff(cli.command.show_diff())
                .with_detail(cli.verbose > 0),
        )
    };
    let ctx = create_context(&config, client, events, stop)?;

    invocation.run(&ctx)
}

fn load_config(explicit: Option<&Path>, cwd: &Path, style: Style) -> Result<Config, RolloutError> {
    let (config, warnings) = load_layered(explicit, cwd)?;
    for warning in &warnings {
        eprintln!("{}", style.line(Icon::Warning, &warning.to_string()));
    }
    Ok(config)
}
