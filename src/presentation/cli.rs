use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// ecs-rollout - task definition revisions and service rollouts
#[derive(Parser, Debug)]
#[command(name = "ecs-rollout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format for CI (NDJSON on stdout)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Config file (default: ./ecs-rollout.toml, then the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Registry endpoint (JSON over HTTP)
    #[arg(long, global = true, value_name = "URL", conflicts_with = "state_file")]
    pub endpoint: Option<String>,

    /// Local registry state file, used instead of an endpoint
    #[arg(long, global = true, value_name = "PATH")]
    pub state_file: Option<PathBuf>,

    /// Region used in ARNs and request routing
    #[arg(long, global = true)]
    pub region: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Container service operations
    Ecs {
        #[command(subcommand)]
        action: EcsCommand,
    },

    /// Blue/green deployments
    CodeDeploy {
        #[command(subcommand)]
        action: CodeDeployCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum EcsCommand {
    /// Register a new revision from the service's current one and roll it out
    Deploy {
        cluster: String,
        service: String,

        #[command(flatten)]
        overrides: OverrideArgs,

        #[command(flatten)]
        wait: WaitArgs,

        /// Deregister the previous revision once the rollout succeeds
        #[arg(long)]
        deregister: bool,
    },

    /// Change a service's desired count
    Scale {
        cluster: String,
        service: String,
        desired_count: u32,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Start one-off tasks
    Run {
        cluster: String,

        /// Task definition: ARN, family:revision or family
        task: String,

        /// Use the newest revision of the TASK family tagged with this
        /// module version or one of the next nine patches
        #[arg(long, value_name = "VERSION")]
        module_version: Option<String>,

        /// Number of tasks to start
        #[arg(default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        count: u32,

        #[command(flatten)]
        overrides: OverrideArgs,

        #[command(flatten)]
        launch: LaunchArgs,

        /// Register the merged revision and run it instead of sending overrides
        #[arg(long)]
        register: bool,
    },

    /// Register a new revision without touching any service
    Update {
        /// Task definition: ARN, family:revision or family
        task: String,

        /// Use the newest revision of the TASK family tagged with this
        /// module version or one of the next nine patches
        #[arg(long, value_name = "VERSION")]
        module_version: Option<String>,

        #[command(flatten)]
        overrides: OverrideArgs,

        /// Deregister the base revision after registering
        #[arg(long)]
        deregister: bool,
    },

    /// Register a new revision and point a scheduled rule at it
    Cron {
        cluster: String,

        /// Task definition: ARN, family:revision or family
        task: String,

        /// Scheduled rule name
        rule: String,

        /// Use the newest revision of the TASK family tagged with this
        /// module version or one of the next nine patches
        #[arg(long, value_name = "VERSION")]
        module_version: Option<String>,

        #[command(flatten)]
        overrides: OverrideArgs,

        /// Deregister the base revision after the rule is updated
        #[arg(long)]
        deregister: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CodeDeployCommand {
    /// Register a new revision and hand it to a blue/green deployment group
    Deploy {
        application: String,
        deployment_group: String,

        #[command(flatten)]
        overrides: OverrideArgs,

        #[command(flatten)]
        wait: WaitArgs,

        /// Container receiving load balancer traffic
        #[arg(long, requires = "container_port")]
        container_name: Option<String>,

        /// Port of that container
        #[arg(long, requires = "container_name")]
        container_port: Option<u16>,

        /// Deregister the previous revision once the deployment succeeds
        #[arg(long)]
        deregister: bool,
    },
}

/// Changes applied to the base revision
#[derive(Args, Debug, Default, Clone)]
pub struct OverrideArgs {
    /// New tag for every container image
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Replace a container's image (repeatable)
    #[arg(short, long, num_args = 2, value_names = ["CONTAINER", "IMAGE"], action = ArgAction::Append)]
    pub image: Vec<String>,

    /// Set an environment variable (repeatable)
    #[arg(short, long, num_args = 3, value_names = ["CONTAINER", "NAME", "VALUE"], action = ArgAction::Append)]
    pub env: Vec<String>,

    /// Read KEY=VALUE lines into a container's environment; --env wins
    #[arg(long, num_args = 2, value_names = ["CONTAINER", "PATH"], action = ArgAction::Append)]
    pub env_file: Vec<String>,

    /// Replace environments instead of merging into them
    #[arg(long)]
    pub exclusive_env: bool,

    /// Set a secret reference (repeatable)
    #[arg(short, long, num_args = 3, value_names = ["CONTAINER", "NAME", "VALUE_FROM"], action = ArgAction::Append)]
    pub secret: Vec<String>,

    /// Replace secrets instead of merging into them
    #[arg(long)]
    pub exclusive_secrets: bool,

    /// Replace a container's command: shell words or a JSON array
    #[arg(short, long, num_args = 2, value_names = ["CONTAINER", "COMMAND"], action = ArgAction::Append, allow_hyphen_values = true)]
    pub command: Vec<String>,

    /// Task role ARN
    #[arg(short, long, value_name = "ARN")]
    pub role: Option<String>,

    /// Execution role ARN
    #[arg(long, value_name = "ARN")]
    pub execution_role: Option<String>,

    /// Set a task definition tag (repeatable)
    #[arg(long, num_args = 2, value_names = ["KEY", "VALUE"], action = ArgAction::Append)]
    pub task_tag: Vec<String>,

    /// Start from this task definition instead of the current one
    #[arg(long = "task", value_name = "REF")]
    pub source_task: Option<String>,

    /// Print every change made to the revision
    #[arg(long)]
    pub show_diff: bool,
}

#[derive(Args, Debug, Default, Clone)]
pub struct WaitArgs {
    /// Seconds to wait for the rollout; -1 returns immediately
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub timeout: Option<i64>,

    /// Keep waiting when a service event matches a failure rule
    #[arg(long)]
    pub ignore_warnings: bool,
}

#[derive(Args, Debug, Default, Clone)]
pub struct LaunchArgs {
    /// EC2 or FARGATE
    #[arg(long, default_value = "EC2")]
    pub launch_type: String,

    /// Subnet for awsvpc networking (repeatable)
    #[arg(long)]
    pub subnet: Vec<String>,

    /// Security group for awsvpc networking (repeatable)
    #[arg(long)]
    pub security_group: Vec<String>,

    /// Assign a public IP
    #[arg(long)]
    pub public_ip: bool,

    #[arg(long)]
    pub platform_version: Option<String>,

    /// Free-form tag recorded on started tasks
    #[arg(long)]
    pub started_by: Option<String>,
}

impl Commands {
    /// Name used in JSON output, e.g. `ecs deploy`.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Ecs { action } => match action {
                EcsCommand::Deploy { .. } => "ecs deploy",
                EcsCommand::Scale { .. } => "ecs scale",
                EcsCommand::Run { .. } => "ecs run",
                EcsCommand::Update { .. } => "ecs update",
                EcsCommand::Cron { .. } => "ecs cron",
            },
            Commands::CodeDeploy { action } => match action {
                CodeDeployCommand::Deploy { .. } => "code-deploy deploy",
            },
        }
    }

    /// Whether `--show-diff` was given.
    pub fn show_diff(&self) -> bool {
        match self {
            Commands::Ecs { action } => match action {
                EcsCommand::Deploy { overrides, .. }
                | EcsCommand::Run { overrides, .. }
                | EcsCommand::Update { overrides, .. }
                | EcsCommand::Cron { overrides, .. } => overrides.show_diff,
                EcsCommand::Scale { .. } => false,
            },
            Commands::CodeDeploy { action } => match action {
                CodeDeployCommand::Deploy { overrides, .. } => overrides.show_diff,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ecs-rollout").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_parse_deploy_with_overrides() {
        let cli = parse(&[
            "ecs", "deploy", "prod", "web", "--tag", "1.2", "-i", "worker", "worker:2", "-e",
            "web", "LOG_LEVEL", "debug", "-e", "web", "MODE", "fast", "--timeout", "-1",
        ]);
        let Commands::Ecs {
            action:
                EcsCommand::Deploy {
                    cluster,
                    service,
                    overrides,
                    wait,
                    deregister,
                },
        } = cli.command
        else {
            panic!("Expected ecs deploy");
        };
        assert_eq!(cluster, "prod");
        assert_eq!(service, "web");
        assert_eq!(overrides.tag.as_deref(), Some("1.2"));
        assert_eq!(overrides.image, ["worker", "worker:2"]);
        assert_eq!(overrides.env.len(), 6);
        assert_eq!(wait.timeout, Some(-1));
        assert!(!deregister);
    }

    #[test]
    fn test_cli_parse_run_defaults() {
        let cli = parse(&["ecs", "run", "prod", "batch"]);
        let Commands::Ecs {
            action:
                EcsCommand::Run {
                    count,
                    launch,
                    register,
                    ..
                },
        } = cli.command
        else {
            panic!("Expected ecs run");
        };
        assert_eq!(count, 1);
        assert_eq!(launch.launch_type, "EC2");
        assert!(!register);
    }

    #[test]
    fn test_cli_parse_run_fargate_network() {
        let cli = parse(&[
            "ecs", "run", "prod", "batch", "3", "--launch-type", "FARGATE", "--subnet",
            "subnet-1", "--subnet", "subnet-2", "--security-group", "sg-1", "--public-ip",
        ]);
        let Commands::Ecs {
            action: EcsCommand::Run { count, launch, .. },
        } = cli.command
        else {
            panic!("Expected ecs run");
        };
        assert_eq!(count, 3);
        assert_eq!(launch.subnet, ["subnet-1", "subnet-2"]);
        assert!(launch.public_ip);
    }

    #[test]
    fn test_cli_rejects_zero_run_count() {
        let result = Cli::try_parse_from(["ecs-rollout", "ecs", "run", "prod", "batch", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = parse(&["ecs", "scale", "prod", "web", "4", "--json", "-vv", "--no-color"]);
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_color);
        assert_eq!(cli.command.name(), "ecs scale");
    }

    #[test]
    fn test_cli_endpoint_conflicts_with_state_file() {
        let result = Cli::try_parse_from([
            "ecs-rollout",
            "--endpoint",
            "http://localhost:4566",
            "--state-file",
            "state.json",
            "ecs",
            "update",
            "web",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_code_deploy_requires_port_with_container() {
        let result = Cli::try_parse_from([
            "ecs-rollout",
            "code-deploy",
            "deploy",
            "shop",
            "shop-web",
            "--container-name",
            "web",
        ]);
        assert!(result.is_err());

        let cli = parse(&[
            "code-deploy",
            "deploy",
            "shop",
            "shop-web",
            "--container-name",
            "web",
            "--container-port",
            "8080",
            "--show-diff",
        ]);
        assert!(cli.command.show_diff());
        assert_eq!(cli.command.name(), "code-deploy deploy");
    }

    #[test]
    fn test_cli_command_accepts_dash_arguments() {
        let cli = parse(&["ecs", "update", "web", "-c", "worker", "--flag value"]);
        let Commands::Ecs {
            action: EcsCommand::Update { overrides, .. },
        } = cli.command
        else {
            panic!("Expected ecs update");
        };
        assert_eq!(overrides.command, ["worker", "--flag value"]);
    }
}
