//! Test environment builder for isolated CLI runs.
//!
//! Every `TestEnv` owns a temp directory holding the registry state file, a
//! fake HOME and the working directory, so no user config leaks into a test.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use ecs_rollout::infrastructure::registry::{RegistryState, StoredRevision, StoredService};
use tempfile::TempDir;

use super::fixtures::standard_state;

/// Result of running the CLI
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    /// Combine stdout and stderr
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }

    /// Parse every stdout line as JSON (NDJSON mode).
    pub fn json_lines(&self) -> Vec<serde_json::Value> {
        self.stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line)
                    .unwrap_or_else(|e| panic!("not JSON: {line}\n{e}\nstdout:\n{}", self.stdout))
            })
            .collect()
    }
}

impl From<Output> for TestResult {
    fn from(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

/// Isolated test environment with a seeded registry.
pub struct TestEnv {
    pub root: TempDir,
    state_file: PathBuf,
    bin: PathBuf,
}

impl TestEnv {
    /// Environment seeded with [`standard_state`].
    pub fn new() -> Self {
        Self::with_state(standard_state())
    }

    /// Environment seeded with `state`.
    pub fn with_state(state: RegistryState) -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp dir");
        std::fs::create_dir_all(root.path().join("home")).expect("Failed to create home");
        let state_file = root.path().join("registry.json");
        let env = Self {
            root,
            state_file,
            bin: PathBuf::from(env!("CARGO_BIN_EXE_ecs-rollout")),
        };
        env.write_state(&state);
        env
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.path().join(relative)
    }

    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    /// Write `content` under the environment root and return its path.
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    pub fn write_state(&self, state: &RegistryState) {
        let json = serde_json::to_string_pretty(state).expect("Failed to serialize state");
        std::fs::write(&self.state_file, json).expect("Failed to write state file");
    }

    /// Current registry state as the CLI left it.
    pub fn state(&self) -> RegistryState {
        let raw = std::fs::read_to_string(&self.state_file).expect("Failed to read state file");
        serde_json::from_str(&raw).expect("Failed to parse state file")
    }

    pub fn service(&self, cluster: &str, name: &str) -> StoredService {
        self.state()
            .services
            .into_iter()
            .find(|s| s.cluster == cluster && s.name == name)
            .unwrap_or_else(|| panic!("no service {name} in {cluster}"))
    }

    pub fn revision(&self, family: &str, revision: u32) -> StoredRevision {
        self.state()
            .task_definitions
            .into_iter()
            .find(|r| r.spec.family == family && r.spec.revision == Some(revision))
            .unwrap_or_else(|| panic!("no revision {family}:{revision}"))
    }

    pub fn revision_count(&self, family: &str) -> usize {
        self.state()
            .task_definitions
            .iter()
            .filter(|r| r.spec.family == family)
            .count()
    }

    /// Run the CLI against this environment's state file.
    pub fn run(&self, args: &[&str]) -> TestResult {
        self.run_with_env(args, &[])
    }

    pub fn run_with_env(&self, args: &[&str], env_vars: &[(&str, &str)]) -> TestResult {
        let state_file = self.state_file.display().to_string();
        let mut full = vec!["--state-file", state_file.as_str()];
        full.extend_from_slice(args);
        self.run_raw(&full, env_vars)
    }

    /// Run the CLI with exactly `args`, no registry selected.
    pub fn run_raw(&self, args: &[&str], env_vars: &[(&str, &str)]) -> TestResult {
        let mut cmd = self.command();
        cmd.args(args);
        for (key, value) in env_vars {
            cmd.env(key, value);
        }
        cmd.output().expect("Failed to run ecs-rollout").into()
    }

    fn command(&self) -> Command {
        let home = self.path("home");
        let mut cmd = Command::new(&self.bin);
        cmd.current_dir(self.root.path())
            .env("HOME", &home)
            .env("XDG_CONFIG_HOME", home.join(".config"))
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .env_remove("ECS_ROLLOUT_ENDPOINT")
            .env_remove("ECS_ROLLOUT_STATE_FILE")
            .env_remove("ECS_ROLLOUT_REGION")
            .env_remove("ECS_ROLLOUT_POLL_INTERVAL")
            .env_remove("ECS_ROLLOUT_TIMEOUT");
        cmd
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
