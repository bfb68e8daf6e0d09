//! Test environment builder for isolated Longshore testing.
//!
//! Provides `TestEnv`, an isolated project directory and home directory
//! pair, plus helpers to run the longshore binary inside it. Endpoints in
//! the canned configurations point at a closed local port, so commands
//! that reach the network fail fast instead of leaving the machine.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Configuration whose endpoint refuses connections immediately.
pub const OFFLINE_CONFIG: &str = r#"
[store]
bucket = "assets"
endpoint = "http://127.0.0.1:1"
"#;

/// Like [`OFFLINE_CONFIG`], but a failed listing degrades to an empty
/// inventory instead of aborting.
pub const OFFLINE_DEGRADED_CONFIG: &str = r#"
[store]
bucket = "assets"
endpoint = "http://127.0.0.1:1"
on_listing_failure = "assume-empty"
"#;

/// Result of running a longshore CLI command
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
}

/// Isolated test environment with temp directories.
///
/// Provides an isolated project directory, an isolated home directory (so
/// no user-level configuration leaks in), and CLI execution helpers.
pub struct TestEnv {
    /// Temporary directory for the project
    pub project_root: TempDir,
    /// Temporary directory for HOME
    pub home_dir: TempDir,
}

impl TestEnv {
    /// Create a new TestEnvBuilder
    pub fn builder() -> TestEnvBuilder {
        TestEnvBuilder::new()
    }

    /// Get path relative to project root
    pub fn project_path(&self, relative: &str) -> PathBuf {
        self.project_root.path().join(relative)
    }

    /// Write a file to the project directory
    pub fn write_project_file(&self, relative: &str, content: &str) {
        let full_path = self.project_path(relative);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create directories");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
    }

    /// Stage every file in the project in a fresh git repository.
    pub fn git_track_all(&self) {
        let root = self.project_root.path();
        run_git(root, &["init", "-q"]);
        run_git(root, &["add", "."]);
    }

    /// Run longshore in this environment from the project root
    pub fn run(&self, args: &[&str]) -> TestResult {
        self.run_with_env(args, &[])
    }

    /// Run longshore from the project root with extra env vars.
    pub fn run_with_env(&self, args: &[&str], env_vars: &[(&str, &str)]) -> TestResult {
        let bin = env!("CARGO_BIN_EXE_longshore");

        let mut cmd = Command::new(bin);
        cmd.current_dir(self.project_root.path())
            .args(args)
            .env("HOME", self.home_dir.path())
            .env("XDG_CONFIG_HOME", self.home_dir.path().join(".config"))
            .env_remove("LONGSHORE_BUCKET")
            .env_remove("LONGSHORE_ENDPOINT")
            .env_remove("LONGSHORE_TOKEN")
            .env_remove("LONGSHORE_MANIFEST")
            .env_remove("LONGSHORE_CACHE_TIME");

        for (key, value) in env_vars {
            cmd.env(key, value);
        }

        let output = cmd.output().expect("Failed to execute longshore");
        to_result(output)
    }
}

fn run_git(cwd: &Path, args: &[&str]) {
    let output = Command::new("git")
        .current_dir(cwd)
        .args(args)
        .output()
        .expect("Failed to execute git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn to_result(output: Output) -> TestResult {
    TestResult {
        success: output.status.success(),
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

/// Builder for TestEnv with fluent API
pub struct TestEnvBuilder {
    project_config: Option<String>,
    source_files: Vec<(String, String)>,
}

impl TestEnvBuilder {
    pub fn new() -> Self {
        Self {
            project_config: None,
            source_files: Vec::new(),
        }
    }

    /// Set longshore.toml content for the project
    pub fn with_project_config(mut self, toml: &str) -> Self {
        self.project_config = Some(toml.to_string());
        self
    }

    /// Add a file under the project root
    pub fn with_source_file(mut self, name: &str, content: &str) -> Self {
        self.source_files
            .push((name.to_string(), content.to_string()));
        self
    }

    /// Build the TestEnv
    pub fn build(self) -> TestEnv {
        let project_root = TempDir::new().expect("Failed to create project temp dir");
        let home_dir = TempDir::new().expect("Failed to create home temp dir");

        if let Some(config) = &self.project_config {
            std::fs::write(project_root.path().join("longshore.toml"), config)
                .expect("Failed to write longshore.toml");
        }

        for (name, content) in &self.source_files {
            let path = project_root.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("Failed to create source directory");
            }
            std::fs::write(&path, content).expect("Failed to write source file");
        }

        TestEnv {
            project_root,
            home_dir,
        }
    }
}

impl Default for TestEnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_writes_config_and_sources() {
        let env = TestEnv::builder()
            .with_project_config(OFFLINE_CONFIG)
            .with_source_file("js/app.js", "console.log(1)")
            .build();

        assert!(env.project_path("longshore.toml").exists());
        assert!(env.project_path("js/app.js").exists());
    }

    #[test]
    fn test_builder_defaults_to_empty_project() {
        let env = TestEnv::builder().build();

        assert!(!env.project_path("longshore.toml").exists());
    }
}
