//! Common test utilities and helpers for repomirror tests

use assert_fs::prelude::*;
use assert_fs::TempDir;
use serde_json::{json, Value};
use std::path::Path;
use std::process::{Command, Output};

/// Config with credentials but no repository source
pub const CONFIG_WITHOUT_PROVIDER: &str = "\
[auth]
username = octocat
password = hunter2
";

/// Scratch directory the binary runs in
pub struct TestWorkspace {
    pub temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write_config(&self, content: &str) {
        self.temp_dir
            .child("config.ini")
            .write_str(content)
            .expect("Failed to write test config");
    }

    pub fn write_repos_file(&self, name: &str, repositories: &Value) {
        self.temp_dir
            .child(name)
            .write_str(&repositories.to_string())
            .expect("Failed to write repository list");
    }

    /// Build a repomirror invocation rooted in the workspace
    pub fn command(&self) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_repomirror"));
        command
            .current_dir(self.path())
            .env_remove("RUST_LOG")
            .arg("--no-color");
        command
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command()
            .args(args)
            .output()
            .expect("Failed to execute repomirror")
    }

    pub fn saved_list(&self) -> Value {
        let content = std::fs::read_to_string(self.path().join("config.json"))
            .expect("Failed to read saved list");
        serde_json::from_str(&content).expect("Saved list is not JSON")
    }
}

/// Repository records shaped like GitHub API items
pub fn repos_json(names: &[&str]) -> Value {
    json!(names
        .iter()
        .enumerate()
        .map(|(i, name)| json!({
            "id": i + 1,
            "name": name,
            "ssh_url": format!("git@github.com:acme/{}.git", name),
            "private": false,
        }))
        .collect::<Vec<_>>())
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
