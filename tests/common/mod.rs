//! Shared test infrastructure for integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Scratch directory holding input files for one `rml` invocation.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn create() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Write `contents` to `name` inside the workspace and return its path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents.as_bytes()).expect("write fixture file");
        path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Run the `rml` binary with `args`, isolated from the caller's RUST_LOG.
pub fn run_rml(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rml"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run rml")
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("utf8 stdout")
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).expect("utf8 stderr")
}

pub fn json_stdout(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("parse stdout JSON")
}
