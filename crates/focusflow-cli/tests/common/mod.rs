//! Helpers for CLI end-to-end tests.
//!
//! Every [`Sandbox`] points `FOCUSFLOW_HOME` at its own temp directory so
//! tests never touch the real data directory or each other.

use std::process::Command;

pub struct Sandbox {
    home: tempfile::TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("create temp home"),
        }
    }

    /// Invoke the CLI and return (stdout, stderr, exit code).
    pub fn run(&self, args: &[&str]) -> (String, String, i32) {
        let output = Command::new(env!("CARGO_BIN_EXE_focusflow"))
            .args(args)
            .env("FOCUSFLOW_HOME", self.home.path())
            .env_remove("FOCUSFLOW_LOG")
            .env_remove("OPENROUTER_API_KEY")
            .output()
            .expect("Failed to execute CLI command");

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        (stdout, stderr, code)
    }

    /// Invoke the CLI and expect success.
    pub fn ok(&self, args: &[&str]) -> String {
        let (stdout, stderr, code) = self.run(args);
        assert_eq!(code, 0, "CLI command failed: {args:?}\nstderr: {stderr}");
        stdout
    }

    /// Invoke the CLI and expect failure. Returns stderr.
    pub fn fail(&self, args: &[&str]) -> String {
        let (_, stderr, code) = self.run(args);
        assert_ne!(code, 0, "CLI command unexpectedly succeeded: {args:?}");
        stderr
    }

    /// Add a task and return its id.
    pub fn add_task(&self, name: &str, hours: &str) -> String {
        let out = self.ok(&["task", "add", name, "--hours", hours]);
        let value = json_after_first_line(&out);
        value["id"].as_str().expect("task id").to_string()
    }
}

/// Commands like `task add` print a status line before the JSON body.
pub fn json_after_first_line(out: &str) -> serde_json::Value {
    let body = out.split_once('\n').map(|(_, rest)| rest).unwrap_or(out);
    parse_json(body)
}

pub fn parse_json(text: &str) -> serde_json::Value {
    serde_json::from_str(text).expect("Failed to parse JSON output")
}

/// Split concatenated pretty-printed JSON documents.
pub fn parse_json_stream(text: &str) -> Vec<serde_json::Value> {
    serde_json::Deserializer::from_str(text)
        .into_iter::<serde_json::Value>()
        .collect::<Result<_, _>>()
        .expect("Failed to parse JSON stream")
}

pub fn assert_contains(haystack: &str, needle: &str) {
    assert!(
        haystack.contains(needle),
        "Expected '{haystack}' to contain '{needle}'"
    );
}
