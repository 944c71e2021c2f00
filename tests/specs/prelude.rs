//! Fluent helpers for driving the `spindle` binary.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::Once;
use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;

static BUILD: Once = Once::new();

/// Path to the `spindle` binary, building it once if this test run didn't.
fn binary() -> PathBuf {
    let path = assert_cmd::cargo::cargo_bin("spindle");
    BUILD.call_once(|| {
        if path.exists() {
            return;
        }
        let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
        let status = std::process::Command::new(cargo)
            .args(["build", "--quiet", "-p", "spindle", "--bin", "spindle"])
            .status()
            .expect("failed to invoke cargo");
        assert!(status.success(), "building spindle failed");
    });
    path
}

/// A `spindle` invocation with no state directory (help, version).
pub fn cli() -> CliBuilder {
    CliBuilder::new(None)
}

/// An isolated state directory shared by several invocations.
pub struct Library {
    dir: TempDir,
}

impl Library {
    pub fn new() -> Self {
        Self { dir: tempfile::tempdir().expect("tempdir") }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `spindle.toml` into the state directory.
    pub fn config(&self, toml: &str) -> &Self {
        std::fs::write(self.dir.path().join("spindle.toml"), toml).expect("write config");
        self
    }

    pub fn spindle(&self) -> CliBuilder {
        CliBuilder::new(Some(self.dir.path()))
    }

    /// Run with `--format json` and parse stdout.
    pub fn json(&self, args: &[&str]) -> Value {
        let mut full = vec!["--format", "json"];
        full.extend_from_slice(args);
        self.spindle().args(&full).passes().json()
    }

    /// Submit a job and return its full id.
    pub fn submit(&self, args: &[&str]) -> String {
        let mut full = vec!["submit"];
        full.extend_from_slice(args);
        self.json(&full)["id"].as_str().expect("submitted job has an id").to_string()
    }

    /// Start `spindle run` in the background; it is killed when the guard drops.
    pub fn serve(&self) -> Serving {
        let child = std::process::Command::new(binary())
            .arg("run")
            .env("NO_COLOR", "1")
            .env("SPINDLE_STATE_DIR", self.dir.path())
            .env("SPINDLE_TIMEOUT_CHECK_MS", "100")
            .env_remove("SPINDLE_LOG")
            .env_remove("SPINDLE_WORKERS")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .expect("spawn spindle run");
        let serving = Serving { child };
        let socket = self.dir.path().join("spindle.sock");
        wait_for(Duration::from_secs(10), || socket.exists());
        serving
    }

    /// Poll `status` of `id` until it reads `want`.
    pub fn wait_for_status(&self, id: &str, want: &str) {
        wait_for(Duration::from_secs(10), || self.status(id) == want);
    }

    pub fn status(&self, id: &str) -> String {
        let shown = self.json(&["show", id]);
        let job = if shown.get("job").is_some() { &shown["job"] } else { &shown };
        job["status"].as_str().unwrap_or_default().to_string()
    }
}

/// A background `spindle run`.
pub struct Serving {
    child: std::process::Child,
}

impl Drop for Serving {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn wait_for(limit: Duration, mut cond: impl FnMut() -> bool) {
    let deadline = std::time::Instant::now() + limit;
    while !cond() {
        assert!(std::time::Instant::now() < deadline, "condition not reached within {limit:?}");
        std::thread::sleep(Duration::from_millis(50));
    }
}

pub struct CliBuilder {
    cmd: assert_cmd::Command,
}

impl CliBuilder {
    fn new(state_dir: Option<&Path>) -> Self {
        let mut cmd = assert_cmd::Command::new(binary());
        cmd.env("NO_COLOR", "1").env_remove("SPINDLE_LOG").env_remove("SPINDLE_WORKERS");
        if let Some(dir) = state_dir {
            cmd.env("SPINDLE_STATE_DIR", dir);
        }
        Self { cmd }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    /// Kill the process after `limit` (for long-running `run`).
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.cmd.timeout(limit);
        self
    }

    /// Run to completion or timeout, whatever the exit status.
    pub fn output(mut self) -> RunAssert {
        RunAssert { output: self.cmd.output().expect("spawn spindle") }
    }

    pub fn passes(self) -> RunAssert {
        let run = self.output();
        assert!(
            run.output.status.success(),
            "expected success, got {:?}\nstdout: {}\nstderr: {}",
            run.output.status.code(),
            run.stdout(),
            run.stderr()
        );
        run
    }

    pub fn fails_with(self, code: i32) -> RunAssert {
        let run = self.output();
        assert_eq!(
            run.output.status.code(),
            Some(code),
            "unexpected exit status\nstdout: {}\nstderr: {}",
            run.stdout(),
            run.stderr()
        );
        run
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(needle), "stdout missing {needle:?}:\n{stdout}");
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(needle), "stderr missing {needle:?}:\n{stderr}");
        self
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.output.stdout)
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}):\n{}", self.stdout()))
    }
}
