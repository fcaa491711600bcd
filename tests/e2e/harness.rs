//! Test harness and utilities for E2E tests.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};

use sanetrace_proto::Ports;

static TEST_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub const CLIENT: Ports = Ports { src: 40000, dst: 6566 };
pub const SERVER: Ports = Ports { src: 6566, dst: 40000 };

/// Result of running the binary.
pub struct RunResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Isolated working directory for one test.
///
/// Every harness writes a config pointing the log file into its own
/// directory, so tests never share log output.
pub struct TestHarness {
    pub temp_dir: PathBuf,
}

impl TestHarness {
    pub fn new(test_name: &str) -> Self {
        let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let temp_dir =
            std::env::temp_dir().join(format!("sanetrace_e2e_{}_{}_{}", test_name, std::process::id(), counter));
        let _ = fs::remove_dir_all(&temp_dir);
        fs::create_dir_all(&temp_dir).expect("Failed to create temp dir");
        let harness = Self { temp_dir };
        harness.write_config("");
        harness
    }

    /// Writes sanetrace.toml, always with a log file inside the temp dir.
    pub fn write_config(&self, content: &str) -> &Self {
        let log_file = self.temp_dir.join("sanetrace.log");
        let config = format!("log_file = {:?}\n{}", log_file.display().to_string(), content);
        fs::write(self.temp_dir.join("sanetrace.toml"), config).expect("Failed to write config");
        self
    }

    pub fn write_transcript(&self, name: &str, segments: &[String]) -> &Self {
        fs::write(self.temp_dir.join(name), segments.concat()).expect("Failed to write transcript");
        self
    }

    pub fn run(&self, args: &[&str]) -> RunResult {
        let output = Command::new(cargo_bin_path())
            .args(args)
            .current_dir(&self.temp_dir)
            .stdin(Stdio::null())
            .output()
            .expect("Failed to run sanetrace");
        RunResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            let _ = fs::remove_dir_all(&self.temp_dir);
        }
    }
}

/// One `[[segment]]` table of a transcript.
pub fn segment(stream: u64, ports: Ports, bytes: &[u8]) -> String {
    format!(
        "[[segment]]\nstream = {}\nsrc = {}\ndst = {}\ndata = \"{}\"\n\n",
        stream,
        ports.src,
        ports.dst,
        hex::encode(bytes)
    )
}

pub fn cargo_bin_path() -> PathBuf {
    let mut path = std::env::current_exe().expect("Failed to get current exe");
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push("sanetrace");
    path
}
