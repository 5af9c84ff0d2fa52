use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

// Not every test binary uses every helper
#[allow(dead_code)]
pub struct TestContext {
    pub _temp_dir: TempDir,
    pub config_path: PathBuf,
    pub bin_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config").join("config.json");
        let bin_dir = temp_dir.path().join("bin");
        let scratch_dir = temp_dir.path().join("scratch");

        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_okdtools"));

        Self {
            _temp_dir: temp_dir,
            config_path,
            bin_dir,
            scratch_dir,
            bin_path,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.env("OKDTOOLS_CONFIG_PATH", &self.config_path);
        cmd.env("OKDTOOLS_EXECUTABLE_DIR", &self.bin_dir);
        cmd.env("OKDTOOLS_SCRATCH_DIR", &self.scratch_dir);
        cmd.env("HOME", self._temp_dir.path());
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Point both release sources at a local mock server.
    pub fn cmd_with_mirror(&self, base_url: &str) -> Command {
        let mut cmd = self.cmd();
        cmd.env("OKDTOOLS_OCP_MIRROR_URL", format!("{}/ocp", base_url));
        cmd.env("OKDTOOLS_OKD_RELEASE_URL", format!("{}/okd", base_url));
        cmd
    }

    pub fn run(&self, args: &[&str]) -> CommandOutput {
        self.cmd()
            .args(args)
            .output()
            .expect("Failed to run okdtools")
            .into()
    }
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_failure(&self) -> &Self {
        if self.status.success() {
            panic!(
                "Command unexpectedly succeeded\nstdout: {}\nstderr: {}",
                self.stdout, self.stderr
            );
        }
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }

    /// Parse stdout as the JSON result document.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|e| panic!("Output was not valid JSON ({}): {}", e, self.stdout))
    }
}

/// Build an in-memory `.tar.gz` holding `entries` as regular files.
#[allow(dead_code)]
pub fn tar_gz(entries: &[(&str, &str)]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, contents) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, name, contents.as_bytes())
            .expect("Failed to append tar entry");
    }
    builder
        .into_inner()
        .expect("Failed to finish tar")
        .finish()
        .expect("Failed to finish gzip")
}
