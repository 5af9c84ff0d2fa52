use crate::resolve::{DEFAULT_OCP_MIRROR_URL, DEFAULT_OKD_RELEASE_URL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_executable_dir")]
    pub executable_dir: String,
    #[serde(default)]
    pub symlink: bool,
    #[serde(default = "default_ocp_mirror_url")]
    pub ocp_mirror_url: String,
    #[serde(default = "default_okd_release_url")]
    pub okd_release_url: String,
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
    /// Parent of per-run scratch directories; system temp dir when unset
    #[serde(default)]
    pub scratch_dir: Option<String>,
}

fn default_executable_dir() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bin")
        .to_string_lossy()
        .to_string()
}
fn default_ocp_mirror_url() -> String {
    DEFAULT_OCP_MIRROR_URL.to_string()
}
fn default_okd_release_url() -> String {
    DEFAULT_OKD_RELEASE_URL.to_string()
}
fn default_download_timeout_secs() -> u64 {
    600
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            executable_dir: default_executable_dir(),
            symlink: false,
            ocp_mirror_url: default_ocp_mirror_url(),
            okd_release_url: default_okd_release_url(),
            download_timeout_secs: default_download_timeout_secs(),
            scratch_dir: None,
        }
    }
}

impl Settings {
    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_dir
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// On-disk artifacts produced for one tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstalledArtifact {
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symlink: Option<PathBuf>,
}

/// Result of one invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Outcome {
    pub changed: bool,
    pub cli_tools: BTreeMap<String, InstalledArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl Outcome {
    pub fn failed(&self) -> bool {
        self.msg.is_some()
    }
}

/// Accumulates changes and artifacts while a run progresses.
#[derive(Debug, Default)]
pub struct OutcomeBuilder {
    changed: bool,
    cli_tools: BTreeMap<String, InstalledArtifact>,
}

impl OutcomeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a step result into the changed flag.
    pub fn record(&mut self, changed: bool) {
        self.changed |= changed;
    }

    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn artifact(&mut self, name: &str, artifact: InstalledArtifact) {
        self.cli_tools.insert(name.to_string(), artifact);
    }

    pub fn finish(self) -> Outcome {
        Outcome {
            changed: self.changed,
            cli_tools: self.cli_tools,
            msg: None,
        }
    }

    pub fn fail(self, msg: String) -> Outcome {
        Outcome {
            msg: Some(msg),
            ..self.finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert!(settings.executable_dir.ends_with("bin"));
        assert!(!settings.symlink);
        assert_eq!(settings.download_timeout_secs, 600);
        assert_eq!(settings.scratch_root(), std::env::temp_dir());
    }

    #[test]
    fn test_settings_partial_json_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"executable_dir": "/opt/bin", "symlink": true}"#).unwrap();
        assert_eq!(settings.executable_dir, "/opt/bin");
        assert!(settings.symlink);
        assert_eq!(settings.ocp_mirror_url, DEFAULT_OCP_MIRROR_URL);
    }

    #[test]
    fn test_outcome_builder() {
        let mut builder = OutcomeBuilder::new();
        builder.record(false);
        assert!(!builder.changed());
        builder.record(true);
        builder.record(false);
        builder.artifact(
            "oc",
            InstalledArtifact {
                path: PathBuf::from("/home/user/bin/oc-4.9.10"),
                symlink: Some(PathBuf::from("/home/user/bin/oc")),
            },
        );

        let outcome = builder.fail("boom".to_string());
        assert!(outcome.changed);
        assert!(outcome.failed());
        assert_eq!(outcome.cli_tools.len(), 1);
    }

    #[test]
    fn test_outcome_serialization() {
        let mut builder = OutcomeBuilder::new();
        builder.artifact(
            "okd-install",
            InstalledArtifact {
                path: PathBuf::from("/home/user/bin/okd-install-4.9.0"),
                symlink: None,
            },
        );
        let json = serde_json::to_value(builder.finish()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "changed": false,
                "cli_tools": {
                    "okd-install": {"path": "/home/user/bin/okd-install-4.9.0"}
                }
            })
        );
    }
}
