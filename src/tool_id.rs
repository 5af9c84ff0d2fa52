use crate::error::ToolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Upstream distributor hosting a release archive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseChannel {
    /// Red Hat's OpenShift client mirror
    Ocp,
    /// OKD community releases on GitHub
    Okd,
}

impl ReleaseChannel {
    /// Infer the channel from a release version.
    ///
    /// OKD versions carry the distribution name, e.g. `4.9.0-0.okd-2021-12-12-025847`.
    /// Only called while validating input; everything downstream reads the
    /// channel from [`Tool`].
    pub fn from_version(version: &str) -> Self {
        if version.contains("okd") {
            ReleaseChannel::Okd
        } else {
            ReleaseChannel::Ocp
        }
    }
}

impl fmt::Display for ReleaseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseChannel::Ocp => write!(f, "ocp"),
            ReleaseChannel::Okd => write!(f, "okd"),
        }
    }
}

/// The executables this tool knows how to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    OpenshiftInstall,
    OkdInstall,
    Oc { channel: ReleaseChannel },
}

pub const SUPPORTED_TOOLS: [&str; 3] = ["openshift-install", "okd-install", "oc"];

impl Tool {
    /// Validate an executable name and settle its release channel.
    ///
    /// The installers have a fixed channel and ignore `channel`. For `oc` an
    /// explicit channel wins, otherwise it is derived from `version`.
    pub fn parse(
        name: &str,
        version: &str,
        channel: Option<ReleaseChannel>,
    ) -> Result<Self, ToolError> {
        match name.trim().to_lowercase().as_str() {
            "openshift-install" => Ok(Tool::OpenshiftInstall),
            "okd-install" => Ok(Tool::OkdInstall),
            "oc" => Ok(Tool::Oc {
                channel: channel.unwrap_or_else(|| ReleaseChannel::from_version(version)),
            }),
            _ => Err(ToolError::UnsupportedToolKind(name.to_string())),
        }
    }

    /// Name used for the installed file and the symlink.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::OpenshiftInstall => "openshift-install",
            Tool::OkdInstall => "okd-install",
            Tool::Oc { .. } => "oc",
        }
    }

    /// Name of the executable inside the release archive.
    ///
    /// OKD ships its installer as `openshift-install`; it gets renamed to
    /// `okd-install` so both installers can live side by side.
    pub fn archive_binary(&self) -> &'static str {
        match self {
            Tool::OpenshiftInstall | Tool::OkdInstall => "openshift-install",
            Tool::Oc { .. } => "oc",
        }
    }

    pub fn channel(&self) -> ReleaseChannel {
        match self {
            Tool::OpenshiftInstall => ReleaseChannel::Ocp,
            Tool::OkdInstall => ReleaseChannel::Okd,
            Tool::Oc { channel } => *channel,
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Desired state of a tool on disk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum State {
    #[default]
    Present,
    Absent,
}

/// A single executable to reconcile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub tool: Tool,
    pub version: String,
    pub directory: PathBuf,
    pub symlink: bool,
}

impl ToolSpec {
    /// Build a spec, rejecting versions that cannot be used as a file name suffix.
    ///
    /// `directory` is made absolute so symlink targets resolve from anywhere.
    pub fn new(
        tool: Tool,
        version: &str,
        directory: &Path,
        symlink: bool,
    ) -> Result<Self, ToolError> {
        let version = version.trim();
        if version.is_empty()
            || version.contains(['/', '\\'])
            || version.chars().any(char::is_whitespace)
        {
            return Err(ToolError::InvalidVersion(version.to_string()));
        }

        let directory = std::path::absolute(directory)
            .map_err(|e| ToolError::file_op("resolve", directory, e))?;

        Ok(Self {
            tool,
            version: version.to_string(),
            directory,
            symlink,
        })
    }

    /// `{directory}/{tool}-{version}`
    pub fn versioned_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}-{}", self.tool.name(), self.version))
    }

    /// `{directory}/{tool}`
    pub fn symlink_path(&self) -> PathBuf {
        self.directory.join(self.tool.name())
    }
}
