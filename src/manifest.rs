//! Multi-tool request files
//!
//! ```yaml
//! directory: ~/bin
//! symlink: true
//! tools:
//!   - name: openshift-install
//!     version: "4.9.10"
//!   - name: oc
//!     version: 4.9.0-0.okd-2021-11-28-035710
//!     state: absent
//! ```

use crate::config::expand_home;
use crate::error::ToolError;
use crate::install::Request;
use crate::tool_id::{ReleaseChannel, State, Tool, ToolSpec};
use crate::types::Settings;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Executable directory for every entry; falls back to settings
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub symlink: Option<bool>,
    #[serde(default)]
    pub state: State,
    pub tools: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub channel: Option<ReleaseChannel>,
    #[serde(default)]
    pub state: Option<State>,
    #[serde(default)]
    pub symlink: Option<bool>,
}

impl Manifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read manifest at {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Could not parse manifest at {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest = serde_yaml::from_str(content)?;
        Ok(manifest)
    }

    /// Validate every entry and turn it into a reconciliation request.
    ///
    /// Entry fields override manifest-level ones, which override settings.
    pub fn requests(&self, settings: &Settings) -> Result<Vec<Request>, ToolError> {
        let directory = expand_home(
            self.directory
                .as_deref()
                .unwrap_or(&settings.executable_dir),
        );
        let default_symlink = self.symlink.unwrap_or(settings.symlink);

        self.tools
            .iter()
            .map(|entry| {
                let tool = Tool::parse(&entry.name, &entry.version, entry.channel)?;
                let spec = ToolSpec::new(
                    tool,
                    &entry.version,
                    &directory,
                    entry.symlink.unwrap_or(default_symlink),
                )?;
                Ok(Request::new(spec, entry.state.unwrap_or(self.state)))
            })
            .collect()
    }
}
