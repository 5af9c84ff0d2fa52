use crate::error::ToolError;
use crate::install::fs_ops::{inspect_link, LinkState};
use crate::tool_id::SUPPORTED_TOOLS;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Versions of one tool found in an executable directory.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InstalledTool {
    pub name: String,
    /// Oldest first
    pub versions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symlink: Option<PathBuf>,
    /// Version the unversioned symlink points at, if it points at one of ours
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<String>,
}

/// Collect installed versions and symlink targets for every supported tool.
pub fn scan(directory: &Path) -> Result<Vec<InstalledTool>, ToolError> {
    let mut names: Vec<String> = match fs::read_dir(directory) {
        Ok(entries) => entries
            .flatten()
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect(),
        Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(ToolError::file_op("read", directory, e)),
    };
    names.sort();

    let mut tools = Vec::new();
    for tool in SUPPORTED_TOOLS {
        let prefix = format!("{}-", tool);
        let mut versions: Vec<String> = names
            .iter()
            .filter_map(|name| name.strip_prefix(&prefix))
            // Skips sibling binaries such as `oc-mirror`
            .filter(|version| version.starts_with(|c: char| c.is_ascii_digit()))
            .map(str::to_string)
            .collect();
        versions.sort_by_cached_key(|version| version_key(version));

        let link = directory.join(tool);
        let (symlink, active) = match inspect_link(&link)? {
            LinkState::Link(target) => {
                let active = target
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| n.strip_prefix(&prefix))
                    .map(str::to_string);
                (Some(target), active)
            }
            _ => (None, None),
        };

        if versions.is_empty() && symlink.is_none() {
            continue;
        }

        tools.push(InstalledTool {
            name: tool.to_string(),
            versions,
            symlink,
            active,
        });
    }

    Ok(tools)
}

/// Total sort key: versions that are not semver sort first by string,
/// semver ones after them by precedence.
pub fn version_key(version: &str) -> (Option<semver::Version>, String) {
    let clean = version.trim_start_matches('v');
    (semver::Version::parse(clean).ok(), clean.to_string())
}
