use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures that abort a reconciliation run.
///
/// Every variant carries the text of the underlying cause so the message can
/// be surfaced to the caller verbatim.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unsupported executable '{0}'. Supported executables: openshift-install, okd-install, oc")]
    UnsupportedToolKind(String),

    #[error("Invalid release version '{0}'")]
    InvalidVersion(String),

    #[error("Unsupported platform {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("There was a problem downloading file at {url}: {}", describe_status(.status, .reason))]
    DownloadFailed {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("Could not extract {}: {cause}", .archive.display())]
    ExtractFailed { archive: PathBuf, cause: String },

    #[error("Could not install {}: {cause}", .path.display())]
    InstallFailed { path: PathBuf, cause: String },

    #[error("Could not {op} {}: {cause}", .path.display())]
    FileOperationFailed {
        op: &'static str,
        path: PathBuf,
        cause: String,
    },
}

fn describe_status(status: &Option<u16>, reason: &str) -> String {
    match status {
        Some(code) => format!("{} - {}", code, reason),
        None => reason.to_string(),
    }
}

impl ToolError {
    pub fn file_op(op: &'static str, path: &Path, cause: impl ToString) -> Self {
        ToolError::FileOperationFailed {
            op,
            path: path.to_path_buf(),
            cause: cause.to_string(),
        }
    }

    pub fn extract(archive: &Path, cause: impl ToString) -> Self {
        ToolError::ExtractFailed {
            archive: archive.to_path_buf(),
            cause: cause.to_string(),
        }
    }

    pub fn install(path: &Path, cause: impl ToString) -> Self {
        ToolError::InstallFailed {
            path: path.to_path_buf(),
            cause: cause.to_string(),
        }
    }
}
