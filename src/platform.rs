use crate::error::ToolError;
use serde::{Deserialize, Serialize};

/// Operating system / architecture pair used to pick a release archive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformInfo {
    pub os: String,
    pub arch: String,
}

impl Default for PlatformInfo {
    /// Archives published for every release: linux on x86_64.
    fn default() -> Self {
        Self {
            os: "linux".to_string(),
            arch: "amd64".to_string(),
        }
    }
}

impl PlatformInfo {
    /// Segment used in archive file names, e.g. `openshift-client-{segment}.tar.gz`.
    ///
    /// Releases name macOS builds `mac` and only suffix non-x86 architectures.
    pub fn archive_segment(&self) -> Result<String, ToolError> {
        let os = match self.os.as_str() {
            "linux" => "linux",
            "macos" | "darwin" | "mac" => "mac",
            _ => return Err(self.unsupported()),
        };

        match self.arch.as_str() {
            "amd64" => Ok(os.to_string()),
            "arm64" => Ok(format!("{}-arm64", os)),
            _ => Err(self.unsupported()),
        }
    }

    fn unsupported(&self) -> ToolError {
        ToolError::UnsupportedPlatform {
            os: self.os.clone(),
            arch: self.arch.clone(),
        }
    }
}

pub fn get_system_info() -> PlatformInfo {
    let os = std::env::consts::OS.to_string();
    let arch = std::env::consts::ARCH.to_string();

    let normalized_arch = match arch.as_str() {
        "x86_64" => "amd64".to_string(),
        "aarch64" => "arm64".to_string(),
        _ => arch,
    };

    PlatformInfo {
        os,
        arch: normalized_arch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform(os: &str, arch: &str) -> PlatformInfo {
        PlatformInfo {
            os: os.to_string(),
            arch: arch.to_string(),
        }
    }

    #[test]
    fn test_platform_info() {
        let info = get_system_info();
        assert!(!info.os.is_empty());
        assert!(!info.arch.is_empty());
        assert_ne!(info.arch, "x86_64");
    }

    #[test]
    fn test_archive_segment() {
        assert_eq!(PlatformInfo::default().archive_segment().unwrap(), "linux");
        assert_eq!(platform("linux", "arm64").archive_segment().unwrap(), "linux-arm64");
        assert_eq!(platform("macos", "amd64").archive_segment().unwrap(), "mac");
        assert_eq!(platform("macos", "arm64").archive_segment().unwrap(), "mac-arm64");
    }

    #[test]
    fn test_archive_segment_unsupported() {
        let err = platform("windows", "amd64").archive_segment().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported platform windows/amd64");
        assert!(platform("linux", "s390x").archive_segment().is_err());
    }
}
