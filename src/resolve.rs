//! Download URL resolution
//!
//! Maps a tool and release version to the archive URL published by its
//! release channel. No network or filesystem access happens here.

use crate::error::ToolError;
use crate::platform::PlatformInfo;
use crate::tool_id::{ReleaseChannel, Tool};

pub const DEFAULT_OCP_MIRROR_URL: &str = "https://mirror.openshift.com/pub/openshift-v4/clients/ocp";
pub const DEFAULT_OKD_RELEASE_URL: &str = "https://github.com/openshift/okd/releases/download";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolver {
    ocp_mirror_url: String,
    okd_release_url: String,
    platform_segment: String,
}

impl Default for Resolver {
    fn default() -> Self {
        Self {
            ocp_mirror_url: DEFAULT_OCP_MIRROR_URL.to_string(),
            okd_release_url: DEFAULT_OKD_RELEASE_URL.to_string(),
            platform_segment: "linux".to_string(),
        }
    }
}

impl Resolver {
    /// Build a resolver for the given base URLs and target platform.
    pub fn new(
        ocp_mirror_url: &str,
        okd_release_url: &str,
        platform: &PlatformInfo,
    ) -> Result<Self, ToolError> {
        Ok(Self {
            ocp_mirror_url: ocp_mirror_url.trim_end_matches('/').to_string(),
            okd_release_url: okd_release_url.trim_end_matches('/').to_string(),
            platform_segment: platform.archive_segment()?,
        })
    }

    /// URL of the `.tar.gz` archive for `tool` at `version`.
    pub fn resolve(&self, tool: &Tool, version: &str) -> String {
        let p = &self.platform_segment;
        match (tool, tool.channel()) {
            (Tool::OpenshiftInstall | Tool::OkdInstall, ReleaseChannel::Okd) => format!(
                "{}/{}/openshift-install-{}-{}.tar.gz",
                self.okd_release_url, version, p, version
            ),
            (Tool::OpenshiftInstall | Tool::OkdInstall, ReleaseChannel::Ocp) => format!(
                "{}/{}/openshift-install-{}.tar.gz",
                self.ocp_mirror_url, version, p
            ),
            (Tool::Oc { .. }, ReleaseChannel::Okd) => format!(
                "{}/{}/openshift-client-{}-{}.tar.gz",
                self.okd_release_url, version, p, version
            ),
            (Tool::Oc { .. }, ReleaseChannel::Ocp) => format!(
                "{}/{}/openshift-client-{}.tar.gz",
                self.ocp_mirror_url, version, p
            ),
        }
    }

    /// Resolve from a raw executable name. The release channel of `oc` is
    /// inferred from `version` unless given.
    pub fn resolve_named(
        &self,
        name: &str,
        version: &str,
        channel: Option<ReleaseChannel>,
    ) -> Result<String, ToolError> {
        let tool = Tool::parse(name, version, channel)?;
        Ok(self.resolve(&tool, version.trim()))
    }
}
