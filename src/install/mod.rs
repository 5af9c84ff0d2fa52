//! Reconciliation of installed executables
//!
//! Converges `{directory}/{tool}-{version}` and the optional `{directory}/{tool}`
//! symlink to the requested state with the fewest filesystem mutations:
//! - `present`: download, extract and install only when the versioned binary
//!   is missing; repoint the symlink only when it targets something else
//! - `absent`: remove leftover scratch data, the versioned binary and the symlink
//!
//! Every install works in its own `okdtools-{tool}-{version}-*` scratch
//! directory and holds an exclusive lock on `.lock` inside it until it is done.
//! Removal only sweeps scratch directories whose lock nobody holds.

pub mod fs_ops;

use crate::download::{download_file, extract_tar_gz, find_binary};
use crate::error::ToolError;
use crate::resolve::Resolver;
use crate::tool_id::{State, ToolSpec};
use crate::types::{InstalledArtifact, Outcome, OutcomeBuilder};
use fs4::tokio::AsyncFileExt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// One tool and the state it should end up in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub spec: ToolSpec,
    pub state: State,
}

impl Request {
    pub fn new(spec: ToolSpec, state: State) -> Self {
        Self { spec, state }
    }
}

/// HTTP client used for archive downloads.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("okdtools/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
}

const SCRATCH_LOCK: &str = ".lock";

fn scratch_prefix(spec: &ToolSpec) -> String {
    format!("okdtools-{}-{}-", spec.tool.name(), spec.version)
}

pub struct Reconciler {
    client: reqwest::Client,
    resolver: Resolver,
    scratch_root: PathBuf,
    check_mode: bool,
    show_progress: bool,
}

impl Reconciler {
    pub fn new(client: reqwest::Client, resolver: Resolver, scratch_root: &Path) -> Self {
        Self {
            client,
            resolver,
            scratch_root: scratch_root.to_path_buf(),
            check_mode: false,
            show_progress: false,
        }
    }

    /// Report what would change without touching the filesystem or network.
    pub fn check_mode(mut self, enabled: bool) -> Self {
        self.check_mode = enabled;
        self
    }

    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Apply `requests` in order. The first failure stops the run; its message
    /// is returned alongside everything reported up to that point.
    pub async fn reconcile(&self, requests: &[Request]) -> Outcome {
        let mut outcome = OutcomeBuilder::new();

        for request in requests {
            let result = match request.state {
                State::Present => self.ensure_present(&request.spec, &mut outcome).await,
                State::Absent => self.ensure_absent(&request.spec, &mut outcome).await,
            };

            if let Err(e) = result {
                tracing::error!("{} {}: {}", request.spec.tool, request.spec.version, e);
                return outcome.fail(e.to_string());
            }
        }

        tracing::debug!(
            "Reconciled {} request(s), changed: {}",
            requests.len(),
            outcome.changed()
        );
        outcome.finish()
    }

    pub async fn ensure_present(
        &self,
        spec: &ToolSpec,
        outcome: &mut OutcomeBuilder,
    ) -> Result<(), ToolError> {
        let versioned = spec.versioned_path();

        if fs_ops::path_exists(&versioned) {
            tracing::info!("{} {} is already installed", spec.tool, spec.version);
        } else if self.check_mode {
            tracing::info!("Would install {} {} to {}", spec.tool, spec.version, versioned.display());
            outcome.record(true);
        } else {
            self.install(spec, &versioned).await?;
            outcome.record(true);
        }

        let mut artifact = InstalledArtifact {
            path: versioned.clone(),
            symlink: None,
        };

        if spec.symlink {
            let link = spec.symlink_path();
            let changed = if self.check_mode {
                fs_ops::link_needs_update(&link, &versioned)?
            } else {
                fs_ops::ensure_symlink(&link, &versioned)?
            };
            outcome.record(changed);
            artifact.symlink = Some(link);
        }

        outcome.artifact(spec.tool.name(), artifact);
        Ok(())
    }

    pub async fn ensure_absent(
        &self,
        spec: &ToolSpec,
        outcome: &mut OutcomeBuilder,
    ) -> Result<(), ToolError> {
        let mut targets = self.leftover_scratch(spec).await?;
        targets.push(spec.versioned_path());
        if spec.symlink {
            targets.push(spec.symlink_path());
        }

        for path in targets {
            if self.check_mode {
                if fs_ops::path_exists(&path) {
                    tracing::info!("Would remove {}", path.display());
                    outcome.record(true);
                }
            } else {
                outcome.record(fs_ops::remove_path(&path)?);
            }
        }

        Ok(())
    }

    /// Download, extract and install into `dest` via a scratch directory
    /// private to this run. The scratch directory is removed on every path out.
    async fn install(&self, spec: &ToolSpec, dest: &Path) -> Result<(), ToolError> {
        let name = spec.tool.name();
        fs::create_dir_all(&self.scratch_root)
            .map_err(|e| ToolError::file_op("create", &self.scratch_root, e))?;
        let scratch = tempfile::Builder::new()
            .prefix(&scratch_prefix(spec))
            .tempdir_in(&self.scratch_root)
            .map_err(|e| ToolError::file_op("create", &self.scratch_root, e))?;
        let lock = lock_scratch(scratch.path()).await?;

        let archive = scratch.path().join(format!("{}.tar.gz", name));
        let extract_dir = scratch.path().join(name);

        let url = self.resolver.resolve(&spec.tool, &spec.version);
        tracing::info!(
            "Installing {} {} ({} channel) from {}",
            name,
            spec.version,
            spec.tool.channel(),
            url
        );

        download_file(&self.client, &url, &archive, self.show_progress).await?;

        if !extract_dir.exists() {
            extract_tar_gz(&archive, &extract_dir)?;
        }

        let binary = find_binary(&extract_dir, spec.tool.archive_binary()).ok_or_else(|| {
            ToolError::extract(
                &archive,
                format!("archive does not contain '{}'", spec.tool.archive_binary()),
            )
        })?;

        fs_ops::install_executable(&binary, dest)?;
        drop(lock);
        remove_scratch(scratch)
    }

    /// Scratch directories of `spec` left behind by interrupted runs.
    ///
    /// Directories whose lock is still held belong to a live install and are skipped.
    async fn leftover_scratch(&self, spec: &ToolSpec) -> Result<Vec<PathBuf>, ToolError> {
        let entries = match fs::read_dir(&self.scratch_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ToolError::file_op("read", &self.scratch_root, e)),
        };

        let prefix = scratch_prefix(spec);
        let mut leftovers = Vec::new();
        for entry in entries.flatten() {
            if !entry.file_name().to_string_lossy().starts_with(&prefix) {
                continue;
            }
            let path = entry.path();
            if path.is_dir() && scratch_in_use(&path).await? {
                tracing::debug!("Skipping {}, an install is still using it", path.display());
                continue;
            }
            leftovers.push(path);
        }
        Ok(leftovers)
    }
}

/// Take the exclusive lock marking `dir` as in use. Released when the file drops.
async fn lock_scratch(dir: &Path) -> Result<tokio::fs::File, ToolError> {
    let path = dir.join(SCRATCH_LOCK);
    let file = tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&path)
        .await
        .map_err(|e| ToolError::file_op("create", &path, e))?;
    file.lock_exclusive()
        .map_err(|e| ToolError::file_op("lock", &path, e))?;
    Ok(file)
}

/// True while another run holds the lock of scratch directory `dir`.
async fn scratch_in_use(dir: &Path) -> Result<bool, ToolError> {
    let path = dir.join(SCRATCH_LOCK);
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        // Interrupted before the lock was taken
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(ToolError::file_op("open", &path, e)),
    };
    let acquired = file
        .try_lock_exclusive()
        .map_err(|e| ToolError::file_op("lock", &path, e))?;
    Ok(!acquired)
}

fn remove_scratch(scratch: TempDir) -> Result<(), ToolError> {
    let path = scratch.path().to_path_buf();
    match scratch.close() {
        Ok(()) => {}
        // Swept by a concurrent removal once the lock was released
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(ToolError::file_op("remove", &path, e)),
    }
    tracing::debug!("Removed scratch directory {}", path.display());
    Ok(())
}
