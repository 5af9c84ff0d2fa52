//! Idempotent filesystem primitives used by the reconciler.
//!
//! Each mutating helper reports whether it touched the disk so callers can
//! derive the overall `changed` flag.

use crate::error::ToolError;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Mode of installed executables: rwxrwxr-x
pub const EXECUTABLE_MODE: u32 = 0o775;

/// True if anything (file, directory or dangling symlink) lives at `path`.
pub fn path_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Remove whatever lives at `path`. A missing path is not an error.
pub fn remove_path(path: &Path) -> Result<bool, ToolError> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(ToolError::file_op("inspect", path, e)),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => {
            tracing::info!("Removed {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ToolError::file_op("remove", path, e)),
    }
}

/// What currently occupies the symlink location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    Missing,
    Link(PathBuf),
    /// A regular file; replaced like a stale link
    File,
    Directory,
}

pub fn inspect_link(link: &Path) -> Result<LinkState, ToolError> {
    let metadata = match fs::symlink_metadata(link) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LinkState::Missing),
        Err(e) => return Err(ToolError::file_op("inspect", link, e)),
    };

    if metadata.file_type().is_symlink() {
        let target = fs::read_link(link).map_err(|e| ToolError::file_op("read link", link, e))?;
        Ok(LinkState::Link(target))
    } else if metadata.is_dir() {
        Ok(LinkState::Directory)
    } else {
        Ok(LinkState::File)
    }
}

/// Does `link` need to be (re)pointed at `target`?
pub fn link_needs_update(link: &Path, target: &Path) -> Result<bool, ToolError> {
    match inspect_link(link)? {
        LinkState::Link(current) => Ok(current != target),
        LinkState::Missing | LinkState::File => Ok(true),
        LinkState::Directory => Err(ToolError::file_op(
            "replace",
            link,
            "a directory occupies the symlink location",
        )),
    }
}

/// Point `link` at `target`, replacing a stale link or file.
///
/// Returns `false` when the link already points at `target`.
pub fn ensure_symlink(link: &Path, target: &Path) -> Result<bool, ToolError> {
    if !link_needs_update(link, target)? {
        tracing::debug!("{} already points to {}", link.display(), target.display());
        return Ok(false);
    }

    remove_path(link)?;
    symlink(target, link).map_err(|e| ToolError::file_op("create symlink", link, e))?;
    tracing::info!("Linked {} -> {}", link.display(), target.display());
    Ok(true)
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

/// Place `source` at `dest` as an executable without ever replacing `dest`.
///
/// The binary is staged next to `dest` and persisted with no-clobber
/// semantics, so a concurrently created destination makes this fail with
/// [`ToolError::InstallFailed`] instead of being overwritten.
pub fn install_executable(source: &Path, dest: &Path) -> Result<(), ToolError> {
    let dest_dir = dest
        .parent()
        .ok_or_else(|| ToolError::install(dest, "destination has no parent directory"))?;
    fs::create_dir_all(dest_dir).map_err(|e| ToolError::file_op("create", dest_dir, e))?;

    let mut staged =
        NamedTempFile::new_in(dest_dir).map_err(|e| ToolError::install(dest, e))?;
    let mut reader = fs::File::open(source).map_err(|e| ToolError::install(dest, e))?;
    io::copy(&mut reader, staged.as_file_mut()).map_err(|e| ToolError::install(dest, e))?;
    staged
        .as_file()
        .sync_all()
        .map_err(|e| ToolError::install(dest, e))?;
    set_executable(staged.path()).map_err(|e| ToolError::file_op("chmod", staged.path(), e))?;

    staged.persist_noclobber(dest).map_err(|e| {
        if e.error.kind() == ErrorKind::AlreadyExists {
            ToolError::install(dest, "destination already exists, refusing to overwrite")
        } else {
            ToolError::install(dest, e.error)
        }
    })?;

    tracing::info!("Installed {}", dest.display());
    Ok(())
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(EXECUTABLE_MODE))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
