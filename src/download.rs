use crate::error::ToolError;
use flate2::read::GzDecoder;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tar::Archive;
use walkdir::WalkDir;

/// Stream `url` into `local_path`.
///
/// Anything other than `200 OK` is a failure; the partially written file is
/// left for the caller's scratch cleanup.
pub async fn download_file(
    client: &reqwest::Client,
    url: &str,
    local_path: &Path,
    show_progress: bool,
) -> Result<(), ToolError> {
    let failed = |status: Option<StatusCode>, reason: String| ToolError::DownloadFailed {
        url: url.to_string(),
        status: status.map(|s| s.as_u16()),
        reason,
    };

    tracing::info!("Downloading {}...", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| failed(None, e.to_string()))?;

    let status = response.status();
    if status != StatusCode::OK {
        let reason = status.canonical_reason().unwrap_or("Unknown").to_string();
        return Err(failed(Some(status), reason));
    }

    let total_size = response.content_length().unwrap_or(0);
    let pb = if show_progress {
        ProgressBar::new(total_size)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    let filename = local_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    pb.set_message(format!("Downloading {}", filename));

    let mut file = fs::File::create(local_path)
        .map_err(|e| ToolError::file_op("create", local_path, e))?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| failed(Some(status), e.to_string()))?;
        file.write_all(&chunk)
            .map_err(|e| ToolError::file_op("write", local_path, e))?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }
    file.flush()
        .map_err(|e| ToolError::file_op("write", local_path, e))?;

    pb.finish_and_clear();
    tracing::debug!("Downloaded {} bytes to {}", downloaded, local_path.display());
    Ok(())
}

/// Unpack a gzip'd tarball into `extract_dir`, creating it.
pub fn extract_tar_gz(archive_path: &Path, extract_dir: &Path) -> Result<(), ToolError> {
    tracing::info!("Extracting {}...", archive_path.display());

    let file = fs::File::open(archive_path).map_err(|e| ToolError::extract(archive_path, e))?;
    let decoder = GzDecoder::new(file);
    let mut archive = Archive::new(decoder);

    fs::create_dir_all(extract_dir).map_err(|e| ToolError::file_op("create", extract_dir, e))?;
    archive
        .unpack(extract_dir)
        .map_err(|e| ToolError::extract(archive_path, e))?;

    Ok(())
}

/// Locate `binary_name` in an extracted archive.
///
/// Release archives keep the binary at the root, so the shallowest match wins.
pub fn find_binary(extract_dir: &Path, binary_name: &str) -> Option<PathBuf> {
    WalkDir::new(extract_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == binary_name)
        .min_by_key(|entry| entry.depth())
        .map(|entry| entry.into_path())
}
