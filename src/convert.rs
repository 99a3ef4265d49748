//! End-to-end conversion entry points.
//!
//! [`convert`] runs the whole flow for one request: validate, submit, poll,
//! and cache the result in the caller's [`SessionState`]. The session is only
//! written once the job has succeeded, so a failed or cancelled run leaves
//! the previous result available for download.
//!
//! [`convert_to_file`] additionally packages the result and writes the zip
//! bundle to disk.

use crate::archive::package;
use crate::client::MarkerClient;
use crate::error::{ApiError, ConvertError};
use crate::output::ConversionResult;
use crate::request::ConversionRequest;
use crate::session::SessionState;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Submit `request`, wait for the job, and store the result in `session`.
///
/// # Errors
/// Any [`ApiError`] from submission or polling. Missing inputs are reported
/// before any network call.
pub async fn convert<'s>(
    client: &MarkerClient,
    request: &ConversionRequest,
    session: &'s mut SessionState,
    cancel: &CancellationToken,
) -> Result<&'s ConversionResult, ApiError> {
    let start = Instant::now();
    info!("Starting conversion: {}", request.file_name());

    let handle = client.submit(request).await?;
    let result = client.poll(&handle, request.api_key(), cancel).await?;

    info!(
        "Conversion of '{}' finished in {}ms",
        request.file_name(),
        start.elapsed().as_millis()
    );
    Ok(session.store(result, request.file_name()))
}

/// Convert `request` and write the zip bundle to `output_path`.
///
/// Uses atomic write (temp file in the target directory + rename) so a
/// failure never leaves a truncated archive behind.
pub async fn convert_to_file(
    client: &MarkerClient,
    request: &ConversionRequest,
    session: &mut SessionState,
    output_path: impl AsRef<Path>,
    cancel: &CancellationToken,
) -> Result<PathBuf, ConvertError> {
    let result = convert(client, request, session, cancel).await?;
    let bytes = package(result, request.file_name())?;
    let path = output_path.as_ref().to_path_buf();
    let len = bytes.len();
    write_atomic_async(path.clone(), bytes).await?;
    info!("Wrote {} ({} bytes)", path.display(), len);
    Ok(path)
}

/// [`write_atomic`] on tokio's blocking pool, for use from async code.
pub async fn write_atomic_async(path: PathBuf, bytes: Vec<u8>) -> Result<(), ConvertError> {
    let target = path.clone();
    tokio::task::spawn_blocking(move || write_atomic(&target, &bytes))
        .await
        .map_err(|e| ConvertError::OutputWriteFailed {
            path,
            source: std::io::Error::other(e),
        })?
}

/// Write `bytes` to `path` through a temp file in the same directory.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ConvertError> {
    let fail = |e: std::io::Error| ConvertError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(fail)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(fail)?;
    tmp.write_all(bytes).map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/report.zip");
        write_atomic(&path, b"PK\x03\x04").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"PK\x03\x04");
    }

    #[tokio::test]
    async fn write_atomic_async_writes_from_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/report.zip");
        write_atomic_async(path.clone(), b"PK\x05\x06".to_vec())
            .await
            .unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"PK\x05\x06");
    }

    #[tokio::test]
    async fn write_atomic_async_reports_target_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        // A regular file where a directory is expected.
        let path = blocker.join("report.zip");

        match write_atomic_async(path.clone(), b"PK".to_vec()).await {
            Err(ConvertError::OutputWriteFailed { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected OutputWriteFailed, got {other:?}"),
        }
    }

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.zip");
        std::fs::write(&path, b"old").unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
        // Only the target remains: the temp file was renamed, not copied.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
