//! Data types exchanged with the remote conversion API.
//!
//! The wire types ([`SubmitResponse`], [`JobStatus`]) mirror the JSON bodies
//! and make every field optional: the API is an external collaborator and
//! nothing guarantees a field is present. Validation happens once, when a
//! terminal [`JobStatus`] is turned into a [`ConversionResult`].

use crate::error::{ApiError, ArchiveError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use indexmap::IndexMap;

/// The status value marking a finished job.
pub const STATUS_COMPLETE: &str = "complete";

/// Reference to an in-progress conversion: the status-check URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub check_url: String,
}

/// Body returned by the submission endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitResponse {
    pub request_check_url: Option<String>,
    pub request_id: Option<String>,
    pub success: Option<bool>,
    pub error: Option<String>,
    /// Error payload of rejected requests (e.g. a bad API key).
    pub detail: Option<serde_json::Value>,
}

impl SubmitResponse {
    /// Extract the job handle, or report why there is none.
    pub fn into_handle(self) -> Result<JobHandle, ApiError> {
        match self.request_check_url {
            Some(url) if !url.trim().is_empty() => Ok(JobHandle { check_url: url }),
            _ => Err(ApiError::MissingJobHandle {
                detail: self.error.or_else(|| {
                    self.detail.map(|d| match d {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    })
                }),
            }),
        }
    }
}

/// One parsed status-check response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub status: Option<String>,
    pub success: Option<bool>,
    pub markdown: Option<String>,
    pub images: Option<IndexMap<String, String>>,
    pub error: Option<String>,
    pub page_count: Option<u32>,
}

impl JobStatus {
    /// `true` once the job reports `"complete"` (exact match).
    pub fn is_complete(&self) -> bool {
        self.status.as_deref() == Some(STATUS_COMPLETE)
    }

    /// Turn a terminal status into the final result.
    ///
    /// A job that completed without `success: true` becomes
    /// [`ApiError::ConversionFailed`]; a successful job without Markdown is a
    /// malformed response.
    pub fn into_result(self) -> Result<ConversionResult, ApiError> {
        if self.success != Some(true) {
            return Err(ApiError::ConversionFailed {
                message: self.error.unwrap_or_else(|| "Unknown error".to_string()),
            });
        }

        let markdown = self.markdown.ok_or_else(|| ApiError::MalformedResponse {
            reason: "successful job without a `markdown` field".to_string(),
            body: String::new(),
        })?;

        Ok(ConversionResult {
            markdown,
            images: self.images.unwrap_or_default(),
            page_count: self.page_count,
        })
    }
}

/// A successfully converted document.
///
/// Images are kept exactly as the API sent them (base64, in the API's key
/// order) and decoded on demand, so a single bad image only fails the step
/// that needs its bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub markdown: String,
    pub images: IndexMap<String, String>,
    pub page_count: Option<u32>,
}

impl ConversionResult {
    /// Decode every image, in the map's order.
    pub fn decoded_images(&self) -> Result<Vec<(&str, Vec<u8>)>, ArchiveError> {
        self.images
            .iter()
            .map(|(name, b64)| Ok((name.as_str(), decode_image(name, b64)?)))
            .collect()
    }
}

/// Decode one base64 image payload. Line breaks and other ASCII whitespace
/// (MIME-style wrapping) are ignored.
pub(crate) fn decode_image(filename: &str, b64: &str) -> Result<Vec<u8>, ArchiveError> {
    let compact: String = b64.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| ArchiveError::ImageDecodeFailed {
            filename: filename.to_string(),
            reason: e.to_string(),
        })
}
