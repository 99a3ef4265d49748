//! Error types for the edgequake-marker library.
//!
//! Two error types reflect the two halves of the workflow:
//!
//! * [`ApiError`]: everything that can go wrong between collecting the
//!   user's inputs and holding a finished [`crate::output::ConversionResult`]:
//!   missing inputs, transport failures, unexpected response bodies, a job that
//!   never completes, or a job the remote service reports as failed.
//!
//! * [`ArchiveError`]: packaging a finished result into a zip bundle failed.
//!   This happens after the network work is done, so the result itself is
//!   still valid and can be retried or exported another way.
//!
//! No variant is ever retried automatically. A failure ends the attempt and
//! the user resubmits.

use crate::output::JobStatus;
use std::path::PathBuf;
use thiserror::Error;

/// All errors produced while submitting and polling a conversion job.
#[derive(Debug, Error)]
pub enum ApiError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// A required input was empty. Reported before any network call.
    #[error("Missing required input: {field}\nPlease provide a PDF file and an API key.")]
    MissingInput { field: &'static str },

    /// A required input is present but unusable (e.g. an API key with
    /// control characters). The value itself is never included.
    #[error("Invalid input: {field} {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// The input file could not be read.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input file exists but does not start with the PDF magic bytes.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Response errors ───────────────────────────────────────────────────
    /// The API answered with a body that is not the JSON we expected.
    ///
    /// `body` holds the raw response text for diagnostics.
    #[error("Error decoding JSON response: {reason}\nRaw response: {body}")]
    MalformedResponse { reason: String, body: String },

    /// The submission response parsed but carried no `request_check_url`.
    #[error("Invalid response from API: no request_check_url{}", detail_suffix(.detail))]
    MissingJobHandle { detail: Option<String> },

    /// The job never reached the terminal status within the attempt budget.
    #[error(
        "Conversion did not complete after {attempts} status checks (last status: {})",
        last_status_label(.last_status)
    )]
    Timeout {
        attempts: u32,
        last_status: Option<Box<JobStatus>>,
    },

    /// The job completed but the service reported it as unsuccessful.
    #[error("Conversion failed: {message}")]
    ConversionFailed { message: String },

    /// Polling was cancelled by the caller.
    #[error("Conversion cancelled after {attempts} status checks")]
    Cancelled { attempts: u32 },

    // ── Transport errors ──────────────────────────────────────────────────
    /// The HTTP request could not be completed.
    #[error("Request to '{url}' failed: {reason}\nCheck your internet connection.")]
    Transport { url: String, reason: String },

    /// A single HTTP request exceeded the per-request timeout.
    #[error("Request to '{url}' timed out after {secs}s\nIncrease --request-timeout.")]
    RequestTimeout { url: String, secs: u64 },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    /// The last status observed before the attempt budget ran out, if any.
    pub fn last_status(&self) -> Option<&JobStatus> {
        match self {
            ApiError::Timeout { last_status, .. } => last_status.as_deref(),
            _ => None,
        }
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(" ({d})"),
        None => String::new(),
    }
}

fn last_status_label(status: &Option<Box<JobStatus>>) -> String {
    status
        .as_ref()
        .and_then(|s| s.status.clone())
        .unwrap_or_else(|| "none".to_string())
}

/// Errors produced while building the zip bundle.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// One image's base64 payload could not be decoded. No archive is produced.
    #[error("Failed to decode image '{filename}': {reason}")]
    ImageDecodeFailed { filename: String, reason: String },

    /// The zip writer failed.
    #[error("Failed to write archive entry '{entry}': {reason}")]
    Write { entry: String, reason: String },
}

/// Errors of the submit → poll → package → write flow.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
