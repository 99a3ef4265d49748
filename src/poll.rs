//! Eager polling: wait for the job to finish and return its result.
//!
//! This drains [`MarkerClient::status_stream`] and keeps the last observed
//! status, so a timeout can still tell the caller where the job got stuck.

use crate::client::MarkerClient;
use crate::error::ApiError;
use crate::output::{ConversionResult, JobHandle, JobStatus};
use crate::request::ApiKey;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

impl MarkerClient {
    /// Poll the job until it reaches the terminal status.
    ///
    /// Uses `poll_interval` and `max_polls` from the client's
    /// [`ClientConfig`](crate::config::ClientConfig). Blocks the calling task
    /// for at most `poll_interval * max_polls` plus request latency; run it
    /// off any UI thread and cancel it through `cancel`.
    ///
    /// # Errors
    /// - [`ApiError::Timeout`] after `max_polls` non-terminal responses, with
    ///   the last one attached
    /// - [`ApiError::ConversionFailed`] if the job completed unsuccessfully
    /// - [`ApiError::Cancelled`] if `cancel` fired
    /// - any transport or parsing error from a single check; the flow is
    ///   aborted, not retried
    pub async fn poll(
        &self,
        handle: &JobHandle,
        api_key: &ApiKey,
        cancel: &CancellationToken,
    ) -> Result<ConversionResult, ApiError> {
        let result = self.poll_inner(handle, api_key, cancel).await;
        if let Some(ref cb) = self.config.progress_callback {
            if let Err(ref e) = result {
                cb.on_failed(&e.to_string());
            }
        }
        result
    }

    async fn poll_inner(
        &self,
        handle: &JobHandle,
        api_key: &ApiKey,
        cancel: &CancellationToken,
    ) -> Result<ConversionResult, ApiError> {
        let mut statuses = self.status_stream(handle.clone(), api_key.clone(), cancel.clone());
        let mut attempts = 0u32;
        let mut last: Option<JobStatus> = None;

        while let Some(item) = statuses.next().await {
            let status = item?;
            attempts += 1;

            if status.is_complete() {
                let result = status.into_result()?;
                info!(
                    "Job complete after {} checks: {} chars of Markdown, {} images",
                    attempts,
                    result.markdown.len(),
                    result.images.len()
                );
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_complete(attempts, result.markdown.len(), result.images.len());
                }
                return Ok(result);
            }
            last = Some(status);
        }

        warn!("Job not complete after {} checks, giving up", attempts);
        Err(ApiError::Timeout {
            attempts,
            last_status: last.map(Box::new),
        })
    }
}
