//! Streaming status API: emit every status check as it returns.
//!
//! [`MarkerClient::status_stream`] exposes the polling loop as a `Stream`
//! so callers can render live progress or log every intermediate status.
//! [`MarkerClient::poll`](crate::client::MarkerClient::poll) is the eager
//! counterpart built on top of it.
//!
//! The stream ends after the first `"complete"` status, after
//! `max_polls` checks, after the first error, or when the cancellation token
//! fires. Attempts are strictly sequential: each one waits `poll_interval`
//! before issuing its request.

use crate::client::MarkerClient;
use crate::error::ApiError;
use crate::output::{JobHandle, JobStatus};
use crate::request::ApiKey;
use futures::stream;
use std::pin::Pin;
use tokio::time::sleep;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A boxed stream of status-check results.
pub type StatusStream<'a> = Pin<Box<dyn Stream<Item = Result<JobStatus, ApiError>> + Send + 'a>>;

struct PollState<'a> {
    client: &'a MarkerClient,
    handle: JobHandle,
    api_key: ApiKey,
    cancel: CancellationToken,
    attempt: u32,
    done: bool,
}

impl MarkerClient {
    /// Poll `handle` until it completes, yielding every observed status.
    ///
    /// On cancellation the stream yields one [`ApiError::Cancelled`] and ends;
    /// an in-flight request is dropped and no further request is issued.
    pub fn status_stream(
        &self,
        handle: JobHandle,
        api_key: ApiKey,
        cancel: CancellationToken,
    ) -> StatusStream<'_> {
        let state = PollState {
            client: self,
            handle,
            api_key,
            cancel,
            attempt: 0,
            done: false,
        };

        Box::pin(stream::unfold(state, |mut st| async move {
            let max_polls = st.client.config.max_polls;
            if st.done || st.attempt >= max_polls {
                return None;
            }

            let interval = st.client.config.poll_interval;
            let outcome = tokio::select! {
                biased;
                _ = st.cancel.cancelled() => None,
                res = async {
                    sleep(interval).await;
                    st.client.check(&st.handle, &st.api_key).await
                } => Some(res),
            };

            match outcome {
                None => {
                    debug!("Polling cancelled after {} checks", st.attempt);
                    st.done = true;
                    let attempts = st.attempt;
                    Some((Err(ApiError::Cancelled { attempts }), st))
                }
                Some(Ok(status)) => {
                    st.attempt += 1;
                    debug!(
                        "Status check {}/{}: {}",
                        st.attempt,
                        max_polls,
                        status.status.as_deref().unwrap_or("?")
                    );
                    if let Some(ref cb) = st.client.config.progress_callback {
                        cb.on_attempt(st.attempt, max_polls, &status);
                    }
                    st.done = status.is_complete();
                    Some((Ok(status), st))
                }
                Some(Err(e)) => {
                    st.attempt += 1;
                    st.done = true;
                    Some((Err(e), st))
                }
            }
        }))
    }
}
