//! HTTP client for the remote conversion API.
//!
//! [`MarkerClient`] performs the two raw interactions the API offers:
//!
//! * [`MarkerClient::submit`]: multipart upload of the PDF, returning a
//!   [`JobHandle`];
//! * [`MarkerClient::check`]: one authenticated GET of the status-check URL.
//!
//! The polling loop built on top of `check` lives in [`crate::poll`] and
//! [`crate::stream`]. Nothing here retries: every failure is returned to the
//! caller as an [`ApiError`].

use crate::config::{ClientConfig, API_KEY_HEADER};
use crate::error::ApiError;
use crate::output::{JobHandle, JobStatus, SubmitResponse};
use crate::request::{ApiKey, ConversionRequest};
use reqwest::header::HeaderValue;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Client for the Datalab marker API.
///
/// Cheap to clone: the underlying `reqwest::Client` shares its connection
/// pool between clones.
#[derive(Debug, Clone)]
pub struct MarkerClient {
    pub(crate) http: reqwest::Client,
    pub(crate) config: ClientConfig,
}

impl MarkerClient {
    /// Build a client whose requests all carry the configured timeout.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// Use a pre-built `reqwest::Client` (custom proxy, TLS roots, …).
    ///
    /// The per-request timeout is then whatever that client was built with.
    pub fn with_http_client(config: ClientConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Upload the PDF and return the handle of the new job.
    ///
    /// # Errors
    /// - [`ApiError::MissingInput`] before any network call if the file or key is empty
    /// - [`ApiError::MalformedResponse`] if the body is not JSON (raw text included)
    /// - [`ApiError::MissingJobHandle`] if the body has no `request_check_url`
    /// - [`ApiError::Transport`] / [`ApiError::RequestTimeout`] on network failure
    pub async fn submit(&self, request: &ConversionRequest) -> Result<JobHandle, ApiError> {
        let result = self.submit_inner(request).await;
        if let Some(ref cb) = self.config.progress_callback {
            match &result {
                Ok(handle) => cb.on_submitted(request.file_name(), &handle.check_url),
                Err(e) => cb.on_failed(&e.to_string()),
            }
        }
        result
    }

    async fn submit_inner(&self, request: &ConversionRequest) -> Result<JobHandle, ApiError> {
        request.validate()?;
        let url = self.config.api_url.as_str();

        info!(
            "Submitting '{}' ({} bytes, langs={:?}, force_ocr={}, paginate={})",
            request.file_name(),
            request.file_bytes().len(),
            request.langs_field(),
            request.is_force_ocr(),
            request.is_paginate()
        );

        let file_part = Part::bytes(request.file_bytes().to_vec())
            .file_name(request.file_name().to_string())
            .mime_str("application/pdf")
            .map_err(|e| self.request_error(url, e))?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("force_ocr", request.is_force_ocr().to_string())
            .text("paginate", request.is_paginate().to_string());
        if let Some(langs) = request.langs_field() {
            form = form.text("langs", langs);
        }

        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, auth_header(request.api_key())?)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.request_error(url, e))?;

        let body = self.read_body(url, response).await?;
        let handle = parse_json::<SubmitResponse>(&body)?.into_handle()?;
        info!("Job accepted, check URL: {}", handle.check_url);
        Ok(handle)
    }

    /// Fetch the current status of a job once.
    ///
    /// A body without a `status` field is reported as
    /// [`ApiError::MalformedResponse`].
    pub async fn check(&self, handle: &JobHandle, api_key: &ApiKey) -> Result<JobStatus, ApiError> {
        let url = handle.check_url.as_str();
        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, auth_header(api_key)?)
            .send()
            .await
            .map_err(|e| self.request_error(url, e))?;

        let body = self.read_body(url, response).await?;
        let status: JobStatus = parse_json(&body)?;
        if status.status.is_none() {
            return Err(ApiError::MalformedResponse {
                reason: "status response without a `status` field".to_string(),
                body,
            });
        }
        Ok(status)
    }

    async fn read_body(&self, url: &str, response: reqwest::Response) -> Result<String, ApiError> {
        let http_status = response.status();
        if !http_status.is_success() {
            warn!("{} answered HTTP {}", url, http_status);
        }
        let body = response
            .text()
            .await
            .map_err(|e| self.request_error(url, e))?;
        debug!("{} → HTTP {} ({} bytes)", url, http_status, body.len());
        Ok(body)
    }

    fn request_error(&self, url: &str, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::RequestTimeout {
                url: url.to_string(),
                secs: self.config.request_timeout_secs,
            }
        } else {
            ApiError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

/// Build the auth header value, marked sensitive so it never shows in debug output.
fn auth_header(key: &ApiKey) -> Result<HeaderValue, ApiError> {
    let mut value = HeaderValue::from_str(key.expose()).map_err(|_| ApiError::InvalidInput {
        field: "api_key",
        reason: "contains characters not allowed in an HTTP header".into(),
    })?;
    value.set_sensitive(true);
    Ok(value)
}

fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::MalformedResponse {
        reason: e.to_string(),
        body: body.to_string(),
    })
}
