//! # edgequake-marker
//!
//! Convert PDF documents to Markdown through the Datalab marker API.
//!
//! The remote service does the actual conversion. This crate handles the
//! client side: uploading the PDF, polling the asynchronous job, and bundling
//! the resulting Markdown and extracted images into a zip archive.
//!
//! ## Workflow
//!
//! ```text
//! ConversionRequest
//!  │
//!  ├─ 1. Submit   multipart POST with X-Api-Key → JobHandle (check URL)
//!  ├─ 2. Poll     GET check URL every 2 s, ≤ 300 times, cancellable
//!  ├─ 3. Store    ConversionResult cached in the caller's SessionState
//!  └─ 4. Package  <name>.md + images → deterministic zip bundle
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_marker::{
//!     convert, ApiKey, CancellationToken, ClientConfig, ConversionRequest, MarkerClient,
//!     SessionState,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MarkerClient::new(ClientConfig::default())?;
//!     let key = ApiKey::new(std::env::var("DATALAB_API_KEY")?);
//!     let request = ConversionRequest::from_path("report.pdf", key)
//!         .await?
//!         .languages_csv("English")
//!         .force_ocr(true);
//!
//!     let mut session = SessionState::new();
//!     let result = convert(&client, &request, &mut session, &CancellationToken::new()).await?;
//!     println!("{}", result.markdown);
//!
//!     if let Some(download) = session.download() {
//!         let download = download?;
//!         std::fs::write(&download.file_name, &download.bytes)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `marker2md` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod archive;
pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod poll;
pub mod progress;
pub mod request;
pub mod session;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use archive::{archive_file_name, markdown_file_name, package};
pub use client::MarkerClient;
pub use config::{ClientConfig, ClientConfigBuilder, API_KEY_HEADER, DEFAULT_API_URL};
pub use convert::{convert, convert_to_file, write_atomic, write_atomic_async};
pub use error::{ApiError, ArchiveError, ConvertError};
pub use output::{ConversionResult, JobHandle, JobStatus, SubmitResponse, STATUS_COMPLETE};
pub use progress::{NoopProgressCallback, PollProgressCallback, ProgressCallback};
pub use request::{ApiKey, ConversionRequest};
pub use session::{Download, SessionState};
pub use stream::StatusStream;
pub use tokio_util::sync::CancellationToken;
