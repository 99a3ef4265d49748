//! Per-session result cache.
//!
//! [`SessionState`] remembers the last successful conversion and the name of
//! the file it came from, so a download action can run long after (and
//! independently of) the submit action that produced it. It is an ordinary
//! owned value: the submit handler borrows it mutably, download and preview
//! handlers borrow it shared. Nothing is shared between sessions and nothing
//! is persisted.

use crate::archive::{archive_file_name, package};
use crate::error::ArchiveError;
use crate::output::ConversionResult;

/// A packaged bundle ready to be handed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Suggested file name (`report.pdf` → `report.zip`).
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// The state one interactive session keeps between actions.
#[derive(Debug, Default)]
pub struct SessionState {
    result: Option<ConversionResult>,
    file_name: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached result with a new successful conversion.
    pub fn store(
        &mut self,
        result: ConversionResult,
        file_name: impl Into<String>,
    ) -> &ConversionResult {
        self.file_name = Some(file_name.into());
        self.result.insert(result)
    }

    pub fn current_result(&self) -> Option<&ConversionResult> {
        self.result.as_ref()
    }

    pub fn current_file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }

    /// Package the cached result as a zip bundle.
    ///
    /// `None` until a conversion has succeeded in this session.
    pub fn download(&self) -> Option<Result<Download, ArchiveError>> {
        let result = self.result.as_ref()?;
        let file_name = self.file_name.as_deref()?;
        Some(package(result, file_name).map(|bytes| Download {
            file_name: archive_file_name(file_name),
            bytes,
        }))
    }
}
