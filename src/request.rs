//! The user's conversion inputs.
//!
//! A [`ConversionRequest`] bundles the PDF bytes with the options collected
//! from the user. It is immutable once built: the client only borrows it.
//! The API key is wrapped in [`ApiKey`] so it cannot leak through `Debug`
//! output or tracing fields.

use crate::error::ApiError;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// A secret API key. Formatting never reveals the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for building the auth header only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// One PDF plus the options it should be converted with.
#[derive(Clone)]
pub struct ConversionRequest {
    file_bytes: Vec<u8>,
    file_name: String,
    api_key: ApiKey,
    languages: Vec<String>,
    force_ocr: bool,
    paginate: bool,
}

impl fmt::Debug for ConversionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionRequest")
            .field("file_name", &self.file_name)
            .field("file_len", &self.file_bytes.len())
            .field("api_key", &self.api_key)
            .field("languages", &self.languages)
            .field("force_ocr", &self.force_ocr)
            .field("paginate", &self.paginate)
            .finish()
    }
}

impl ConversionRequest {
    pub fn new(file_bytes: Vec<u8>, file_name: impl Into<String>, api_key: ApiKey) -> Self {
        Self {
            file_bytes,
            file_name: file_name.into(),
            api_key,
            languages: Vec::new(),
            force_ocr: false,
            paginate: false,
        }
    }

    /// Read a local PDF, checking it exists and starts with `%PDF`.
    pub async fn from_path(path: impl AsRef<Path>, api_key: ApiKey) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| ApiError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        if !bytes.starts_with(b"%PDF") {
            // Shorter files are zero-padded.
            let mut magic = [0u8; 4];
            let n = bytes.len().min(4);
            magic[..n].copy_from_slice(&bytes[..n]);
            return Err(ApiError::NotAPdf {
                path: path.to_path_buf(),
                magic,
            });
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "uploaded_file.pdf".to_string());
        debug!("Read {} ({} bytes)", file_name, bytes.len());

        Ok(Self::new(bytes, file_name, api_key))
    }

    /// Set the OCR languages. Blank entries are dropped.
    pub fn languages<I, S>(mut self, langs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = langs
            .into_iter()
            .map(|l| {
                let l: String = l.into();
                l.trim().to_string()
            })
            .filter(|l| !l.is_empty())
            .collect();
        self
    }

    /// Parse a user-typed comma-separated language list (`"English, German"`).
    pub fn languages_csv(self, csv: &str) -> Self {
        self.languages(csv.split(','))
    }

    pub fn force_ocr(mut self, v: bool) -> Self {
        self.force_ocr = v;
        self
    }

    pub fn paginate(mut self, v: bool) -> Self {
        self.paginate = v;
        self
    }

    pub fn file_bytes(&self) -> &[u8] {
        &self.file_bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn is_force_ocr(&self) -> bool {
        self.force_ocr
    }

    pub fn is_paginate(&self) -> bool {
        self.paginate
    }

    /// The `langs` form field: comma-joined, or `None` when no language is set.
    pub fn langs_field(&self) -> Option<String> {
        if self.languages.is_empty() {
            None
        } else {
            Some(self.languages.join(","))
        }
    }

    /// Check the inputs that must be present before anything is sent.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.file_bytes.is_empty() {
            return Err(ApiError::MissingInput { field: "file" });
        }
        if self.api_key.is_empty() {
            return Err(ApiError::MissingInput { field: "api_key" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn pdf() -> Vec<u8> {
        b"%PDF-1.4\n%fake".to_vec()
    }

    #[test]
    fn api_key_is_redacted() {
        let key = ApiKey::new("sk-secret-123");
        assert!(!format!("{key:?}").contains("secret"));
        assert!(!format!("{key}").contains("secret"));
        assert_eq!(key.expose(), "sk-secret-123");

        let req = ConversionRequest::new(pdf(), "a.pdf", key);
        assert!(!format!("{req:?}").contains("secret"));
    }

    #[test]
    fn langs_field_joins_and_trims() {
        let req = ConversionRequest::new(pdf(), "a.pdf", ApiKey::new("k"))
            .languages_csv(" English, German ,, ");
        assert_eq!(req.langs_field().as_deref(), Some("English,German"));
    }

    #[test]
    fn langs_field_absent_when_empty() {
        let req = ConversionRequest::new(pdf(), "a.pdf", ApiKey::new("k")).languages_csv("");
        assert_eq!(req.langs_field(), None);
    }

    #[test]
    fn validate_reports_missing_inputs() {
        let no_file = ConversionRequest::new(Vec::new(), "a.pdf", ApiKey::new("k"));
        assert!(matches!(
            no_file.validate(),
            Err(ApiError::MissingInput { field: "file" })
        ));

        let no_key = ConversionRequest::new(pdf(), "a.pdf", ApiKey::new("  "));
        assert!(matches!(
            no_key.validate(),
            Err(ApiError::MissingInput { field: "api_key" })
        ));

        let ok = ConversionRequest::new(pdf(), "a.pdf", ApiKey::new("k"))
            .force_ocr(true)
            .paginate(true);
        assert!(ok.validate().is_ok());
        assert!(ok.is_force_ocr() && ok.is_paginate());
    }

    #[tokio::test]
    async fn from_path_reads_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::File::create(&path).unwrap().write_all(&pdf()).unwrap();

        let req =
            tokio_test::assert_ok!(ConversionRequest::from_path(&path, ApiKey::new("k")).await);
        assert_eq!(req.file_name(), "report.pdf");
        assert_eq!(req.file_bytes(), pdf().as_slice());
    }

    #[tokio::test]
    async fn from_path_rejects_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"hello world").unwrap();

        let err = ConversionRequest::from_path(&path, ApiKey::new("k"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotAPdf { magic, .. } if &magic == b"hell"));
    }

    #[tokio::test]
    async fn from_path_rejects_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.pdf");
        std::fs::write(&path, b"%P").unwrap();

        let err = ConversionRequest::from_path(&path, ApiKey::new("k"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotAPdf { magic, .. } if magic == *b"%P\0\0"));
    }

    #[tokio::test]
    async fn from_path_missing_file() {
        let err = ConversionRequest::from_path("/definitely/not/here.pdf", ApiKey::new("k"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Io { .. }));
    }
}
