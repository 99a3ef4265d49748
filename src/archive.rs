//! Zip packaging of a finished conversion.
//!
//! The bundle holds the Markdown first, then every image under its original
//! filename. Entry timestamps and compression settings are fixed so the same
//! result always packages to the same bytes.

use crate::error::ArchiveError;
use crate::output::ConversionResult;
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Package `result` into an in-memory zip archive.
///
/// `base_file_name` is the name of the original upload; the Markdown entry is
/// named after it (`report.pdf` → `report.md`). Image keys are used verbatim
/// as entry names, in the order the API returned them.
///
/// Every image is decoded before anything is written: a single bad image
/// fails the call with [`ArchiveError::ImageDecodeFailed`] and no archive is
/// returned.
pub fn package(result: &ConversionResult, base_file_name: &str) -> Result<Vec<u8>, ArchiveError> {
    let images = result.decoded_images()?;
    let md_name = markdown_file_name(base_file_name);

    let mut buf = Vec::new();
    let mut zip = ZipWriter::new(Cursor::new(&mut buf));

    write_entry(&mut zip, &md_name, result.markdown.as_bytes())?;
    for (name, bytes) in &images {
        write_entry(&mut zip, name, bytes)?;
    }

    zip.finish().map_err(|e| ArchiveError::Write {
        entry: "<central directory>".to_string(),
        reason: e.to_string(),
    })?;

    debug!(
        "Packaged {} + {} images → {} bytes",
        md_name,
        images.len(),
        buf.len()
    );
    Ok(buf)
}

/// `report.pdf` → `report.md`. Directory components are dropped.
pub fn markdown_file_name(file_name: &str) -> String {
    format!("{}.md", file_stem(file_name))
}

/// `report.pdf` → `report.zip`. Directory components are dropped.
pub fn archive_file_name(file_name: &str) -> String {
    format!("{}.zip", file_stem(file_name))
}

fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string())
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644)
}

fn write_entry<W: Write + std::io::Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    data: &[u8],
) -> Result<(), ArchiveError> {
    let err = |reason: String| ArchiveError::Write {
        entry: name.to_string(),
        reason,
    };
    zip.start_file(name, entry_options()).map_err(|e| err(e.to_string()))?;
    zip.write_all(data).map_err(|e| err(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use indexmap::IndexMap;
    use std::io::Read;
    use zip::ZipArchive;

    fn result_with(images: Vec<(&str, Vec<u8>)>) -> ConversionResult {
        let images: IndexMap<String, String> = images
            .into_iter()
            .map(|(n, b)| (n.to_string(), STANDARD.encode(b)))
            .collect();
        ConversionResult {
            markdown: "# Title\n\nSome text with ünïcödé.\n".to_string(),
            images,
            page_count: Some(1),
        }
    }

    fn entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut f = archive.by_index(i).unwrap();
                let mut data = Vec::new();
                f.read_to_end(&mut data).unwrap();
                (f.name().to_string(), data)
            })
            .collect()
    }

    #[test]
    fn names_follow_original_file() {
        assert_eq!(markdown_file_name("report.pdf"), "report.md");
        assert_eq!(archive_file_name("report.pdf"), "report.zip");
        assert_eq!(markdown_file_name("/tmp/in/scan.2024.pdf"), "scan.2024.md");
        assert_eq!(markdown_file_name("noext"), "noext.md");
        assert_eq!(archive_file_name(""), "document.zip");
    }

    #[test]
    fn markdown_first_then_images_in_api_order() {
        let result = result_with(vec![("b.png", vec![2, 2]), ("a.jpeg", vec![1])]);
        let bytes = package(&result, "paper.pdf").unwrap();
        let got = entries(&bytes);

        let names: Vec<&str> = got.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["paper.md", "b.png", "a.jpeg"]);
        assert_eq!(got[0].1, result.markdown.as_bytes());
        assert_eq!(got[1].1, vec![2u8, 2]);
        assert_eq!(got[2].1, vec![1u8]);
    }

    #[test]
    fn packaging_is_deterministic() {
        let result = result_with(vec![("img1.png", vec![0, 1, 2]), ("img2.png", vec![9; 64])]);
        let a = package(&result, "report.pdf").unwrap();
        let b = package(&result, "report.pdf").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_images_yield_markdown_only() {
        let result = result_with(Vec::new());
        let got = entries(&package(&result, "report.pdf").unwrap());
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].0, "report.md");
    }

    #[test]
    fn bad_image_fails_whole_archive() {
        let mut result = result_with(vec![("ok.png", vec![1, 2, 3])]);
        result
            .images
            .insert("broken.png".to_string(), "%%%".to_string());

        match package(&result, "report.pdf") {
            Err(ArchiveError::ImageDecodeFailed { filename, .. }) => {
                assert_eq!(filename, "broken.png")
            }
            other => panic!("expected ImageDecodeFailed, got {other:?}"),
        }
    }

    #[test]
    fn image_named_like_markdown_is_rejected() {
        let result = result_with(vec![("report.md", vec![1])]);
        assert!(matches!(
            package(&result, "report.pdf"),
            Err(ArchiveError::Write { .. })
        ));
    }
}
