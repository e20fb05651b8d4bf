//! Content extraction for classification
//!
//! Most files are classified on their raw bytes. Office documents are zip
//! containers, so for those the canonical inner document is unpacked and
//! classified instead.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

/// Extensions treated as zip-packaged office documents
pub const OFFICE_EXTENSIONS: &[&str] = &["doc", "docx", "xls", "xlsx", "ods", "odt"];

/// Inner entries holding the document body, matched by base name
pub const OFFICE_INNER_DOCUMENTS: &[&str] = &["WordDocument", "content.xml", "document.xml"];

/// Return the bytes to classify for `path`.
///
/// Office documents yield their first canonical inner entry, decompressed
/// up to `limit` bytes. Anything that is not an office document, is not a
/// readable archive, or has no such entry falls back to the file's raw bytes.
pub fn extract(path: &Path, limit: u64) -> Result<Vec<u8>> {
    if is_office_document(path) {
        match read_office_entry(path, limit) {
            Ok(Some(content)) if !content.is_empty() => return Ok(content),
            Ok(_) => {
                tracing::debug!("No inner document in {}, using raw bytes", path.display());
            }
            Err(e) => {
                tracing::debug!("Unable to unzip {}: {:#}", path.display(), e);
            }
        }
    }

    fs::read(path).with_context(|| format!("Unable to read {}", path.display()))
}

/// Whether the path carries one of the office extensions
pub fn is_office_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            OFFICE_EXTENSIONS
                .iter()
                .any(|office| ext.eq_ignore_ascii_case(office))
        })
}

/// Decompress the first entry whose base name is a canonical inner document
fn read_office_entry(path: &Path, limit: u64) -> Result<Option<Vec<u8>>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Not a zip archive: {}", path.display()))?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let base_name = entry.name().rsplit('/').next().unwrap_or_default().to_string();
        if OFFICE_INNER_DOCUMENTS.contains(&base_name.as_str()) {
            let mut content = Vec::new();
            Read::take(&mut entry, limit)
                .read_to_end(&mut content)
                .with_context(|| format!("Failed to decompress {} in {}", base_name, path.display()))?;
            if content.len() as u64 == limit && entry.size() > limit {
                tracing::debug!("Truncated {} in {} to {} bytes", base_name, path.display(), limit);
            }
            return Ok(Some(content));
        }
    }

    Ok(None)
}
