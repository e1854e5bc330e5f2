//! Files offered to the intake, before validation.

use crate::FilesError;
use std::fs;
use std::path::Path;

/// A file handle as offered by a selection, a drop or a paste.
///
/// `size` is tracked separately from `bytes` so that callers can describe a file by its
/// metadata alone (for example when only a listing is available).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    pub name: String,
    pub mime: String,
    pub size: u64,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    /// Creates a file from in-memory content.
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            size: bytes.len() as u64,
            bytes,
        }
    }

    /// Creates a file known only by its metadata. Its preview falls back to the icon.
    pub fn metadata_only(name: impl Into<String>, mime: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            size,
            bytes: Vec::new(),
        }
    }

    /// Reads a file from disk and detects its media type.
    ///
    /// Detection sniffs the content first and falls back to the extension. An unknown type
    /// is left empty so the intake decides on the extension alone.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if the path has no file name or cannot be read.
    pub fn from_path(path: &Path) -> Result<Self, FilesError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| FilesError::InvalidPath(path.display().to_string()))?
            .to_string();

        let bytes = fs::read(path).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read source file {}: {}", path.display(), e),
            ))
        })?;

        let mime = infer::get(&bytes)
            .map(|kind| kind.mime_type().to_string())
            .or_else(|| mime_for_extension(&name).map(str::to_string))
            .unwrap_or_default();

        Ok(Self::new(name, mime, bytes))
    }

    /// Lower-cased extension including the leading dot.
    ///
    /// A name without a dot yields the whole name, so `"scan"` becomes `".scan"` and is
    /// rejected by the allow-list.
    pub fn extension(&self) -> String {
        let last = self.name.rsplit('.').next().unwrap_or_default();
        format!(".{}", last.to_lowercase())
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// One entry of a clipboard paste. Only `File` entries reach the intake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardItem {
    File(IncomingFile),
    Text(String),
}

impl ClipboardItem {
    /// Keeps the file items of a paste, in order.
    pub fn files(items: Vec<ClipboardItem>) -> Vec<IncomingFile> {
        items
            .into_iter()
            .filter_map(|item| match item {
                ClipboardItem::File(file) => Some(file),
                ClipboardItem::Text(_) => None,
            })
            .collect()
    }
}

fn mime_for_extension(name: &str) -> Option<&'static str> {
    let ext = name.rsplit('.').next()?.to_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}
