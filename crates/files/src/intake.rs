//! Batch validation and bookkeeping of attached files.
//!
//! [`FileIntake`] holds the accepted attachments of one form session. Every add is
//! evaluated as a batch against the configured [`IntakeLimits`]; a batch with any
//! rejection leaves the intake untouched.

use crate::constants::{
    ALLOWED_EXTENSIONS, ALLOWED_MIME_TYPES, MAX_FILES, MAX_FILE_SIZE, MAX_TOTAL_SIZE,
};
use crate::{data_url, format_file_size, IncomingFile, Preview};
use chrono::Utc;
use serde::Deserialize;

/// Limits applied to every batch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IntakeLimits {
    pub max_files: usize,
    pub max_file_size: u64,
    pub max_total_size: u64,
    pub allowed_mime_types: Vec<String>,
    pub allowed_extensions: Vec<String>,
}

impl Default for IntakeLimits {
    fn default() -> Self {
        Self {
            max_files: MAX_FILES,
            max_file_size: MAX_FILE_SIZE,
            max_total_size: MAX_TOTAL_SIZE,
            allowed_mime_types: ALLOWED_MIME_TYPES.iter().map(|s| s.to_string()).collect(),
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// An accepted attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub id: String,
    pub file: IncomingFile,
    pub name: String,
    pub size: u64,
    pub mime: String,
    pub preview: Preview,
    pub uploaded: bool,
    /// Simulated upload progress in percent.
    pub progress: u8,
}

/// Why a file or a batch was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeRejection {
    #[error("Maximum {max} files allowed. You can upload {remaining} more files.")]
    TooManyFiles { max: usize, remaining: usize },
    #[error("{name}: File type not supported. Allowed types: {}", .allowed.join(", "))]
    UnsupportedType { name: String, allowed: Vec<String> },
    #[error("{name}: File size exceeds {} limit", size_label(.max))]
    TooLarge { name: String, max: u64 },
    #[error("{name}: File with this name already exists")]
    Duplicate { name: String },
    #[error("Total file size cannot exceed {}.", size_label(.max))]
    TotalSizeExceeded { max: u64 },
}

fn size_label(bytes: &u64) -> String {
    format_file_size(*bytes)
}

/// A refused batch with every reason found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", joined(.rejections))]
pub struct IntakeError {
    pub rejections: Vec<IntakeRejection>,
}

fn joined(rejections: &[IntakeRejection]) -> String {
    rejections
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

impl IntakeError {
    /// The aggregated message shown under the upload zone.
    pub fn message(&self) -> String {
        joined(&self.rejections)
    }
}

/// Accepted attachments of one form session.
#[derive(Debug, Clone, Default)]
pub struct FileIntake {
    limits: IntakeLimits,
    files: Vec<UploadedFile>,
}

impl FileIntake {
    pub fn new(limits: IntakeLimits) -> Self {
        Self {
            limits,
            files: Vec::new(),
        }
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut [UploadedFile] {
        &mut self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Validates and adds a batch.
    ///
    /// Checks, in order: the count limit (rejects immediately), each file's type, size
    /// and name, then the cumulative size of the accepted files. Any rejection refuses
    /// the whole batch.
    ///
    /// # Returns
    ///
    /// The ids of the added files, in batch order.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError` listing every rejection when the batch is refused.
    pub fn add(&mut self, batch: Vec<IncomingFile>) -> Result<Vec<String>, IntakeError> {
        if self.files.len() + batch.len() > self.limits.max_files {
            let remaining = self.limits.max_files.saturating_sub(self.files.len());
            return Err(IntakeError {
                rejections: vec![IntakeRejection::TooManyFiles {
                    max: self.limits.max_files,
                    remaining,
                }],
            });
        }

        let mut rejections = Vec::new();
        let mut accepted: Vec<IncomingFile> = Vec::new();
        for file in batch {
            match self.check_file(&file, &accepted) {
                Some(rejection) => rejections.push(rejection),
                None => accepted.push(file),
            }
        }

        let new_size: u64 = accepted.iter().map(|f| f.size).sum();
        if self.total_size() + new_size > self.limits.max_total_size {
            rejections.push(IntakeRejection::TotalSizeExceeded {
                max: self.limits.max_total_size,
            });
        }

        if !rejections.is_empty() {
            tracing::warn!("file batch rejected: {} problem(s)", rejections.len());
            return Err(IntakeError { rejections });
        }

        let ids = accepted
            .into_iter()
            .map(|file| {
                let id = generate_file_id();
                self.files.push(UploadedFile {
                    id: id.clone(),
                    name: file.name.clone(),
                    size: file.size,
                    mime: file.mime.clone(),
                    preview: Preview::initial_for(&file.mime),
                    uploaded: false,
                    progress: 0,
                    file,
                });
                id
            })
            .collect();

        Ok(ids)
    }

    fn check_file(&self, file: &IncomingFile, accepted: &[IncomingFile]) -> Option<IntakeRejection> {
        let mime_ok = self.limits.allowed_mime_types.iter().any(|m| *m == file.mime);
        if !mime_ok && !self.limits.allowed_extensions.contains(&file.extension()) {
            return Some(IntakeRejection::UnsupportedType {
                name: file.name.clone(),
                allowed: self.limits.allowed_extensions.clone(),
            });
        }

        if file.size > self.limits.max_file_size {
            return Some(IntakeRejection::TooLarge {
                name: file.name.clone(),
                max: self.limits.max_file_size,
            });
        }

        let duplicate = self.files.iter().any(|f| f.name == file.name)
            || accepted.iter().any(|f| f.name == file.name);
        if duplicate {
            return Some(IntakeRejection::Duplicate {
                name: file.name.clone(),
            });
        }

        None
    }

    /// Removes an attachment by id.
    pub fn remove(&mut self, id: &str) -> Option<UploadedFile> {
        let index = self.files.iter().position(|f| f.id == id)?;
        Some(self.files.remove(index))
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Ids of attachments whose image preview has not been generated yet.
    pub fn pending_previews(&self) -> Vec<String> {
        self.files
            .iter()
            .filter(|f| f.preview.is_pending())
            .map(|f| f.id.clone())
            .collect()
    }

    /// Generates the preview for one attachment.
    ///
    /// Images with content become a `data:` URL; an image known only by metadata falls
    /// back to the icon. Returns `false` when the id is unknown (for example removed
    /// while its preview was being produced).
    pub fn resolve_preview(&mut self, id: &str) -> bool {
        let Some(file) = self.files.iter_mut().find(|f| f.id == id) else {
            return false;
        };
        file.preview = if file.file.is_image() && !file.file.bytes.is_empty() {
            Preview::Image(data_url(&file.mime, &file.file.bytes))
        } else {
            Preview::Icon
        };
        true
    }
}

/// Generates an attachment id: `file_<millis>_<9 random hex chars>`.
pub fn generate_file_id() -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("file_{}_{}", Utc::now().timestamp_millis(), &random[..9])
}
