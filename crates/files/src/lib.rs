//! Veritas File Intake
//!
//! This crate owns the attachments a user adds to a scam report before submission.
//!
//! ## Design Principles
//!
//! - Files are validated as a batch: one bad file rejects the whole batch
//! - Limits (count, per-file size, cumulative size, allowed types) are data, not code
//! - Binary content never leaves the intake except as a preview `data:` URL
//! - Only metadata (id, name, size, MIME type) is ever persisted in drafts
//!
//! ## Intake Model
//!
//! ```text
//! IncomingFile (select / drop / paste)
//!     └── FileIntake::add(batch)
//!             ├── count limit        (whole batch)
//!             ├── type / size / name (per file)
//!             ├── cumulative size    (whole batch)
//!             └── UploadedFile { id, preview: Pending | Icon, progress: 0 }
//! ```
//!
//! ## Example Usage
//!
//! ```
//! use veritas_files::{FileIntake, IncomingFile, IntakeLimits};
//!
//! let mut intake = FileIntake::new(IntakeLimits::default());
//! let ids = intake
//!     .add(vec![IncomingFile::new("lease.pdf", "application/pdf", b"%PDF-1.7".to_vec())])
//!     .unwrap();
//! assert_eq!(ids.len(), 1);
//! assert_eq!(intake.len(), 1);
//! ```

mod constants;
mod incoming;
mod intake;
mod preview;
mod size;

pub use constants::{
    ALLOWED_EXTENSIONS, ALLOWED_MIME_TYPES, MAX_FILES, MAX_FILE_SIZE, MAX_TOTAL_SIZE,
    UPLOAD_URL_BASE,
};
pub use incoming::{ClipboardItem, IncomingFile};
pub use intake::{
    generate_file_id, FileIntake, IntakeError, IntakeLimits, IntakeRejection, UploadedFile,
};
pub use preview::{data_url, Preview};
pub use size::format_file_size;

/// Errors that can occur while reading files into the intake
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Path has no usable file name component
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
