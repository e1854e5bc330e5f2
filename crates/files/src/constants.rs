//! Default intake limits and allow-lists.

/// Largest accepted single file (25 MB).
pub const MAX_FILE_SIZE: u64 = 25 * 1024 * 1024;

/// Maximum number of attachments per report.
pub const MAX_FILES: usize = 20;

/// Largest accepted cumulative attachment size (200 MB).
pub const MAX_TOTAL_SIZE: u64 = 200 * 1024 * 1024;

/// MIME types accepted without looking at the file extension.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/webp",
    "application/pdf",
    "image/heic",
];

/// Extensions accepted when the MIME type is missing or unrecognised.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".webp", ".pdf", ".heic"];

/// Base of the simulated storage URL handed out for uploaded attachments.
pub const UPLOAD_URL_BASE: &str = "https://example.com/uploads";
