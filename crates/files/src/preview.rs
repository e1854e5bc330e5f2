//! Attachment previews.

use base64::Engine;

/// What the form shows for an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// Image preview still being generated.
    Pending,
    /// Inline image as a `data:` URL.
    Image(String),
    /// Static document icon for non-image files.
    Icon,
}

impl Preview {
    /// Images start pending and are resolved later; everything else gets the icon.
    pub fn initial_for(mime: &str) -> Self {
        if mime.starts_with("image/") {
            Preview::Pending
        } else {
            Preview::Icon
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Preview::Pending)
    }
}

/// Encodes content as a base64 `data:` URL.
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}
