//! Simulated attachment upload.

use super::submission::Attachment;
use std::time::Duration;
use veritas_files::{UploadedFile, UPLOAD_URL_BASE};

/// Progress increments of one upload, in percent.
const PROGRESS_STEP: usize = 10;

/// Uploads each file in turn.
///
/// Progress climbs from 0 to 100 in steps of ten with `step` between updates;
/// `on_progress` sees the file after every update. Files end up marked uploaded and each
/// yields an [`Attachment`] pointing at its simulated storage URL.
pub async fn upload_files<F>(files: &mut [UploadedFile], step: Duration, mut on_progress: F) -> Vec<Attachment>
where
    F: FnMut(&UploadedFile),
{
    let mut attachments = Vec::with_capacity(files.len());
    for file in files.iter_mut() {
        for progress in (0..=100u8).step_by(PROGRESS_STEP) {
            if !step.is_zero() {
                tokio::time::sleep(step).await;
            }
            file.progress = progress;
            on_progress(file);
        }
        file.uploaded = true;
        tracing::debug!("uploaded {} ({})", file.name, file.id);

        attachments.push(Attachment {
            id: file.id.clone(),
            name: file.name.clone(),
            mime: file.mime.clone(),
            url: format!("{}/{}", UPLOAD_URL_BASE, file.id),
            size: file.size,
        });
    }
    attachments
}
