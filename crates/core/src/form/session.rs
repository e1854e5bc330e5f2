//! One visit to the intake form.
//!
//! [`FormSession`] owns everything the page keeps between events: field values, touched
//! flags and messages, the attachment intake, the autosave deadline and the draft-saved
//! flag. Events go through [`FormSession::dispatch`]; submission is an async call that
//! ends in a navigation, a blocked form or an error banner.
//!
//! Timers use `tokio::time::Instant`, so tests drive them with a paused clock.

use super::bindings::{bindings_for, EventKind, FieldBinding, FieldId, FieldValue, FormEvent, FormFields, FIELD_BINDINGS};
use super::draft::{load_draft, save_draft, DraftFileMeta, DraftRecord};
use super::submission::{
    ClientContext, ErrorBanner, SubmissionClient, SubmissionOutcome, SubmissionPayload,
    SubmissionReceipt,
};
use super::upload::upload_files;
use super::validation::{counter_level, CounterLevel};
use crate::config::{CoreConfig, FormTiming};
use crate::constants::ADDRESS_KEY;
use crate::navigation::Page;
use crate::storage::SharedStore;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::time::Instant;
use veritas_files::{ClipboardItem, FileIntake, IncomingFile, UploadedFile};

/// How a submit attempt ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitResult {
    /// Accepted; the page moves on.
    Submitted {
        receipt: SubmissionReceipt,
        next: Page,
    },
    /// Invalid fields; nothing was sent.
    Blocked(Vec<(FieldId, &'static str)>),
    /// Refused or undeliverable; the banner is showing.
    Failed(ErrorBanner),
}

pub struct FormSession {
    timing: FormTiming,
    fields: FormFields,
    touched: BTreeSet<FieldId>,
    errors: BTreeMap<FieldId, &'static str>,
    intake: FileIntake,
    file_error: Option<String>,
    restored_files: Vec<DraftFileMeta>,
    dragover: bool,
    busy: bool,
    banner: Option<ErrorBanner>,
    autosave_at: Option<Instant>,
    notice_until: Option<Instant>,
    draft_saved: bool,
    local: SharedStore,
    session: SharedStore,
    client: Arc<dyn SubmissionClient>,
    context: ClientContext,
}

impl FormSession {
    /// Opens the form, restoring a recent draft from `local` if there is one.
    pub fn open(
        config: &CoreConfig,
        local: SharedStore,
        session: SharedStore,
        client: Arc<dyn SubmissionClient>,
    ) -> Self {
        let mut form = Self {
            timing: config.form.clone(),
            fields: FormFields::default(),
            touched: BTreeSet::new(),
            errors: BTreeMap::new(),
            intake: FileIntake::new(config.intake.clone()),
            file_error: None,
            restored_files: Vec::new(),
            dragover: false,
            busy: false,
            banner: None,
            autosave_at: None,
            notice_until: None,
            draft_saved: false,
            local,
            session,
            client,
            context: ClientContext::default(),
        };
        form.restore_draft(Utc::now());
        form
    }

    pub fn with_client_context(mut self, context: ClientContext) -> Self {
        self.context = context;
        self
    }

    /// Repopulates the form from a draft younger than the configured maximum age.
    pub fn restore_draft(&mut self, now: DateTime<Utc>) -> bool {
        match load_draft(self.local.as_ref(), now, self.timing.draft_max_age()) {
            Ok(Some(draft)) => {
                tracing::info!("restored draft saved at {}", draft.timestamp);
                self.fields = draft.fields();
                self.restored_files = draft.files;
                self.draft_saved = true;
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("failed to load draft: {}", e);
                false
            }
        }
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn error(&self, field: FieldId) -> Option<&'static str> {
        self.errors.get(&field).copied()
    }

    pub fn errors(&self) -> &BTreeMap<FieldId, &'static str> {
        &self.errors
    }

    pub fn is_touched(&self, field: FieldId) -> bool {
        self.touched.contains(&field)
    }

    pub fn files(&self) -> &[UploadedFile] {
        self.intake.files()
    }

    /// File metadata of a restored draft. Display only; the content is gone.
    pub fn restored_files(&self) -> &[DraftFileMeta] {
        &self.restored_files
    }

    pub fn file_error(&self) -> Option<&str> {
        self.file_error.as_deref()
    }

    pub fn is_dragover(&self) -> bool {
        self.dragover
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn banner(&self) -> Option<&ErrorBanner> {
        self.banner.as_ref()
    }

    pub fn is_draft_saved(&self) -> bool {
        self.draft_saved
    }

    pub fn autosave_deadline(&self) -> Option<Instant> {
        self.autosave_at
    }

    pub fn notice_visible(&self) -> bool {
        self.notice_until
            .map(|until| Instant::now() < until)
            .unwrap_or(false)
    }

    /// Length of the raw details value and its counter band.
    pub fn details_counter(&self) -> (usize, CounterLevel) {
        let len = self.fields.other_details.chars().count();
        (len, counter_level(len))
    }

    pub fn dispatch(&mut self, event: FormEvent) {
        match event {
            FormEvent::Input(field, value) => self.on_field(field, value, EventKind::Input),
            FormEvent::Change(field, value) => self.on_field(field, value, EventKind::Change),
            FormEvent::FilesSelected(files) => {
                self.add_files(files);
            }
            FormEvent::FilesDropped(files) => {
                self.dragover = false;
                self.add_files(files);
            }
            FormEvent::Paste(items) => {
                let files = ClipboardItem::files(items);
                if !files.is_empty() {
                    self.add_files(files);
                }
            }
            FormEvent::DragOver => self.dragover = true,
            FormEvent::DragLeave => self.dragover = false,
            FormEvent::RemoveFile(id) => self.remove_file(&id),
            FormEvent::Escape => self.notice_until = None,
            FormEvent::Retry => self.retry(),
        }
    }

    fn on_field(&mut self, field: FieldId, value: FieldValue, kind: EventKind) {
        if value.is_non_empty() {
            self.touched.insert(field);
        }
        self.fields.set(field, value);
        for binding in bindings_for(field, kind) {
            self.apply(binding);
        }
        self.schedule_autosave();
    }

    fn apply(&mut self, binding: &FieldBinding) -> bool {
        let check = (binding.rule)(&self.fields, self.touched.contains(&binding.field));
        match check.message() {
            Some(message) => {
                self.errors.insert(binding.field, message);
                false
            }
            None => {
                self.errors.remove(&binding.field);
                true
            }
        }
    }

    /// Marks every field touched and runs every rule.
    pub fn validate_all(&mut self) -> Vec<(FieldId, &'static str)> {
        self.touched.extend(FieldId::ALL);
        for binding in FIELD_BINDINGS {
            self.apply(binding);
        }
        self.errors.iter().map(|(f, m)| (*f, *m)).collect()
    }

    /// Adds a batch of files. On refusal the aggregated message is shown and nothing from
    /// the batch is kept.
    pub fn add_files(&mut self, batch: Vec<IncomingFile>) -> bool {
        self.file_error = None;
        match self.intake.add(batch) {
            Ok(ids) => {
                tracing::info!("added {} file(s)", ids.len());
                self.schedule_autosave();
                true
            }
            Err(e) => {
                self.file_error = Some(e.message());
                false
            }
        }
    }

    pub fn remove_file(&mut self, id: &str) {
        if self.intake.remove(id).is_some() {
            self.schedule_autosave();
        }
    }

    /// Produces image previews that are still pending, yielding between files.
    pub async fn generate_previews(&mut self) -> usize {
        let mut resolved = 0;
        for id in self.intake.pending_previews() {
            tokio::task::yield_now().await;
            if self.intake.resolve_preview(&id) {
                resolved += 1;
            }
        }
        resolved
    }

    fn schedule_autosave(&mut self) {
        self.autosave_at = Some(Instant::now() + self.timing.autosave_interval());
    }

    /// Saves the draft if the autosave deadline has passed.
    pub fn tick(&mut self) -> bool {
        match self.autosave_at {
            Some(at) if at <= Instant::now() => {
                self.autosave_at = None;
                self.save_draft()
            }
            _ => false,
        }
    }

    /// Waits for the pending autosave, if any, and performs it.
    pub async fn wait_for_autosave(&mut self) -> bool {
        let Some(at) = self.autosave_at else {
            return false;
        };
        tokio::time::sleep_until(at).await;
        self.tick()
    }

    /// Writes the draft and shows the saved notice.
    pub fn save_draft(&mut self) -> bool {
        let record = DraftRecord::capture(&self.fields, self.intake.files(), Utc::now());
        match save_draft(self.local.as_ref(), &record) {
            Ok(()) => {
                tracing::debug!("draft saved");
                self.draft_saved = true;
                self.notice_until = Some(Instant::now() + self.timing.saved_notice());
                true
            }
            Err(e) => {
                tracing::warn!("failed to save draft: {}", e);
                false
            }
        }
    }

    pub fn has_form_data(&self) -> bool {
        !self.fields.house_address.trim().is_empty()
            || !self.fields.listing_url.trim().is_empty()
            || !self.fields.other_details.trim().is_empty()
            || !self.intake.is_empty()
    }

    /// Leaving the page saves once if nothing has been saved yet.
    pub fn on_unload(&mut self) -> bool {
        if !self.draft_saved && self.has_form_data() {
            self.save_draft()
        } else {
            false
        }
    }

    /// Clears fields, files, touched flags and every message.
    pub fn reset(&mut self) {
        self.fields = FormFields::default();
        self.intake.clear();
        self.restored_files.clear();
        self.touched.clear();
        self.errors.clear();
        self.file_error = None;
        self.dragover = false;
    }

    /// Hides the error banner; the form keeps its values.
    pub fn retry(&mut self) {
        self.banner = None;
    }

    pub async fn submit(&mut self) -> SubmitResult {
        self.submit_with_progress(|_| {}).await
    }

    /// Validates, uploads, submits and stores the address for the next page.
    pub async fn submit_with_progress<F>(&mut self, on_progress: F) -> SubmitResult
    where
        F: FnMut(&UploadedFile),
    {
        let problems = self.validate_all();
        if !problems.is_empty() {
            tracing::info!("submission blocked by {} invalid field(s)", problems.len());
            return SubmitResult::Blocked(problems);
        }

        self.busy = true;
        self.banner = None;

        let attachments =
            upload_files(self.intake.files_mut(), self.timing.upload_step(), on_progress).await;
        let payload = SubmissionPayload::assemble(
            &self.fields,
            attachments,
            self.context.metadata(Utc::now()),
        );
        let outcome = self.client.submit(&payload).await;
        self.busy = false;

        match outcome {
            Ok(SubmissionOutcome::Accepted(receipt)) => {
                if let Err(e) = self.session.set(ADDRESS_KEY, &payload.house_address) {
                    tracing::warn!("failed to hand over address: {}", e);
                }
                tracing::info!(
                    "submission {} accepted, navigating to {}",
                    receipt.submission_id,
                    Page::Loading
                );
                SubmitResult::Submitted {
                    receipt,
                    next: Page::Loading,
                }
            }
            Ok(SubmissionOutcome::Rejected(failure)) => {
                tracing::warn!("submission refused: {}", failure.message);
                let banner = ErrorBanner::from_failure(failure);
                self.banner = Some(banner.clone());
                SubmitResult::Failed(banner)
            }
            Err(e) => {
                tracing::warn!("submission failed: {}", e);
                let banner = ErrorBanner::network(Utc::now());
                self.banner = Some(banner.clone());
                SubmitResult::Failed(banner)
            }
        }
    }
}
