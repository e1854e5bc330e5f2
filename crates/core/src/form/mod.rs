//! Intake-form controller.
//!
//! - [`validation`]: pure field validators and the details counter bands
//! - [`bindings`]: the field model, form events and the `FIELD_BINDINGS` table
//! - [`draft`]: draft records in the durable store
//! - [`upload`]: simulated sequential upload of attachments
//! - [`submission`]: wire types and the [`SubmissionClient`] capability
//! - [`session`]: [`FormSession`], which ties the above together for one page visit

pub mod bindings;
pub mod draft;
pub mod session;
pub mod submission;
pub mod upload;
pub mod validation;

pub use bindings::{EventKind, FieldId, FieldValue, FormEvent, FormFields, FIELD_BINDINGS};
pub use draft::{clear_draft, load_draft, save_draft, DraftFileMeta, DraftRecord};
pub use session::{FormSession, SubmitResult};
pub use submission::{
    receive_submission, Attachment, ClientContext, ClientMetadata, Consents, ErrorBanner,
    MockSubmissionClient, SubmissionClient, SubmissionFailure, SubmissionOutcome,
    SubmissionPayload, SubmissionReceipt,
};
pub use validation::{CounterLevel, FieldCheck};
