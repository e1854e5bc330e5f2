//! Submission wire types and the submission capability.

use super::bindings::{validate_all, FormFields};
use crate::constants::CLIENT_VERSION;
use crate::VeritasResult;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

/// An uploaded attachment as referenced by a submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub mime: String,
    pub url: String,
    pub size: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Consents {
    pub privacy: bool,
    pub contact: bool,
}

/// Where a submission came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientMetadata {
    pub client_version: String,
    pub locale: String,
    pub tz: String,
    pub user_agent: String,
    /// RFC 3339 time of submission.
    pub timestamp: String,
}

/// Environment facts about the submitting client, supplied by the binary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientContext {
    pub locale: String,
    pub tz: String,
    pub user_agent: String,
}

impl Default for ClientContext {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            tz: "UTC".to_string(),
            user_agent: format!("veritas/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientContext {
    pub fn metadata(&self, now: DateTime<Utc>) -> ClientMetadata {
        ClientMetadata {
            client_version: CLIENT_VERSION.to_string(),
            locale: self.locale.clone(),
            tz: self.tz.clone(),
            user_agent: self.user_agent.clone(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Body of `POST /api/submissions`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub house_address: String,
    pub landlord_name: String,
    pub listing_url: String,
    pub other_details: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub consents: Consents,
    pub metadata: ClientMetadata,
}

impl SubmissionPayload {
    /// Builds the payload from the form; text is trimmed and contact consent is implied.
    pub fn assemble(fields: &FormFields, attachments: Vec<Attachment>, metadata: ClientMetadata) -> Self {
        Self {
            house_address: fields.house_address.trim().to_string(),
            landlord_name: fields.landlord_name.trim().to_string(),
            listing_url: fields.listing_url.trim().to_string(),
            other_details: fields.other_details.trim().to_string(),
            attachments,
            consents: Consents {
                privacy: fields.privacy_consent,
                contact: true,
            },
            metadata,
        }
    }

    pub fn fields(&self) -> FormFields {
        FormFields {
            house_address: self.house_address.clone(),
            landlord_name: self.landlord_name.clone(),
            listing_url: self.listing_url.clone(),
            other_details: self.other_details.clone(),
            privacy_consent: self.consents.privacy,
        }
    }
}

/// Accepted submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub submission_id: String,
    pub status: String,
    pub estimated_wait_sec: u32,
}

/// Refused submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionFailure {
    pub error_id: String,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Accepted(SubmissionReceipt),
    Rejected(SubmissionFailure),
}

/// Decides a submission the way the service does: fields are re-validated and any
/// problem refuses it.
pub fn receive_submission(payload: &SubmissionPayload, now: DateTime<Utc>) -> SubmissionOutcome {
    let millis = now.timestamp_millis();
    let errors = validate_all(&payload.fields());
    if let Some((field, message)) = errors.first() {
        tracing::warn!("submission refused: {:?} {}", field, message);
        return SubmissionOutcome::Rejected(SubmissionFailure {
            error_id: format!("err_{}", millis),
            message: format!("Validation failed: {}", message),
        });
    }

    let receipt = SubmissionReceipt {
        submission_id: format!("subm_{}", millis),
        status: "received".to_string(),
        estimated_wait_sec: 15,
    };
    tracing::info!(
        "submission {} received with {} attachment(s)",
        receipt.submission_id,
        payload.attachments.len()
    );
    SubmissionOutcome::Accepted(receipt)
}

/// Sends a submission somewhere.
///
/// `Err` means the submission could not be delivered at all; a refusal by the receiver is
/// `Ok(SubmissionOutcome::Rejected)`.
#[async_trait]
pub trait SubmissionClient: Send + Sync {
    async fn submit(&self, payload: &SubmissionPayload) -> VeritasResult<SubmissionOutcome>;
}

/// In-process submission with a fixed delay.
#[derive(Clone, Debug)]
pub struct MockSubmissionClient {
    delay: Duration,
    reject_with: Option<String>,
}

impl MockSubmissionClient {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            reject_with: None,
        }
    }

    /// A client that refuses every submission with `message`.
    pub fn rejecting(delay: Duration, message: impl Into<String>) -> Self {
        Self {
            delay,
            reject_with: Some(message.into()),
        }
    }
}

#[async_trait]
impl SubmissionClient for MockSubmissionClient {
    async fn submit(&self, payload: &SubmissionPayload) -> VeritasResult<SubmissionOutcome> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let now = Utc::now();
        Ok(match &self.reject_with {
            Some(message) => SubmissionOutcome::Rejected(SubmissionFailure {
                error_id: format!("err_{}", now.timestamp_millis()),
                message: message.clone(),
            }),
            None => receive_submission(payload, now),
        })
    }
}

/// The error shown above the form after a failed submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBanner {
    pub error_id: String,
    pub message: String,
}

impl ErrorBanner {
    pub fn from_failure(failure: SubmissionFailure) -> Self {
        Self {
            error_id: if failure.error_id.is_empty() {
                "unknown".to_string()
            } else {
                failure.error_id
            },
            message: if failure.message.is_empty() {
                "An unexpected error occurred.".to_string()
            } else {
                failure.message
            },
        }
    }

    /// Banner for a submission that never reached the receiver.
    pub fn network(now: DateTime<Utc>) -> Self {
        Self {
            error_id: format!("client_error_{}", now.timestamp_millis()),
            message: "Network error occurred. Please check your connection and try again."
                .to_string(),
        }
    }
}
