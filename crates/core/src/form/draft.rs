//! Draft persistence for the intake form.
//!
//! A draft is one JSON record in the durable store under [`DRAFT_KEY`]. Each save replaces
//! the previous record. Only file metadata is kept; file content never reaches the store.
//! The current time is passed in so expiry is testable.

use super::bindings::FormFields;
use crate::constants::DRAFT_KEY;
use crate::storage::KeyValueStore;
use crate::{VeritasError, VeritasResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use veritas_files::UploadedFile;

/// Metadata of an attachment at the time of the save.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftFileMeta {
    pub id: String,
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime: String,
}

/// A saved draft.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    #[serde(default)]
    pub house_address: String,
    #[serde(default)]
    pub landlord_name: String,
    #[serde(default)]
    pub listing_url: String,
    #[serde(default)]
    pub other_details: String,
    #[serde(default)]
    pub privacy_consent: bool,
    /// Save time in epoch milliseconds.
    pub timestamp: i64,
    #[serde(default)]
    pub files: Vec<DraftFileMeta>,
}

impl DraftRecord {
    /// Snapshot of the form as it stands. Text is kept untrimmed.
    pub fn capture(fields: &FormFields, files: &[UploadedFile], now: DateTime<Utc>) -> Self {
        Self {
            house_address: fields.house_address.clone(),
            landlord_name: fields.landlord_name.clone(),
            listing_url: fields.listing_url.clone(),
            other_details: fields.other_details.clone(),
            privacy_consent: fields.privacy_consent,
            timestamp: now.timestamp_millis(),
            files: files
                .iter()
                .map(|f| DraftFileMeta {
                    id: f.id.clone(),
                    name: f.name.clone(),
                    size: f.size,
                    mime: f.mime.clone(),
                })
                .collect(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        // An age that does not fit in i64 is treated as expired.
        match now.timestamp_millis().checked_sub(self.timestamp) {
            Some(age) => age > max_age.num_milliseconds(),
            None => true,
        }
    }

    pub fn fields(&self) -> FormFields {
        FormFields {
            house_address: self.house_address.clone(),
            landlord_name: self.landlord_name.clone(),
            listing_url: self.listing_url.clone(),
            other_details: self.other_details.clone(),
            privacy_consent: self.privacy_consent,
        }
    }
}

pub fn save_draft(store: &dyn KeyValueStore, record: &DraftRecord) -> VeritasResult<()> {
    let json = serde_json::to_string(record).map_err(VeritasError::Serialization)?;
    store.set(DRAFT_KEY, &json)
}

/// Loads the draft if it is younger than `max_age`.
///
/// Expired and unparsable drafts are removed from the store and reported as absent.
///
/// # Errors
///
/// Returns an error only if the store itself fails.
pub fn load_draft(
    store: &dyn KeyValueStore,
    now: DateTime<Utc>,
    max_age: Duration,
) -> VeritasResult<Option<DraftRecord>> {
    let Some(json) = store.get(DRAFT_KEY)? else {
        return Ok(None);
    };

    let record: DraftRecord = match serde_json::from_str(&json) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!("discarding unreadable draft: {}", e);
            store.remove(DRAFT_KEY)?;
            return Ok(None);
        }
    };

    if record.is_expired(now, max_age) {
        tracing::info!("discarding draft saved at {}", record.timestamp);
        store.remove(DRAFT_KEY)?;
        return Ok(None);
    }

    Ok(Some(record))
}

pub fn clear_draft(store: &dyn KeyValueStore) -> VeritasResult<()> {
    store.remove(DRAFT_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn fields() -> FormFields {
        FormFields {
            house_address: "1550 Mathilda Ave ".into(),
            landlord_name: "Pat".into(),
            listing_url: "https://example.com/l/1".into(),
            other_details: "Asked for a wire transfer".into(),
            privacy_consent: true,
        }
    }

    #[test]
    fn test_young_draft_restores_fields() {
        let store = MemoryStore::new();
        let saved_at = Utc::now();
        save_draft(&store, &DraftRecord::capture(&fields(), &[], saved_at)).unwrap();

        let later = saved_at + Duration::hours(23);
        let draft = load_draft(&store, later, Duration::hours(24))
            .unwrap()
            .unwrap();
        assert_eq!(draft.fields(), fields());
        assert!(store.get(DRAFT_KEY).unwrap().is_some());
    }

    #[test]
    fn test_old_draft_is_removed() {
        let store = MemoryStore::new();
        let saved_at = Utc::now();
        save_draft(&store, &DraftRecord::capture(&fields(), &[], saved_at)).unwrap();

        let later = saved_at + Duration::hours(24) + Duration::milliseconds(1);
        assert_eq!(load_draft(&store, later, Duration::hours(24)).unwrap(), None);
        assert_eq!(store.get(DRAFT_KEY).unwrap(), None);
    }

    #[test]
    fn test_corrupt_draft_is_removed() {
        let store = MemoryStore::new();
        store.set(DRAFT_KEY, "{\"houseAddress\": ").unwrap();

        assert_eq!(load_draft(&store, Utc::now(), Duration::hours(24)).unwrap(), None);
        assert_eq!(store.get(DRAFT_KEY).unwrap(), None);
    }

    #[test]
    fn test_draft_with_unrepresentable_age_is_removed() {
        let store = MemoryStore::new();
        store
            .set(DRAFT_KEY, r#"{"timestamp": -9223372036854775808}"#)
            .unwrap();

        assert_eq!(load_draft(&store, Utc::now(), Duration::hours(24)).unwrap(), None);
        assert_eq!(store.get(DRAFT_KEY).unwrap(), None);
    }

    #[test]
    fn test_wire_format() {
        let record = DraftRecord {
            files: vec![DraftFileMeta {
                id: "file_1_abc".into(),
                name: "lease.pdf".into(),
                size: 10,
                mime: "application/pdf".into(),
            }],
            ..DraftRecord::capture(&fields(), &[], DateTime::from_timestamp_millis(42).unwrap())
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["houseAddress"], "1550 Mathilda Ave ");
        assert_eq!(value["privacyConsent"], true);
        assert_eq!(value["timestamp"], 42);
        assert_eq!(value["files"][0]["type"], "application/pdf");
    }

    #[test]
    fn test_missing_text_fields_default_to_empty() {
        let record: DraftRecord = serde_json::from_str(r#"{"timestamp": 1}"#).unwrap();
        assert_eq!(record.fields(), FormFields::default());
    }
}
