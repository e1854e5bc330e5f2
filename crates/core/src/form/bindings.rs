//! Field model and the declarative wiring of fields to rules.

use super::validation::{
    validate_address, validate_consent, validate_details, validate_landlord_name,
    validate_listing_url, FieldCheck,
};
use serde::{Deserialize, Serialize};
use veritas_files::{ClipboardItem, IncomingFile};

/// A form field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldId {
    HouseAddress,
    LandlordName,
    ListingUrl,
    OtherDetails,
    PrivacyConsent,
}

impl FieldId {
    pub const ALL: [FieldId; 5] = [
        FieldId::HouseAddress,
        FieldId::LandlordName,
        FieldId::ListingUrl,
        FieldId::OtherDetails,
        FieldId::PrivacyConsent,
    ];

    /// Element id on the form page; also the payload and draft key.
    pub fn dom_id(self) -> &'static str {
        match self {
            FieldId::HouseAddress => "houseAddress",
            FieldId::LandlordName => "landlordName",
            FieldId::ListingUrl => "listingUrl",
            FieldId::OtherDetails => "otherDetails",
            FieldId::PrivacyConsent => "privacyConsent",
        }
    }

    pub fn from_dom_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.dom_id() == id)
    }

    pub fn label(self) -> &'static str {
        match self {
            FieldId::HouseAddress => "House address",
            FieldId::LandlordName => "Landlord name",
            FieldId::ListingUrl => "Listing URL",
            FieldId::OtherDetails => "Other details",
            FieldId::PrivacyConsent => "Privacy consent",
        }
    }
}

/// Current values of the form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormFields {
    pub house_address: String,
    pub landlord_name: String,
    pub listing_url: String,
    pub other_details: String,
    pub privacy_consent: bool,
}

impl FormFields {
    pub fn text(&self, field: FieldId) -> Option<&str> {
        match field {
            FieldId::HouseAddress => Some(&self.house_address),
            FieldId::LandlordName => Some(&self.landlord_name),
            FieldId::ListingUrl => Some(&self.listing_url),
            FieldId::OtherDetails => Some(&self.other_details),
            FieldId::PrivacyConsent => None,
        }
    }

    /// Stores a value. A checkbox ignores text and a text field ignores a checked state.
    pub fn set(&mut self, field: FieldId, value: FieldValue) {
        match (field, value) {
            (FieldId::HouseAddress, FieldValue::Text(v)) => self.house_address = v,
            (FieldId::LandlordName, FieldValue::Text(v)) => self.landlord_name = v,
            (FieldId::ListingUrl, FieldValue::Text(v)) => self.listing_url = v,
            (FieldId::OtherDetails, FieldValue::Text(v)) => self.other_details = v,
            (FieldId::PrivacyConsent, FieldValue::Checked(v)) => self.privacy_consent = v,
            (field, value) => {
                tracing::debug!("ignoring {:?} for {:?}", value, field);
            }
        }
    }
}

/// A value carried by an input event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Checked(bool),
}

impl FieldValue {
    /// Whether entering this value marks its field as touched.
    pub fn is_non_empty(&self) -> bool {
        match self {
            FieldValue::Text(text) => !text.trim().is_empty(),
            FieldValue::Checked(_) => false,
        }
    }
}

/// Event kinds a rule can listen to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Input,
    Change,
}

/// Something the user did on the form page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormEvent {
    Input(FieldId, FieldValue),
    Change(FieldId, FieldValue),
    FilesSelected(Vec<IncomingFile>),
    FilesDropped(Vec<IncomingFile>),
    Paste(Vec<ClipboardItem>),
    DragOver,
    DragLeave,
    RemoveFile(String),
    Escape,
    Retry,
}

/// A rule sees the current values and whether its field was touched.
pub type FieldRule = fn(&FormFields, bool) -> FieldCheck;

/// Wires one field to its rule.
pub struct FieldBinding {
    pub field: FieldId,
    pub events: &'static [EventKind],
    pub rule: FieldRule,
}

fn address_rule(f: &FormFields, touched: bool) -> FieldCheck {
    validate_address(&f.house_address, touched)
}

fn landlord_name_rule(f: &FormFields, touched: bool) -> FieldCheck {
    validate_landlord_name(&f.landlord_name, touched)
}

fn listing_url_rule(f: &FormFields, touched: bool) -> FieldCheck {
    validate_listing_url(&f.listing_url, touched)
}

fn details_rule(f: &FormFields, _touched: bool) -> FieldCheck {
    validate_details(&f.other_details)
}

fn consent_rule(f: &FormFields, _touched: bool) -> FieldCheck {
    validate_consent(f.privacy_consent)
}

pub static FIELD_BINDINGS: &[FieldBinding] = &[
    FieldBinding {
        field: FieldId::HouseAddress,
        events: &[EventKind::Input],
        rule: address_rule,
    },
    FieldBinding {
        field: FieldId::LandlordName,
        events: &[EventKind::Input],
        rule: landlord_name_rule,
    },
    FieldBinding {
        field: FieldId::ListingUrl,
        events: &[EventKind::Input],
        rule: listing_url_rule,
    },
    FieldBinding {
        field: FieldId::OtherDetails,
        events: &[EventKind::Input],
        rule: details_rule,
    },
    FieldBinding {
        field: FieldId::PrivacyConsent,
        events: &[EventKind::Change],
        rule: consent_rule,
    },
];

/// Bindings of `field` that listen to `kind`.
pub fn bindings_for(field: FieldId, kind: EventKind) -> impl Iterator<Item = &'static FieldBinding> {
    FIELD_BINDINGS
        .iter()
        .filter(move |b| b.field == field && b.events.contains(&kind))
}

/// Runs every rule with every field considered touched.
pub fn validate_all(fields: &FormFields) -> Vec<(FieldId, &'static str)> {
    FIELD_BINDINGS
        .iter()
        .filter_map(|b| (b.rule)(fields, true).message().map(|m| (b.field, m)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_field_has_one_binding() {
        for field in FieldId::ALL {
            assert_eq!(FIELD_BINDINGS.iter().filter(|b| b.field == field).count(), 1);
        }
    }

    #[test]
    fn test_bindings_for_event_kind() {
        assert_eq!(bindings_for(FieldId::HouseAddress, EventKind::Input).count(), 1);
        assert_eq!(bindings_for(FieldId::HouseAddress, EventKind::Change).count(), 0);
        assert_eq!(bindings_for(FieldId::PrivacyConsent, EventKind::Change).count(), 1);
    }

    #[test]
    fn test_validate_all_on_empty_form() {
        let errors = validate_all(&FormFields::default());
        let fields: Vec<_> = errors.iter().map(|(f, _)| *f).collect();
        assert_eq!(
            fields,
            vec![
                FieldId::HouseAddress,
                FieldId::LandlordName,
                FieldId::ListingUrl,
                FieldId::PrivacyConsent
            ]
        );
    }

    #[test]
    fn test_set_ignores_mismatched_value() {
        let mut fields = FormFields::default();
        fields.set(FieldId::PrivacyConsent, FieldValue::Text("yes".into()));
        fields.set(FieldId::HouseAddress, FieldValue::Text("1 Main St".into()));
        assert!(!fields.privacy_consent);
        assert_eq!(fields.text(FieldId::HouseAddress), Some("1 Main St"));
        assert_eq!(FieldId::from_dom_id("listingUrl"), Some(FieldId::ListingUrl));
    }
}
