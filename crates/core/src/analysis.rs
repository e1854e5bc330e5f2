//! Canned analysis narratives shown on the loading page.
//!
//! An [`AnalysisMap`] maps an address string to its [`AnalysisEntry`]. The mapping arrives
//! as JSON text, either handed over through the session store or taken from the payload
//! embedded in this crate.

use crate::constants::DEFAULT_ADDRESS;
use crate::{VeritasError, VeritasResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Analysis payload compiled into the binary, used when none was handed over.
pub const DEFAULT_ANALYSIS_JSON: &str = include_str!("../data/analysis.json");

/// One address's mocked investigation narrative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisEntry {
    pub heading: String,
    pub subheading: String,
    pub summary_bold: String,
    pub results: Vec<ResultItem>,
    /// Closing remark.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer_italics: Option<String>,
}

impl AnalysisEntry {
    /// The closing remark, if present and not blank.
    pub fn closing_remark(&self) -> Option<&str> {
        self.footer_italics
            .as_deref()
            .filter(|remark| !remark.trim().is_empty())
    }
}

/// One source examined in an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultItem {
    pub n: u32,
    pub title: String,
    pub url_label: String,
    pub analyzing: String,
    #[serde(default)]
    pub analysis: Vec<String>,
}

/// Address → entry mapping.
///
/// Entries are kept as raw JSON and decoded only when looked up, so a malformed entry under
/// one address does not affect any other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisMap(BTreeMap<String, Value>);

impl AnalysisMap {
    /// Parses a JSON mapping. A document that is not an object yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns `VeritasError::InvalidAnalysisJson` if the text is not JSON at all.
    pub fn parse(json: &str) -> VeritasResult<Self> {
        let value: Value = serde_json::from_str(json).map_err(VeritasError::InvalidAnalysisJson)?;
        match value {
            Value::Object(entries) => Ok(Self(entries.into_iter().collect())),
            _ => {
                tracing::warn!("analysis payload is not an address mapping");
                Ok(Self::default())
            }
        }
    }

    /// The mapping embedded in this crate.
    pub fn embedded() -> VeritasResult<Self> {
        Self::parse(DEFAULT_ANALYSIS_JSON)
    }

    /// Decodes the entry stored under `address`.
    ///
    /// # Errors
    ///
    /// Returns `VeritasError::MalformedAnalysisEntry` if the entry does not have the
    /// expected shape.
    pub fn get(&self, address: &str) -> VeritasResult<Option<AnalysisEntry>> {
        self.raw(address).map(|raw| decode(address, raw)).transpose()
    }

    /// Looks up `address`, then the default address.
    ///
    /// # Errors
    ///
    /// Returns `VeritasError::MissingAnalysisEntry` carrying the original address when
    /// neither key is present, or `VeritasError::MalformedAnalysisEntry` when the entry
    /// found cannot be decoded.
    pub fn lookup(&self, address: &str) -> VeritasResult<AnalysisEntry> {
        let (key, raw) = self
            .raw(address)
            .map(|raw| (address, raw))
            .or_else(|| self.raw(DEFAULT_ADDRESS).map(|raw| (DEFAULT_ADDRESS, raw)))
            .ok_or_else(|| VeritasError::MissingAnalysisEntry(address.to_string()))?;
        decode(key, raw)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A present, non-null entry.
    fn raw(&self, address: &str) -> Option<&Value> {
        self.0.get(address).filter(|raw| !raw.is_null())
    }
}

fn decode(address: &str, raw: &Value) -> VeritasResult<AnalysisEntry> {
    AnalysisEntry::deserialize(raw).map_err(|source| VeritasError::MalformedAnalysisEntry {
        address: address.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_payload_parses_and_has_default_address() {
        let map = AnalysisMap::embedded().unwrap();
        let entry = map.get(DEFAULT_ADDRESS).unwrap().unwrap();
        assert!(!entry.results.is_empty());
        assert!(entry.closing_remark().is_some());
    }

    #[test]
    fn test_lookup_falls_back_to_default_address() {
        let map = AnalysisMap::embedded().unwrap();
        let entry = map.lookup("742 Evergreen Terrace").unwrap();
        assert_eq!(entry.subheading, DEFAULT_ADDRESS);
    }

    #[test]
    fn test_lookup_without_default_is_missing_entry() {
        let map = AnalysisMap::parse("{}").unwrap();
        match map.lookup("742 Evergreen Terrace") {
            Err(VeritasError::MissingAnalysisEntry(address)) => {
                assert_eq!(address, "742 Evergreen Terrace")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(matches!(
            AnalysisMap::parse("not json"),
            Err(VeritasError::InvalidAnalysisJson(_))
        ));
    }

    #[test]
    fn test_missing_analysis_lines_default_to_empty() {
        let json = r#"{"a": {"heading": "h", "subheading": "s", "summary_bold": "b",
            "results": [{"n": 1, "title": "t", "url_label": "u", "analyzing": "x"}]}}"#;
        let map = AnalysisMap::parse(json).unwrap();
        let entry = map.get("a").unwrap().unwrap();
        assert!(entry.results[0].analysis.is_empty());
        assert_eq!(entry.closing_remark(), None);
    }

    #[test]
    fn test_non_object_payload_is_an_empty_map() {
        for json in ["[]", "42", "\"text\"", "null"] {
            let map = AnalysisMap::parse(json).unwrap();
            assert!(map.is_empty(), "{}", json);
            assert!(matches!(
                map.lookup("1 Good St"),
                Err(VeritasError::MissingAnalysisEntry(_))
            ));
        }
    }

    #[test]
    fn test_malformed_entry_does_not_hide_valid_ones() {
        let json = r#"{
            "1 Good St": {"heading": "h", "subheading": "s", "summary_bold": "b", "results": []},
            "2 Other St": {"heading": "only"}
        }"#;
        let map = AnalysisMap::parse(json).unwrap();
        assert_eq!(map.lookup("1 Good St").unwrap().heading, "h");
        assert!(matches!(
            map.lookup("2 Other St"),
            Err(VeritasError::MalformedAnalysisEntry { address, .. }) if address == "2 Other St"
        ));
    }

    #[test]
    fn test_null_entry_falls_back_to_default_address() {
        let json = format!(
            r#"{{"1 Good St": null, "{}": {{"heading": "d", "subheading": "s", "summary_bold": "b", "results": []}}}}"#,
            DEFAULT_ADDRESS
        );
        let map = AnalysisMap::parse(&json).unwrap();
        assert_eq!(map.lookup("1 Good St").unwrap().heading, "d");
    }
}
