//! The draft record and its string encoding.
//!
//! A draft is a flat mapping of field name to string value, stored as a JSON
//! object. Decoding accepts nothing else: arrays, scalars, nested objects and
//! non-string values are all rejected as [`QaError::DraftDecode`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use kilnqa_core::{QaError, QaResult};
use kilnqa_forms::FieldSnapshot;

/// Saved field values for one form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftRecord {
    values: BTreeMap<String, String>,
}

impl DraftRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the persistable fields of a tree snapshot.
    ///
    /// Secret fields and submit buttons are never captured. When a name
    /// repeats, the first field wins.
    pub fn from_fields(fields: &[FieldSnapshot]) -> Self {
        let mut values = BTreeMap::new();
        for field in fields {
            if field.input_type.is_secret() || !field.input_type.carries_value() {
                continue;
            }
            values
                .entry(field.name.clone())
                .or_insert_with(|| field.value.clone());
        }
        Self { values }
    }

    /// Sets one value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Returns the value saved for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Number of saved fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing is saved.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over name/value pairs, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encodes the record as a single string.
    pub fn encode(&self) -> QaResult<String> {
        serde_json::to_string(self).map_err(|e| QaError::SerializationError(e.to_string()))
    }

    /// Decodes a stored string.
    pub fn decode(raw: &str) -> QaResult<Self> {
        serde_json::from_str(raw).map_err(|e| QaError::DraftDecode(e.to_string()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DraftRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kilnqa_forms::InputType;

    fn snapshot(name: &str, input_type: InputType, value: &str) -> FieldSnapshot {
        FieldSnapshot {
            name: name.to_string(),
            input_type,
            value: value.to_string(),
        }
    }

    #[test]
    fn test_from_fields_skips_secret_and_submit() {
        let record = DraftRecord::from_fields(&[
            snapshot("username", InputType::Text, "inspector"),
            snapshot("password", InputType::Password, "hunter2"),
            snapshot("submit", InputType::Submit, "Log in"),
            snapshot("notes", InputType::Textarea, ""),
        ]);
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("username"), Some("inspector"));
        assert_eq!(record.get("notes"), Some(""));
        assert_eq!(record.get("password"), None);
        assert_eq!(record.get("submit"), None);
    }

    #[test]
    fn test_from_fields_first_duplicate_wins() {
        let record = DraftRecord::from_fields(&[
            snapshot("kiln_number", InputType::Select, "K1"),
            snapshot("kiln_number", InputType::Hidden, "K9"),
        ]);
        assert_eq!(record.get("kiln_number"), Some("K1"));
    }

    #[test]
    fn test_encode_preserves_arbitrary_text() {
        let record: DraftRecord = [
            ("notes", "line one\nline \"two\"\t\u{00b0}C ✓"),
            ("empty", ""),
        ]
        .into_iter()
        .collect();
        let encoded = record.encode().unwrap();
        assert_eq!(DraftRecord::decode(&encoded).unwrap(), record);
    }

    #[test]
    fn test_encode_is_a_flat_object() {
        let record: DraftRecord = [("a", "1"), ("b", "x")].into_iter().collect();
        assert_eq!(record.encode().unwrap(), r#"{"a":"1","b":"x"}"#);
    }

    #[test]
    fn test_decode_rejects_non_mapping_shapes() {
        for raw in [
            "[]",
            "\"text\"",
            "42",
            "null",
            r#"{"a": 1}"#,
            r#"{"a": {"b": "c"}}"#,
            "{not json",
            "",
        ] {
            assert!(
                matches!(DraftRecord::decode(raw), Err(QaError::DraftDecode(_))),
                "accepted {raw:?}"
            );
        }
    }

    #[test]
    fn test_decode_empty_object() {
        assert!(DraftRecord::decode("{}").unwrap().is_empty());
    }
}
