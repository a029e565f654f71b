// Answer Document Model
//
// A document is a single JSON object mapping record id -> record.
// Records are appended, never edited or removed. This module is pure:
// no I/O, no shared state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

/// Stable identifier for one submitted record.
///
/// Generated fresh (v4) at merge time. Collisions are not re-checked
/// against existing keys; 128 random bits make them negligible at
/// survey volumes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One submitted set of answers plus its creation timestamp.
///
/// Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub values: Vec<String>,

    /// RFC 3339 timestamp assigned when the record was merged.
    #[serde(rename = "createdTimestamp")]
    pub created_timestamp: String,
}

/// The shared answer document: record id -> record.
///
/// Mapping semantics only; iteration order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    pub records: BTreeMap<RecordId, Record>,
}

impl Document {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.get(id)
    }
}

/// Current time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

/// Merge a new record into an existing document (or start a fresh one).
///
/// All prior entries are preserved unchanged; the result's key set is
/// exactly the prior key set plus the freshly generated id.
pub fn merge(existing: Option<&Document>, values: Vec<String>) -> (Document, RecordId) {
    let id = RecordId::generate();
    let record = Record {
        values,
        created_timestamp: now_rfc3339(),
    };

    let mut next = existing.cloned().unwrap_or_default();
    next.records.insert(id.clone(), record);
    (next, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn merge_into_absent_produces_single_entry() {
        let (doc, id) = merge(None, vec!["hello".into()]);

        assert_eq!(doc.len(), 1);
        let record = doc.get(&id).unwrap();
        assert_eq!(record.values, vec!["hello".to_string()]);
        assert!(!record.created_timestamp.is_empty());
    }

    #[test]
    fn merge_preserves_prior_records() {
        let (first, first_id) = merge(None, vec!["hello".into()]);
        let before = first.get(&first_id).unwrap().clone();

        let (second, second_id) = merge(Some(&first), vec!["world".into()]);

        assert_eq!(second.len(), 2);
        assert_eq!(second.get(&first_id).unwrap(), &before);
        assert_eq!(
            second.get(&second_id).unwrap().values,
            vec!["world".to_string()]
        );
    }

    #[test]
    fn generated_ids_do_not_collide() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let (_, id) = merge(None, vec![]);
            assert!(seen.insert(id));
        }
    }

    #[test]
    fn document_round_trips_original_wire_shape() {
        let json = r#"
        {
          "9f7c8b31-3f9d-4b0a-9c3c-6b8df92f7e11": {
            "values": ["first", "second"],
            "createdTimestamp": "2021-09-23T16:40:47.704Z"
          }
        }
        "#;

        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.len(), 1);

        let record = doc.records.values().next().unwrap();
        assert_eq!(record.values.len(), 2);
        assert_eq!(record.created_timestamp, "2021-09-23T16:40:47.704Z");
    }
}
