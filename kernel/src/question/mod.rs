// Survey Question Metadata
//
// The question file describes one survey: its prompt, how many answer
// entries the form renders, and the per-entry length cap. It is a
// sibling document to the answer file and shares the same store.

use serde::{Deserialize, Serialize};

use crate::document::now_rfc3339;

pub const DEFAULT_ENTRY_MAX_LENGTH: u32 = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub workshop_name: String,
    pub question: String,
    pub entries: u32,
    pub entry_max_length: u32,
    pub created_timestamp: String,
    pub last_modified_timestamp: String,
}

impl Question {
    /// A freshly created, blank question with both timestamps set to now.
    pub fn blank() -> Self {
        let now = now_rfc3339();
        Self {
            workshop_name: String::new(),
            question: String::new(),
            entries: 0,
            entry_max_length: DEFAULT_ENTRY_MAX_LENGTH,
            created_timestamp: now.clone(),
            last_modified_timestamp: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_question_has_original_defaults() {
        let q = Question::blank();
        assert_eq!(q.entries, 0);
        assert_eq!(q.entry_max_length, 80);
        assert!(q.workshop_name.is_empty());
        assert_eq!(q.created_timestamp, q.last_modified_timestamp);
    }

    #[test]
    fn question_serializes_with_camel_case_keys() {
        let q = Question::blank();
        let json = serde_json::to_value(&q).unwrap();

        assert!(json.get("workshopName").is_some());
        assert!(json.get("entryMaxLength").is_some());
        assert!(json.get("createdTimestamp").is_some());
        assert!(json.get("lastModifiedTimestamp").is_some());
    }

    #[test]
    fn question_parses_original_wire_shape() {
        let json = r#"
        {
          "workshopName": "UIO workshop",
          "question": "Describe yourself in one word",
          "entries": 3,
          "entryMaxLength": 80,
          "createdTimestamp": "2021-09-23T16:40:47.704Z",
          "lastModifiedTimestamp": "2021-09-24T10:01:12.000Z"
        }
        "#;

        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.entries, 3);
        assert_eq!(q.question, "Describe yourself in one word");
    }
}
