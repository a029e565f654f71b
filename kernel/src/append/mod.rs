// Append Coordinator
//
// Orchestrates fetch -> merge -> conditional write for one append
// request. Exactly one fetch and one write per call; a lost race
// surfaces to the caller as a typed failure, never an internal retry.
// The remote store's check-and-set is the only serialization point.

use tracing::info;

use crate::document::{merge, Document, RecordId};
use crate::paths::{answers_path, question_path, PathError};
use crate::question::Question;
use crate::store::{ChangeNote, FetchResult, RawFetch, StoreError, VersionToken, VersionedStore};

/// Failure classification surfaced to the request gateway.
///
/// Nothing is swallowed and nothing is retried; `AlreadyExists` and
/// `VersionConflict` are distinct so the caller can decide whether to
/// resubmit.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AppendError {
    #[error("invalid request: {detail}")]
    Validation { detail: String },

    #[error("store unavailable: {detail}")]
    Unavailable { detail: String },

    #[error("corrupt document: {detail}")]
    Corrupt { detail: String },

    #[error("already exists")]
    AlreadyExists,

    #[error("version conflict: the document changed since it was fetched")]
    VersionConflict,
}

impl AppendError {
    /// Stable machine-readable name for gateway error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::Unavailable { .. } => "store_unavailable",
            Self::Corrupt { .. } => "corrupt_document",
            Self::AlreadyExists => "already_exists",
            Self::VersionConflict => "version_conflict",
        }
    }
}

impl From<StoreError> for AppendError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable { detail } => Self::Unavailable { detail },
            StoreError::Corrupt { detail } => Self::Corrupt { detail },
            StoreError::AlreadyExists => Self::AlreadyExists,
            StoreError::VersionConflict => Self::VersionConflict,
        }
    }
}

impl From<PathError> for AppendError {
    fn from(err: PathError) -> Self {
        Self::Validation {
            detail: err.to_string(),
        }
    }
}

/// Result of a successful append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendReceipt {
    pub record_id: RecordId,

    /// True when this append created the document (create path).
    pub created: bool,

    /// The store's version token after the write.
    pub version: VersionToken,
}

/// Stateless orchestrator for document operations.
///
/// Holds no document state between calls; every operation re-derives
/// current state from the store before mutating it.
pub struct AppendCoordinator<S: VersionedStore> {
    store: S,
}

impl<S: VersionedStore> AppendCoordinator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Append one record to a survey's answer document.
    ///
    /// Blank values are dropped; a submission with nothing left is a
    /// validation failure before any store traffic.
    pub fn append(
        &self,
        survey_id: &str,
        values: Vec<String>,
    ) -> Result<AppendReceipt, AppendError> {
        let values: Vec<String> = values
            .into_iter()
            .filter(|v| !v.trim().is_empty())
            .collect();
        if values.is_empty() {
            return Err(AppendError::Validation {
                detail: "no answer values supplied".into(),
            });
        }

        let path = answers_path(survey_id)?;
        match self.store.fetch(&path)? {
            FetchResult::Absent => {
                let (next, record_id) = merge(None, values);
                let note = ChangeNote::no_deploy(format!("create {survey_id}-answers.json"));
                let version = self.store.write(&path, &next, None, &note)?;
                info!(survey_id, record_id = %record_id, "created answer document");
                Ok(AppendReceipt {
                    record_id,
                    created: true,
                    version,
                })
            }
            FetchResult::Present { document, token } => {
                let (next, record_id) = merge(Some(&document), values);
                let note = ChangeNote::no_deploy(format!("update {survey_id}-answers.json"));
                let version = self.store.write(&path, &next, Some(&token), &note)?;
                info!(survey_id, record_id = %record_id, "appended to answer document");
                Ok(AppendReceipt {
                    record_id,
                    created: false,
                    version,
                })
            }
        }
    }

    /// Fetch a survey's answer document, if it exists yet.
    pub fn fetch_answers(&self, survey_id: &str) -> Result<Option<Document>, AppendError> {
        let path = answers_path(survey_id)?;
        match self.store.fetch(&path)? {
            FetchResult::Absent => Ok(None),
            FetchResult::Present { document, .. } => Ok(Some(document)),
        }
    }

    /// Fetch a survey's question metadata, if it exists.
    pub fn fetch_question(&self, survey_id: &str) -> Result<Option<Question>, AppendError> {
        let path = question_path(survey_id)?;
        match self.store.fetch_raw(&path)? {
            RawFetch::Absent => Ok(None),
            RawFetch::Present { content, .. } => {
                let question =
                    serde_json::from_str(&content).map_err(|e| AppendError::Corrupt {
                        detail: e.to_string(),
                    })?;
                Ok(Some(question))
            }
        }
    }

    /// Create a blank question file for a new survey.
    ///
    /// Create-path write only: a taken survey id fails `AlreadyExists`.
    pub fn create_question(&self, survey_id: &str) -> Result<Question, AppendError> {
        let path = question_path(survey_id)?;
        let question = Question::blank();
        let content =
            serde_json::to_string(&question).map_err(|e| AppendError::Unavailable {
                detail: e.to_string(),
            })?;
        let note = ChangeNote::no_deploy(format!("create {survey_id}-question.json"));
        self.store.write_raw(&path, &content, None, &note)?;
        info!(survey_id, "created question file");
        Ok(question)
    }
}
