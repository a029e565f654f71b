// Versioned Document Store Abstraction
//
// Defines the contract for the remote file store holding the answer
// document. The store is the sole serialization point for concurrent
// appends: create and conditional-update writes must be evaluated
// atomically against its current version state (check-and-set).

use crate::document::Document;

pub mod github;
pub mod memory;

/// Opaque identifier of a document's exact content version.
///
/// Produced by the store at fetch time; a conditional write carrying a
/// token succeeds only while the store's current version still matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionToken(pub String);

impl VersionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Outcome of fetching a path at the byte level.
///
/// Plain absence is a value, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFetch {
    Absent,
    Present {
        content: String,
        token: VersionToken,
    },
}

impl RawFetch {
    pub fn exists(&self) -> bool {
        matches!(self, Self::Present { .. })
    }
}

/// Outcome of fetching a path as an answer document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Absent,
    Present {
        document: Document,
        token: VersionToken,
    },
}

impl FetchResult {
    pub fn exists(&self) -> bool {
        matches!(self, Self::Present { .. })
    }
}

/// Human-readable change description attached to every write, for
/// audit and traceability in the store's history.
#[derive(Debug, Clone)]
pub struct ChangeNote {
    pub summary: String,

    /// Marks the commit so the hosting collaborator skips publication.
    pub no_deploy: bool,
}

impl ChangeNote {
    /// A data-only change that must not trigger a site deploy.
    pub fn no_deploy(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            no_deploy: true,
        }
    }

    /// The commit message as rendered into the store's history.
    pub fn render(&self) -> String {
        if self.no_deploy {
            format!("chore: [skip ci] {}", self.summary)
        } else {
            format!("chore: {}", self.summary)
        }
    }
}

/// Failures surfaced by a store, decoded once at the boundary.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// Transport or auth failure; the document's state is unknown.
    #[error("store unavailable: {detail}")]
    Unavailable { detail: String },

    /// Existing content failed to parse as a document. A data error,
    /// not absence.
    #[error("corrupt document: {detail}")]
    Corrupt { detail: String },

    /// Create-path write found a document already present.
    #[error("document already exists")]
    AlreadyExists,

    /// Conditional update carried a stale version token.
    #[error("version conflict: document changed since fetch")]
    VersionConflict,
}

/// Remote store for versioned JSON files.
///
/// Properties required from implementations:
/// - `fetch_raw` never errors for plain absence
/// - writes replace the entire content or fail leaving it intact
/// - a write without a token succeeds only if nothing exists at the path
/// - a write with a token succeeds only if the current version matches
/// - both checks are atomic against the store's version state
pub trait VersionedStore: Send + Sync {
    /// Fetch the raw content at `path`, with its current version token.
    fn fetch_raw(&self, path: &str) -> Result<RawFetch, StoreError>;

    /// Write `content` as the full new value at `path`.
    ///
    /// `token` absent means create; present means conditional update.
    /// On success the store's version token for `path` advances, and
    /// the new token is returned.
    fn write_raw(
        &self,
        path: &str,
        content: &str,
        token: Option<&VersionToken>,
        note: &ChangeNote,
    ) -> Result<VersionToken, StoreError>;

    /// Fetch `path` parsed as an answer document.
    ///
    /// Content that exists but does not parse as a document is
    /// `Corrupt`, never absence.
    fn fetch(&self, path: &str) -> Result<FetchResult, StoreError> {
        match self.fetch_raw(path)? {
            RawFetch::Absent => Ok(FetchResult::Absent),
            RawFetch::Present { content, token } => {
                let document =
                    serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
                        detail: e.to_string(),
                    })?;
                Ok(FetchResult::Present { document, token })
            }
        }
    }

    /// Write `document` as the full new content at `path`.
    fn write(
        &self,
        path: &str,
        document: &Document,
        token: Option<&VersionToken>,
        note: &ChangeNote,
    ) -> Result<VersionToken, StoreError> {
        let content = serde_json::to_string(document).map_err(|e| StoreError::Unavailable {
            detail: e.to_string(),
        })?;
        self.write_raw(path, &content, token, note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_deploy_note_carries_skip_ci_marker() {
        let note = ChangeNote::no_deploy("update answers.json");
        assert_eq!(note.render(), "chore: [skip ci] update answers.json");
    }

    #[test]
    fn plain_note_has_no_marker() {
        let note = ChangeNote {
            summary: "create answers.json".into(),
            no_deploy: false,
        };
        assert_eq!(note.render(), "chore: create answers.json");
    }
}
