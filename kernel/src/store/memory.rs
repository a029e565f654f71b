// In-Memory Versioned Store
//
// Reference implementation of `VersionedStore` with real check-and-set
// semantics. Version tokens are content hashes, so the token advances
// exactly when the bytes change. Used by coordinator and race tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use sha2::{Digest, Sha256};

use crate::store::{ChangeNote, RawFetch, StoreError, VersionToken, VersionedStore};

#[derive(Default)]
pub struct InMemoryStore {
    files: Mutex<HashMap<String, String>>,
}

fn content_token(content: &str) -> VersionToken {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    VersionToken(format!("{:x}", hasher.finalize()))
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn files(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a path with raw bytes, bypassing the version checks.
    /// Lets tests exercise the corrupt-content path.
    pub fn put_raw(&self, path: &str, content: impl Into<String>) {
        self.files().insert(path.to_string(), content.into());
    }

    pub fn raw_content(&self, path: &str) -> Option<String> {
        self.files().get(path).cloned()
    }
}

impl VersionedStore for InMemoryStore {
    fn fetch_raw(&self, path: &str) -> Result<RawFetch, StoreError> {
        let files = self.files();
        match files.get(path) {
            None => Ok(RawFetch::Absent),
            Some(content) => Ok(RawFetch::Present {
                token: content_token(content),
                content: content.clone(),
            }),
        }
    }

    fn write_raw(
        &self,
        path: &str,
        content: &str,
        token: Option<&VersionToken>,
        _note: &ChangeNote,
    ) -> Result<VersionToken, StoreError> {
        let mut files = self.files();

        // Existence and version checks happen under the same lock as
        // the insert, matching the store contract's atomicity.
        match (files.get(path), token) {
            (Some(_), None) => return Err(StoreError::AlreadyExists),
            (None, Some(_)) => return Err(StoreError::VersionConflict),
            (Some(current), Some(expected)) => {
                if &content_token(current) != expected {
                    return Err(StoreError::VersionConflict);
                }
            }
            (None, None) => {}
        }

        let next = content_token(content);
        files.insert(path.to_string(), content.to_string());
        Ok(next)
    }
}
