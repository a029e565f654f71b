// GitHub Contents-API Store
//
// `VersionedStore` backed by the GitHub repository contents API. The
// git blob sha doubles as the version token: a PUT carrying a stale
// sha is rejected by GitHub, which is the check-and-set this protocol
// relies on. All response decoding happens once, at this boundary, in
// pure helpers that tests can drive without a network.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{ChangeNote, RawFetch, StoreError, VersionToken, VersionedStore};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("tally/", env!("CARGO_PKG_VERSION"));

/// Explicit configuration for one repository target.
///
/// Passed in at construction; the kernel never reads ambient
/// environment state, so tests can point `api_base` anywhere.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub token: String,
    pub api_base: String,
}

impl GitHubConfig {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
            token: token.into(),
            api_base: DEFAULT_API_BASE.into(),
        }
    }
}

pub struct GitHubStore {
    config: GitHubConfig,
    client: reqwest::blocking::Client,
}

/// GET /repos/{owner}/{repo}/contents/{path} response subset.
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    content: Option<String>,
}

/// PUT /repos/{owner}/{repo}/contents/{path} response subset.
#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    message: String,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

impl GitHubStore {
    pub fn new(config: GitHubConfig) -> Result<Self, StoreError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| StoreError::Unavailable {
                detail: e.to_string(),
            })?;
        Ok(Self { config, client })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.owner,
            self.config.repo,
            path.trim_start_matches('/')
        )
    }
}

impl VersionedStore for GitHubStore {
    fn fetch_raw(&self, path: &str) -> Result<RawFetch, StoreError> {
        let response = self
            .client
            .get(self.contents_url(path))
            .query(&[("ref", self.config.branch.as_str())])
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .map_err(|e| StoreError::Unavailable {
                detail: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| StoreError::Unavailable {
            detail: e.to_string(),
        })?;
        debug!(path, status, "fetched file");

        decode_fetch(status, &body)
    }

    fn write_raw(
        &self,
        path: &str,
        content: &str,
        token: Option<&VersionToken>,
        note: &ChangeNote,
    ) -> Result<VersionToken, StoreError> {
        let request = PutRequest {
            message: note.render(),
            content: STANDARD.encode(content.as_bytes()),
            branch: &self.config.branch,
            sha: token.map(VersionToken::as_str),
        };

        let response = self
            .client
            .put(self.contents_url(path))
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .json(&request)
            .send()
            .map_err(|e| StoreError::Unavailable {
                detail: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| StoreError::Unavailable {
            detail: e.to_string(),
        })?;
        debug!(path, status, create = token.is_none(), "wrote file");

        decode_write(status, &body, token.is_none())
    }
}

/// Map a contents-API GET response to a fetch outcome.
fn decode_fetch(status: u16, body: &str) -> Result<RawFetch, StoreError> {
    match status {
        200 => {
            let contents: ContentsResponse =
                serde_json::from_str(body).map_err(|e| StoreError::Unavailable {
                    detail: format!("unexpected contents response: {e}"),
                })?;
            let encoded = contents.content.ok_or_else(|| StoreError::Corrupt {
                detail: "contents response carried no inline content".into(),
            })?;
            Ok(RawFetch::Present {
                content: decode_content(&encoded)?,
                token: VersionToken(contents.sha),
            })
        }
        404 => Ok(RawFetch::Absent),
        401 | 403 => Err(StoreError::Unavailable {
            detail: format!("auth rejected (HTTP {status})"),
        }),
        _ => Err(StoreError::Unavailable {
            detail: format!("unexpected HTTP {status}: {body}"),
        }),
    }
}

/// Map a contents-API PUT response to a write outcome.
///
/// GitHub answers 409 when the supplied sha is stale and 422 when a
/// create races a file that now exists ("sha wasn't supplied").
fn decode_write(status: u16, body: &str, create: bool) -> Result<VersionToken, StoreError> {
    match status {
        200 | 201 => {
            let put: PutResponse =
                serde_json::from_str(body).map_err(|e| StoreError::Unavailable {
                    detail: format!("unexpected write response: {e}"),
                })?;
            Ok(VersionToken(put.content.sha))
        }
        409 => Err(StoreError::VersionConflict),
        422 if create => Err(StoreError::AlreadyExists),
        422 => Err(StoreError::VersionConflict),
        401 | 403 => Err(StoreError::Unavailable {
            detail: format!("auth rejected (HTTP {status})"),
        }),
        _ => Err(StoreError::Unavailable {
            detail: format!("unexpected HTTP {status}: {body}"),
        }),
    }
}

/// Decode the base64 payload of a contents response.
///
/// GitHub wraps base64 bodies with newlines; strip all whitespace
/// before decoding.
fn decode_content(encoded: &str) -> Result<String, StoreError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| StoreError::Corrupt {
            detail: format!("content is not valid base64: {e}"),
        })?;
    String::from_utf8(bytes).map_err(|e| StoreError::Corrupt {
        detail: format!("content is not valid UTF-8: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(json: &str) -> String {
        STANDARD.encode(json.as_bytes())
    }

    #[test]
    fn fetch_200_decodes_content_and_sha() {
        let payload = encode(r#"{"hello":"world"}"#);
        let body = format!(r#"{{"sha":"abc123","content":"{payload}","encoding":"base64"}}"#);

        match decode_fetch(200, &body).unwrap() {
            RawFetch::Present { content, token } => {
                assert_eq!(content, r#"{"hello":"world"}"#);
                assert_eq!(token, VersionToken("abc123".into()));
            }
            RawFetch::Absent => panic!("expected present"),
        }
    }

    #[test]
    fn fetch_200_tolerates_newline_wrapped_base64() {
        let raw = encode(r#"{}"#);
        let wrapped = format!("{}\\n{}\\n", &raw[..2], &raw[2..]);
        let body = format!(r#"{{"sha":"abc123","content":"{wrapped}"}}"#);

        assert!(decode_fetch(200, &body).unwrap().exists());
    }

    #[test]
    fn fetch_404_is_absence_not_an_error() {
        let result = decode_fetch(404, r#"{"message":"Not Found"}"#).unwrap();
        assert_eq!(result, RawFetch::Absent);
    }

    #[test]
    fn fetch_auth_failure_is_unavailable() {
        let err = decode_fetch(401, r#"{"message":"Bad credentials"}"#).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }

    #[test]
    fn fetch_200_with_invalid_base64_is_corrupt() {
        let body = r#"{"sha":"abc123","content":"@@not-base64@@"}"#;
        let err = decode_fetch(200, body).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn write_201_returns_new_sha() {
        let body = r#"{"content":{"sha":"def456"},"commit":{"sha":"ignored"}}"#;
        let token = decode_write(201, body, true).unwrap();
        assert_eq!(token, VersionToken("def456".into()));
    }

    #[test]
    fn write_409_is_version_conflict() {
        let err = decode_write(409, r#"{"message":"Conflict"}"#, false).unwrap_err();
        assert_eq!(err, StoreError::VersionConflict);
    }

    #[test]
    fn write_422_on_create_is_already_exists() {
        let body = r#"{"message":"Invalid request.\n\n\"sha\" wasn't supplied."}"#;
        assert_eq!(
            decode_write(422, body, true).unwrap_err(),
            StoreError::AlreadyExists
        );
        assert_eq!(
            decode_write(422, body, false).unwrap_err(),
            StoreError::VersionConflict
        );
    }

    #[test]
    fn put_request_omits_sha_on_create() {
        let request = PutRequest {
            message: "chore: [skip ci] create answers.json".into(),
            content: encode("{}"),
            branch: "main",
            sha: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("sha").is_none());
        assert_eq!(json["branch"], "main");
    }
}
