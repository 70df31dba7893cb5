//! GitHub implementation of ContentStore
//!
//! Talks to the repository "contents" endpoints of the GitHub REST API. The
//! blob SHA returned by the API is the revision marker; GitHub rejects a write
//! whose `sha` no longer matches the file, which is the only concurrency
//! control this service relies on.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::RemoteSettings;
use crate::error::{StoreError, SyncError};
use crate::remote::{CommitInfo, ContentStore, RevisionMarker, StoredFile, WriteRequest};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// File entry returned by `GET /repos/{owner}/{repo}/contents/{path}`
#[derive(Debug, Deserialize)]
struct ContentsEntry {
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

/// Body of `PUT /repos/{owner}/{repo}/contents/{path}`
#[derive(Debug, Serialize)]
struct PutContentsBody<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: PutContentsFile,
    commit: PutContentsCommit,
}

#[derive(Debug, Deserialize)]
struct PutContentsFile {
    path: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PutContentsCommit {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// Content store backed by a GitHub repository branch
pub struct GitHubContentStore {
    http_client: Client,
    settings: RemoteSettings,
}

impl GitHubContentStore {
    pub fn new(settings: RemoteSettings) -> Result<Self, SyncError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| SyncError::Config(format!("cannot build HTTP client: {}", e)))?;

        // Validate the base URL once so request building cannot fail later
        Url::parse(&settings.api_base_url)
            .map_err(|e| SyncError::Config(format!("invalid api_base_url {}: {}", settings.api_base_url, e)))?;

        Ok(Self { http_client, settings })
    }

    fn contents_url(&self, path: &str) -> Result<Url, StoreError> {
        let invalid = |message: String| StoreError::InvalidResponse {
            path: path.to_string(),
            message,
        };

        let mut url = Url::parse(&self.settings.api_base_url)
            .map_err(|e| invalid(format!("invalid api_base_url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| invalid("api_base_url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["repos", self.settings.owner.as_str(), self.settings.repo.as_str(), "contents"])
            .extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert("x-github-api-version", HeaderValue::from_static(GITHUB_API_VERSION));
        if let Some(token) = &self.settings.token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }

    fn network_error(path: &str, error: reqwest::Error) -> StoreError {
        warn!("GitHub request for {} failed: {}", path, error);
        StoreError::Network {
            path: path.to_string(),
            message: error.to_string(),
        }
    }

    /// Map a non-success response onto the error taxonomy
    async fn status_error(path: &str, response: Response) -> StoreError {
        let status = response.status();
        let rate_limit_exhausted = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim() == "0")
            .unwrap_or(false);
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);
        let path = path.to_string();

        match status {
            StatusCode::NOT_FOUND => StoreError::NotFound { path },
            StatusCode::CONFLICT => StoreError::Conflict { path },
            StatusCode::UNPROCESSABLE_ENTITY if message.contains("sha") => StoreError::Conflict { path },
            StatusCode::TOO_MANY_REQUESTS => StoreError::RateLimited { path },
            StatusCode::FORBIDDEN if rate_limit_exhausted => StoreError::RateLimited { path },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized {
                path,
                status: status.as_u16(),
            },
            _ => StoreError::Unexpected {
                path,
                status: status.as_u16(),
                message,
            },
        }
    }
}

fn decode_content(path: &str, entry: &ContentsEntry) -> Result<Bytes, StoreError> {
    match (entry.encoding.as_deref(), entry.content.as_deref()) {
        (Some("base64"), Some(encoded)) => {
            let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
            general_purpose::STANDARD
                .decode(cleaned)
                .map(Bytes::from)
                .map_err(|e| StoreError::InvalidResponse {
                    path: path.to_string(),
                    message: format!("invalid base64 content: {}", e),
                })
        }
        // Files above the inline size limit come back without content
        _ => Ok(Bytes::new()),
    }
}

#[async_trait]
impl ContentStore for GitHubContentStore {
    async fn read(&self, path: &str) -> Result<StoredFile, StoreError> {
        let mut url = self.contents_url(path)?;
        url.query_pairs_mut().append_pair("ref", &self.settings.branch);
        debug!("GitHub GET {}", url);

        let response = self
            .http_client
            .get(url)
            .headers(self.headers())
            .send()
            .await
            .map_err(|e| Self::network_error(path, e))?;

        if !response.status().is_success() {
            return Err(Self::status_error(path, response).await);
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Self::network_error(path, e))?;
        if value.is_array() {
            return Err(StoreError::InvalidResponse {
                path: path.to_string(),
                message: "path is a directory".to_string(),
            });
        }
        let entry: ContentsEntry = serde_json::from_value(value).map_err(|e| StoreError::InvalidResponse {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        Ok(StoredFile {
            content: decode_content(path, &entry)?,
            revision: RevisionMarker::new(entry.sha),
        })
    }

    async fn write(&self, request: WriteRequest<'_>) -> Result<CommitInfo, StoreError> {
        let path = request.path;
        let url = self.contents_url(path)?;
        let body = PutContentsBody {
            message: request.message,
            content: general_purpose::STANDARD.encode(request.content),
            branch: &self.settings.branch,
            sha: request.revision.map(RevisionMarker::as_str),
        };
        debug!(
            "GitHub PUT {} ({} bytes, {})",
            url,
            request.content.len(),
            if body.sha.is_some() { "update" } else { "create" }
        );

        let response = self
            .http_client
            .put(url)
            .headers(self.headers())
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::network_error(path, e))?;

        if !response.status().is_success() {
            return Err(Self::status_error(path, response).await);
        }

        let created: PutContentsResponse = response.json().await.map_err(|e| StoreError::InvalidResponse {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        Ok(CommitInfo {
            path: created.content.path,
            revision: RevisionMarker::new(created.content.sha),
            commit: created.commit.sha,
        })
    }

    fn name(&self) -> &'static str {
        "github"
    }
}
