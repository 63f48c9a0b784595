//! Asana API client with pagination and rate-limit handling.
//!
//! Only the two listing endpoints the extraction pipeline needs are modeled.
//! Each listing call walks the cursor-paginated response until the server
//! stops returning an offset, retrying rate-limited requests with the
//! server-directed delay.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::AsanaConfig;
use crate::deadline::Deadline;
use crate::error::{Error, Result};
use crate::extractor::WorkspaceClient;
use crate::models::{Page, Project, User};

const BASE_URL: &str = "https://app.asana.com/api/1.0";
const PAGE_SIZE: &str = "100";
const MAX_ATTEMPTS: u32 = 25;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60);

// Fixed field projections, one per entity type. The server returns only
// these attributes, keeping page payloads small.
const USER_OPT_FIELDS: &[&str] = &["email", "name"];
const PROJECT_OPT_FIELDS: &[&str] = &[
    "name",
    "archived",
    "completed",
    "completed_by",
    "completed_at",
];

/// Asana API client scoped to a single workspace.
///
/// Immutable after construction; safe to share across concurrent tasks.
#[derive(Debug)]
pub struct AsanaClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    workspace: String,
}

impl AsanaClient {
    /// Create a client from configuration. Fails fast when no access token
    /// is resolvable or the workspace is missing; an unauthenticated request
    /// is never sent.
    pub fn new(config: &AsanaConfig) -> Result<Self> {
        let token = config.resolve_token().ok_or_else(|| {
            Error::Configuration(format!(
                "Asana access token is required (set asana.token or {})",
                crate::config::TOKEN_ENV_VAR
            ))
        })?;

        if config.workspace.is_empty() {
            return Err(Error::Configuration(
                "asana.workspace is required".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            token,
            workspace: config.workspace.clone(),
        })
    }

    /// Point the client at a different API root (tests, staging).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// List all users in the workspace, in page-then-in-page order.
    pub async fn list_users(&self, deadline: Deadline) -> Result<Vec<User>> {
        self.fetch_all("users", USER_OPT_FIELDS, deadline).await
    }

    /// List all projects in the workspace, in page-then-in-page order.
    pub async fn list_projects(&self, deadline: Deadline) -> Result<Vec<Project>> {
        self.fetch_all("projects", PROJECT_OPT_FIELDS, deadline)
            .await
    }

    /// Walk every page of a listing. Termination relies on the server
    /// eventually returning an empty cursor; there is no page ceiling.
    async fn fetch_all<T: DeserializeOwned>(
        &self,
        path: &str,
        opt_fields: &[&str],
        deadline: Deadline,
    ) -> Result<Vec<T>> {
        let opt_fields = opt_fields.join(",");
        let mut collected = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let page: Page<T> = self
                .fetch_page(path, &opt_fields, offset.as_deref(), deadline)
                .await?;
            collected.extend(page.data);

            offset = page
                .next_page
                .map(|next| next.offset)
                .filter(|offset| !offset.is_empty());
            if offset.is_none() {
                break;
            }
        }

        debug!(path, count = collected.len(), "listing complete");
        Ok(collected)
    }

    /// Fetch one page, retrying the same request while the server reports
    /// rate limiting. Bounded to MAX_ATTEMPTS requests; every other non-2xx
    /// status is terminal.
    async fn fetch_page<T: DeserializeOwned>(
        &self,
        path: &str,
        opt_fields: &str,
        offset: Option<&str>,
        deadline: Deadline,
    ) -> Result<Page<T>> {
        let url = format!("{}/{}", self.base_url, path);

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let mut request = self.http.get(&url).bearer_auth(&self.token).query(&[
                ("workspace", self.workspace.as_str()),
                ("limit", PAGE_SIZE),
                ("opt_fields", opt_fields),
            ]);
            if let Some(offset) = offset {
                request = request.query(&[("offset", offset)]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| Error::Request(format!("request to {path} failed: {e}")))?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= MAX_ATTEMPTS {
                    return Err(Error::Request(format!(
                        "rate limit retries exhausted after {MAX_ATTEMPTS} attempts on {path}"
                    )));
                }

                let delay = retry_after(response.headers()).unwrap_or(DEFAULT_RETRY_DELAY);
                if delay >= deadline.remaining() {
                    return Err(Error::Request(format!(
                        "rate limited on {path}; retry delay of {}s would overrun the cycle deadline",
                        delay.as_secs()
                    )));
                }

                warn!(
                    path,
                    attempt,
                    delay_secs = delay.as_secs(),
                    "rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            let status = response.status();
            if !status.is_success() {
                // Capture the body for diagnostics; these failures are terminal.
                let body = response.text().await.unwrap_or_default();
                debug!(path, %status, body, "unexpected listing response");
                return Err(Error::Request(format!(
                    "unexpected status {status} on {path}: {body}"
                )));
            }

            return response
                .json::<Page<T>>()
                .await
                .map_err(|e| Error::Request(format!("failed to decode {path} response: {e}")));
        }
    }
}

#[async_trait]
impl WorkspaceClient for AsanaClient {
    async fn list_users(&self, deadline: Deadline) -> Result<Vec<User>> {
        AsanaClient::list_users(self, deadline).await
    }

    async fn list_projects(&self, deadline: Deadline) -> Result<Vec<Project>> {
        AsanaClient::list_projects(self, deadline).await
    }
}

/// Parse the Retry-After header as whole seconds.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
