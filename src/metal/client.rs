//! HTTP client for the Equinix Metal API.
//!
//! Base path: `<endpoint>/metal/v1/`
//! Auth: `X-Auth-Token` header

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::models::{
    Connection, ConnectionCreateRequest, ConnectionUpdateRequest, Device, DeviceAction,
    DeviceCreateRequest, DeviceUpdateRequest, ErrorResponse, Meta, Plan, Project,
    ProjectCreateRequest, ProjectUpdateRequest, SshKey, SshKeyCreateRequest, SshKeyUpdateRequest,
};
use crate::config::ProviderConfig;
use crate::error::ProviderError;

const USER_AGENT_VALUE: &str = concat!("equinix-provider/", env!("CARGO_PKG_VERSION"));
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Async client for the Metal REST API.
///
/// Failed calls with a retryable status or a connect/timeout error are
/// retried with exponential backoff. List calls follow pagination until the
/// last page.
#[derive(Debug, Clone)]
pub struct MetalClient {
    http: reqwest::Client,
    base_url: Url,
    page_size: u32,
    max_retries: u32,
    max_retry_wait: Duration,
}

impl MetalClient {
    /// Build a client from resolved provider configuration.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        let mut token = HeaderValue::from_str(config.auth_token.expose_secret()).map_err(|e| {
            ProviderError::Configuration(format!("invalid auth_token header value: {}", e))
        })?;
        token.set_sensitive(true);
        headers.insert("X-Auth-Token", token);
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base()?,
            page_size: config.response_max_page_size,
            max_retries: config.max_retries,
            max_retry_wait: config.max_retry_wait,
        })
    }

    /// `per_page` used for list calls.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn url(&self, path: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ProviderError::Internal(format!("invalid API path {:?}: {}", path, e)))
    }

    // ── Transport ───────────────────────────────────────────────────

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ProviderError> {
        let url = self.url(path)?;
        let mut attempt: u32 = 0;
        let mut backoff = INITIAL_BACKOFF.min(self.max_retry_wait);

        loop {
            attempt = attempt.saturating_add(1);
            debug!(%method, %url, attempt, "metal request");

            let mut request = self.http.request(method.clone(), url.clone()).query(query);
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) => {
                    let status = resp.status();
                    if attempt <= self.max_retries && is_retryable_status(status) {
                        let wait = retry_wait(status, resp.headers(), backoff).min(self.max_retry_wait);
                        warn!(%method, %url, %status, ?wait, attempt, "retrying metal request");
                        tokio::time::sleep(wait).await;
                        backoff = next_backoff(backoff, self.max_retry_wait);
                        continue;
                    }
                    return Err(parse_error(status, resp).await);
                },
                Err(e) => {
                    if attempt <= self.max_retries && is_retryable_reqwest(&e) {
                        warn!(%method, %url, error = %e, ?backoff, attempt, "retrying metal request");
                        tokio::time::sleep(backoff).await;
                        backoff = next_backoff(backoff, self.max_retry_wait);
                        continue;
                    }
                    return Err(ProviderError::Http(e));
                },
            }
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let resp = self.send(Method::GET, path, query, None).await?;
        decode(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ProviderError> {
        let body = serde_json::to_value(body)?;
        let resp = self.send(Method::POST, path, &[], Some(&body)).await?;
        decode(resp).await
    }

    async fn post_no_response<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ProviderError> {
        let body = serde_json::to_value(body)?;
        self.send(Method::POST, path, &[], Some(&body)).await?;
        Ok(())
    }

    async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ProviderError> {
        let body = serde_json::to_value(body)?;
        let resp = self.send(Method::PUT, path, &[], Some(&body)).await?;
        decode(resp).await
    }

    async fn delete(&self, path: &str, query: &[(&str, String)]) -> Result<(), ProviderError> {
        self.send(Method::DELETE, path, query, None).await?;
        Ok(())
    }

    /// Collect every page of a list endpoint.
    ///
    /// `key` names the array in the response body, e.g. `"projects"`.
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ProviderError> {
        let mut all = Vec::new();
        let mut page: u32 = 1;

        loop {
            let mut params = query.to_vec();
            params.push(("page", page.to_string()));
            params.push(("per_page", self.page_size.to_string()));

            let mut body: Value = self.get(path, &params).await?;
            let items: Vec<T> = match body.get_mut(key).map(Value::take) {
                Some(Value::Null) | None => Vec::new(),
                Some(items) => serde_json::from_value(items)?,
            };
            let meta: Meta = match body.get_mut("meta").map(Value::take) {
                Some(Value::Null) | None => Meta::default(),
                Some(meta) => serde_json::from_value(meta)?,
            };

            let received = items.len();
            all.extend(items);
            if received == 0 || !meta.has_next() {
                break;
            }
            page = page.saturating_add(1);
        }

        Ok(all)
    }

    // ── Projects ────────────────────────────────────────────────────

    /// All projects visible to the token.
    pub async fn list_projects(&self) -> Result<Vec<Project>, ProviderError> {
        self.list_all("projects", "projects", &[]).await
    }

    /// Fetch one project.
    pub async fn get_project(&self, id: &str) -> Result<Project, ProviderError> {
        self.get(&format!("projects/{}", id), &[]).await
    }

    /// Create a project.
    pub async fn create_project(&self, req: &ProjectCreateRequest) -> Result<Project, ProviderError> {
        self.post("projects", req).await
    }

    /// Update a project.
    pub async fn update_project(
        &self,
        id: &str,
        req: &ProjectUpdateRequest,
    ) -> Result<Project, ProviderError> {
        self.put(&format!("projects/{}", id), req).await
    }

    /// Delete a project.
    pub async fn delete_project(&self, id: &str) -> Result<(), ProviderError> {
        self.delete(&format!("projects/{}", id), &[]).await
    }

    // ── Devices ─────────────────────────────────────────────────────

    /// All devices of a project.
    pub async fn list_devices(&self, project_id: &str) -> Result<Vec<Device>, ProviderError> {
        self.list_all(&format!("projects/{}/devices", project_id), "devices", &[])
            .await
    }

    /// Fetch one device.
    pub async fn get_device(&self, id: &str) -> Result<Device, ProviderError> {
        self.get(&format!("devices/{}", id), &[]).await
    }

    /// Request a new device in a project.
    pub async fn create_device(
        &self,
        project_id: &str,
        req: &DeviceCreateRequest,
    ) -> Result<Device, ProviderError> {
        self.post(&format!("projects/{}/devices", project_id), req)
            .await
    }

    /// Update mutable device fields.
    pub async fn update_device(
        &self,
        id: &str,
        req: &DeviceUpdateRequest,
    ) -> Result<Device, ProviderError> {
        self.put(&format!("devices/{}", id), req).await
    }

    /// Run an action such as a reinstall on a device.
    pub async fn device_action(&self, id: &str, action: &DeviceAction) -> Result<(), ProviderError> {
        self.post_no_response(&format!("devices/{}/actions", id), action)
            .await
    }

    /// Delete a device. `force` detaches attached volumes first.
    pub async fn delete_device(&self, id: &str, force: bool) -> Result<(), ProviderError> {
        self.delete(
            &format!("devices/{}", id),
            &[("force_delete", force.to_string())],
        )
        .await
    }

    /// Poll a device until it reaches `active`.
    ///
    /// A device entering `failed` is an error, as is running out of time.
    pub async fn wait_for_device_active(
        &self,
        id: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Device, ProviderError> {
        let start = Instant::now();

        loop {
            let device = self.get_device(id).await?;
            match device.state.as_str() {
                "active" => return Ok(device),
                "failed" => {
                    return Err(ProviderError::FailedPrecondition(format!(
                        "device {} entered state failed",
                        id
                    )))
                },
                state => debug!(device = id, state, "waiting for device"),
            }

            if start.elapsed() >= timeout {
                return Err(ProviderError::DeadlineExceeded(format!(
                    "device {} still {} after {:?}",
                    id, device.state, timeout
                )));
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    // ── SSH keys ────────────────────────────────────────────────────

    /// Fetch one SSH key, user or project scoped.
    pub async fn get_ssh_key(&self, id: &str) -> Result<SshKey, ProviderError> {
        self.get(&format!("ssh-keys/{}", id), &[]).await
    }

    /// Create a user SSH key.
    pub async fn create_ssh_key(&self, req: &SshKeyCreateRequest) -> Result<SshKey, ProviderError> {
        self.post("ssh-keys", req).await
    }

    /// Create an SSH key scoped to a project.
    pub async fn create_project_ssh_key(
        &self,
        project_id: &str,
        req: &SshKeyCreateRequest,
    ) -> Result<SshKey, ProviderError> {
        self.post(&format!("projects/{}/ssh-keys", project_id), req)
            .await
    }

    /// Rename an SSH key.
    pub async fn update_ssh_key(
        &self,
        id: &str,
        req: &SshKeyUpdateRequest,
    ) -> Result<SshKey, ProviderError> {
        self.put(&format!("ssh-keys/{}", id), req).await
    }

    /// Delete an SSH key.
    pub async fn delete_ssh_key(&self, id: &str) -> Result<(), ProviderError> {
        self.delete(&format!("ssh-keys/{}", id), &[]).await
    }

    // ── Interconnections ────────────────────────────────────────────

    /// Request a connection in a project.
    pub async fn create_connection(
        &self,
        project_id: &str,
        req: &ConnectionCreateRequest,
    ) -> Result<Connection, ProviderError> {
        self.post(&format!("projects/{}/connections", project_id), req)
            .await
    }

    /// Fetch one connection.
    pub async fn get_connection(&self, id: &str) -> Result<Connection, ProviderError> {
        self.get(&format!("connections/{}", id), &[]).await
    }

    /// Update a connection.
    pub async fn update_connection(
        &self,
        id: &str,
        req: &ConnectionUpdateRequest,
    ) -> Result<Connection, ProviderError> {
        self.put(&format!("connections/{}", id), req).await
    }

    /// Delete a connection.
    pub async fn delete_connection(&self, id: &str) -> Result<(), ProviderError> {
        self.delete(&format!("connections/{}", id), &[]).await
    }

    // ── Plans ───────────────────────────────────────────────────────

    /// All plans, with facility and metro availability.
    pub async fn list_plans(&self) -> Result<Vec<Plan>, ProviderError> {
        self.list_all(
            "plans",
            "plans",
            &[("include", "available_in,available_in_metros".to_string())],
        )
        .await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ProviderError> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(ProviderError::from)
}

async fn parse_error(status: StatusCode, resp: reqwest::Response) -> ProviderError {
    let raw = resp.text().await.unwrap_or_default();
    ProviderError::from_api(status.as_u16(), error_message(status, &raw))
}

fn error_message(status: StatusCode, raw: &str) -> String {
    if let Ok(body) = serde_json::from_str::<ErrorResponse>(raw) {
        if !body.errors.is_empty() {
            return body.errors.join("; ");
        }
        if let Some(error) = body.error.filter(|e| !e.is_empty()) {
            return error;
        }
    }
    if raw.trim().is_empty() {
        status.to_string()
    } else {
        raw.trim().to_string()
    }
}

/// Wait before the next attempt. `Retry-After` only counts on 429 and 503.
fn retry_wait(status: StatusCode, headers: &HeaderMap, backoff: Duration) -> Duration {
    if !matches!(status.as_u16(), 429 | 503) {
        return backoff;
    }
    retry_after(headers).unwrap_or(backoff)
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[inline]
const fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 408 | 429 | 500 | 502 | 503 | 504)
}

#[inline]
fn is_retryable_reqwest(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect()
}

#[inline]
fn next_backoff(current: Duration, max: Duration) -> Duration {
    current.saturating_mul(2).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_errors_array() {
        let status = StatusCode::UNPROCESSABLE_ENTITY;
        assert_eq!(
            error_message(status, r#"{"errors":["hostname is invalid","plan is required"]}"#),
            "hostname is invalid; plan is required"
        );
        assert_eq!(error_message(status, r#"{"error":"Not found"}"#), "Not found");
        assert_eq!(error_message(status, "upstream broke"), "upstream broke");
        assert_eq!(error_message(status, ""), "422 Unprocessable Entity");
    }

    #[test]
    fn retryable_statuses() {
        for code in [408, 429, 500, 502, 503, 504] {
            assert!(is_retryable_status(StatusCode::from_u16(code).unwrap()));
        }
        for code in [400, 401, 404, 409, 422] {
            assert!(!is_retryable_status(StatusCode::from_u16(code).unwrap()));
        }
    }

    #[test]
    fn retry_after_only_for_throttling() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        let backoff = Duration::from_secs(1);

        for code in [429, 503] {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(retry_wait(status, &headers, backoff), Duration::from_secs(7));
        }
        for code in [408, 500, 502, 504] {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(retry_wait(status, &headers, backoff), backoff);
        }
        assert_eq!(
            retry_wait(StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new(), backoff),
            backoff
        );
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let cap = Duration::from_secs(30);
        let mut wait = INITIAL_BACKOFF;
        let mut seen = Vec::new();
        for _ in 0..7 {
            seen.push(wait.as_secs());
            wait = next_backoff(wait, cap);
        }
        assert_eq!(seen, vec![1, 2, 4, 8, 16, 30, 30]);
    }

    #[test]
    fn user_agent_names_crate() {
        assert!(USER_AGENT_VALUE.starts_with("equinix-provider/"));
    }
}
