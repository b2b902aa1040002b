//! Provider configuration.
//!
//! Values are layered with `figment`: built-in defaults, then the
//! environment, then the non-null attributes of the provider block.

use std::time::Duration;

use figment::{
    providers::{Env, Serialized},
    Figment, Provider,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

/// Default Equinix API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.equinix.com";
/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;
/// Default page size for list calls.
pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// Smallest accepted page size.
pub const MIN_PAGE_SIZE: u32 = 20;
/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 10;
/// Default upper bound of a single retry wait, in seconds.
pub const DEFAULT_MAX_RETRY_WAIT: u64 = 30;

/// Message reported when no API token is available.
pub const MISSING_TOKEN: &str = "\"auth_token\" must be provided when configuring the provider";

/// Environment variables and the attribute each one feeds.
const ENV_KEYS: &[(&str, &str)] = &[
    ("METAL_AUTH_TOKEN", "auth_token"),
    ("EQUINIX_API_ENDPOINT", "endpoint"),
    ("EQUINIX_API_TIMEOUT", "request_timeout"),
    ("METAL_MAX_RETRIES", "max_retries"),
    ("METAL_MAX_RETRY_WAIT_SECONDS", "max_retry_wait_seconds"),
];

/// Layered configuration before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawConfig {
    #[serde(default)]
    auth_token: Option<String>,
    endpoint: String,
    request_timeout: u64,
    response_max_page_size: u32,
    max_retries: u32,
    max_retry_wait_seconds: u64,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            auth_token: None,
            endpoint: DEFAULT_ENDPOINT.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            response_max_page_size: DEFAULT_PAGE_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            max_retry_wait_seconds: DEFAULT_MAX_RETRY_WAIT,
        }
    }
}

/// Validated provider configuration.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Metal API token.
    pub auth_token: SecretString,
    /// API endpoint, without the `/metal/v1` suffix.
    pub endpoint: Url,
    /// Timeout of a single HTTP request.
    pub request_timeout: Duration,
    /// `per_page` used for list calls.
    pub response_max_page_size: u32,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Upper bound of a single retry wait.
    pub max_retry_wait: Duration,
}

impl ProviderConfig {
    /// Resolve the configuration from defaults, the process environment
    /// and the provider block.
    pub fn resolve(block: &Value) -> Result<Self, ProviderError> {
        Self::resolve_from(block, environment())
    }

    /// Resolve the configuration with `env` standing in for the environment.
    pub fn resolve_from(block: &Value, env: impl Provider) -> Result<Self, ProviderError> {
        let raw: RawConfig = Figment::from(Serialized::defaults(RawConfig::default()))
            .merge(env)
            .merge(Serialized::defaults(non_null(block)))
            .extract()
            .map_err(|e| ProviderError::Configuration(e.to_string()))?;

        raw.validate()
    }

    /// A configuration with defaults and the given token and endpoint.
    pub fn new(auth_token: impl Into<String>, endpoint: Url) -> Self {
        let raw = RawConfig::default();
        Self {
            auth_token: SecretString::from(auth_token.into()),
            endpoint,
            request_timeout: Duration::from_secs(raw.request_timeout),
            response_max_page_size: raw.response_max_page_size,
            max_retries: raw.max_retries,
            max_retry_wait: Duration::from_secs(raw.max_retry_wait_seconds),
        }
    }

    /// Base URL of the Metal API, always ending in `/metal/v1/`.
    pub fn api_base(&self) -> Result<Url, ProviderError> {
        let mut base = self.endpoint.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join("metal/v1/")
            .map_err(|e| ProviderError::Configuration(format!("invalid endpoint: {}", e)))
    }
}

impl RawConfig {
    fn validate(self) -> Result<ProviderConfig, ProviderError> {
        let auth_token = self
            .auth_token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ProviderError::Configuration(MISSING_TOKEN.into()))?;

        let endpoint = Url::parse(&self.endpoint).map_err(|e| {
            ProviderError::Configuration(format!("invalid endpoint {:?}: {}", self.endpoint, e))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ProviderError::Configuration(format!(
                "endpoint must use http or https, got {}",
                endpoint.scheme()
            )));
        }

        if self.response_max_page_size < MIN_PAGE_SIZE {
            return Err(ProviderError::Configuration(format!(
                "response_max_page_size must be at least {}, got {}",
                MIN_PAGE_SIZE, self.response_max_page_size
            )));
        }
        if self.request_timeout == 0 {
            return Err(ProviderError::Configuration(
                "request_timeout must be at least 1 second".into(),
            ));
        }

        Ok(ProviderConfig {
            auth_token: SecretString::from(auth_token),
            endpoint,
            request_timeout: Duration::from_secs(self.request_timeout),
            response_max_page_size: self.response_max_page_size,
            max_retries: self.max_retries,
            max_retry_wait: Duration::from_secs(self.max_retry_wait_seconds),
        })
    }
}

/// The environment variables the provider reads, mapped to attribute names.
pub fn environment() -> Env {
    Env::raw().filter_map(|key| env_attribute(key.as_str()).map(Into::into))
}

fn env_attribute(name: &str) -> Option<&'static str> {
    ENV_KEYS
        .iter()
        .find(|(env, _)| env.eq_ignore_ascii_case(name))
        .map(|(_, attr)| *attr)
}

fn non_null(block: &Value) -> serde_json::Map<String, Value> {
    block
        .as_object()
        .map(|obj| {
            obj.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default()
}

/// Schema of the provider block.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("Equinix Metal provider configuration")
        .with_attribute(
            "auth_token",
            Attribute::optional_string()
                .sensitive()
                .with_description("Metal API token. Falls back to METAL_AUTH_TOKEN."),
        )
        .with_attribute(
            "endpoint",
            Attribute::optional_string()
                .with_description("Equinix API endpoint. Falls back to EQUINIX_API_ENDPOINT."),
        )
        .with_attribute(
            "request_timeout",
            Attribute::optional_int64()
                .with_description("HTTP request timeout in seconds. Falls back to EQUINIX_API_TIMEOUT."),
        )
        .with_attribute(
            "response_max_page_size",
            Attribute::optional_int64().with_description("Page size of list calls, at least 20."),
        )
        .with_attribute(
            "max_retries",
            Attribute::optional_int64()
                .with_description("Retries of failed API calls. Falls back to METAL_MAX_RETRIES."),
        )
        .with_attribute(
            "max_retry_wait_seconds",
            Attribute::optional_int64().with_description(
                "Longest wait between retries. Falls back to METAL_MAX_RETRY_WAIT_SECONDS.",
            ),
        )
}
