use std::env;
use std::time::Duration;

use uuid::Uuid;

use crate::error::AppError;

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Connection settings for the hosted points service (auth + REST + RPC).
#[derive(Debug, Clone, PartialEq)]
pub struct HostedServiceConfig {
    /// Project base URL, without a trailing slash
    pub base_url: String,
    /// Public anon key sent as `apikey` on every request
    pub anon_key: String,
    pub request_timeout: Duration,
    /// Recorded with each award this instance submits
    pub device_id: String,
}

impl HostedServiceConfig {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            anon_key: anon_key.into(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            device_id: default_device_id(),
        }
    }

    /// Reads `POINTS_SERVICE_URL`, `POINTS_SERVICE_ANON_KEY`, and the optional
    /// `POINTS_REQUEST_TIMEOUT_MS` and `POINTS_DEVICE_ID`.
    pub fn from_env() -> Result<Self, AppError> {
        let base_url = must_var("POINTS_SERVICE_URL")?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::config(format!(
                "POINTS_SERVICE_URL must be an http(s) URL, got: '{base_url}'"
            )));
        }
        let anon_key = must_var("POINTS_SERVICE_ANON_KEY")?;

        let request_timeout = match env::var("POINTS_REQUEST_TIMEOUT_MS") {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(AppError::config(format!(
                        "POINTS_REQUEST_TIMEOUT_MS must be a positive number of milliseconds, got: '{raw}'"
                    )))
                }
            },
            Err(_) => Duration::from_millis(DEFAULT_TIMEOUT_MS),
        };

        let device_id = env::var("POINTS_DEVICE_ID")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(default_device_id);

        Ok(Self {
            base_url: normalize_base_url(&base_url),
            anon_key,
            request_timeout,
            device_id,
        })
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn default_device_id() -> String {
    format!("server-{}", Uuid::new_v4())
}

/// Get required environment variable or return error
fn must_var(name: &str) -> Result<String, AppError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::config(format!("Required environment variable '{name}' is not set")))
}
