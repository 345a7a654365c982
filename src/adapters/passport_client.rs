use crate::core::{ConfigProvider, PassportRecord, PassportRegistry};
use crate::utils::error::{BookingError, Result};
use crate::utils::retry::{retry_send, RetryPolicy};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// 護照登記處回應的欄位，其他欄位忽略
#[derive(Debug, Deserialize)]
struct PassportBody {
    first_name: String,
    last_name: String,
}

/// `PassportRegistry` backed by an HTTP registry.
///
/// `GET {base_url}{lookup_path}` with `{passport_id}` substituted:
/// 200 + JSON is a record, 404 is "no such passport", anything else is
/// `RegistryUnavailable`. Every request is bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct HttpPassportClient {
    client: Client,
    base_url: Url,
    lookup_path: String,
    retry: RetryPolicy,
}

impl HttpPassportClient {
    pub fn new<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        Self::with_settings(
            config.passport_api_endpoint(),
            config.lookup_path(),
            config.request_timeout(),
            RetryPolicy::new(config.retry_attempts(), config.retry_delay()),
        )
    }

    pub fn with_settings(
        base_url: &str,
        lookup_path: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| BookingError::InvalidConfigValueError {
            field: "passport_api.base_url".to_string(),
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| BookingError::ConfigError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url,
            lookup_path: lookup_path.to_string(),
            retry,
        })
    }

    fn lookup_url(&self, passport_id: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| BookingError::ConfigError {
                    message: format!("{} cannot be used as a base URL", self.base_url),
                })?;
            segments.pop_if_empty();
            // push 會對每一段做 percent-encoding
            for template in self.lookup_path.split('/').filter(|s| !s.is_empty()) {
                let segment = template.replace("{passport_id}", passport_id);
                if is_dot_segment(&segment) {
                    return Err(BookingError::InvalidRequest {
                        field: "passport_id".to_string(),
                        reason: format!("'{}' cannot be addressed as a URL path segment", passport_id),
                    });
                }
                segments.push(&segment);
            }
        }
        Ok(url)
    }
}

/// `.` 與 `..` 會被 URL 正規化吃掉（`%2E` 也一樣），永遠指不到那筆護照
fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "." | "..")
}

fn unavailable(err: reqwest::Error) -> BookingError {
    let reason = if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    };
    BookingError::RegistryUnavailable { reason }
}

#[async_trait]
impl PassportRegistry for HttpPassportClient {
    async fn lookup(&self, passport_id: &str) -> Result<Option<PassportRecord>> {
        let url = self.lookup_url(passport_id)?;
        tracing::debug!("Looking up passport at {}", url);

        let response = retry_send(&self.retry, || self.client.get(url.clone()).send())
            .await
            .map_err(unavailable)?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::debug!(passport_id, "Passport not found in registry");
                Ok(None)
            }
            status if status.is_success() => {
                let body: PassportBody = response.json().await.map_err(unavailable)?;
                Ok(Some(PassportRecord {
                    passport_id: passport_id.to_string(),
                    first_name: body.first_name,
                    last_name: body.last_name,
                }))
            }
            status => Err(BookingError::RegistryUnavailable {
                reason: format!("unexpected status {} from passport registry", status),
            }),
        }
    }
}
