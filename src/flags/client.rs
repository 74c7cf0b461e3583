//! Flag-source HTTP client.
//!
//! # Responsibilities
//! - Fetch single feature definitions and the feature list
//! - Register this controller instance
//! - Post usage buckets
//!
//! Every request carries the configured timeout; nothing is retried here.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::FlagsConfig;
use crate::flags::types::{
    iso8601, ClientIdentity, FeatureDefinition, FeatureList, FeatureSummary, FlagError,
    FlagResult, MetricsBucket, MetricsReport, Registration, ToggleCount,
};

/// Operations the controller needs from the flag source.
#[async_trait]
pub trait FlagSource: Send + Sync {
    /// Fetch one feature's configuration.
    async fn fetch_feature(&self, name: &str) -> FlagResult<FeatureDefinition>;

    /// List all known features.
    async fn list_features(&self) -> FlagResult<Vec<FeatureSummary>>;

    /// Announce this instance.
    async fn register(&self, strategies: Vec<String>, interval: Duration) -> FlagResult<()>;

    /// Post one window's yes/no counts for a feature.
    async fn send_metrics(
        &self,
        feature: &str,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        counts: ToggleCount,
    ) -> FlagResult<()>;
}

/// HTTP implementation of [`FlagSource`].
#[derive(Clone)]
pub struct HttpFlagClient {
    http: reqwest::Client,
    base: Url,
    identity: ClientIdentity,
}

impl HttpFlagClient {
    /// Build a client from configuration.
    pub fn new(config: &FlagsConfig, identity: ClientIdentity) -> FlagResult<Self> {
        // Url::join drops the last segment unless the base ends with a slash.
        let mut raw = config.url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = config.api_token.as_deref().filter(|t| !t.is_empty()) {
            if let Ok(value) = HeaderValue::from_str(token) {
                headers.insert(AUTHORIZATION, value);
            } else {
                tracing::warn!("Ignoring flag source token with invalid header characters");
            }
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .default_headers(headers)
            .build()?;

        Ok(Self { http, base, identity })
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> FlagResult<T> {
        let url = self.base.join(path)?;
        let response = self.http.get(url).send().await?;
        decode(path, response).await
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> FlagResult<()> {
        let url = self.base.join(path)?;
        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FlagError::Status { status: status.as_u16(), path: path.to_string() });
        }
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> FlagResult<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(FlagError::Status { status: status.as_u16(), path: path.to_string() });
    }
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| FlagError::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl FlagSource for HttpFlagClient {
    async fn fetch_feature(&self, name: &str) -> FlagResult<FeatureDefinition> {
        self.get_json(&format!("features/{}", name)).await
    }

    async fn list_features(&self) -> FlagResult<Vec<FeatureSummary>> {
        let list: FeatureList = self.get_json("features/").await?;
        Ok(list.features)
    }

    async fn register(&self, strategies: Vec<String>, interval: Duration) -> FlagResult<()> {
        let body = Registration {
            app_name: self.identity.app_name.clone(),
            instance_id: self.identity.instance_id.clone(),
            strategies,
            started: iso8601(self.identity.started),
            interval: interval.as_secs(),
        };
        self.post_json("client/register", &body).await
    }

    async fn send_metrics(
        &self,
        feature: &str,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        counts: ToggleCount,
    ) -> FlagResult<()> {
        let body = MetricsReport {
            app_name: self.identity.app_name.clone(),
            instance_id: self.identity.instance_id.clone(),
            bucket: MetricsBucket {
                start: iso8601(start),
                stop: iso8601(stop),
                toggles: HashMap::from([(feature.to_string(), counts)]),
            },
        };
        self.post_json("client/metrics", &body).await
    }
}

impl std::fmt::Debug for HttpFlagClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFlagClient")
            .field("base", &self.base.as_str())
            .field("instance_id", &self.identity.instance_id)
            .finish()
    }
}
