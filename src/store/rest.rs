use async_trait::async_trait;
use reqwest::header::{HeaderMap, ETAG, IF_MATCH};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::config::StoreConfig;
use crate::error::{Result, VerifierError};
use crate::pool::{Job, JobUpdate};
use crate::store::{JobStore, TxDecision, TxFn, TxOutcome};

const ETAG_REQUEST_HEADER: &str = "X-Firebase-ETag";

/// Job store backed by a realtime-database style REST endpoint.
///
/// Transactions use ETag preconditions: the value is read together with its
/// ETag, and the write carries `if-match`. A `412 Precondition Failed`
/// response carries the fresh value and ETag, which feed the next attempt.
#[derive(Debug, Clone)]
pub struct RestJobStore {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
    max_retries: u32,
}

impl RestJobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: None,
            max_retries: 25,
        }
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| VerifierError::Internal("store base URL not configured".to_string()))?;
        let mut store = Self::new(base_url);
        store.auth_token = config.auth_token.clone();
        store.max_retries = config.max_retries.max(1);
        Ok(store)
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.auth_token {
            Some(token) => builder.query(&[("auth", token)]),
            None => builder,
        }
    }

    fn etag(headers: &HeaderMap) -> Result<String> {
        headers
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| VerifierError::Store("response carried no ETag".to_string()))
    }

    fn parse_job(value: Value) -> Result<Option<Job>> {
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    async fn read_with_etag(&self, path: &str) -> Result<(Option<Job>, String)> {
        let response = self
            .request(reqwest::Method::GET, path)
            .header(ETAG_REQUEST_HEADER, "true")
            .send()
            .await?
            .error_for_status()?;
        let etag = Self::etag(response.headers())?;
        let value: Value = response.json().await?;
        Ok((Self::parse_job(value)?, etag))
    }
}

#[async_trait]
impl JobStore for RestJobStore {
    async fn get(&self, path: &str) -> Result<Option<Job>> {
        let response = self
            .request(reqwest::Method::GET, path)
            .send()
            .await?
            .error_for_status()?;
        let value: Value = response.json().await?;
        Self::parse_job(value)
    }

    async fn transact(&self, path: &str, update: TxFn<'_>) -> Result<TxOutcome> {
        let (mut current, mut etag) = self.read_with_etag(path).await?;

        for attempt in 1..=self.max_retries {
            let value = match update(current.clone()) {
                TxDecision::Abort => {
                    return Ok(TxOutcome {
                        committed: false,
                        snapshot: current,
                    })
                }
                TxDecision::Commit(value) => value,
            };

            if current.is_none() && value.is_none() {
                return Ok(TxOutcome {
                    committed: true,
                    snapshot: None,
                });
            }

            let response = self
                .request(reqwest::Method::PUT, path)
                .header(IF_MATCH, etag.as_str())
                .json(&value)
                .send()
                .await?;

            if response.status() == StatusCode::PRECONDITION_FAILED {
                tracing::debug!(path, attempt, "ETag mismatch, retrying with fresh data");
                etag = Self::etag(response.headers())?;
                current = Self::parse_job(response.json().await?)?;
                continue;
            }

            let response = response.error_for_status()?;
            let written: Value = response.json().await?;
            return Ok(TxOutcome {
                committed: true,
                snapshot: Self::parse_job(written)?,
            });
        }

        Err(VerifierError::Conflict(path.to_string(), self.max_retries))
    }

    async fn update(&self, path: &str, update: &JobUpdate) -> Result<()> {
        self.request(reqwest::Method::PATCH, path)
            .json(update)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
