// Vendor inventory API client
//
// Both vendors expose the same paging contract: POST <endpoint>?skip=N&limit=M with a
// `token` header, answering with a JSON array of host records.

use super::{into_records, HostSource};
use crate::error::{IngestError, IngestResult};
use crate::normalize::RawHostRecord;
use async_trait::async_trait;
use hostfuse_common::config::ResolvedSource;
use hostfuse_common::SourceKind;
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ApiHostSource {
    kind: SourceKind,
    endpoint: String,
    token: String,
    client: reqwest::Client,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl ApiHostSource {
    pub fn new(settings: &ResolvedSource) -> IngestResult<Self> {
        let per_second =
            NonZeroU32::new(settings.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = governor::RateLimiter::direct(governor::Quota::per_second(per_second));

        let client = reqwest::Client::builder()
            .user_agent(concat!("hostfuse/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            kind: settings.kind,
            endpoint: settings.endpoint.clone(),
            token: settings.token.clone(),
            client,
            rate_limiter,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl HostSource for ApiHostSource {
    fn source_kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch_page(&self, skip: usize, limit: usize) -> IngestResult<Vec<RawHostRecord>> {
        self.rate_limiter.until_ready().await;

        debug!("POST {} (skip={}, limit={})", self.endpoint, skip, limit);

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .header("token", &self.token)
            .query(&[("skip", skip), ("limit", limit)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Source {
                vendor: self.kind,
                message: format!("API returned error: {}", status),
            });
        }

        let body: Value = response.json().await?;
        into_records(self.kind, body)
    }
}
