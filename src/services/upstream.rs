use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;

use crate::business_logic::aggregator::PatternSource;
use crate::business_logic::screener::{CompanyFeed, CompanySource};
use crate::config::{UPSTREAM_TIMEOUT_SECS, UPSTREAM_URL};
use crate::models::catalog::PatternCatalog;
use crate::models::company::{CompanyEnvelope, CompanyRecord};
use crate::models::pattern::{PatternKind, PatternRecord};

/// HTTP client for the detector and fundamentals API.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build upstream http client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/api/<segments...>` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid upstream url {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("upstream url cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> anyhow::Result<T> {
        tracing::debug!("GET {}", url);
        self.client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("{url} returned an error status"))?
            .json::<T>()
            .await
            .with_context(|| format!("could not decode response from {url}"))
    }

    /// Every detected pattern, grouped by kind.
    pub async fn fetch_catalog(&self) -> anyhow::Result<PatternCatalog> {
        let url = self.endpoint(&["patterns", "all"])?;
        self.get_json(url).await.context("failed to fetch pattern catalog")
    }
}

#[async_trait]
impl PatternSource for UpstreamClient {
    async fn fetch_pattern(&self, kind: PatternKind, symbol: &str) -> anyhow::Result<PatternRecord> {
        let url = self.endpoint(&["patterns", kind.as_str(), symbol])?;
        self.get_json(url)
            .await
            .with_context(|| format!("failed to fetch {kind} for {symbol}"))
    }
}

#[async_trait]
impl CompanyFeed for UpstreamClient {
    async fn fetch_companies(&self, source: &CompanySource) -> anyhow::Result<Vec<CompanyRecord>> {
        let url = match source {
            CompanySource::All => self.endpoint(&["companies"])?,
            CompanySource::Sector(sector) => self.endpoint(&["companies", sector.as_str()])?,
            CompanySource::Search(query) => {
                let mut url = self.endpoint(&["search"])?;
                url.query_pairs_mut().append_pair("q", query);
                url
            }
        };
        let envelope: CompanyEnvelope = self
            .get_json(url)
            .await
            .with_context(|| format!("failed to load companies ({})", source.label()))?;
        Ok(envelope.data)
    }
}

impl Default for UpstreamClient {
    fn default() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            base_url: UPSTREAM_URL.to_string(),
        }
    }
}
