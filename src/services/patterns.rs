use std::sync::Arc;

use anyhow::Context;

use crate::business_logic::aggregator::{PatternAggregator, PatternSource};
use crate::business_logic::catalog::{CatalogBuilder, CatalogSelector};
use crate::business_logic::geometry::view_for;
use crate::models::annotation::{PatternView, SymbolPatterns};
use crate::models::catalog::CatalogResponse;
use crate::models::pattern::PatternKind;
use crate::services::upstream::UpstreamClient;

pub struct PatternService {
    client: Arc<UpstreamClient>,
    aggregator: PatternAggregator,
}

impl PatternService {
    pub fn new(client: Arc<UpstreamClient>, aggregator: PatternAggregator) -> Self {
        Self { client, aggregator }
    }

    pub async fn fetch_view(&self, kind: PatternKind, symbol: &str) -> anyhow::Result<PatternView> {
        let mut record = self
            .client
            .fetch_pattern(kind, symbol)
            .await
            .context("failed to fetch pattern")?;
        if record.pattern_type.is_empty() {
            record.pattern_type = kind.as_str().to_string();
        }
        Ok(view_for(record))
    }

    /// Ranked views of every pattern detected for a symbol. Never fails;
    /// detector errors only shrink the list.
    pub async fn symbol_patterns(&self, symbol: &str) -> SymbolPatterns {
        let symbol = normalize_symbol(symbol);
        let records = self.aggregator.aggregate_for_symbol(&symbol).await;
        SymbolPatterns {
            as_of_ms: now_ms(),
            symbol,
            count: records.len(),
            patterns: records.into_iter().map(view_for).collect(),
        }
    }

    pub async fn catalog(&self, selector: &CatalogSelector) -> anyhow::Result<CatalogResponse> {
        let catalog = self
            .client
            .fetch_catalog()
            .await
            .context("failed to load catalog")?;
        let builder = CatalogBuilder::new(&catalog);
        let patterns = builder.filtered(selector);

        Ok(CatalogResponse {
            as_of_ms: now_ms(),
            title: catalog.title.clone(),
            description: catalog.description.clone(),
            summary: builder.summary().clone(),
            tabs: builder.tabs(),
            selector: selector.to_string(),
            count: patterns.len(),
            patterns,
        })
    }
}

fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}
