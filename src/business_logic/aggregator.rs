use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;

use crate::models::pattern::{PatternKind, PatternRecord};

/// Reads one detector result keyed by (kind, symbol).
#[async_trait]
pub trait PatternSource: Send + Sync {
    async fn fetch_pattern(&self, kind: PatternKind, symbol: &str)
        -> anyhow::Result<PatternRecord>;
}

/// Fans out one read per pattern kind for a symbol and ranks what was detected.
#[derive(Clone)]
pub struct PatternAggregator {
    source: Arc<dyn PatternSource>,
    /// Per-read bound; a read that exceeds it counts as not detected
    read_timeout: Option<Duration>,
}

impl PatternAggregator {
    pub fn new(source: Arc<dyn PatternSource>, read_timeout: Option<Duration>) -> Self {
        Self {
            source,
            read_timeout,
        }
    }

    /// Waits for every kind to settle, drops failures and misses, and sorts by
    /// confidence descending. Equal scores keep `PatternKind::ALL` order.
    pub async fn aggregate_for_symbol(&self, symbol: &str) -> Vec<PatternRecord> {
        let reads = PatternKind::ALL
            .into_iter()
            .map(|kind| self.read(kind, symbol));
        let outcomes = join_all(reads).await;

        let mut detected: Vec<PatternRecord> = outcomes
            .into_iter()
            .flatten()
            .filter(|record| record.detected)
            .collect();
        rank_by_confidence(&mut detected);

        tracing::debug!(
            "{}: {} of {} detectors reported a pattern",
            symbol,
            detected.len(),
            PatternKind::ALL.len()
        );
        detected
    }

    async fn read(&self, kind: PatternKind, symbol: &str) -> Option<PatternRecord> {
        let fetch = self.source.fetch_pattern(kind, symbol);
        let outcome = match self.read_timeout {
            Some(limit) => match tokio::time::timeout(limit, fetch).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!("{} read for {} timed out after {:?}", kind, symbol, limit);
                    return None;
                }
            },
            None => fetch.await,
        };

        match outcome {
            Ok(mut record) => {
                if record.pattern_type.is_empty() {
                    record.pattern_type = kind.as_str().to_string();
                }
                if record.ticker.is_empty() {
                    record.ticker = symbol.to_uppercase();
                }
                Some(record)
            }
            Err(error) => {
                tracing::warn!("{} read for {} failed: {:#}", kind, symbol, error);
                None
            }
        }
    }
}

/// Stable sort, highest confidence first; absent confidence counts as zero.
pub fn rank_by_confidence(records: &mut [PatternRecord]) {
    records.sort_by(|a, b| b.score().total_cmp(&a.score()));
}
