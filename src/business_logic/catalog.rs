use std::fmt;
use std::str::FromStr;

use crate::business_logic::aggregator::rank_by_confidence;
use crate::business_logic::registry::descriptor_for;
use crate::models::catalog::{CatalogBucket, CatalogSummary, CatalogTab, PatternCatalog};
use crate::models::pattern::{PatternRecord, Signal};

/// Which slice of the catalog a table shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSelector {
    All,
    Signal(Signal),
    /// A single bucket, exactly as supplied (not re-ranked)
    Kind(String),
}

impl FromStr for CatalogSelector {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value.trim() {
            "" | "all" => CatalogSelector::All,
            "bullish" => CatalogSelector::Signal(Signal::Bullish),
            "bearish" => CatalogSelector::Signal(Signal::Bearish),
            kind => CatalogSelector::Kind(kind.replace('-', "_")),
        })
    }
}

impl fmt::Display for CatalogSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSelector::All => f.write_str("all"),
            CatalogSelector::Signal(signal) => f.write_str(signal.as_str()),
            CatalogSelector::Kind(kind) => f.write_str(kind),
        }
    }
}

/// Read-only views over a pre-fetched catalog.
///
/// The catalog's keys are the kinds the upstream scan *has*; they are not
/// checked against `PatternKind::ALL`, the kinds the aggregator *asks for*.
/// A key this build doesn't know still gets a tab and a bucket.
pub struct CatalogBuilder<'a> {
    catalog: &'a PatternCatalog,
}

impl<'a> CatalogBuilder<'a> {
    pub fn new(catalog: &'a PatternCatalog) -> Self {
        Self { catalog }
    }

    /// Every bucket flattened in key order, then ranked by confidence.
    pub fn all_patterns(&self) -> Vec<PatternRecord> {
        let mut records: Vec<PatternRecord> = self
            .catalog
            .pattern_types
            .iter()
            .flat_map(|(kind, bucket)| bucket_records(kind, bucket))
            .collect();
        rank_by_confidence(&mut records);
        records
    }

    pub fn filtered(&self, selector: &CatalogSelector) -> Vec<PatternRecord> {
        match selector {
            CatalogSelector::All => self.all_patterns(),
            CatalogSelector::Signal(signal) => self
                .all_patterns()
                .into_iter()
                .filter(|record| {
                    descriptor_for(&record.pattern_type)
                        .is_some_and(|descriptor| descriptor.signal == *signal)
                })
                .collect(),
            CatalogSelector::Kind(kind) => self
                .catalog
                .pattern_types
                .iter()
                .find(|(key, _)| key == kind)
                .map(|(key, bucket)| bucket_records(key, bucket).collect())
                .unwrap_or_default(),
        }
    }

    pub fn tabs(&self) -> Vec<CatalogTab> {
        self.catalog
            .pattern_types
            .iter()
            .map(|(kind, bucket)| match descriptor_for(kind) {
                Some(descriptor) => CatalogTab {
                    kind: kind.clone(),
                    name: descriptor.name.to_string(),
                    signal: Some(descriptor.signal),
                    count: bucket.count,
                },
                None => CatalogTab {
                    kind: kind.clone(),
                    name: if bucket.name.is_empty() {
                        kind.clone()
                    } else {
                        bucket.name.clone()
                    },
                    signal: bucket.signal.as_deref().and_then(parse_signal),
                    count: bucket.count,
                },
            })
            .collect()
    }

    pub fn summary(&self) -> &CatalogSummary {
        &self.catalog.summary
    }
}

/// Bucket records with their kind filled in from the bucket key when absent.
fn bucket_records<'b>(
    kind: &'b str,
    bucket: &'b CatalogBucket,
) -> impl Iterator<Item = PatternRecord> + 'b {
    bucket.patterns.iter().map(move |record| {
        let mut record = record.clone();
        if record.pattern_type.is_empty() {
            record.pattern_type = kind.to_string();
        }
        record
    })
}

fn parse_signal(value: &str) -> Option<Signal> {
    match value {
        "bullish" => Some(Signal::Bullish),
        "bearish" => Some(Signal::Bearish),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> PatternCatalog {
        serde_json::from_value(json!({
            "title": "Technical Patterns Dashboard",
            "description": "All detected chart patterns",
            "summary": { "total_patterns": 5, "bullish_patterns": 3, "bearish_patterns": 2 },
            "pattern_types": {
                "double_top": {
                    "name": "Double Top", "signal": "bearish", "count": 2,
                    "patterns": [
                        { "ticker": "AAPL", "detected": true, "confidence": 80 },
                        { "ticker": "MSFT", "detected": true, "confidence": 60 }
                    ]
                },
                "bullish_flag": {
                    "name": "Bullish Flag", "signal": "bullish", "count": 2,
                    "patterns": [
                        { "ticker": "NVDA", "detected": true, "confidence": 95 },
                        { "ticker": "AMD", "detected": true }
                    ]
                },
                "diamond_top": {
                    "name": "Diamond Top", "signal": "bearish", "count": 1,
                    "patterns": [
                        { "ticker": "IBM", "detected": true, "confidence": 70 }
                    ]
                }
            }
        }))
        .unwrap()
    }

    fn tickers(records: &[PatternRecord]) -> Vec<&str> {
        records.iter().map(|r| r.ticker.as_str()).collect()
    }

    #[test]
    fn all_patterns_ranks_across_buckets() {
        let catalog = catalog();
        let records = CatalogBuilder::new(&catalog).all_patterns();
        let scores: Vec<f64> = records.iter().map(PatternRecord::score).collect();
        assert_eq!(scores, vec![95.0, 80.0, 70.0, 60.0, 0.0]);
        assert_eq!(records[0].pattern_type, "bullish_flag");
    }

    #[test]
    fn signal_selectors_use_registry_signal() {
        let catalog = catalog();
        let builder = CatalogBuilder::new(&catalog);

        let bullish = builder.filtered(&"bullish".parse().unwrap());
        assert_eq!(tickers(&bullish), vec!["NVDA", "AMD"]);

        // the unknown diamond_top bucket has no descriptor, so no signal
        let bearish = builder.filtered(&"bearish".parse().unwrap());
        assert_eq!(tickers(&bearish), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn kind_selector_returns_the_raw_bucket() {
        let mut catalog = catalog();
        catalog.pattern_types[1].1.patterns.reverse();
        let builder = CatalogBuilder::new(&catalog);

        let flags = builder.filtered(&CatalogSelector::Kind("bullish_flag".to_string()));
        assert_eq!(tickers(&flags), vec!["AMD", "NVDA"]);

        let ranked = builder.filtered(&CatalogSelector::All);
        assert_eq!(ranked[0].ticker, "NVDA");
    }

    #[test]
    fn kind_selector_accepts_kebab_case_and_misses_are_empty() {
        let catalog = catalog();
        let builder = CatalogBuilder::new(&catalog);
        assert_eq!(builder.filtered(&"double-top".parse().unwrap()).len(), 2);
        assert!(builder.filtered(&"triple_top".parse().unwrap()).is_empty());
    }

    #[test]
    fn tabs_follow_catalog_keys() {
        let catalog = catalog();
        let tabs = CatalogBuilder::new(&catalog).tabs();
        let kinds: Vec<&str> = tabs.iter().map(|t| t.kind.as_str()).collect();
        assert_eq!(kinds, vec!["double_top", "bullish_flag", "diamond_top"]);
        assert_eq!(tabs[0].name, "Double Top");
        assert_eq!(tabs[1].signal, Some(Signal::Bullish));
        assert_eq!(tabs[2].name, "Diamond Top");
        assert_eq!(tabs[2].signal, Some(Signal::Bearish));
        assert_eq!(tabs[2].count, 1);
    }

    #[test]
    fn summary_passes_through() {
        let catalog = catalog();
        let summary = CatalogBuilder::new(&catalog).summary().clone();
        assert_eq!(summary.total_patterns, 5);
        assert_eq!(summary.bearish_patterns, 2);
    }

    #[test]
    fn selector_display_round_trips() {
        for text in ["all", "bullish", "bearish", "cup_and_handle"] {
            let selector: CatalogSelector = text.parse().unwrap();
            assert_eq!(selector.to_string(), text);
        }
    }
}
