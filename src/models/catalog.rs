use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::pattern::{PatternRecord, Signal};

/// Counts supplied by the upstream scan; passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CatalogSummary {
    pub total_patterns: u64,
    pub bullish_patterns: u64,
    pub bearish_patterns: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogBucket {
    pub name: String,
    pub signal: Option<String>,
    pub count: usize,
    pub patterns: Vec<PatternRecord>,
}

/// Whole-catalog scan result. Bucket order is the upstream key order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatternCatalog {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub summary: CatalogSummary,
    #[serde(default, deserialize_with = "ordered_buckets")]
    pub pattern_types: Vec<(String, CatalogBucket)>,
}

fn ordered_buckets<'de, D>(deserializer: D) -> Result<Vec<(String, CatalogBucket)>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: serde_json::Map<String, serde_json::Value> = Deserialize::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(kind, bucket)| {
            serde_json::from_value(bucket)
                .map(|bucket| (kind.clone(), bucket))
                .map_err(|err| D::Error::custom(format!("pattern_types.{kind}: {err}")))
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema, IntoParams)]
pub struct CatalogQuery {
    /// `all`, `bullish`, `bearish` or a pattern kind such as `double_top`.
    #[validate(length(max = 64))]
    #[param(example = "bullish")]
    pub selector: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CatalogTab {
    pub kind: String,
    pub name: String,
    pub signal: Option<Signal>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogResponse {
    pub as_of_ms: u64,
    pub title: String,
    pub description: String,
    pub summary: CatalogSummary,
    pub tabs: Vec<CatalogTab>,
    pub selector: String,
    pub count: usize,
    #[schema(value_type = Vec<Object>)]
    pub patterns: Vec<PatternRecord>,
}
