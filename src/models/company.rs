use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::business_logic::screener::{SortDirection, SortField};

/// A fundamentals value as delivered upstream: a number, a string that may
/// or may not hold a number, or anything else (never numeric).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum Metric {
    Number(f64),
    Text(String),
    Other(Value),
}

impl Metric {
    /// The finite numeric reading, if there is one.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Metric::Number(value) => *value,
            Metric::Text(text) => text.trim().parse::<f64>().ok()?,
            Metric::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for Metric {
    fn from(value: f64) -> Self {
        Metric::Number(value)
    }
}

impl From<&str> for Metric {
    fn from(value: &str) -> Self {
        Metric::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CompanyRecord {
    #[serde(default, alias = "symbol", deserialize_with = "lenient_text")]
    pub ticker: String,
    #[serde(default, alias = "name", deserialize_with = "lenient_text")]
    pub company_name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub sector: String,
    #[serde(default)]
    pub forward_pe: Option<Metric>,
    #[serde(default)]
    pub trailing_pe: Option<Metric>,
    /// Trailing P/E over forward P/E; computed here, never taken from upstream
    #[serde(default, skip_deserializing)]
    pub pe_ratio: Option<f64>,
    #[serde(default, skip_deserializing)]
    pub pe_ratio_fmt: Option<String>,
    #[serde(default)]
    pub market_cap: Option<Metric>,
    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub market_cap_fmt: Option<String>,
    /// Fraction, e.g. 0.25 for 25%
    #[serde(default)]
    pub profit_margin: Option<Metric>,
    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub profit_margin_fmt: Option<String>,
    /// Fraction, e.g. 0.08 for 8%
    #[serde(default)]
    pub revenue_growth: Option<Metric>,
    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub revenue_growth_fmt: Option<String>,
    #[serde(default)]
    pub current_price: Option<Metric>,
    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub current_price_fmt: Option<String>,
    #[serde(default)]
    pub year_change: Option<Metric>,
    #[serde(default)]
    pub dividend_yield: Option<Metric>,
    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub dividend_yield_fmt: Option<String>,
    #[serde(default)]
    pub beta: Option<Metric>,
}

/// Upstream envelope shared by the sector, all and search reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyEnvelope {
    #[serde(default, deserialize_with = "lenient_rows")]
    pub data: Vec<CompanyRecord>,
}

/// Strings pass through, numbers are rendered, anything else reads as empty.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_optional_text(deserializer)?.unwrap_or_default())
}

fn lenient_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

/// Rows that are not company objects are logged and dropped; the rest load.
fn lenient_rows<'de, D>(deserializer: D) -> Result<Vec<CompanyRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows: Vec<Value> = Deserialize::deserialize(deserializer)?;
    Ok(rows
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| match serde_json::from_value(row) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!("skipping company row {}: {}", index, err);
                None
            }
        })
        .collect())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema, IntoParams)]
pub struct CompanyQuery {
    /// Search text; takes precedence over `all` and `sector`.
    #[validate(length(max = 64))]
    pub q: Option<String>,
    /// Load every company; takes precedence over `sector`.
    #[serde(default)]
    pub all: bool,
    /// Load a single sector.
    #[validate(length(min = 1, max = 64))]
    #[param(example = "Information Technology")]
    pub sector: Option<String>,
    /// Sector equality filter applied after loading.
    pub filter_sector: Option<String>,
    pub forward_pe_min: Option<String>,
    pub forward_pe_max: Option<String>,
    pub trailing_pe_min: Option<String>,
    pub trailing_pe_max: Option<String>,
    pub pe_ratio_min: Option<String>,
    pub pe_ratio_max: Option<String>,
    /// Billions
    pub market_cap_min: Option<String>,
    /// Billions
    pub market_cap_max: Option<String>,
    /// Percent
    pub profit_margin_min: Option<String>,
    /// Percent
    pub profit_margin_max: Option<String>,
    /// Percent
    pub revenue_growth_min: Option<String>,
    /// Percent
    pub revenue_growth_max: Option<String>,
    pub sort_by: Option<SortField>,
    pub order: Option<SortDirection>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompanyListResponse {
    /// Which upstream read produced the rows: `search`, `all` or `sector`
    pub source: String,
    /// Sector dropdown options drawn from the loaded (unfiltered) rows
    pub sectors: Vec<String>,
    pub count: usize,
    pub data: Vec<CompanyRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SectorSummary {
    pub name: String,
    pub count: usize,
    pub avg_forward_pe: Option<f64>,
    pub median_forward_pe: Option<f64>,
    pub total_market_cap: f64,
    pub total_market_cap_fmt: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SpotlightCategoryResponse {
    pub category: String,
    pub title: String,
    pub description: String,
    pub count: usize,
    pub companies: Vec<CompanyRecord>,
}
