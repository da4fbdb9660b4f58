use std::cmp::Ordering;
use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::company::{CompanyRecord, Metric, SectorSummary};

/// Where the current row set came from. Exactly one applies per load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanySource {
    Search(String),
    All,
    Sector(String),
}

impl CompanySource {
    /// Search beats "show all", which beats a sector scope.
    pub fn resolve(search: Option<&str>, show_all: bool, sector: Option<&str>) -> Option<Self> {
        if let Some(query) = search.map(str::trim).filter(|q| !q.is_empty()) {
            return Some(CompanySource::Search(query.to_string()));
        }
        if show_all {
            return Some(CompanySource::All);
        }
        sector
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| CompanySource::Sector(s.to_string()))
    }

    pub fn label(&self) -> &'static str {
        match self {
            CompanySource::Search(_) => "search",
            CompanySource::All => "all",
            CompanySource::Sector(_) => "sector",
        }
    }
}

/// Loads the company collection for one source.
#[async_trait]
pub trait CompanyFeed: Send + Sync {
    async fn fetch_companies(&self, source: &CompanySource) -> anyhow::Result<Vec<CompanyRecord>>;
}

pub fn pe_ratio(trailing_pe: Option<&Metric>, forward_pe: Option<&Metric>) -> Option<f64> {
    let trailing = trailing_pe?.as_f64()?;
    let forward = forward_pe?.as_f64()?;
    if forward <= 0.0 {
        return None;
    }
    Some(trailing / forward).filter(|ratio| ratio.is_finite())
}

pub fn format_ratio(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.2}x"),
        None => "N/A".to_string(),
    }
}

/// Fills in the derived `pe_ratio` and its display string.
pub fn enrich(records: &mut [CompanyRecord]) {
    for record in records {
        let ratio = pe_ratio(record.trailing_pe.as_ref(), record.forward_pe.as_ref());
        record.pe_ratio = ratio;
        record.pe_ratio_fmt = Some(format_ratio(ratio));
    }
}

/// Numeric columns a range filter can bound, in the units the inputs use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    ForwardPe,
    TrailingPe,
    PeRatio,
    /// Billions of dollars
    MarketCap,
    /// Percent
    ProfitMargin,
    /// Percent
    RevenueGrowth,
}

impl FilterField {
    pub fn name(self) -> &'static str {
        match self {
            FilterField::ForwardPe => "forward_pe",
            FilterField::TrailingPe => "trailing_pe",
            FilterField::PeRatio => "pe_ratio",
            FilterField::MarketCap => "market_cap",
            FilterField::ProfitMargin => "profit_margin",
            FilterField::RevenueGrowth => "revenue_growth",
        }
    }

    pub fn value(self, record: &CompanyRecord) -> Option<f64> {
        let metric = |field: &Option<Metric>| field.as_ref().and_then(Metric::as_f64);
        match self {
            FilterField::ForwardPe => metric(&record.forward_pe),
            FilterField::TrailingPe => metric(&record.trailing_pe),
            FilterField::PeRatio => record.pe_ratio.filter(|v| v.is_finite()),
            FilterField::MarketCap => metric(&record.market_cap).map(|v| v / 1e9),
            FilterField::ProfitMargin => metric(&record.profit_margin).map(|v| v * 100.0),
            FilterField::RevenueGrowth => metric(&record.revenue_growth).map(|v| v * 100.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CriteriaError {
    #[error("{field}_{side} must be a number, got {input:?}")]
    InvalidBound {
        field: &'static str,
        side: &'static str,
        input: String,
    },
}

/// Inclusive bounds; `None` on a side means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Range {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Range {
    /// Parses text inputs. Empty or blank text leaves that side unset.
    pub fn parse(
        field: FilterField,
        min: Option<&str>,
        max: Option<&str>,
    ) -> Result<Self, CriteriaError> {
        Ok(Self {
            min: parse_bound(field, "min", min)?,
            max: parse_bound(field, "max", max)?,
        })
    }

    pub fn is_set(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    /// An unset range admits anything; a set one needs a value inside it.
    pub fn admits(&self, value: Option<f64>) -> bool {
        if !self.is_set() {
            return true;
        }
        let Some(value) = value else {
            return false;
        };
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

fn parse_bound(
    field: FilterField,
    side: &'static str,
    input: Option<&str>,
) -> Result<Option<f64>, CriteriaError> {
    let Some(text) = input.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| CriteriaError::InvalidBound {
            field: field.name(),
            side,
            input: text.to_string(),
        })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub sector: Option<String>,
    pub forward_pe: Range,
    pub trailing_pe: Range,
    pub pe_ratio: Range,
    pub market_cap: Range,
    pub profit_margin: Range,
    pub revenue_growth: Range,
}

impl FilterCriteria {
    fn ranges(&self) -> [(FilterField, &Range); 6] {
        [
            (FilterField::ForwardPe, &self.forward_pe),
            (FilterField::TrailingPe, &self.trailing_pe),
            (FilterField::PeRatio, &self.pe_ratio),
            (FilterField::MarketCap, &self.market_cap),
            (FilterField::ProfitMargin, &self.profit_margin),
            (FilterField::RevenueGrowth, &self.revenue_growth),
        ]
    }

    pub fn matches(&self, record: &CompanyRecord) -> bool {
        if let Some(sector) = self.sector.as_deref() {
            if record.sector != sector {
                return false;
            }
        }
        self.ranges()
            .into_iter()
            .all(|(field, range)| range.admits(field.value(record)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Ticker,
    CompanyName,
    Sector,
    #[default]
    ForwardPe,
    TrailingPe,
    PeRatio,
    MarketCap,
    ProfitMargin,
    RevenueGrowth,
    CurrentPrice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Re-selecting the active column flips it; a new column starts ascending.
    pub fn select(self, field: SortField) -> Self {
        if field == self.field {
            Self::new(field, self.direction.toggled())
        } else {
            Self::new(field, SortDirection::Asc)
        }
    }
}

/// A cell value as the comparator sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Missing,
    Number(f64),
    Text(String),
}

impl SortValue {
    fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return SortValue::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => SortValue::Number(value),
            _ => SortValue::Text(text.to_string()),
        }
    }

    fn from_metric(metric: Option<&Metric>) -> Self {
        match metric {
            None => SortValue::Missing,
            Some(Metric::Number(value)) if value.is_finite() => SortValue::Number(*value),
            Some(Metric::Number(_)) => SortValue::Missing,
            Some(Metric::Text(text)) => SortValue::from_text(text),
            Some(Metric::Other(_)) => SortValue::Missing,
        }
    }
}

impl SortField {
    pub fn value(self, record: &CompanyRecord) -> SortValue {
        match self {
            SortField::Ticker => SortValue::from_text(&record.ticker),
            SortField::CompanyName => SortValue::from_text(&record.company_name),
            SortField::Sector => SortValue::from_text(&record.sector),
            SortField::ForwardPe => SortValue::from_metric(record.forward_pe.as_ref()),
            SortField::TrailingPe => SortValue::from_metric(record.trailing_pe.as_ref()),
            SortField::PeRatio => match record.pe_ratio {
                Some(value) if value.is_finite() => SortValue::Number(value),
                _ => SortValue::Missing,
            },
            SortField::MarketCap => SortValue::from_metric(record.market_cap.as_ref()),
            SortField::ProfitMargin => SortValue::from_metric(record.profit_margin.as_ref()),
            SortField::RevenueGrowth => SortValue::from_metric(record.revenue_growth.as_ref()),
            SortField::CurrentPrice => SortValue::from_metric(record.current_price.as_ref()),
        }
    }
}

/// Missing values go last in either direction; the direction only reverses
/// the order among present values. Numbers sort before text, and text
/// compares case-insensitively with byte order breaking ties.
pub fn compare_values(a: &SortValue, b: &SortValue, direction: SortDirection) -> Ordering {
    let ordering = match (a, b) {
        (SortValue::Missing, SortValue::Missing) => return Ordering::Equal,
        (SortValue::Missing, _) => return Ordering::Greater,
        (_, SortValue::Missing) => return Ordering::Less,
        (SortValue::Number(x), SortValue::Number(y)) => x.total_cmp(y),
        (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
        (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
        (SortValue::Text(x), SortValue::Text(y)) => x
            .to_lowercase()
            .cmp(&y.to_lowercase())
            .then_with(|| x.cmp(y)),
    };
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Stable sort by the active column.
pub fn sort_records(records: &mut [CompanyRecord], spec: SortSpec) {
    records.sort_by(|a, b| {
        compare_values(&spec.field.value(a), &spec.field.value(b), spec.direction)
    });
}

/// Distinct sectors present in the loaded rows, sorted.
pub fn sector_options(records: &[CompanyRecord]) -> Vec<String> {
    records
        .iter()
        .filter(|record| !record.sector.is_empty())
        .map(|record| record.sector.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Output of one enrich/filter/sort pass.
#[derive(Debug, Clone, Default)]
pub struct ScreenerTable {
    pub sectors: Vec<String>,
    pub rows: Vec<CompanyRecord>,
}

impl ScreenerTable {
    pub fn build(mut records: Vec<CompanyRecord>, criteria: &FilterCriteria, sort: SortSpec) -> Self {
        enrich(&mut records);
        let sectors = sector_options(&records);

        let mut rows: Vec<CompanyRecord> = records
            .into_iter()
            .filter(|record| criteria.matches(record))
            .collect();
        sort_records(&mut rows, sort);

        Self { sectors, rows }
    }
}

pub fn sector_summaries(records: &[CompanyRecord]) -> Vec<SectorSummary> {
    sector_options(records)
        .into_iter()
        .map(|sector| {
            let members: Vec<&CompanyRecord> =
                records.iter().filter(|r| r.sector == sector).collect();
            let mut pes: Vec<f64> = members
                .iter()
                .filter_map(|r| FilterField::ForwardPe.value(r))
                .collect();
            let caps: Vec<f64> = members
                .iter()
                .filter_map(|r| r.market_cap.as_ref().and_then(Metric::as_f64))
                .collect();

            pes.sort_by(f64::total_cmp);
            let total_market_cap: f64 = caps.iter().sum();

            SectorSummary {
                name: sector,
                count: members.len(),
                avg_forward_pe: mean(&pes).map(round2),
                median_forward_pe: median(&pes).map(round2),
                total_market_cap,
                total_market_cap_fmt: if caps.is_empty() {
                    "N/A".to_string()
                } else {
                    format!("${:.2}T", total_market_cap / 1e12)
                },
            }
        })
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Expects sorted input.
fn median(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2]),
        _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
