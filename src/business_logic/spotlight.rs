use std::str::FromStr;

use crate::business_logic::screener::enrich;
use crate::models::company::{CompanyRecord, Metric, SpotlightCategoryResponse};

/// Rows shown per category on the overview.
pub const OVERVIEW_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Measure {
    ForwardPe,
    PeRatio,
    MarketCap,
    ProfitMargin,
    RevenueGrowth,
    YearChange,
    DividendYield,
    Beta,
}

impl Measure {
    fn read(self, record: &CompanyRecord) -> Option<f64> {
        let metric = |field: &Option<Metric>| field.as_ref().and_then(Metric::as_f64);
        match self {
            Measure::ForwardPe => metric(&record.forward_pe),
            Measure::PeRatio => record.pe_ratio.filter(|v| v.is_finite()),
            Measure::MarketCap => metric(&record.market_cap),
            Measure::ProfitMargin => metric(&record.profit_margin),
            Measure::RevenueGrowth => metric(&record.revenue_growth),
            Measure::YearChange => metric(&record.year_change),
            Measure::DividendYield => metric(&record.dividend_yield),
            Measure::Beta => metric(&record.beta),
        }
    }

    fn above(self, record: &CompanyRecord, floor: f64) -> bool {
        self.read(record).is_some_and(|v| v > floor)
    }

    fn below(self, record: &CompanyRecord, ceiling: f64) -> bool {
        self.read(record).is_some_and(|v| v < ceiling)
    }
}

/// Fixed fundamental screens. Thresholds are in upstream units (fractions,
/// dollars).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpotlightCategory {
    GrowthStocks,
    HotStocks,
    ValuePlays,
    MomentumLeaders,
    QualityGems,
    DividendChampions,
    LowVolatility,
    MegaCaps,
    TurnaroundPlays,
    HighBetaMovers,
}

impl SpotlightCategory {
    pub const ALL: [SpotlightCategory; 10] = [
        SpotlightCategory::GrowthStocks,
        SpotlightCategory::HotStocks,
        SpotlightCategory::ValuePlays,
        SpotlightCategory::MomentumLeaders,
        SpotlightCategory::QualityGems,
        SpotlightCategory::DividendChampions,
        SpotlightCategory::LowVolatility,
        SpotlightCategory::MegaCaps,
        SpotlightCategory::TurnaroundPlays,
        SpotlightCategory::HighBetaMovers,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SpotlightCategory::GrowthStocks => "growth_stocks",
            SpotlightCategory::HotStocks => "hot_stocks",
            SpotlightCategory::ValuePlays => "value_plays",
            SpotlightCategory::MomentumLeaders => "momentum_leaders",
            SpotlightCategory::QualityGems => "quality_gems",
            SpotlightCategory::DividendChampions => "dividend_champions",
            SpotlightCategory::LowVolatility => "low_volatility",
            SpotlightCategory::MegaCaps => "mega_caps",
            SpotlightCategory::TurnaroundPlays => "turnaround_plays",
            SpotlightCategory::HighBetaMovers => "high_beta_movers",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SpotlightCategory::GrowthStocks => "Growth Stocks",
            SpotlightCategory::HotStocks => "Hot Stocks",
            SpotlightCategory::ValuePlays => "Value Plays",
            SpotlightCategory::MomentumLeaders => "Momentum Leaders",
            SpotlightCategory::QualityGems => "Quality Gems",
            SpotlightCategory::DividendChampions => "Dividend Champions",
            SpotlightCategory::LowVolatility => "Low Volatility",
            SpotlightCategory::MegaCaps => "Mega Caps",
            SpotlightCategory::TurnaroundPlays => "Turnaround Plays",
            SpotlightCategory::HighBetaMovers => "High Beta Movers",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SpotlightCategory::GrowthStocks => {
                "High revenue growth (>15%) with positive 52-week momentum"
            }
            SpotlightCategory::HotStocks => "Strongest 52-week performance (>20% gains)",
            SpotlightCategory::ValuePlays => "Low forward P/E (<15) with expected earnings growth",
            SpotlightCategory::MomentumLeaders => "P/E ratio >1.2x indicating earnings acceleration",
            SpotlightCategory::QualityGems => {
                "High profit margins (>15%) with solid revenue growth (>5%)"
            }
            SpotlightCategory::DividendChampions => "High dividend yield (>3%) for income investors",
            SpotlightCategory::LowVolatility => "Stable stocks with beta <0.8",
            SpotlightCategory::MegaCaps => "Largest companies with market cap >$200B",
            SpotlightCategory::TurnaroundPlays => "Down >10% over the year but still profitable",
            SpotlightCategory::HighBetaMovers => "High volatility stocks (beta >1.5)",
        }
    }

    /// Comparisons against a missing value are false.
    pub fn admits(self, record: &CompanyRecord) -> bool {
        use Measure::*;
        match self {
            SpotlightCategory::GrowthStocks => {
                RevenueGrowth.above(record, 0.15) && YearChange.above(record, 0.0)
            }
            SpotlightCategory::HotStocks => YearChange.above(record, 0.20),
            SpotlightCategory::ValuePlays => {
                ForwardPe.above(record, 0.0)
                    && ForwardPe.below(record, 15.0)
                    && PeRatio.above(record, 1.0)
            }
            SpotlightCategory::MomentumLeaders => PeRatio.above(record, 1.2),
            SpotlightCategory::QualityGems => {
                ProfitMargin.above(record, 0.15) && RevenueGrowth.above(record, 0.05)
            }
            SpotlightCategory::DividendChampions => DividendYield.above(record, 0.03),
            SpotlightCategory::LowVolatility => Beta.above(record, 0.0) && Beta.below(record, 0.8),
            SpotlightCategory::MegaCaps => MarketCap.above(record, 200e9),
            SpotlightCategory::TurnaroundPlays => {
                YearChange.below(record, -0.10) && ForwardPe.above(record, 0.0)
            }
            SpotlightCategory::HighBetaMovers => Beta.above(record, 1.5),
        }
    }

    /// (measure, ascending)
    fn ordering(self) -> (Measure, bool) {
        match self {
            SpotlightCategory::GrowthStocks => (Measure::RevenueGrowth, false),
            SpotlightCategory::HotStocks => (Measure::YearChange, false),
            SpotlightCategory::ValuePlays => (Measure::ForwardPe, true),
            SpotlightCategory::MomentumLeaders => (Measure::PeRatio, false),
            SpotlightCategory::QualityGems => (Measure::ProfitMargin, false),
            SpotlightCategory::DividendChampions => (Measure::DividendYield, false),
            SpotlightCategory::LowVolatility => (Measure::Beta, true),
            SpotlightCategory::MegaCaps => (Measure::MarketCap, false),
            SpotlightCategory::TurnaroundPlays => (Measure::YearChange, true),
            SpotlightCategory::HighBetaMovers => (Measure::Beta, false),
        }
    }

    /// Every admitted record, sorted by the category's measure. Expects
    /// enriched records.
    pub fn select(self, records: &[CompanyRecord]) -> Vec<CompanyRecord> {
        let (measure, ascending) = self.ordering();
        let mut picked: Vec<CompanyRecord> = records
            .iter()
            .filter(|record| self.admits(record))
            .cloned()
            .collect();
        picked.sort_by(|a, b| {
            // admitted records always carry the measure
            let (x, y) = (
                measure.read(a).unwrap_or(f64::NAN),
                measure.read(b).unwrap_or(f64::NAN),
            );
            if ascending {
                x.total_cmp(&y)
            } else {
                y.total_cmp(&x)
            }
        });
        picked
    }
}

impl FromStr for SpotlightCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().replace('-', "_");
        SpotlightCategory::ALL
            .into_iter()
            .find(|category| category.key() == normalized)
            .ok_or_else(|| format!("Unknown category: {value}"))
    }
}

fn response(
    category: SpotlightCategory,
    matches: Vec<CompanyRecord>,
    limit: Option<usize>,
) -> SpotlightCategoryResponse {
    let count = matches.len();
    let companies = match limit {
        Some(limit) => matches.into_iter().take(limit).collect(),
        None => matches,
    };
    SpotlightCategoryResponse {
        category: category.key().to_string(),
        title: category.title().to_string(),
        description: category.description().to_string(),
        count,
        companies,
    }
}

/// Top rows of every category. `count` is the full number of matches.
pub fn overview(mut records: Vec<CompanyRecord>) -> Vec<SpotlightCategoryResponse> {
    enrich(&mut records);
    SpotlightCategory::ALL
        .into_iter()
        .map(|category| response(category, category.select(&records), Some(OVERVIEW_LIMIT)))
        .collect()
}

pub fn category_listing(
    category: SpotlightCategory,
    mut records: Vec<CompanyRecord>,
) -> SpotlightCategoryResponse {
    enrich(&mut records);
    response(category, category.select(&records), None)
}
