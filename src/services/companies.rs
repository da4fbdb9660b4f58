use std::sync::Arc;

use anyhow::Context;

use crate::business_logic::screener::{
    sector_summaries, CompanyFeed, CompanySource, CriteriaError, FilterCriteria, FilterField,
    Range, ScreenerTable, SortSpec,
};
use crate::business_logic::spotlight::{self, SpotlightCategory};
use crate::models::company::{
    CompanyListResponse, CompanyQuery, CompanyRecord, SectorSummary, SpotlightCategoryResponse,
};

pub struct CompanyService {
    feed: Arc<dyn CompanyFeed>,
}

impl CompanyService {
    pub fn new(feed: Arc<dyn CompanyFeed>) -> Self {
        Self { feed }
    }

    /// Loads the collection for `source`, then enriches, filters and sorts it.
    /// With no source there is nothing to load and the table is empty.
    pub async fn list(
        &self,
        source: Option<CompanySource>,
        criteria: &FilterCriteria,
        sort: SortSpec,
    ) -> anyhow::Result<CompanyListResponse> {
        let Some(source) = source else {
            return Ok(CompanyListResponse {
                source: "none".to_string(),
                sectors: Vec::new(),
                count: 0,
                data: Vec::new(),
            });
        };

        let records = self.load(&source).await?;
        let loaded = records.len();
        let table = ScreenerTable::build(records, criteria, sort);
        tracing::info!(
            "{} load: {} rows, {} after filters",
            source.label(),
            loaded,
            table.rows.len()
        );

        Ok(CompanyListResponse {
            source: source.label().to_string(),
            sectors: table.sectors,
            count: table.rows.len(),
            data: table.rows,
        })
    }

    pub async fn sectors(&self) -> anyhow::Result<Vec<SectorSummary>> {
        let records = self.load(&CompanySource::All).await?;
        Ok(sector_summaries(&records))
    }

    pub async fn spotlight(&self) -> anyhow::Result<Vec<SpotlightCategoryResponse>> {
        let records = self.load(&CompanySource::All).await?;
        Ok(spotlight::overview(records))
    }

    pub async fn spotlight_category(
        &self,
        category: SpotlightCategory,
    ) -> anyhow::Result<SpotlightCategoryResponse> {
        let records = self.load(&CompanySource::All).await?;
        Ok(spotlight::category_listing(category, records))
    }

    async fn load(&self, source: &CompanySource) -> anyhow::Result<Vec<CompanyRecord>> {
        self.feed
            .fetch_companies(source)
            .await
            .context("failed to load company collection")
    }
}

/// Reads the range inputs and the post-load sector filter from a query.
pub fn criteria_from_query(query: &CompanyQuery) -> Result<FilterCriteria, CriteriaError> {
    let range = |field, min: &Option<String>, max: &Option<String>| {
        Range::parse(field, min.as_deref(), max.as_deref())
    };

    Ok(FilterCriteria {
        sector: query
            .filter_sector
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        forward_pe: range(FilterField::ForwardPe, &query.forward_pe_min, &query.forward_pe_max)?,
        trailing_pe: range(FilterField::TrailingPe, &query.trailing_pe_min, &query.trailing_pe_max)?,
        pe_ratio: range(FilterField::PeRatio, &query.pe_ratio_min, &query.pe_ratio_max)?,
        market_cap: range(FilterField::MarketCap, &query.market_cap_min, &query.market_cap_max)?,
        profit_margin: range(
            FilterField::ProfitMargin,
            &query.profit_margin_min,
            &query.profit_margin_max,
        )?,
        revenue_growth: range(
            FilterField::RevenueGrowth,
            &query.revenue_growth_min,
            &query.revenue_growth_max,
        )?,
    })
}

pub fn sort_from_query(query: &CompanyQuery) -> SortSpec {
    let default = SortSpec::default();
    SortSpec::new(
        query.sort_by.unwrap_or(default.field),
        query.order.unwrap_or(default.direction),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business_logic::screener::{SortDirection, SortField};
    use crate::models::company::Metric;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeFeed {
        rows: Vec<CompanyRecord>,
        fails: bool,
        requests: Mutex<Vec<CompanySource>>,
    }

    #[async_trait]
    impl CompanyFeed for FakeFeed {
        async fn fetch_companies(
            &self,
            source: &CompanySource,
        ) -> anyhow::Result<Vec<CompanyRecord>> {
            self.requests.lock().unwrap().push(source.clone());
            if self.fails {
                anyhow::bail!("503 Service Unavailable");
            }
            Ok(self.rows.clone())
        }
    }

    fn company(ticker: &str, sector: &str, trailing: f64, forward: f64) -> CompanyRecord {
        CompanyRecord {
            ticker: ticker.to_string(),
            sector: sector.to_string(),
            trailing_pe: Some(Metric::Number(trailing)),
            forward_pe: Some(Metric::Number(forward)),
            ..Default::default()
        }
    }

    fn service(feed: FakeFeed) -> (Arc<FakeFeed>, CompanyService) {
        let feed = Arc::new(feed);
        (feed.clone(), CompanyService::new(feed))
    }

    #[tokio::test]
    async fn list_enriches_filters_and_sorts_the_loaded_rows() {
        let (feed, service) = service(FakeFeed {
            rows: vec![
                company("A", "Tech", 30.0, 20.0),
                company("B", "Health", 18.0, 18.0),
                company("C", "Tech", 12.0, 8.0),
            ],
            ..Default::default()
        });
        let criteria = FilterCriteria {
            sector: Some("Tech".to_string()),
            ..Default::default()
        };

        let response = service
            .list(Some(CompanySource::All), &criteria, SortSpec::default())
            .await
            .unwrap();

        assert_eq!(response.source, "all");
        assert_eq!(response.sectors, vec!["Health".to_string(), "Tech".to_string()]);
        let tickers: Vec<&str> = response.data.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["C", "A"]);
        assert_eq!(response.count, 2);
        assert_eq!(response.data[1].pe_ratio_fmt.as_deref(), Some("1.50x"));
        assert_eq!(*feed.requests.lock().unwrap(), vec![CompanySource::All]);
    }

    #[tokio::test]
    async fn list_without_a_source_loads_nothing() {
        let (feed, service) = service(FakeFeed {
            rows: vec![company("A", "Tech", 30.0, 20.0)],
            ..Default::default()
        });

        let response = service
            .list(None, &FilterCriteria::default(), SortSpec::default())
            .await
            .unwrap();

        assert_eq!(response.source, "none");
        assert_eq!(response.count, 0);
        assert!(response.sectors.is_empty());
        assert!(feed.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn load_failures_surface_as_errors() {
        let (_, service) = service(FakeFeed {
            fails: true,
            ..Default::default()
        });

        let err = service.sectors().await.unwrap_err();
        assert!(format!("{err:#}").contains("failed to load company collection"));
    }

    #[tokio::test]
    async fn spotlight_category_reads_the_full_collection() {
        let mut big = company("BIG", "Tech", 30.0, 25.0);
        big.market_cap = Some(Metric::Number(3e12));
        let (feed, service) = service(FakeFeed {
            rows: vec![big, company("SMALL", "Tech", 10.0, 9.0)],
            ..Default::default()
        });

        let listing = service
            .spotlight_category(SpotlightCategory::MegaCaps)
            .await
            .unwrap();

        assert_eq!(listing.count, 1);
        assert_eq!(listing.companies[0].ticker, "BIG");
        assert_eq!(*feed.requests.lock().unwrap(), vec![CompanySource::All]);
    }

    fn query(pairs: &str) -> CompanyQuery {
        let mut query: CompanyQuery = serde_json::from_value(serde_json::json!({})).unwrap();
        for pair in pairs.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap();
            let value = Some(value.to_string());
            match key {
                "filter_sector" => query.filter_sector = value,
                "forward_pe_min" => query.forward_pe_min = value,
                "market_cap_max" => query.market_cap_max = value,
                "profit_margin_min" => query.profit_margin_min = value,
                other => panic!("unexpected key {other}"),
            }
        }
        query
    }

    #[test]
    fn criteria_read_every_bound() {
        let criteria = criteria_from_query(&query(
            "filter_sector=Energy&forward_pe_min=10&market_cap_max=500&profit_margin_min=",
        ))
        .unwrap();

        assert_eq!(criteria.sector.as_deref(), Some("Energy"));
        assert_eq!(criteria.forward_pe.min, Some(10.0));
        assert_eq!(criteria.market_cap.max, Some(500.0));
        assert!(!criteria.profit_margin.is_set());
        assert!(!criteria.revenue_growth.is_set());
    }

    #[test]
    fn criteria_reject_non_numeric_bounds() {
        let err = criteria_from_query(&query("forward_pe_min=cheap")).unwrap_err();
        assert!(err.to_string().starts_with("forward_pe_min"));
    }

    #[test]
    fn blank_sector_filter_is_unset() {
        let criteria = criteria_from_query(&query("filter_sector=")).unwrap();
        assert!(criteria.sector.is_none());
    }

    #[test]
    fn sort_defaults_to_forward_pe_ascending() {
        let mut q = query("");
        assert_eq!(sort_from_query(&q), SortSpec::default());

        q.sort_by = Some(SortField::MarketCap);
        q.order = Some(SortDirection::Desc);
        assert_eq!(
            sort_from_query(&q),
            SortSpec::new(SortField::MarketCap, SortDirection::Desc)
        );
    }
}
