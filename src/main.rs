use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Router};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use patternboard::business_logic::aggregator::PatternAggregator;
use patternboard::business_logic::registry::PatternDescriptor;
use patternboard::business_logic::screener::{SortDirection, SortField};
use patternboard::config::AppConfig;
use patternboard::errors::ErrorResponse;
use patternboard::handlers;
use patternboard::models::annotation::{
    ChartAnnotation, DashStyle, Dot, LegendEntry, LegendKind, Line, PatternView, SymbolPatterns,
};
use patternboard::models::catalog::{CatalogResponse, CatalogSummary, CatalogTab};
use patternboard::models::company::{
    CompanyListResponse, CompanyRecord, Metric, SectorSummary, SpotlightCategoryResponse,
};
use patternboard::models::health::HealthResponse;
use patternboard::models::pattern::{PatternKind, Signal};
use patternboard::services::upstream::UpstreamClient;
use patternboard::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::patterns::get_registry,
        handlers::patterns::get_pattern,
        handlers::patterns::get_symbol_patterns,
        handlers::catalog::get_catalog,
        handlers::companies::get_companies,
        handlers::companies::get_sectors,
        handlers::companies::get_spotlight,
        handlers::companies::get_spotlight_category
    ),
    components(schemas(
        HealthResponse,
        ErrorResponse,
        PatternKind,
        Signal,
        PatternDescriptor,
        PatternView,
        SymbolPatterns,
        ChartAnnotation,
        Dot,
        Line,
        DashStyle,
        LegendEntry,
        LegendKind,
        CatalogResponse,
        CatalogSummary,
        CatalogTab,
        CompanyListResponse,
        CompanyRecord,
        Metric,
        SortField,
        SortDirection,
        SectorSummary,
        SpotlightCategoryResponse
    ))
)]
struct ApiDoc;

fn init_tracing(config: &AppConfig) -> Option<WorkerGuard> {
    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "patternboard.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "patternboard=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let _log_guard = init_tracing(&config);

    let upstream = Arc::new(UpstreamClient::new(
        &config.upstream_url,
        config.upstream_timeout,
    )?);
    let aggregator = PatternAggregator::new(upstream.clone(), config.pattern_fetch_timeout);
    let state = AppState {
        upstream,
        aggregator,
    };

    tracing::info!("Reading patterns and fundamentals from {}", config.upstream_url);
    if let Some(limit) = config.pattern_fetch_timeout {
        tracing::info!("Per-detector read timeout: {:?}", limit);
    }

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/patterns/registry", get(handlers::patterns::get_registry))
        .route("/patterns/{kind}/{symbol}", get(handlers::patterns::get_pattern))
        .route(
            "/symbols/{symbol}/patterns",
            get(handlers::patterns::get_symbol_patterns),
        )
        .route("/catalog", get(handlers::catalog::get_catalog))
        .route("/companies", get(handlers::companies::get_companies))
        .route("/sectors", get(handlers::companies::get_sectors))
        .route("/spotlight", get(handlers::companies::get_spotlight))
        .route(
            "/spotlight/{category}",
            get(handlers::companies::get_spotlight_category),
        )
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Server running on http://{}", config.bind_addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui", config.bind_addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
