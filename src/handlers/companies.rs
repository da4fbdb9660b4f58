use axum::{
    extract::{Path, Query, State},
    Json,
};
use validator::Validate;

use crate::business_logic::screener::CompanySource;
use crate::business_logic::spotlight::SpotlightCategory;
use crate::errors::AppError;
use crate::models::company::{
    CompanyListResponse, CompanyQuery, SectorSummary, SpotlightCategoryResponse,
};
use crate::services::companies::{criteria_from_query, sort_from_query, CompanyService};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/companies",
    params(CompanyQuery),
    responses(
        (status = 200, description = "Enriched, filtered and sorted company rows", body = CompanyListResponse),
        (status = 400, description = "Invalid request or filter bound", body = crate::errors::ErrorResponse),
        (status = 502, description = "Company data unavailable", body = crate::errors::ErrorResponse)
    )
)]
pub async fn get_companies(
    State(state): State<AppState>,
    Query(query): Query<CompanyQuery>,
) -> Result<Json<CompanyListResponse>, AppError> {
    query.validate()?;
    let criteria = criteria_from_query(&query)?;
    let sort = sort_from_query(&query);
    let source = CompanySource::resolve(query.q.as_deref(), query.all, query.sector.as_deref());

    let service = CompanyService::new(state.upstream.clone());
    let response = service
        .list(source, &criteria, sort)
        .await
        .map_err(AppError::upstream)?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/sectors",
    responses(
        (status = 200, description = "Per-sector counts and valuation stats", body = [SectorSummary]),
        (status = 502, description = "Company data unavailable", body = crate::errors::ErrorResponse)
    )
)]
pub async fn get_sectors(
    State(state): State<AppState>,
) -> Result<Json<Vec<SectorSummary>>, AppError> {
    let service = CompanyService::new(state.upstream.clone());
    let sectors = service.sectors().await.map_err(AppError::upstream)?;
    Ok(Json(sectors))
}

#[utoipa::path(
    get,
    path = "/spotlight",
    responses(
        (status = 200, description = "Top five companies for every spotlight screen", body = [SpotlightCategoryResponse]),
        (status = 502, description = "Company data unavailable", body = crate::errors::ErrorResponse)
    )
)]
pub async fn get_spotlight(
    State(state): State<AppState>,
) -> Result<Json<Vec<SpotlightCategoryResponse>>, AppError> {
    let service = CompanyService::new(state.upstream.clone());
    let overview = service.spotlight().await.map_err(AppError::upstream)?;
    Ok(Json(overview))
}

#[utoipa::path(
    get,
    path = "/spotlight/{category}",
    params(
        ("category" = String, Path, description = "Spotlight screen, e.g. value_plays")
    ),
    responses(
        (status = 200, description = "Every company matching the screen", body = SpotlightCategoryResponse),
        (status = 404, description = "Unknown category", body = crate::errors::ErrorResponse),
        (status = 502, description = "Company data unavailable", body = crate::errors::ErrorResponse)
    )
)]
pub async fn get_spotlight_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<SpotlightCategoryResponse>, AppError> {
    let category = category
        .parse::<SpotlightCategory>()
        .map_err(AppError::NotFound)?;

    let service = CompanyService::new(state.upstream.clone());
    let listing = service
        .spotlight_category(category)
        .await
        .map_err(AppError::upstream)?;
    Ok(Json(listing))
}
