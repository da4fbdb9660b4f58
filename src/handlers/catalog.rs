use axum::{
    extract::{Query, State},
    Json,
};
use validator::Validate;

use crate::business_logic::catalog::CatalogSelector;
use crate::errors::AppError;
use crate::models::catalog::{CatalogQuery, CatalogResponse};
use crate::services::patterns::PatternService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/catalog",
    params(CatalogQuery),
    responses(
        (status = 200, description = "Catalog tabs and the selected pattern list", body = CatalogResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 502, description = "Catalog unavailable", body = crate::errors::ErrorResponse)
    )
)]
pub async fn get_catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<CatalogResponse>, AppError> {
    query.validate()?;

    let selector = match query.selector.as_deref() {
        Some(raw) => raw.parse::<CatalogSelector>().unwrap_or(CatalogSelector::All),
        None => CatalogSelector::All,
    };

    let service = PatternService::new(state.upstream.clone(), state.aggregator.clone());
    let response = service
        .catalog(&selector)
        .await
        .map_err(AppError::upstream)?;
    Ok(Json(response))
}
