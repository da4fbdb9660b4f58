use axum::{
    extract::{Path, State},
    Json,
};

use crate::business_logic::registry::{all_descriptors, PatternDescriptor};
use crate::errors::AppError;
use crate::models::annotation::{PatternView, SymbolPatterns};
use crate::models::pattern::PatternKind;
use crate::services::patterns::PatternService;
use crate::state::AppState;

const MAX_SYMBOL_LEN: usize = 24;

#[utoipa::path(
    get,
    path = "/patterns/registry",
    responses(
        (status = 200, description = "Every supported pattern kind in display order", body = [PatternDescriptor])
    )
)]
pub async fn get_registry() -> Json<Vec<&'static PatternDescriptor>> {
    Json(all_descriptors())
}

#[utoipa::path(
    get,
    path = "/patterns/{kind}/{symbol}",
    params(
        ("kind" = String, Path, description = "Pattern kind, e.g. double_top"),
        ("symbol" = String, Path, description = "Ticker symbol", example = "AAPL")
    ),
    responses(
        (status = 200, description = "Detector result with chart annotations", body = PatternView),
        (status = 400, description = "Unknown pattern kind or bad symbol", body = crate::errors::ErrorResponse),
        (status = 502, description = "Detector unavailable", body = crate::errors::ErrorResponse)
    )
)]
pub async fn get_pattern(
    State(state): State<AppState>,
    Path((kind, symbol)): Path<(String, String)>,
) -> Result<Json<PatternView>, AppError> {
    let kind = kind
        .parse::<PatternKind>()
        .map_err(|err| AppError::Validation(err.to_string()))?;
    let symbol = validate_symbol(&symbol)?;

    let service = PatternService::new(state.upstream.clone(), state.aggregator.clone());
    let view = service
        .fetch_view(kind, symbol)
        .await
        .map_err(AppError::upstream)?;
    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/symbols/{symbol}/patterns",
    params(
        ("symbol" = String, Path, description = "Ticker symbol", example = "NVDA")
    ),
    responses(
        (status = 200, description = "Detected patterns for the symbol, highest confidence first", body = SymbolPatterns),
        (status = 400, description = "Bad symbol", body = crate::errors::ErrorResponse)
    )
)]
pub async fn get_symbol_patterns(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<SymbolPatterns>, AppError> {
    let symbol = validate_symbol(&symbol)?;
    let service = PatternService::new(state.upstream.clone(), state.aggregator.clone());
    Ok(Json(service.symbol_patterns(symbol).await))
}

fn validate_symbol(symbol: &str) -> Result<&str, AppError> {
    let symbol = symbol.trim();
    if symbol.is_empty() || symbol.len() > MAX_SYMBOL_LEN {
        return Err(AppError::Validation(format!(
            "symbol must be 1 to {MAX_SYMBOL_LEN} characters"
        )));
    }
    if !symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
    {
        return Err(AppError::Validation(format!(
            "symbol contains unsupported characters: {symbol}"
        )));
    }
    Ok(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_accept_exchange_suffixes() {
        assert_eq!(validate_symbol(" BRK-B ").unwrap(), "BRK-B");
        assert!(validate_symbol("^GSPC").is_ok());
        assert!(validate_symbol("").is_err());
        assert!(validate_symbol("AAPL/../x").is_err());
    }
}
