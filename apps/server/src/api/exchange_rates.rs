use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use crossprice_core::{constants::BASE_CURRENCY, ConversionResult};
use rust_decimal::Decimal;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
    models::{ConvertQuery, Envelope, RateStatus},
};

async fn convert_price(
    Query(query): Query<ConvertQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Envelope<ConversionResult>>> {
    let amount = Decimal::from_str(query.amount.trim())
        .map_err(|_| ApiError::BadRequest(format!("invalid amount '{}'", query.amount)))?;
    let to = query.to.as_deref().unwrap_or(BASE_CURRENCY);
    let result = state
        .comparison_service
        .convert_price(amount, &query.from, to)
        .await?;
    Ok(Json(Envelope::success("Conversion complete", result)))
}

async fn get_rate_status(State(state): State<Arc<AppState>>) -> ApiResult<Json<Envelope<RateStatus>>> {
    let snapshot = state.rate_cache.snapshot();
    let status = RateStatus {
        state: state.rate_cache.state(),
        last_update: snapshot.as_ref().map(|s| s.last_update),
        currencies: snapshot.as_ref().map(|s| s.rates.len()).unwrap_or(0),
        ttl_hours: state.rate_cache.ttl().num_hours(),
    };
    Ok(Json(Envelope::success("Rate cache status", status)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/exchange-rates/convert", get(convert_price))
        .route("/exchange-rates/status", get(get_rate_status))
}
