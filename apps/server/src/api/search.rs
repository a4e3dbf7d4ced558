use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use crossprice_core::{AggregatedResult, SearchRequest};
use crossprice_market_data::SearchOptions;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
    models::{Envelope, SearchBody},
};

/// Search every configured marketplace and compare prices.
async fn search_products(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SearchBody>,
) -> ApiResult<Json<Envelope<AggregatedResult>>> {
    let keyword = body.keyword.trim();
    if keyword.is_empty() {
        return Err(ApiError::BadRequest("keyword must not be empty".to_string()));
    }

    let target_currency = body
        .target_currency
        .filter(|c| !c.trim().is_empty())
        .or_else(|| body.normalize.then(|| state.default_currency.clone()));

    let mut options = SearchOptions::default();
    if let Some(limit) = body.limit.filter(|l| *l > 0) {
        options = options.with_limit(limit);
    }
    let request = SearchRequest {
        platforms: body.platforms,
        target_currency,
        options,
    };

    let result = state
        .comparison_service
        .search_all_platforms(keyword, &request)
        .await;
    let message = format!("{} listings found", result.total());
    Ok(Json(Envelope::success(message, result)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/search", post(search_products))
}
