use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use crossprice_market_data::TrackingRegistration;

use crate::{
    error::ApiResult,
    main_lib::AppState,
    models::{Envelope, PriceAlert, TrackBody},
};

async fn track_prices(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TrackBody>,
) -> ApiResult<Json<Envelope<BTreeMap<String, TrackingRegistration>>>> {
    let registrations = state.comparison_service.track_price(&body.urls).await;
    let message = format!("{} of {} urls registered", registrations.len(), body.urls.len());
    Ok(Json(Envelope::success(message, registrations)))
}

/// Alerts are acknowledged but not stored.
async fn create_price_alert(Json(alert): Json<PriceAlert>) -> ApiResult<Json<Envelope<PriceAlert>>> {
    tracing::info!(
        "Price alert for product {} at {}",
        alert.product_id,
        alert.target_price
    );
    Ok(Json(Envelope::success("Price alert created", alert)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/track", post(track_prices))
        .route("/alert", post(create_price_alert))
}
