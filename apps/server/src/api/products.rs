use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use crossprice_core::PriceAnalysis;
use crossprice_market_data::Platform;
use serde_json::{json, Value};

use crate::{
    error::ApiResult,
    main_lib::AppState,
    models::{Envelope, ProductQuery},
};

fn requested_platform(query: &ProductQuery) -> Platform {
    query
        .platform
        .as_deref()
        .map(|p| p.parse().unwrap_or_default())
        .unwrap_or(Platform::Taobao)
}

/// Product detail. A miss is still a success with an empty object.
async fn get_product_details(
    Path(id): Path<String>,
    Query(query): Query<ProductQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Envelope<Value>>> {
    let platform = requested_platform(&query);
    let envelope = match state.comparison_service.get_details(&id, platform).await {
        Some(detail) => {
            let data = serde_json::to_value(detail).map_err(anyhow::Error::from)?;
            Envelope::success("Product found", data)
        }
        None => Envelope::success(
            format!("Product {} not found on {}", id, platform),
            json!({}),
        ),
    };
    Ok(Json(envelope))
}

async fn get_product_analysis(
    Path(id): Path<String>,
    Query(query): Query<ProductQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Envelope<PriceAnalysis>>> {
    let platform = requested_platform(&query);
    let analysis = state.comparison_service.price_analysis(&id, platform).await;
    Ok(Json(Envelope::success("Analysis complete", analysis)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/product/{id}", get(get_product_details))
        .route("/product/{id}/analysis", get(get_product_analysis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_defaults_to_taobao() {
        assert_eq!(requested_platform(&ProductQuery::default()), Platform::Taobao);
        let query = ProductQuery {
            platform: Some("EBAY".to_string()),
        };
        assert_eq!(requested_platform(&query), Platform::Ebay);
        let query = ProductQuery {
            platform: Some("jd".to_string()),
        };
        assert_eq!(requested_platform(&query), Platform::Unknown);
    }
}
