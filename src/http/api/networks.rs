use axum::extract::{Path, State};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::coins::SUPPORTED_COINS;
use crate::http::error::{HttpError, HttpResult};
use crate::http::models::{NetworkResponse, NetworksResponse};
use crate::http::state::AppState;
use crate::resolver::ResolveError;

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::get(all_networks))
        .route("/:symbol", axum::routing::get(one_network))
}

#[utoipa::path(
    tag = "Networks",
    get,
    path = "/v1/networks",
    responses(
        (status = 200, body = NetworksResponse),
        (status = 500, description = "Every coin was unresolvable")
    )
)]
pub(crate) async fn all_networks(
    State(state): State<AppState>,
) -> HttpResult<Json<NetworksResponse>> {
    if let Some(cached) = state.cached_networks().await {
        return Ok(Json(NetworksResponse {
            success: true,
            data: (*cached).clone(),
            timestamp: Utc::now().timestamp_millis(),
        }));
    }

    let resolver = state.resolver();
    let results = futures::future::join_all(
        SUPPORTED_COINS
            .iter()
            .map(|coin| resolver.resolve_coin(coin)),
    )
    .await;

    // response order follows the static coin table, not completion order
    let mut data = Vec::with_capacity(SUPPORTED_COINS.len());
    for (coin, result) in SUPPORTED_COINS.iter().zip(results) {
        match result {
            Ok(snapshot) => data.push(snapshot),
            Err(err) => {
                tracing::warn!("excluding {} from the aggregate: {err}", coin.symbol);
            }
        }
    }

    if data.is_empty() {
        return Err(HttpError::internal("Failed to fetch network data"));
    }

    let data = state.cache_networks(data).await;
    Ok(Json(NetworksResponse {
        success: true,
        data: (*data).clone(),
        timestamp: Utc::now().timestamp_millis(),
    }))
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Path)]
struct SymbolParam {
    symbol: String,
}

#[utoipa::path(
    tag = "Networks",
    get,
    path = "/v1/networks/{symbol}",
    params(SymbolParam),
    responses(
        (status = 200, body = NetworkResponse),
        (status = 404, description = "Symbol is not in the supported coin set"),
        (status = 503, description = "Every mining source for the coin is down")
    )
)]
pub(crate) async fn one_network(
    Path(SymbolParam { symbol }): Path<SymbolParam>,
    State(state): State<AppState>,
) -> HttpResult<Json<NetworkResponse>> {
    match state.resolver().resolve(&symbol).await {
        Ok(snapshot) => Ok(Json(NetworkResponse {
            success: true,
            data: snapshot,
            timestamp: Utc::now().timestamp_millis(),
        })),
        Err(ResolveError::UnknownCoin(symbol)) => Err(HttpError::unknown_coin(&symbol)),
        Err(ResolveError::MiningExhausted { symbol }) => {
            Err(HttpError::upstreams_unavailable(&symbol))
        }
    }
}
