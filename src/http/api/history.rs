use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::coins::{coin_config, supported_symbols, SUPPORTED_COINS};
use crate::history::trend::current_stats;
use crate::history::CoinHistory;
use crate::http::error::{HttpError, HttpResult};
use crate::http::models::{
    CoinSummary, CompactSeries, HistoryCompactResponse, HistoryFullResponse, HistoryIndexResponse,
    HistoryPoint, API_VERSION, UPDATE_FREQUENCY,
};
use crate::http::state::AppState;

/// These are public, read-only, cacheable endpoints; let intermediaries hold
/// responses for a few minutes.
const HISTORY_CACHE_CONTROL: &str = "public, max-age=300, stale-while-revalidate=600";

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::get(history_index))
        .route("/:symbol", axum::routing::get(coin_history))
}

#[utoipa::path(
    tag = "History",
    get,
    path = "/v1/history",
    responses((status = 200, body = HistoryIndexResponse))
)]
pub(crate) async fn history_index(State(state): State<AppState>) -> HttpResult<Response> {
    let mut coins = Vec::with_capacity(SUPPORTED_COINS.len());
    for coin in SUPPORTED_COINS {
        let history = match state.store().read_all(coin.symbol).await {
            Ok(history) => history,
            Err(err) => {
                tracing::error!("history read failed for {}: {err}", coin.symbol);
                None
            }
        };
        coins.push(CoinSummary {
            symbol: coin.symbol.to_string(),
            name: coin.display_name.to_string(),
            entries: history.as_ref().map(|h| h.total_entries).unwrap_or(0),
            last_updated: history.and_then(|h| h.last_updated.clone()),
        });
    }

    let body = HistoryIndexResponse {
        success: true,
        coins,
        supported_coins: supported_symbols().iter().map(|s| s.to_string()).collect(),
        update_frequency: UPDATE_FREQUENCY.to_string(),
        api_version: API_VERSION.to_string(),
    };
    Ok(with_cache_headers(Json(body)))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HistoryFormat {
    #[default]
    Full,
    Compact,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct HistoryQuery {
    /// Narrow the log to the last N days.
    days: Option<u32>,
    /// `full` (entry objects) or `compact` (parallel arrays).
    format: Option<HistoryFormat>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Path)]
struct SymbolParam {
    symbol: String,
}

#[utoipa::path(
    tag = "History",
    get,
    path = "/v1/history/{symbol}",
    params(SymbolParam, HistoryQuery),
    responses(
        (status = 200, body = HistoryFullResponse),
        (status = 404, description = "Unknown coin, or no data collected yet")
    )
)]
pub(crate) async fn coin_history(
    Path(SymbolParam { symbol }): Path<SymbolParam>,
    Query(query): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> HttpResult<Response> {
    let Some(coin) = coin_config(&symbol) else {
        return Err(HttpError::unknown_coin(&symbol));
    };

    let read = match query.days {
        Some(days) => state.store().read_recent(coin.symbol, days).await,
        None => state
            .store()
            .read_all(coin.symbol)
            .await
            .map(|maybe| maybe.map(|arc| (*arc).clone())),
    };

    let history = match read {
        Ok(Some(history)) => history,
        Ok(None) => return Err(HttpError::no_history(coin.symbol)),
        Err(err) => {
            // a broken backing file reads the same as "nothing collected yet"
            tracing::error!("history read failed for {}: {err}", coin.symbol);
            return Err(HttpError::no_history(coin.symbol));
        }
    };

    let body = match query.format.unwrap_or_default() {
        HistoryFormat::Compact => with_cache_headers(Json(compact_response(history))),
        HistoryFormat::Full => with_cache_headers(Json(full_response(history))),
    };
    Ok(body)
}

fn with_cache_headers(body: impl IntoResponse) -> Response {
    ([(header::CACHE_CONTROL, HISTORY_CACHE_CONTROL)], body).into_response()
}

fn compact_response(history: CoinHistory) -> HistoryCompactResponse {
    let current = current_stats(&history);
    HistoryCompactResponse {
        success: true,
        coin: history.coin.clone(),
        name: history.name.clone(),
        current,
        data: CompactSeries {
            timestamps: history.data.iter().map(|e| e.t).collect(),
            hashrates: history.data.iter().map(|e| e.h).collect(),
            difficulties: history.data.iter().map(|e| e.d).collect(),
            prices: history.data.iter().map(|e| e.p).collect(),
        },
        total_entries: history.data.len(),
    }
}

fn full_response(history: CoinHistory) -> HistoryFullResponse {
    let current = current_stats(&history);
    let data = history
        .data
        .iter()
        .map(|e| HistoryPoint {
            timestamp: e.t,
            datetime: Utc
                .timestamp_opt(e.t, 0)
                .single()
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_default(),
            hashrate: e.h,
            difficulty: e.d,
            price: e.p,
        })
        .collect();

    HistoryFullResponse {
        success: true,
        coin: history.coin,
        name: history.name,
        algorithm: history.algorithm,
        block_time: history.block_time,
        data_started: history.data_started,
        last_updated: history.last_updated,
        current,
        data,
        total_entries: history.data.len(),
        update_frequency: UPDATE_FREQUENCY.to_string(),
    }
}
