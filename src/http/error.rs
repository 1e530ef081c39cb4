use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::coins::supported_symbols;

pub(crate) type HttpResult<T> = Result<T, HttpError>;

/// A user-facing failure: `{success: false, error, ...}` with the matching
/// status code. Unknown coins and not-yet-collected coins both 404, with
/// distinct messages.
pub(crate) struct HttpError {
    status: StatusCode,
    body: serde_json::Value,
}

impl HttpError {
    pub(crate) fn unknown_coin(symbol: &str) -> Self {
        HttpError {
            status: StatusCode::NOT_FOUND,
            body: json!({
                "success": false,
                "error": format!("Unknown coin: {symbol}"),
                "supportedCoins": supported_symbols(),
            }),
        }
    }

    pub(crate) fn no_history(symbol: &str) -> Self {
        HttpError {
            status: StatusCode::NOT_FOUND,
            body: json!({
                "success": false,
                "error": format!("No data available for {symbol}"),
                "message": "Data collection may not have started yet. Check back after the next update.",
            }),
        }
    }

    pub(crate) fn upstreams_unavailable(symbol: &str) -> Self {
        HttpError {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: json!({
                "success": false,
                "error": format!("All mining data sources are currently unavailable for {symbol}"),
            }),
        }
    }

    pub(crate) fn internal(message: &str) -> Self {
        HttpError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: json!({
                "success": false,
                "error": message,
            }),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
