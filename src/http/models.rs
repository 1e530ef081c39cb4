use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::history::trend::CurrentStats;
use crate::models::NetworkSnapshot;

pub(crate) const UPDATE_FREQUENCY: &str = "Every 4 hours";
pub(crate) const API_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NetworksResponse {
    pub success: bool,
    pub data: Vec<NetworkSnapshot>,
    /// Epoch milliseconds at which this response was assembled.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NetworkResponse {
    pub success: bool,
    pub data: NetworkSnapshot,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CoinSummary {
    pub symbol: String,
    pub name: String,
    pub entries: usize,
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryIndexResponse {
    pub success: bool,
    pub coins: Vec<CoinSummary>,
    pub supported_coins: Vec<String>,
    pub update_frequency: String,
    pub api_version: String,
}

/// One fully expanded log entry, for the `full` serialization.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryPoint {
    pub timestamp: i64,
    pub datetime: String,
    pub hashrate: f64,
    pub difficulty: f64,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryFullResponse {
    pub success: bool,
    pub coin: String,
    pub name: String,
    pub algorithm: String,
    pub block_time: f64,
    pub data_started: String,
    pub last_updated: Option<String>,
    pub current: Option<CurrentStats>,
    pub data: Vec<HistoryPoint>,
    pub total_entries: usize,
    pub update_frequency: String,
}

/// Parallel arrays for charting, the `compact` serialization.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompactSeries {
    pub timestamps: Vec<i64>,
    pub hashrates: Vec<f64>,
    pub difficulties: Vec<f64>,
    pub prices: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryCompactResponse {
    pub success: bool,
    pub coin: String,
    pub name: String,
    pub current: Option<CurrentStats>,
    pub data: CompactSeries,
    pub total_entries: usize,
}
