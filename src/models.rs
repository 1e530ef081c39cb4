use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::coins::HashrateUnit;

/// One coin's mining and financial state at a point in time, in the shape the
/// public API serves. Hashrate is quoted in the coin's conventional display
/// unit; storage and adapters deal in raw H/s.
///
/// An all-zero financial block means "price unavailable", not an error.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSnapshot {
    pub symbol: String,
    pub display_name: String,
    pub hashrate_value: f64,
    pub hashrate_unit: HashrateUnit,
    pub difficulty: f64,
    pub price_usd: f64,
    pub price_change_24h_pct: f64,
    pub market_cap_usd: f64,
    /// Unix timestamp in seconds.
    pub observed_at: i64,
}

impl NetworkSnapshot {
    /// Hashrate back in canonical H/s, the unit history entries are stored in.
    pub fn hashrate_hs(&self) -> f64 {
        self.hashrate_value * self.hashrate_unit.scale()
    }
}

/// Derived trend over a fixed lookback window. Computed on demand, never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendWindow {
    pub window_days: u32,
    pub pct_change: f64,
}
