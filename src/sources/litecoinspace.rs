use async_trait::async_trait;
use serde::Deserialize;

use crate::coins::{CoinConfig, SourceId};

use super::client::send_json;
use super::{SourceAdapter, SourceError, SourceRecord, SourceResult};

/// litecoinspace.org (a mempool.space fork) mining endpoint — the primary
/// Litecoin hashrate source. Values are already in raw H/s.
pub struct LitecoinspaceSource {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MiningSummary {
    current_hashrate: f64,
    current_difficulty: f64,
}

impl LitecoinspaceSource {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        LitecoinspaceSource { client, base_url }
    }
}

#[async_trait]
impl SourceAdapter for LitecoinspaceSource {
    fn id(&self) -> SourceId {
        SourceId::Litecoinspace
    }

    async fn fetch(&self, coin: &CoinConfig) -> SourceResult<SourceRecord> {
        if coin.symbol != "LTC" {
            return Err(SourceError::MissingCoin {
                provider: self.id(),
                symbol: coin.symbol.to_string(),
            });
        }

        let url = format!("{}/api/v1/mining/hashrate/3d", self.base_url);
        let summary: MiningSummary = send_json(self.id(), self.client.get(url)).await?;

        Ok(SourceRecord {
            hashrate_hs: Some(summary.current_hashrate),
            difficulty: Some(summary.current_difficulty),
            ..SourceRecord::default()
        })
    }
}
