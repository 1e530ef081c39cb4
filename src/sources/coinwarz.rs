use async_trait::async_trait;
use serde::Deserialize;

use crate::coins::{CoinConfig, SourceId};

use super::client::send_json;
use super::{SourceAdapter, SourceError, SourceRecord, SourceResult};

/// CoinWarz coin-information endpoint, a keyed secondary source for
/// hashrate/difficulty. Without a configured key the adapter degrades to
/// `MissingApiKey` and the chain falls through to the next source.
pub struct CoinwarzSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CoinwarzEnvelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<CoinwarzCoin>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CoinwarzCoin {
    difficulty: f64,
    network_hash_rate: f64,
}

impl CoinwarzSource {
    pub fn new(client: reqwest::Client, base_url: String, api_key: Option<String>) -> Self {
        CoinwarzSource {
            client,
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl SourceAdapter for CoinwarzSource {
    fn id(&self) -> SourceId {
        SourceId::Coinwarz
    }

    async fn fetch(&self, coin: &CoinConfig) -> SourceResult<SourceRecord> {
        let Some(api_key) = &self.api_key else {
            return Err(SourceError::MissingApiKey { provider: self.id() });
        };

        let url = format!("{}/v1/api/coininformation", self.base_url);
        let symbol = coin.symbol.to_ascii_lowercase();
        let request = self
            .client
            .get(url)
            .query(&[("apikey", api_key.as_str()), ("coin", symbol.as_str())]);
        let envelope: CoinwarzEnvelope = send_json(self.id(), request).await?;

        if !envelope.success {
            return Err(SourceError::MalformedResponse {
                provider: self.id(),
                detail: envelope
                    .message
                    .unwrap_or_else(|| "provider reported failure".to_string()),
            });
        }
        let Some(data) = envelope.data else {
            return Err(SourceError::MissingCoin {
                provider: self.id(),
                symbol: coin.symbol.to_string(),
            });
        };

        Ok(SourceRecord {
            hashrate_hs: Some(data.network_hash_rate),
            difficulty: Some(data.difficulty),
            ..SourceRecord::default()
        })
    }
}
