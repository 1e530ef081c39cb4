use async_trait::async_trait;
use serde::Deserialize;

use crate::coins::{CoinConfig, SourceId};

use super::client::send_json;
use super::{SourceAdapter, SourceError, SourceRecord, SourceResult};

/// The Ethereum Classic Blockscout instance's `/stats` endpoint, used as a
/// financial fallback for ETC. Numeric fields arrive as strings.
pub struct BlockscoutSource {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct BlockscoutStats {
    coin_price: Option<String>,
    coin_price_change_percentage: Option<f64>,
    market_cap: Option<String>,
}

impl BlockscoutSource {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        BlockscoutSource { client, base_url }
    }

    fn parse_decimal(&self, field: &str, raw: &str) -> SourceResult<f64> {
        raw.parse::<f64>()
            .map_err(|_| SourceError::MalformedResponse {
                provider: self.id(),
                detail: format!("{field} is not a number: {raw:?}"),
            })
    }
}

#[async_trait]
impl SourceAdapter for BlockscoutSource {
    fn id(&self) -> SourceId {
        SourceId::Blockscout
    }

    async fn fetch(&self, coin: &CoinConfig) -> SourceResult<SourceRecord> {
        if coin.symbol != "ETC" {
            return Err(SourceError::MissingCoin {
                provider: self.id(),
                symbol: coin.symbol.to_string(),
            });
        }

        let url = format!("{}/api/v2/stats", self.base_url);
        let stats: BlockscoutStats = send_json(self.id(), self.client.get(url)).await?;

        let Some(raw_price) = stats.coin_price else {
            return Err(SourceError::MissingCoin {
                provider: self.id(),
                symbol: coin.symbol.to_string(),
            });
        };
        let price = self.parse_decimal("coin_price", &raw_price)?;
        let market_cap = stats
            .market_cap
            .as_deref()
            .map(|raw| self.parse_decimal("market_cap", raw))
            .transpose()?;

        Ok(SourceRecord {
            price_usd: Some(price),
            price_change_24h_pct: stats.coin_price_change_percentage,
            market_cap_usd: market_cap,
            ..SourceRecord::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coins::coin_config;
    use std::time::Duration;

    fn test_source(base: &str) -> BlockscoutSource {
        let client = super::super::client::build_http_client(Duration::from_secs(2))
            .expect("client should build");
        BlockscoutSource::new(client, base.to_string())
    }

    #[tokio::test]
    async fn parses_stringly_typed_numbers() {
        let body = r#"{
            "coin_price": "26.43",
            "coin_price_change_percentage": -1.8,
            "market_cap": "3900000000.0",
            "total_blocks": "19000000"
        }"#;
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v2/stats")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let source = test_source(&server.url());
        let record = source.fetch(coin_config("ETC").unwrap()).await.unwrap();

        assert_eq!(record.price_usd, Some(26.43));
        assert_eq!(record.price_change_24h_pct, Some(-1.8));
        assert_eq!(record.market_cap_usd, Some(3.9e9));
        assert!(record.hashrate_hs.is_none());
    }

    #[tokio::test]
    async fn garbage_price_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v2/stats")
            .with_status(200)
            .with_body(r#"{"coin_price": "not-a-number"}"#)
            .create_async()
            .await;

        let source = test_source(&server.url());
        let err = source.fetch(coin_config("ETC").unwrap()).await.unwrap_err();
        assert!(matches!(err, SourceError::MalformedResponse { .. }));
    }
}
