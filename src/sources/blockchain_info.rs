use async_trait::async_trait;
use serde::Deserialize;

use crate::coins::{CoinConfig, SourceId};

use super::client::send_json;
use super::{SourceAdapter, SourceError, SourceRecord, SourceResult};

/// blockchain.info's chart endpoints, the authoritative Bitcoin source. The
/// hash-rate chart is quoted in TH/s and has to be rescaled to H/s.
pub struct BlockchainInfoSource {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    values: Vec<ChartPoint>,
}

#[derive(Debug, Deserialize)]
struct ChartPoint {
    x: i64,
    y: f64,
}

impl BlockchainInfoSource {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        BlockchainInfoSource { client, base_url }
    }

    async fn latest_chart_point(&self, chart: &str) -> SourceResult<ChartPoint> {
        let url = format!("{}/charts/{}", self.base_url, chart);
        let request = self.client.get(url).query(&[
            ("timespan", "5days"),
            ("format", "json"),
            ("cors", "true"),
        ]);
        let response: ChartResponse = send_json(self.id(), request).await?;
        response
            .values
            .into_iter()
            .last()
            .ok_or_else(|| SourceError::MalformedResponse {
                provider: self.id(),
                detail: format!("{chart} chart contained no points"),
            })
    }
}

#[async_trait]
impl SourceAdapter for BlockchainInfoSource {
    fn id(&self) -> SourceId {
        SourceId::BlockchainInfo
    }

    async fn fetch(&self, coin: &CoinConfig) -> SourceResult<SourceRecord> {
        if coin.symbol != "BTC" {
            return Err(SourceError::MissingCoin {
                provider: self.id(),
                symbol: coin.symbol.to_string(),
            });
        }

        let hashrate = self.latest_chart_point("hash-rate").await?;
        let difficulty = self.latest_chart_point("difficulty").await?;

        Ok(SourceRecord {
            // chart values are TH/s
            hashrate_hs: Some(hashrate.y * 1e12),
            difficulty: Some(difficulty.y),
            observed_at: Some(hashrate.x),
            ..SourceRecord::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coins::coin_config;
    use std::time::Duration;

    fn test_source(base: &str) -> BlockchainInfoSource {
        let client = super::super::client::build_http_client(Duration::from_secs(2))
            .expect("client should build");
        BlockchainInfoSource::new(client, base.to_string())
    }

    #[tokio::test]
    async fn converts_terahash_chart_to_raw_hashes() {
        let mut server = mockito::Server::new_async().await;
        let _hash = server
            .mock("GET", "/charts/hash-rate")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"values": [{"x": 1699990000, "y": 500000000.0}, {"x": 1700000000, "y": 600000000.0}]}"#)
            .create_async()
            .await;
        let _diff = server
            .mock("GET", "/charts/difficulty")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"values": [{"x": 1700000000, "y": 9.0e13}]}"#)
            .create_async()
            .await;

        let source = test_source(&server.url());
        let record = source.fetch(coin_config("BTC").unwrap()).await.unwrap();

        // 600M TH/s == 6e20 H/s, the latest chart point wins
        assert_eq!(record.hashrate_hs, Some(6.0e20));
        assert_eq!(record.difficulty, Some(9.0e13));
        assert_eq!(record.observed_at, Some(1700000000));
    }

    #[tokio::test]
    async fn empty_chart_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _hash = server
            .mock("GET", "/charts/hash-rate")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"values": []}"#)
            .create_async()
            .await;

        let source = test_source(&server.url());
        let err = source.fetch(coin_config("BTC").unwrap()).await.unwrap_err();
        assert!(matches!(err, SourceError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn refuses_non_bitcoin_coins() {
        let source = test_source("http://unused.invalid");
        let err = source.fetch(coin_config("LTC").unwrap()).await.unwrap_err();
        assert!(matches!(err, SourceError::MissingCoin { .. }));
    }
}
