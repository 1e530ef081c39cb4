use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::coins::{CoinConfig, SourceId, SUPPORTED_COINS};

use super::client::send_json;
use super::{BatchSource, SourceAdapter, SourceError, SourceRecord, SourceResult};

/// How long one batch response is reused before hitting the provider again.
/// A full collection run or an aggregate fan-out resolves every coin within
/// this window from a single upstream call.
const BATCH_MEMO_TTL: Duration = Duration::from_secs(30);

/// Minerstat's `/coins` endpoint: the one provider carrying mining metrics for
/// every supported coin, plus a spot price. Values arrive in raw H/s.
pub struct MinerstatSource {
    client: reqwest::Client,
    base_url: String,
    memo: Mutex<Option<BatchMemo>>,
}

struct BatchMemo {
    fetched_at: Instant,
    records: Arc<HashMap<String, SourceRecord>>,
}

#[derive(Debug, Deserialize)]
struct MinerstatCoin {
    coin: String,
    #[serde(default)]
    network_hashrate: f64,
    #[serde(default)]
    difficulty: f64,
    #[serde(default)]
    price: f64,
    #[serde(default)]
    updated: i64,
}

impl MinerstatSource {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        MinerstatSource {
            client,
            base_url,
            memo: Mutex::new(None),
        }
    }

    async fn fetch_batch_raw(
        &self,
        coins: &[&CoinConfig],
    ) -> SourceResult<HashMap<String, SourceRecord>> {
        let list = coins
            .iter()
            .map(|c| c.symbol)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/coins", self.base_url);
        let request = self.client.get(url).query(&[("list", list.as_str())]);
        let response: Vec<MinerstatCoin> = send_json(self.id(), request).await?;

        let mut records = HashMap::new();
        for coin in response {
            // the provider reports unknown metrics as negative sentinels
            if coin.network_hashrate < 0.0 || coin.difficulty < 0.0 {
                tracing::debug!("minerstat has no usable data for {}", coin.coin);
                continue;
            }
            records.insert(
                coin.coin.clone(),
                SourceRecord {
                    hashrate_hs: Some(coin.network_hashrate),
                    difficulty: Some(coin.difficulty),
                    price_usd: (coin.price > 0.0).then_some(coin.price),
                    observed_at: (coin.updated > 0).then_some(coin.updated),
                    ..SourceRecord::default()
                },
            );
        }
        Ok(records)
    }

    async fn memoized_batch(&self) -> SourceResult<Arc<HashMap<String, SourceRecord>>> {
        let mut memo = self.memo.lock().await;
        if let Some(existing) = memo.as_ref() {
            if existing.fetched_at.elapsed() < BATCH_MEMO_TTL {
                return Ok(existing.records.clone());
            }
        }

        let all: Vec<&CoinConfig> = SUPPORTED_COINS.iter().collect();
        let records = Arc::new(BatchSource::fetch_batch(self, &all).await?);
        *memo = Some(BatchMemo {
            fetched_at: Instant::now(),
            records: records.clone(),
        });
        Ok(records)
    }
}

#[async_trait]
impl SourceAdapter for MinerstatSource {
    fn id(&self) -> SourceId {
        SourceId::Minerstat
    }

    async fn fetch(&self, coin: &CoinConfig) -> SourceResult<SourceRecord> {
        let records = self.memoized_batch().await?;
        records
            .get(coin.symbol)
            .cloned()
            .ok_or_else(|| SourceError::MissingCoin {
                provider: self.id(),
                symbol: coin.symbol.to_string(),
            })
    }
}

#[async_trait]
impl BatchSource for MinerstatSource {
    async fn fetch_batch(
        &self,
        coins: &[&CoinConfig],
    ) -> SourceResult<HashMap<String, SourceRecord>> {
        self.fetch_batch_raw(coins).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coins::coin_config;
    use std::time::Duration;

    fn test_source(base: &str) -> MinerstatSource {
        let client = super::super::client::build_http_client(Duration::from_secs(2))
            .expect("client should build");
        MinerstatSource::new(client, base.to_string())
    }

    #[tokio::test]
    async fn batch_skips_negative_sentinel_records() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"[
            {"coin": "BTC", "network_hashrate": 6.1e20, "difficulty": 9.0e13, "price": 65000.0, "updated": 1700000000},
            {"coin": "KAS", "network_hashrate": -1, "difficulty": -1, "price": 0.12, "updated": 1700000000}
        ]"#;
        let _m = server
            .mock("GET", "/coins")
            .match_query(mockito::Matcher::UrlEncoded(
                "list".into(),
                "BTC,KAS".into(),
            ))
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let source = test_source(&server.url());
        let coins = [coin_config("BTC").unwrap(), coin_config("KAS").unwrap()];
        let batch = source.fetch_batch(&coins).await.unwrap();

        let btc = batch.get("BTC").expect("BTC should be present");
        assert_eq!(btc.hashrate_hs, Some(6.1e20));
        assert_eq!(btc.difficulty, Some(9.0e13));
        assert_eq!(btc.price_usd, Some(65000.0));
        assert_eq!(btc.observed_at, Some(1700000000));
        assert!(!batch.contains_key("KAS"), "sentinel record must be skipped");
    }

    #[tokio::test]
    async fn upstream_error_maps_to_status() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/coins")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let source = test_source(&server.url());
        let coins = [coin_config("BTC").unwrap()];
        let err = source.fetch_batch(&coins).await.unwrap_err();
        assert!(matches!(err, SourceError::Status { .. }));
    }
}
