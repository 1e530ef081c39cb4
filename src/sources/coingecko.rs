use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::coins::{CoinConfig, SourceId, SUPPORTED_COINS};

use super::client::send_json;
use super::{BatchSource, SourceAdapter, SourceError, SourceRecord, SourceResult};

const BATCH_MEMO_TTL: Duration = Duration::from_secs(30);

/// Header CoinGecko accepts for its (optional) demo tier key. The endpoint
/// also answers keyless at a tighter rate limit, so a missing key is not an
/// error for this provider.
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// CoinGecko `/simple/price`: the primary financial source for every coin.
/// Batch keyed by CoinGecko's own coin ids, mapped back to tickers here.
pub struct CoingeckoSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    memo: Mutex<Option<BatchMemo>>,
}

struct BatchMemo {
    fetched_at: Instant,
    records: Arc<HashMap<String, SourceRecord>>,
}

#[derive(Debug, Deserialize)]
struct GeckoQuote {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
    usd_market_cap: Option<f64>,
}

impl CoingeckoSource {
    pub fn new(client: reqwest::Client, base_url: String, api_key: Option<String>) -> Self {
        CoingeckoSource {
            client,
            base_url,
            api_key,
            memo: Mutex::new(None),
        }
    }

    async fn fetch_batch_raw(
        &self,
        coins: &[&CoinConfig],
    ) -> SourceResult<HashMap<String, SourceRecord>> {
        let ids = coins
            .iter()
            .map(|c| c.coingecko_id)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/simple/price", self.base_url);
        let mut request = self.client.get(url).query(&[
            ("ids", ids.as_str()),
            ("vs_currencies", "usd"),
            ("include_24hr_change", "true"),
            ("include_market_cap", "true"),
        ]);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key.as_str());
        }

        let response: HashMap<String, GeckoQuote> = send_json(self.id(), request).await?;

        let mut records = HashMap::new();
        for coin in coins {
            let Some(quote) = response.get(coin.coingecko_id) else {
                continue;
            };
            let Some(price) = quote.usd else {
                continue;
            };
            records.insert(
                coin.symbol.to_string(),
                SourceRecord {
                    price_usd: Some(price),
                    price_change_24h_pct: quote.usd_24h_change,
                    market_cap_usd: quote.usd_market_cap,
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
impl SourceAdapter for CoingeckoSource {
    fn id(&self) -> SourceId {
        SourceId::Coingecko
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
impl BatchSource for CoingeckoSource {
    async fn fetch_batch(
        &self,
        coins: &[&CoinConfig],
    ) -> SourceResult<HashMap<String, SourceRecord>> {
        self.fetch_batch_raw(coins).await
    }
}
