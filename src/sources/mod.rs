use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::coins::{CoinConfig, SourceId};
use crate::config::Config;
use crate::error::BloxchaserError;

pub(crate) mod client;

mod blockchain_info;
mod blockscout;
mod coingecko;
mod coinwarz;
mod litecoinspace;
mod minerstat;
mod synthetic;

pub use blockchain_info::BlockchainInfoSource;
pub use blockscout::BlockscoutSource;
pub use coingecko::CoingeckoSource;
pub use coinwarz::CoinwarzSource;
pub use litecoinspace::LitecoinspaceSource;
pub use minerstat::MinerstatSource;
pub use synthetic::SyntheticSource;

pub type SourceResult<T> = Result<T, SourceError>;

/// Everything that can go wrong talking to one provider. Every variant is
/// recoverable by falling through to the next source in the chain; none of the
/// underlying provider error types leak past this boundary.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {provider} failed: {source}")]
    Request {
        provider: SourceId,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} responded with status {status}")]
    Status {
        provider: SourceId,
        status: reqwest::StatusCode,
    },

    #[error("{provider} returned a malformed response: {detail}")]
    MalformedResponse { provider: SourceId, detail: String },

    #[error("{provider} returned no data for {symbol}")]
    MissingCoin { provider: SourceId, symbol: String },

    #[error("no api key configured for {provider}")]
    MissingApiKey { provider: SourceId },
}

/// Normalized output of one provider fetch. Fields the provider does not carry
/// stay `None`; hashrate is always in raw H/s regardless of how the provider
/// quotes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRecord {
    pub hashrate_hs: Option<f64>,
    pub difficulty: Option<f64>,
    pub price_usd: Option<f64>,
    pub price_change_24h_pct: Option<f64>,
    pub market_cap_usd: Option<f64>,
    /// Unix seconds at which the provider says it produced the data, when it
    /// says so at all.
    pub observed_at: Option<i64>,
}

impl SourceRecord {
    /// A record counts for the mining field group once it carries a hashrate.
    pub fn has_mining_fields(&self) -> bool {
        self.hashrate_hs.is_some()
    }

    /// A record counts for the financial field group once it carries a price.
    pub fn has_financial_fields(&self) -> bool {
        self.price_usd.is_some()
    }

    pub fn non_zero_difficulty(&self) -> Option<f64> {
        self.difficulty.filter(|d| *d > 0.0)
    }
}

/// Integration boundary to one external data provider.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn id(&self) -> SourceId;

    /// Fetch whatever fields this provider has for one coin.
    async fn fetch(&self, coin: &CoinConfig) -> SourceResult<SourceRecord>;
}

/// Contract for providers that return many coins in one call. Symbols absent
/// from the response are simply absent from the map, not an error.
#[async_trait]
pub trait BatchSource: SourceAdapter {
    async fn fetch_batch(
        &self,
        coins: &[&CoinConfig],
    ) -> SourceResult<HashMap<String, SourceRecord>>;
}

/// Registry of constructed adapters, one per provider, shared by the resolver.
pub struct Sources {
    adapters: HashMap<SourceId, Arc<dyn SourceAdapter>>,
}

impl Sources {
    pub fn new(config: &Config) -> Result<Self, BloxchaserError> {
        let client = client::build_http_client(config.request_timeout)
            .map_err(|source| BloxchaserError::HttpClientBuildFailure { source })?;
        let endpoints = &config.sources;

        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
            Arc::new(MinerstatSource::new(
                client.clone(),
                endpoints.minerstat_url.clone(),
            )),
            Arc::new(CoingeckoSource::new(
                client.clone(),
                endpoints.coingecko_url.clone(),
                endpoints.coingecko_api_key.clone(),
            )),
            Arc::new(BlockchainInfoSource::new(
                client.clone(),
                endpoints.blockchain_info_url.clone(),
            )),
            Arc::new(BlockscoutSource::new(
                client.clone(),
                endpoints.blockscout_url.clone(),
            )),
            Arc::new(LitecoinspaceSource::new(
                client.clone(),
                endpoints.litecoinspace_url.clone(),
            )),
            Arc::new(CoinwarzSource::new(
                client,
                endpoints.coinwarz_url.clone(),
                endpoints.coinwarz_api_key.clone(),
            )),
            Arc::new(SyntheticSource),
        ];

        Ok(Self::from_adapters(adapters))
    }

    pub fn from_adapters(adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        Sources {
            adapters: adapters.into_iter().map(|a| (a.id(), a)).collect(),
        }
    }

    pub fn adapter(&self, id: SourceId) -> Option<&Arc<dyn SourceAdapter>> {
        self.adapters.get(&id)
    }
}
