use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::coins::{CoinConfig, SUPPORTED_COINS};
use crate::history::{HistoryEntry, HistoryStore};
use crate::resolver::Resolver;

/// Outcome of one collection pass. Partial success is the normal case; a
/// fully empty pass is what callers escalate on.
#[derive(Debug, Default)]
pub struct CollectionReport {
    pub updated: usize,
    pub failed: Vec<String>,
}

/// Resolves every configured coin and appends one history entry per success.
/// Runs either as a one-shot CLI pass (external scheduler) or as the interval
/// loop spawned next to the HTTP server.
pub struct Collector {
    resolver: Arc<Resolver>,
    store: Arc<HistoryStore>,
}

impl Collector {
    pub fn new(resolver: Arc<Resolver>, store: Arc<HistoryStore>) -> Self {
        Collector { resolver, store }
    }

    pub async fn run_once(&self) -> CollectionReport {
        let mut report = CollectionReport::default();

        for coin in SUPPORTED_COINS {
            match self.collect_coin(coin).await {
                Ok(()) => report.updated += 1,
                Err(err) => {
                    tracing::error!("failed to collect {}: {err:#}", coin.symbol);
                    report.failed.push(coin.symbol.to_string());
                }
            }
        }

        tracing::info!(
            "collection pass updated {}/{} coins",
            report.updated,
            SUPPORTED_COINS.len()
        );
        report
    }

    async fn collect_coin(&self, coin: &CoinConfig) -> anyhow::Result<()> {
        let snapshot = self.resolver.resolve_coin(coin).await?;
        let entry = HistoryEntry {
            t: snapshot.observed_at,
            d: snapshot.difficulty,
            h: snapshot.hashrate_hs(),
            p: snapshot.price_usd,
        };
        self.store.append(coin, entry).await?;
        tracing::info!(
            "{}: {:.2} {} diff={:.3e}",
            coin.symbol,
            snapshot.hashrate_value,
            snapshot.hashrate_unit,
            snapshot.difficulty
        );
        Ok(())
    }

    pub fn spawn_interval(self: Arc<Self>, interval: Duration, token: CancellationToken) {
        tracing::info!(
            "starting collection loop, one pass every {}s",
            interval.as_secs()
        );
        tokio::spawn(async move {
            loop {
                let report = self.run_once().await;
                if report.updated == 0 {
                    tracing::error!("collection pass updated no coins, will retry next interval");
                }
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::debug!("collection loop shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::sources::Sources;
    use std::time::Duration;

    /// Partial upstream coverage: minerstat knows two coins, CoinGecko is
    /// down. The pass appends what it can and reports the rest.
    #[tokio::test]
    async fn partial_upstream_coverage_is_partial_success() {
        let mut server = mockito::Server::new_async().await;
        let minerstat_body = r#"[
            {"coin": "BTC", "network_hashrate": 6.0e20, "difficulty": 9.0e13, "price": 65000.0, "updated": 1700000000},
            {"coin": "ETC", "network_hashrate": 1.8e14, "difficulty": 2.3e15, "price": 26.0, "updated": 1700000000}
        ]"#;
        let _coins = server
            .mock("GET", "/coins")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(minerstat_body)
            .create_async()
            .await;
        let _gecko = server
            .mock("GET", "/gecko/simple/price")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let mut config = Config::default();
        config.request_timeout = Duration::from_secs(2);
        config.sources.minerstat_url = server.url();
        config.sources.coingecko_url = format!("{}/gecko", server.url());
        config.sources.blockchain_info_url = format!("{}/dead", server.url());
        config.sources.blockscout_url = format!("{}/dead", server.url());
        config.sources.litecoinspace_url = format!("{}/dead", server.url());

        let dir = tempfile::tempdir().unwrap();
        let sources = Arc::new(Sources::new(&config).unwrap());
        let resolver = Arc::new(Resolver::new(sources));
        let store = Arc::new(HistoryStore::new(dir.path(), Duration::from_secs(60)).unwrap());
        let collector = Collector::new(resolver, store.clone());

        let report = collector.run_once().await;

        // BTC and ETC come from minerstat; LTC/XMR/DOGE bottom out in the
        // synthetic source; the rest have nothing to fall back on
        assert!(report.updated >= 5);
        assert!(report.failed.contains(&"KAS".to_string()));
        assert!(!report.failed.contains(&"BTC".to_string()));

        let btc = store.read_all("BTC").await.unwrap().unwrap();
        assert_eq!(btc.data.len(), 1);
        assert_eq!(btc.data[0].h, 6.0e20);
        assert_eq!(btc.data[0].d, 9.0e13);
        // CoinGecko is down, so the price falls back to minerstat's quote
        assert_eq!(btc.data[0].p, 65000.0);
        assert_eq!(btc.data[0].t, 1700000000);
    }
}
