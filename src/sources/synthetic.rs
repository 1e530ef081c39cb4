use async_trait::async_trait;
use rand::Rng;

use crate::coins::{CoinConfig, SourceId};

use super::{SourceAdapter, SourceRecord, SourceResult};

/// Terminal fallback behind the same adapter interface as real providers:
/// produces a record from the coin's static baseline with bounded jitter, so a
/// coin with no reachable upstream still renders instead of disappearing.
/// Configured only for coins whose feeds were estimates to begin with;
/// swapping it out is a chain-table change, not a resolver change.
pub struct SyntheticSource;

#[async_trait]
impl SourceAdapter for SyntheticSource {
    fn id(&self) -> SourceId {
        SourceId::Synthetic
    }

    async fn fetch(&self, coin: &CoinConfig) -> SourceResult<SourceRecord> {
        // +/-5% around the baseline, mirroring the variance the estimated
        // feeds carried
        let jitter = rand::thread_rng().gen_range(0.95..=1.05);

        Ok(SourceRecord {
            hashrate_hs: Some(coin.baseline_hashrate_hs * jitter),
            difficulty: Some(coin.baseline_difficulty * jitter),
            ..SourceRecord::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coins::coin_config;

    #[tokio::test]
    async fn always_succeeds_with_bounded_jitter() {
        let coin = coin_config("LTC").unwrap();
        let record = SyntheticSource.fetch(coin).await.unwrap();

        let hashrate = record.hashrate_hs.unwrap();
        assert!(hashrate >= coin.baseline_hashrate_hs * 0.95);
        assert!(hashrate <= coin.baseline_hashrate_hs * 1.05);
        assert!(record.difficulty.unwrap() > 0.0);
        assert!(record.price_usd.is_none());
    }
}
