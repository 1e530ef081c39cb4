use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::coins::{coin_config, CoinConfig, SourceId};
use crate::models::NetworkSnapshot;
use crate::sources::{SourceRecord, Sources};

/// Which subset of snapshot fields a fallback chain is responsible for.
/// Mining and financial metrics frequently come from different providers for
/// the same coin, so each group resolves through its own chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldGroup {
    Mining,
    Financial,
}

impl FieldGroup {
    fn accepts(&self, record: &SourceRecord) -> bool {
        match self {
            FieldGroup::Mining => record.has_mining_fields(),
            FieldGroup::Financial => record.has_financial_fields(),
        }
    }
}

impl fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldGroup::Mining => f.write_str("mining"),
            FieldGroup::Financial => f.write_str("financial"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unknown coin symbol: {0}")]
    UnknownCoin(String),

    #[error("every mining source for {symbol} was unavailable")]
    MiningExhausted { symbol: String },
}

/// Walks each coin's configured fallback chains and merges the winners into
/// one snapshot. Partial success is success: a coin with hashrate but no
/// reachable price source resolves with a zeroed financial block. Only a fully
/// exhausted mining chain fails the coin.
pub struct Resolver {
    sources: Arc<Sources>,
}

impl Resolver {
    pub fn new(sources: Arc<Sources>) -> Self {
        Resolver { sources }
    }

    pub async fn resolve(&self, symbol: &str) -> Result<NetworkSnapshot, ResolveError> {
        let coin =
            coin_config(symbol).ok_or_else(|| ResolveError::UnknownCoin(symbol.to_string()))?;
        self.resolve_coin(coin).await
    }

    pub async fn resolve_coin(&self, coin: &CoinConfig) -> Result<NetworkSnapshot, ResolveError> {
        // the two groups merge only at the end, so they can run concurrently;
        // within a group attempts stay sequential (only one result is used)
        let (mining, financial) = tokio::join!(
            self.resolve_group(coin, coin.mining_sources, FieldGroup::Mining),
            self.resolve_group(coin, coin.financial_sources, FieldGroup::Financial),
        );

        let Some((mining_id, mining_record)) = mining else {
            return Err(ResolveError::MiningExhausted {
                symbol: coin.symbol.to_string(),
            });
        };

        let difficulty = self.select_difficulty(
            coin,
            &[
                (mining_id, &mining_record),
                // financial winner may also carry a usable difficulty
            ],
            financial.as_ref().map(|(id, record)| (*id, record)),
        );

        let observed_at = mining_record
            .observed_at
            .or(financial.as_ref().and_then(|(_, r)| r.observed_at))
            .unwrap_or_else(|| Utc::now().timestamp());

        let financial_record = financial.map(|(_, record)| record).unwrap_or_default();
        let hashrate_hs = mining_record.hashrate_hs.unwrap_or(0.0).max(0.0);

        Ok(NetworkSnapshot {
            symbol: coin.symbol.to_string(),
            display_name: coin.display_name.to_string(),
            hashrate_value: hashrate_hs / coin.display_unit.scale(),
            hashrate_unit: coin.display_unit,
            difficulty: difficulty.max(0.0),
            price_usd: financial_record.price_usd.unwrap_or(0.0),
            price_change_24h_pct: financial_record.price_change_24h_pct.unwrap_or(0.0),
            market_cap_usd: financial_record.market_cap_usd.unwrap_or(0.0),
            observed_at,
        })
    }

    /// Try each source in order; the first record carrying the group's fields
    /// wins outright. Failures are logged and swallowed here, they only matter
    /// if the whole chain comes up empty.
    async fn resolve_group(
        &self,
        coin: &CoinConfig,
        chain: &[SourceId],
        group: FieldGroup,
    ) -> Option<(SourceId, SourceRecord)> {
        for id in chain {
            let Some(adapter) = self.sources.adapter(*id) else {
                tracing::warn!("source {id} is not registered, skipping");
                continue;
            };
            match adapter.fetch(coin).await {
                Ok(record) if group.accepts(&record) => {
                    tracing::debug!("{} {group} metrics resolved via {id}", coin.symbol);
                    return Some((*id, record));
                }
                Ok(_) => {
                    tracing::debug!("{id} returned no {group} fields for {}", coin.symbol);
                }
                Err(err) => {
                    tracing::warn!("source {id} failed for {}: {err}", coin.symbol);
                }
            }
        }
        tracing::warn!("every {group} source exhausted for {}", coin.symbol);
        None
    }

    /// Difficulty can arrive from both group winners. Prefer the configured
    /// authority's non-zero value, then the first non-zero value in winner
    /// order, then 0.
    fn select_difficulty(
        &self,
        coin: &CoinConfig,
        mining: &[(SourceId, &SourceRecord)],
        financial: Option<(SourceId, &SourceRecord)>,
    ) -> f64 {
        let candidates: Vec<(SourceId, &SourceRecord)> = mining
            .iter()
            .copied()
            .chain(financial.into_iter())
            .collect();

        if let Some(authority) = coin.difficulty_authority {
            if let Some(value) = candidates
                .iter()
                .find(|(id, _)| *id == authority)
                .and_then(|(_, record)| record.non_zero_difficulty())
            {
                return value;
            }
        }

        candidates
            .iter()
            .find_map(|(_, record)| record.non_zero_difficulty())
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{SourceAdapter, SourceError, SourceResult};
    use async_trait::async_trait;

    enum StubOutcome {
        Fail,
        Record(SourceRecord),
    }

    struct StubSource {
        id: SourceId,
        outcome: StubOutcome,
    }

    #[async_trait]
    impl SourceAdapter for StubSource {
        fn id(&self) -> SourceId {
            self.id
        }

        async fn fetch(&self, coin: &CoinConfig) -> SourceResult<SourceRecord> {
            match &self.outcome {
                StubOutcome::Fail => Err(SourceError::Status {
                    provider: self.id,
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                }),
                StubOutcome::Record(record) => {
                    let _ = coin;
                    Ok(record.clone())
                }
            }
        }
    }

    fn resolver_with(stubs: Vec<StubSource>) -> Resolver {
        let adapters = stubs
            .into_iter()
            .map(|s| Arc::new(s) as Arc<dyn SourceAdapter>)
            .collect();
        Resolver::new(Arc::new(Sources::from_adapters(adapters)))
    }

    fn mining_record(hashrate_hs: f64, difficulty: f64) -> SourceRecord {
        SourceRecord {
            hashrate_hs: Some(hashrate_hs),
            difficulty: Some(difficulty),
            ..SourceRecord::default()
        }
    }

    #[tokio::test]
    async fn fallback_order_first_success_wins() {
        // BTC mining chain is blockchain.info then minerstat; the former fails
        let resolver = resolver_with(vec![
            StubSource {
                id: SourceId::BlockchainInfo,
                outcome: StubOutcome::Fail,
            },
            StubSource {
                id: SourceId::Minerstat,
                outcome: StubOutcome::Record(mining_record(6.0e20, 9.0e13)),
            },
            StubSource {
                id: SourceId::Coingecko,
                outcome: StubOutcome::Fail,
            },
        ]);

        let snapshot = resolver.resolve("BTC").await.unwrap();
        // 6e20 H/s rendered in EH/s, values passed through unchanged
        assert_eq!(snapshot.hashrate_value, 600.0);
        assert_eq!(snapshot.difficulty, 9.0e13);
    }

    #[tokio::test]
    async fn partial_success_zeroes_financial_block() {
        let resolver = resolver_with(vec![
            StubSource {
                id: SourceId::BlockchainInfo,
                outcome: StubOutcome::Record(mining_record(6.0e20, 9.0e13)),
            },
            StubSource {
                id: SourceId::Minerstat,
                outcome: StubOutcome::Fail,
            },
            StubSource {
                id: SourceId::Coingecko,
                outcome: StubOutcome::Fail,
            },
        ]);

        let snapshot = resolver.resolve("BTC").await.unwrap();
        assert!(snapshot.hashrate_value > 0.0);
        assert_eq!(snapshot.price_usd, 0.0);
        assert_eq!(snapshot.price_change_24h_pct, 0.0);
        assert_eq!(snapshot.market_cap_usd, 0.0);
    }

    #[tokio::test]
    async fn exhausted_mining_chain_fails_the_coin() {
        let resolver = resolver_with(vec![
            StubSource {
                id: SourceId::BlockchainInfo,
                outcome: StubOutcome::Fail,
            },
            StubSource {
                id: SourceId::Minerstat,
                outcome: StubOutcome::Fail,
            },
            StubSource {
                id: SourceId::Coingecko,
                outcome: StubOutcome::Record(SourceRecord {
                    price_usd: Some(65000.0),
                    ..SourceRecord::default()
                }),
            },
        ]);

        let err = resolver.resolve("BTC").await.unwrap_err();
        assert!(matches!(err, ResolveError::MiningExhausted { .. }));
    }

    #[tokio::test]
    async fn unknown_symbol_is_rejected() {
        let resolver = resolver_with(vec![]);
        let err = resolver.resolve("WAT").await.unwrap_err();
        assert!(matches!(err, ResolveError::UnknownCoin(_)));
    }

    #[tokio::test]
    async fn financial_fields_merge_over_mining_zeros() {
        let resolver = resolver_with(vec![
            StubSource {
                id: SourceId::BlockchainInfo,
                outcome: StubOutcome::Record(mining_record(6.0e20, 9.0e13)),
            },
            StubSource {
                id: SourceId::Coingecko,
                outcome: StubOutcome::Record(SourceRecord {
                    price_usd: Some(65000.0),
                    price_change_24h_pct: Some(1.5),
                    market_cap_usd: Some(1.3e12),
                    ..SourceRecord::default()
                }),
            },
        ]);

        let snapshot = resolver.resolve("BTC").await.unwrap();
        assert_eq!(snapshot.hashrate_value, 600.0);
        assert_eq!(snapshot.price_usd, 65000.0);
        assert_eq!(snapshot.price_change_24h_pct, 1.5);
        assert_eq!(snapshot.market_cap_usd, 1.3e12);
    }

    #[tokio::test]
    async fn difficulty_falls_back_to_other_successful_source() {
        // mining winner has hashrate but no difficulty; the financial winner
        // (minerstat for LTC) carries one
        let resolver = resolver_with(vec![
            StubSource {
                id: SourceId::Litecoinspace,
                outcome: StubOutcome::Record(SourceRecord {
                    hashrate_hs: Some(1.5e15),
                    ..SourceRecord::default()
                }),
            },
            StubSource {
                id: SourceId::Coingecko,
                outcome: StubOutcome::Fail,
            },
            StubSource {
                id: SourceId::Minerstat,
                outcome: StubOutcome::Record(SourceRecord {
                    price_usd: Some(80.0),
                    difficulty: Some(4.5e7),
                    ..SourceRecord::default()
                }),
            },
        ]);

        let snapshot = resolver.resolve("LTC").await.unwrap();
        assert_eq!(snapshot.difficulty, 4.5e7);
        assert_eq!(snapshot.price_usd, 80.0);
    }
}
