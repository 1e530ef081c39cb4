use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Conventional display scale for a network's hashrate. Coins are quoted in
/// different magnitudes (BTC in EH/s, Monero in GH/s) and the numeric value is
/// meaningless without it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum HashrateUnit {
    #[serde(rename = "EH/s")]
    ExaHash,
    #[serde(rename = "PH/s")]
    PetaHash,
    #[serde(rename = "TH/s")]
    TeraHash,
    #[serde(rename = "GH/s")]
    GigaHash,
    #[serde(rename = "MH/s")]
    MegaHash,
}

impl HashrateUnit {
    /// Hashes per second represented by 1.0 in this unit.
    pub fn scale(&self) -> f64 {
        match self {
            HashrateUnit::ExaHash => 1e18,
            HashrateUnit::PetaHash => 1e15,
            HashrateUnit::TeraHash => 1e12,
            HashrateUnit::GigaHash => 1e9,
            HashrateUnit::MegaHash => 1e6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HashrateUnit::ExaHash => "EH/s",
            HashrateUnit::PetaHash => "PH/s",
            HashrateUnit::TeraHash => "TH/s",
            HashrateUnit::GigaHash => "GH/s",
            HashrateUnit::MegaHash => "MH/s",
        }
    }
}

impl fmt::Display for HashrateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one upstream data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    Minerstat,
    Coingecko,
    BlockchainInfo,
    Blockscout,
    Litecoinspace,
    Coinwarz,
    Synthetic,
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceId::Minerstat => "minerstat",
            SourceId::Coingecko => "coingecko",
            SourceId::BlockchainInfo => "blockchain.info",
            SourceId::Blockscout => "blockscout",
            SourceId::Litecoinspace => "litecoinspace",
            SourceId::Coinwarz => "coinwarz",
            SourceId::Synthetic => "synthetic",
        };
        f.write_str(name)
    }
}

/// Static per-coin configuration. One table shared by the resolver, the
/// collector and the serving layer instead of per-component constants.
#[derive(Debug, Clone)]
pub struct CoinConfig {
    pub symbol: &'static str,
    pub display_name: &'static str,
    pub algorithm: &'static str,
    /// Nominal seconds between blocks (Conflux runs sub-second).
    pub block_interval_secs: f64,
    pub display_unit: HashrateUnit,
    /// Coin id in CoinGecko's namespace.
    pub coingecko_id: &'static str,
    /// Ordered fallback chain for hashrate/difficulty. First success wins.
    pub mining_sources: &'static [SourceId],
    /// Ordered fallback chain for price/market-cap. First success wins.
    pub financial_sources: &'static [SourceId],
    /// Preferred source for the difficulty field when several succeeded.
    pub difficulty_authority: Option<SourceId>,
    /// Last-resort constants for the synthetic source.
    pub baseline_hashrate_hs: f64,
    pub baseline_difficulty: f64,
}

use SourceId::*;

pub const SUPPORTED_COINS: &[CoinConfig] = &[
    CoinConfig {
        symbol: "BTC",
        display_name: "Bitcoin",
        algorithm: "SHA-256",
        block_interval_secs: 600.0,
        display_unit: HashrateUnit::ExaHash,
        coingecko_id: "bitcoin",
        mining_sources: &[BlockchainInfo, Minerstat],
        financial_sources: &[Coingecko, Minerstat],
        difficulty_authority: Some(BlockchainInfo),
        baseline_hashrate_hs: 6.0e20,
        baseline_difficulty: 9.0e13,
    },
    CoinConfig {
        symbol: "LTC",
        display_name: "Litecoin",
        algorithm: "Scrypt",
        block_interval_secs: 150.0,
        display_unit: HashrateUnit::TeraHash,
        coingecko_id: "litecoin",
        mining_sources: &[Litecoinspace, Minerstat, Synthetic],
        financial_sources: &[Coingecko, Minerstat],
        difficulty_authority: None,
        baseline_hashrate_hs: 1.5e15,
        baseline_difficulty: 4.5e7,
    },
    CoinConfig {
        symbol: "XMR",
        display_name: "Monero",
        algorithm: "RandomX",
        block_interval_secs: 120.0,
        display_unit: HashrateUnit::GigaHash,
        coingecko_id: "monero",
        mining_sources: &[Minerstat, Synthetic],
        financial_sources: &[Coingecko, Minerstat],
        difficulty_authority: None,
        baseline_hashrate_hs: 3.0e9,
        baseline_difficulty: 3.6e11,
    },
    CoinConfig {
        symbol: "DOGE",
        display_name: "Dogecoin",
        algorithm: "Scrypt",
        block_interval_secs: 60.0,
        display_unit: HashrateUnit::TeraHash,
        coingecko_id: "dogecoin",
        mining_sources: &[Minerstat, Coinwarz, Synthetic],
        financial_sources: &[Coingecko, Minerstat],
        difficulty_authority: None,
        baseline_hashrate_hs: 1.2e15,
        baseline_difficulty: 1.7e7,
    },
    CoinConfig {
        symbol: "KAS",
        display_name: "Kaspa",
        algorithm: "kHeavyHash",
        block_interval_secs: 1.0,
        display_unit: HashrateUnit::PetaHash,
        coingecko_id: "kaspa",
        mining_sources: &[Minerstat],
        financial_sources: &[Coingecko, Minerstat],
        difficulty_authority: None,
        baseline_hashrate_hs: 7.0e17,
        baseline_difficulty: 4.0e14,
    },
    CoinConfig {
        symbol: "ETC",
        display_name: "Ethereum Classic",
        algorithm: "Etchash",
        block_interval_secs: 13.0,
        display_unit: HashrateUnit::TeraHash,
        coingecko_id: "ethereum-classic",
        mining_sources: &[Minerstat],
        financial_sources: &[Coingecko, Blockscout, Minerstat],
        difficulty_authority: None,
        baseline_hashrate_hs: 1.8e14,
        baseline_difficulty: 2.3e15,
    },
    CoinConfig {
        symbol: "RVN",
        display_name: "Ravencoin",
        algorithm: "KAWPOW",
        block_interval_secs: 60.0,
        display_unit: HashrateUnit::TeraHash,
        coingecko_id: "ravencoin",
        mining_sources: &[Minerstat, Coinwarz],
        financial_sources: &[Coingecko, Minerstat],
        difficulty_authority: None,
        baseline_hashrate_hs: 5.0e12,
        baseline_difficulty: 6.0e4,
    },
    CoinConfig {
        symbol: "ZEC",
        display_name: "Zcash",
        algorithm: "Equihash",
        block_interval_secs: 75.0,
        display_unit: HashrateUnit::GigaHash,
        coingecko_id: "zcash",
        mining_sources: &[Minerstat, Coinwarz],
        financial_sources: &[Coingecko, Minerstat],
        difficulty_authority: None,
        baseline_hashrate_hs: 8.0e9,
        baseline_difficulty: 6.5e7,
    },
    CoinConfig {
        symbol: "BCH",
        display_name: "Bitcoin Cash",
        algorithm: "SHA-256",
        block_interval_secs: 600.0,
        display_unit: HashrateUnit::ExaHash,
        coingecko_id: "bitcoin-cash",
        mining_sources: &[Minerstat, Coinwarz],
        financial_sources: &[Coingecko, Minerstat],
        difficulty_authority: None,
        baseline_hashrate_hs: 3.5e18,
        baseline_difficulty: 5.0e11,
    },
    CoinConfig {
        symbol: "ERG",
        display_name: "Ergo",
        algorithm: "Autolykos2",
        block_interval_secs: 120.0,
        display_unit: HashrateUnit::TeraHash,
        coingecko_id: "ergo",
        mining_sources: &[Minerstat],
        financial_sources: &[Coingecko, Minerstat],
        difficulty_authority: None,
        baseline_hashrate_hs: 1.5e13,
        baseline_difficulty: 1.8e15,
    },
    CoinConfig {
        symbol: "CFX",
        display_name: "Conflux",
        algorithm: "Octopus",
        block_interval_secs: 0.5,
        display_unit: HashrateUnit::TeraHash,
        coingecko_id: "conflux-token",
        mining_sources: &[Minerstat],
        financial_sources: &[Coingecko, Minerstat],
        difficulty_authority: None,
        baseline_hashrate_hs: 1.5e12,
        baseline_difficulty: 1.0e15,
    },
];

/// Case-insensitive lookup into the static table.
pub fn coin_config(symbol: &str) -> Option<&'static CoinConfig> {
    SUPPORTED_COINS
        .iter()
        .find(|c| c.symbol.eq_ignore_ascii_case(symbol))
}

pub fn supported_symbols() -> Vec<&'static str> {
    SUPPORTED_COINS.iter().map(|c| c.symbol).collect()
}
