use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::BloxchaserError;

/// Process configuration: serde defaults cover every field, so an empty file
/// (or no file at all) yields a fully working setup pointed at the real
/// providers. CLI flags override individual fields after loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub http_port: u16,

    /// Root of the on-disk state; history files live in `<data_dir>/history`.
    pub data_dir: PathBuf,

    /// Cadence of the in-process collection loop, when enabled.
    #[serde(with = "humantime_serde")]
    pub collection_interval: Duration,

    /// Age-based expiry for the per-coin history read cache.
    #[serde(with = "humantime_serde")]
    pub history_cache_ttl: Duration,

    /// Age-based expiry for the aggregate `/networks` response.
    #[serde(with = "humantime_serde")]
    pub networks_cache_ttl: Duration,

    /// Total per-request budget for upstream provider calls.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    pub sources: SourceEndpoints,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            http_port: 8000,
            data_dir: PathBuf::from("data"),
            collection_interval: Duration::from_secs(4 * 60 * 60),
            history_cache_ttl: Duration::from_secs(60),
            networks_cache_ttl: Duration::from_secs(10 * 60),
            request_timeout: Duration::from_secs(10),
            sources: SourceEndpoints::default(),
        }
    }
}

/// Upstream endpoints, overridable so tests (and self-hosted mirrors) can
/// point adapters elsewhere. Keys are optional; a keyed provider without its
/// key degrades to unavailable instead of failing startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceEndpoints {
    pub minerstat_url: String,
    pub coingecko_url: String,
    pub coingecko_api_key: Option<String>,
    pub blockchain_info_url: String,
    pub blockscout_url: String,
    pub litecoinspace_url: String,
    pub coinwarz_url: String,
    pub coinwarz_api_key: Option<String>,
}

impl Default for SourceEndpoints {
    fn default() -> Self {
        SourceEndpoints {
            minerstat_url: "https://api.minerstat.com/v2".to_string(),
            coingecko_url: "https://api.coingecko.com/api/v3".to_string(),
            coingecko_api_key: None,
            blockchain_info_url: "https://blockchain.info".to_string(),
            blockscout_url: "https://etc.blockscout.com".to_string(),
            litecoinspace_url: "https://litecoinspace.org".to_string(),
            coinwarz_url: "https://www.coinwarz.com".to_string(),
            coinwarz_api_key: None,
        }
    }
}

impl Config {
    pub fn read_from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, BloxchaserError> {
        let path = path.as_ref();
        let raw =
            std::fs::read_to_string(path).map_err(|source| BloxchaserError::ConfigLoadFailure {
                path: path.to_path_buf(),
                source,
            })?;
        let loaded =
            toml::from_str(&raw).map_err(|source| BloxchaserError::ConfigParseFailure {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!("loaded config file from {}", path.display());
        Ok(loaded)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.http_port, 8000);
        assert_eq!(config.history_cache_ttl, Duration::from_secs(60));
        assert!(config.sources.coinwarz_api_key.is_none());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let doc = r#"
            http_port = 9999
            collection_interval = "2h"

            [sources]
            coinwarz_api_key = "secret"
        "#;
        let config: Config = toml::from_str(doc).unwrap();
        assert_eq!(config.http_port, 9999);
        assert_eq!(config.collection_interval, Duration::from_secs(7200));
        assert_eq!(config.sources.coinwarz_api_key.as_deref(), Some("secret"));
        assert_eq!(
            config.sources.minerstat_url,
            "https://api.minerstat.com/v2"
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(toml::from_str::<Config>("not_a_field = 1").is_err());
    }

    #[test]
    fn serializes_back_to_toml() {
        let rendered = Config::default().to_toml_string().unwrap();
        let reparsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(reparsed.http_port, 8000);
    }
}
