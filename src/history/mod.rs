use chrono::Utc;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use utoipa::ToSchema;

use crate::coins::CoinConfig;
use crate::error::BloxchaserError;

pub mod trend;

const SECS_PER_DAY: i64 = 86_400;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read history file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write history file '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("history file '{}' is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One collected data point: unix seconds, difficulty, hashrate in raw H/s,
/// price in USD. Field names match the on-disk format, which keeps the files
/// small — they are rewritten wholesale on every append.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoryEntry {
    pub t: i64,
    pub d: f64,
    pub h: f64,
    pub p: f64,
}

/// On-disk document for one coin: a small header plus the append-only entry
/// log.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoinHistory {
    pub coin: String,
    pub name: String,
    pub algorithm: String,
    pub block_time: f64,
    pub data_started: String,
    pub last_updated: Option<String>,
    pub total_entries: usize,
    pub data: Vec<HistoryEntry>,
}

impl CoinHistory {
    fn new_for(coin: &CoinConfig) -> Self {
        CoinHistory {
            coin: coin.symbol.to_string(),
            name: coin.display_name.to_string(),
            algorithm: coin.algorithm.to_string(),
            block_time: coin.block_interval_secs,
            data_started: Utc::now().to_rfc3339(),
            last_updated: None,
            total_entries: 0,
            data: Vec::new(),
        }
    }

    /// Entries usable for charting and trends: zero-hashrate points are
    /// placeholders, not measurements.
    pub fn chartable(&self) -> Vec<HistoryEntry> {
        self.data.iter().filter(|e| e.h > 0.0).copied().collect()
    }
}

/// Append-only per-coin snapshot log: one JSON file per coin under
/// `<data_dir>/history/`, single writer (the collector), many readers (the
/// serving path) going through a short-lived in-memory cache.
pub struct HistoryStore {
    dir: PathBuf,
    cache: Cache<String, Arc<CoinHistory>>,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(data_dir: &Path, cache_ttl: Duration) -> Result<Self, BloxchaserError> {
        let dir = data_dir.join("history");
        std::fs::create_dir_all(&dir).map_err(|source| {
            BloxchaserError::DataDirCreationFailure {
                path: dir.clone(),
                source,
            }
        })?;

        Ok(HistoryStore {
            dir,
            // entries expire purely by age, they are never explicitly
            // invalidated; readers may observe the pre-append state for up to
            // one TTL
            cache: Cache::builder()
                .time_to_live(cache_ttl)
                .max_capacity(64)
                .build(),
            write_lock: Mutex::new(()),
        })
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir
            .join(format!("{}-history.json", symbol.to_lowercase()))
    }

    /// Uncached read straight from the backing file. Entries are sorted on
    /// read; duplicate timestamps are tolerated and kept in stable order.
    fn load_from_disk(&self, symbol: &str) -> Result<Option<CoinHistory>, StoreError> {
        let path = self.path_for(symbol);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        let mut history: CoinHistory =
            serde_json::from_slice(&raw).map_err(|source| StoreError::Corrupt { path, source })?;
        history.data.sort_by_key(|e| e.t);
        Ok(Some(history))
    }

    fn write_atomic(&self, symbol: &str, history: &CoinHistory) -> Result<(), StoreError> {
        let path = self.path_for(symbol);
        let tmp =
            tempfile::NamedTempFile::new_in(&self.dir).map_err(|source| StoreError::Write {
                path: path.clone(),
                source,
            })?;
        serde_json::to_writer_pretty(tmp.as_file(), history).map_err(|source| {
            StoreError::Write {
                path: path.clone(),
                source: source.into(),
            }
        })?;
        // rename within the same directory, so an interrupted write can never
        // leave a truncated file behind
        tmp.persist(&path).map_err(|err| StoreError::Write {
            path,
            source: err.error,
        })?;
        Ok(())
    }

    /// The only mutator. Creates the file with a fresh header on the first
    /// append for a coin.
    pub async fn append(&self, coin: &CoinConfig, entry: HistoryEntry) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut history = self
            .load_from_disk(coin.symbol)?
            .unwrap_or_else(|| CoinHistory::new_for(coin));
        history.data.push(entry);
        history.last_updated = Some(Utc::now().to_rfc3339());
        history.total_entries = history.data.len();

        self.write_atomic(coin.symbol, &history)
    }

    pub async fn read_all(&self, symbol: &str) -> Result<Option<Arc<CoinHistory>>, StoreError> {
        let key = symbol.to_uppercase();
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(Some(cached));
        }
        match self.load_from_disk(&key)? {
            Some(history) => {
                let history = Arc::new(history);
                self.cache.insert(key, history.clone()).await;
                Ok(Some(history))
            }
            None => Ok(None),
        }
    }

    /// Like `read_all` but with the entry log narrowed to the last `days`
    /// days. The header is preserved; `total_entries` reflects the full log.
    pub async fn read_recent(
        &self,
        symbol: &str,
        days: u32,
    ) -> Result<Option<CoinHistory>, StoreError> {
        let Some(full) = self.read_all(symbol).await? else {
            return Ok(None);
        };
        let cutoff = Utc::now().timestamp() - days as i64 * SECS_PER_DAY;
        let mut narrowed = (*full).clone();
        narrowed.data.retain(|e| e.t >= cutoff);
        Ok(Some(narrowed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coins::coin_config;

    fn entry(t: i64, h: f64) -> HistoryEntry {
        HistoryEntry {
            t,
            d: 1.0e13,
            h,
            p: 100.0,
        }
    }

    #[tokio::test]
    async fn appends_are_sorted_on_read_regardless_of_write_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path(), Duration::from_secs(60)).unwrap();
        let btc = coin_config("BTC").unwrap();

        for t in [300, 100, 200] {
            store.append(btc, entry(t, 1.0)).await.unwrap();
        }

        // bypass the cache with a fresh store over the same directory
        let fresh = HistoryStore::new(dir.path(), Duration::from_secs(60)).unwrap();
        let history = fresh.read_all("BTC").await.unwrap().unwrap();
        let timestamps: Vec<i64> = history.data.iter().map(|e| e.t).collect();
        assert_eq!(timestamps, vec![100, 200, 300]);
        assert_eq!(history.total_entries, 3);
        assert_eq!(history.name, "Bitcoin");
    }

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path(), Duration::from_secs(60)).unwrap();
        assert!(store.read_all("BTC").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path(), Duration::from_secs(60)).unwrap();
        std::fs::write(dir.path().join("history/btc-history.json"), b"{not json").unwrap();

        let err = store.read_all("BTC").await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn reads_within_ttl_ignore_concurrent_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path(), Duration::from_secs(60)).unwrap();
        let btc = coin_config("BTC").unwrap();

        store.append(btc, entry(100, 1.0)).await.unwrap();
        let first = store.read_all("BTC").await.unwrap().unwrap();
        assert_eq!(first.data.len(), 1);

        store.append(btc, entry(200, 2.0)).await.unwrap();
        let second = store.read_all("BTC").await.unwrap().unwrap();
        // still the cached pre-append view; age is the only invalidator
        assert_eq!(second.data.len(), 1);

        let fresh = HistoryStore::new(dir.path(), Duration::from_secs(60)).unwrap();
        assert_eq!(fresh.read_all("BTC").await.unwrap().unwrap().data.len(), 2);
    }

    #[tokio::test]
    async fn read_recent_narrows_the_window() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path(), Duration::from_secs(60)).unwrap();
        let btc = coin_config("BTC").unwrap();

        let now = Utc::now().timestamp();
        store.append(btc, entry(now - 10 * SECS_PER_DAY, 1.0)).await.unwrap();
        store.append(btc, entry(now - SECS_PER_DAY, 2.0)).await.unwrap();

        let recent = store.read_recent("BTC", 7).await.unwrap().unwrap();
        assert_eq!(recent.data.len(), 1);
        assert_eq!(recent.data[0].h, 2.0);
        // header still reflects the whole log
        assert_eq!(recent.total_entries, 2);
    }

    #[tokio::test]
    async fn chartable_drops_zero_hashrate_placeholders() {
        let history = CoinHistory {
            coin: "BTC".into(),
            name: "Bitcoin".into(),
            algorithm: "SHA-256".into(),
            block_time: 600.0,
            data_started: Utc::now().to_rfc3339(),
            last_updated: None,
            total_entries: 3,
            data: vec![entry(1, 5.0), entry(2, 0.0), entry(3, 6.0)],
        };
        let chartable = history.chartable();
        assert_eq!(chartable.len(), 2);
        assert!(chartable.iter().all(|e| e.h > 0.0));
    }
}
