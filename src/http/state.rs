use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::coins::supported_symbols;
use crate::history::HistoryStore;
use crate::models::NetworkSnapshot;
use crate::resolver::Resolver;

/// Everything request handlers need, constructed once at startup and cloned
/// into the router. The caches live here instead of in module-level statics
/// so their lifetime and expiry are owned by the process wiring.
#[derive(Clone)]
pub(crate) struct AppState {
    resolver: Arc<Resolver>,
    store: Arc<HistoryStore>,
    networks_cache: Cache<String, Arc<Vec<NetworkSnapshot>>>,
}

impl AppState {
    pub(crate) fn new(
        resolver: Arc<Resolver>,
        store: Arc<HistoryStore>,
        networks_cache_ttl: Duration,
    ) -> Self {
        AppState {
            resolver,
            store,
            networks_cache: Cache::builder()
                .time_to_live(networks_cache_ttl)
                .max_capacity(4)
                .build(),
        }
    }

    pub(crate) fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub(crate) fn store(&self) -> &HistoryStore {
        &self.store
    }

    // the aggregate is keyed by the full symbol set, not per coin
    fn networks_cache_key() -> String {
        supported_symbols().join(",")
    }

    pub(crate) async fn cached_networks(&self) -> Option<Arc<Vec<NetworkSnapshot>>> {
        self.networks_cache.get(&Self::networks_cache_key()).await
    }

    pub(crate) async fn cache_networks(
        &self,
        snapshots: Vec<NetworkSnapshot>,
    ) -> Arc<Vec<NetworkSnapshot>> {
        let snapshots = Arc::new(snapshots);
        self.networks_cache
            .insert(Self::networks_cache_key(), snapshots.clone())
            .await;
        snapshots
    }
}
