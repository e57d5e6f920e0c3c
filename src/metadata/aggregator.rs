use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::{debug, info, warn};

use super::anilist::AnilistClient;
use super::kitsu::KitsuClient;
use super::mal::MalClient;
use super::{EntryInfo, MetadataBackend, MetadataProvider};
use crate::config::{CacheConfig, MetadataConfig};
use crate::error::{Error, Result};
use crate::search::Medium;

/// Fans one query out to every provider, in order, and keeps recent answers
pub struct Aggregator {
    providers: Vec<Box<dyn MetadataProvider>>,
    cache: ResponseCache,
}

impl Aggregator {
    pub fn new(providers: Vec<Box<dyn MetadataProvider>>, ttl: Duration) -> Self {
        Self {
            providers,
            cache: ResponseCache::new(ttl),
        }
    }

    pub fn from_config(metadata: &MetadataConfig, cache: &CacheConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("oragi/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut providers: Vec<Box<dyn MetadataProvider>> = Vec::new();

        if metadata.mal_client_id.trim().is_empty() {
            warn!("No MAL client id configured, MyAnimeList lookups disabled");
        } else {
            providers.push(Box::new(MalClient::new(metadata.mal_client_id.trim())?));
        }
        if metadata.anilist {
            providers.push(Box::new(AnilistClient::new(client.clone())));
        }
        if metadata.kitsu {
            providers.push(Box::new(KitsuClient::new(client)));
        }

        let sources: Vec<_> = providers.iter().map(|p| p.source().display_name()).collect();
        info!(sources = ?sources, ttl_secs = cache.ttl_secs, "Metadata providers ready");

        Ok(Self::new(providers, cache.ttl()))
    }
}

#[async_trait::async_trait]
impl MetadataBackend for Aggregator {
    async fn search(&self, query: &str, medium: Medium) -> Result<EntryInfo> {
        if let Some(entry) = self.cache.get(medium, query) {
            debug!(query = %query, %medium, "Cache hit");
            return Ok(entry);
        }

        let mut entry = EntryInfo::new();
        let mut last_error = None;

        for provider in &self.providers {
            let source = provider.source();
            match provider.search(query, medium).await {
                Ok(Some(record)) => entry.insert(source, record),
                Ok(None) => debug!(query = %query, source = source.display_name(), "No match"),
                Err(e) => {
                    warn!(query = %query, source = source.display_name(), "Provider failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            // every provider failed, nothing to show
            Some(e) if entry.is_empty() => Err(Error::Lookup(e.to_string())),
            // partial answers are not cached so the failed site gets retried
            Some(_) => Ok(entry),
            None => {
                self.cache.insert(medium, query, entry.clone());
                Ok(entry)
            }
        }
    }
}

const CACHE_CAPACITY: usize = 1024;

/// In-memory answers keyed by medium and lowercased query
struct ResponseCache {
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<(Medium, String), (Instant, EntryInfo)>>,
}

impl ResponseCache {
    fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, CACHE_CAPACITY)
    }

    fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn get(&self, medium: Medium, query: &str) -> Option<EntryInfo> {
        if self.ttl.is_zero() {
            return None;
        }

        let cache = self.entries.lock().ok()?;
        cache
            .get(&(medium, query.to_lowercase()))
            .filter(|(stored, _)| stored.elapsed() < self.ttl)
            .map(|(_, entry)| entry.clone())
    }

    fn insert(&self, medium: Medium, query: &str, entry: EntryInfo) {
        if self.ttl.is_zero() {
            return;
        }

        if let Ok(mut cache) = self.entries.lock() {
            cache.retain(|_, (stored, _)| stored.elapsed() < self.ttl);
            // full of live entries, drop the oldest
            if cache.len() >= self.capacity {
                let oldest = cache
                    .iter()
                    .min_by_key(|(_, (stored, _))| *stored)
                    .map(|(key, _)| key.clone());
                if let Some(key) = oldest {
                    cache.remove(&key);
                }
            }
            cache.insert((medium, query.to_lowercase()), (Instant::now(), entry));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{LinkRecord, Source, SourceRecord};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeProvider {
        source: Source,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl FakeProvider {
        fn boxed(
            source: Source,
            fail: bool,
            calls: &Arc<AtomicUsize>,
        ) -> Box<dyn MetadataProvider> {
            Box::new(Self {
                source,
                fail,
                calls: Arc::clone(calls),
            })
        }
    }

    #[async_trait::async_trait]
    impl MetadataProvider for FakeProvider {
        fn source(&self) -> Source {
            self.source
        }

        async fn search(&self, query: &str, _medium: Medium) -> Result<Option<SourceRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Metadata("boom".to_string()));
            }
            Ok(Some(SourceRecord::Link(LinkRecord {
                title: query.to_string(),
                url: format!("http://{}", self.source.display_name()),
            })))
        }
    }

    #[tokio::test]
    async fn test_collects_every_provider() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aggregator = Aggregator::new(
            vec![
                FakeProvider::boxed(Source::Anilist, false, &calls),
                FakeProvider::boxed(Source::Kitsu, false, &calls),
            ],
            Duration::ZERO,
        );

        let entry = aggregator.search("Monster", Medium::Anime).await.unwrap();
        assert_eq!(entry.len(), 2);
        assert!(entry.get(Source::Kitsu).is_some());
    }

    #[tokio::test]
    async fn test_one_failure_keeps_the_rest() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aggregator = Aggregator::new(
            vec![
                FakeProvider::boxed(Source::Mal, true, &calls),
                FakeProvider::boxed(Source::Kitsu, false, &calls),
            ],
            Duration::from_secs(60),
        );

        let entry = aggregator.search("Monster", Medium::Anime).await.unwrap();
        assert_eq!(entry.len(), 1);

        // partial answers are not cached
        aggregator.search("Monster", Medium::Anime).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_all_failures_is_lookup_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aggregator = Aggregator::new(
            vec![FakeProvider::boxed(Source::Mal, true, &calls)],
            Duration::ZERO,
        );

        let result = aggregator.search("Monster", Medium::Anime).await;
        assert!(matches!(result, Err(Error::Lookup(_))));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_providers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aggregator = Aggregator::new(
            vec![FakeProvider::boxed(Source::Kitsu, false, &calls)],
            Duration::from_secs(60),
        );

        let first = aggregator.search("Monster", Medium::Anime).await.unwrap();
        let second = aggregator.search("MONSTER", Medium::Anime).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // a different medium is a different entry
        aggregator.search("Monster", Medium::Manga).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cache_evicts_oldest_when_full() {
        let cache = ResponseCache::with_capacity(Duration::from_secs(60), 2);
        cache.insert(Medium::Anime, "Monster", EntryInfo::new());
        std::thread::sleep(Duration::from_millis(2));
        cache.insert(Medium::Anime, "Berserk", EntryInfo::new());
        std::thread::sleep(Duration::from_millis(2));
        cache.insert(Medium::Anime, "Mushishi", EntryInfo::new());

        assert!(cache.get(Medium::Anime, "Monster").is_none());
        assert!(cache.get(Medium::Anime, "Berserk").is_some());
        assert!(cache.get(Medium::Anime, "Mushishi").is_some());
        assert_eq!(cache.entries.lock().unwrap().len(), 2);
    }

    fn configured_sources(metadata: &MetadataConfig) -> Vec<Source> {
        let aggregator = Aggregator::from_config(metadata, &CacheConfig::default()).unwrap();
        aggregator.providers.iter().map(|p| p.source()).collect()
    }

    #[test]
    fn test_blank_client_id_disables_mal() {
        let metadata = MetadataConfig {
            mal_client_id: "  ".to_string(),
            anilist: true,
            kitsu: false,
        };
        assert_eq!(configured_sources(&metadata), vec![Source::Anilist]);
    }

    #[test]
    fn test_every_provider_enabled() {
        let metadata = MetadataConfig {
            mal_client_id: "client-id".to_string(),
            anilist: true,
            kitsu: true,
        };
        assert_eq!(
            configured_sources(&metadata),
            vec![Source::Mal, Source::Anilist, Source::Kitsu]
        );
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aggregator = Aggregator::new(
            vec![FakeProvider::boxed(Source::Kitsu, false, &calls)],
            Duration::ZERO,
        );

        aggregator.search("Monster", Medium::Anime).await.unwrap();
        aggregator.search("Monster", Medium::Anime).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
