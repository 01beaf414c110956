//! The enrichment orchestrator: fan-out, fallback, merge, cache.
//!
//! Failure policy is best-effort throughout: a provider failure never fails
//! a merged response, and total provider failure yields a successful empty
//! response that is deliberately *not* cached (so the next caller retries
//! upstream). Only input validation surfaces as an error.

use crate::editions::{clamp_limit, fuzzy_title_match, sort_editions};
use crate::error::EnrichError;
use crate::merge::{merge_editions, merge_lookup, merge_search};
use crate::normalize::{ProviderRecords, normalize_book, normalize_doc, normalize_hit};
use async_trait::async_trait;
use bookdex_cache::{Cache, CacheClass, CacheHit, CacheKey, FetchError, FetchedValue, GetOrFetch};
use bookdex_core::config::CoreConfig;
use bookdex_core::domain::{EnrichOutcome, EnrichedResponse, ProviderId};
use bookdex_core::normalize::normalize_isbn;
use bookdex_core::ports::providers::{IsbnRegistryPort, OpenBibPort, VolumeCatalogPort};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// How many results to request from each provider for search operations.
const SEARCH_FAN_OUT: u32 = 20;

/// Advanced multi-field query. At least one of `title`/`author` is required.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<i32>,
    pub publisher: Option<String>,
}

/// One book in a batch request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookQuery {
    pub title: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
}

/// Best-effort result for one book of a batch.
#[derive(Clone, Debug)]
pub struct BookResult {
    pub query: BookQuery,
    pub result: Result<EnrichOutcome, String>,
}

/// Public surface of the orchestrator, as a port so pipelines and handlers
/// can be tested against stubs.
#[async_trait]
pub trait EnrichmentPort: Send + Sync {
    async fn enrich_by_isbn(&self, isbn: &str) -> Result<EnrichOutcome, EnrichError>;
    async fn enrich_by_title(&self, query: &str) -> Result<EnrichOutcome, EnrichError>;
    async fn enrich_by_author(&self, query: &str) -> Result<EnrichOutcome, EnrichError>;
    async fn enrich_advanced(&self, query: AdvancedQuery) -> Result<EnrichOutcome, EnrichError>;
    async fn enrich_editions(
        &self,
        work_title: &str,
        author: &str,
        limit: Option<u32>,
    ) -> Result<EnrichOutcome, EnrichError>;
    async fn enrich_multiple(&self, books: Vec<BookQuery>) -> Vec<BookResult>;
}

/// Provider clients the orchestrator fans out to.
#[derive(Clone)]
pub struct EnrichDeps {
    pub volume: Arc<dyn VolumeCatalogPort>,
    pub openbib: Arc<dyn OpenBibPort>,
    pub registry: Arc<dyn IsbnRegistryPort>,
}

/// The enrichment orchestrator.
pub struct Enricher {
    deps: EnrichDeps,
    cache: Arc<Cache>,
    config: CoreConfig,
    batch_slots: Arc<Semaphore>,
}

impl Enricher {
    #[must_use]
    pub fn new(deps: EnrichDeps, cache: Arc<Cache>, config: CoreConfig) -> Self {
        let batch_slots = Arc::new(Semaphore::new(config.batch_concurrency.max(1)));
        Self { deps, cache, config, batch_slots }
    }

    // ------------------------------------------------------------------
    // Fetch paths (cache-miss side)
    // ------------------------------------------------------------------

    /// ISBN fan-out: volume catalog and open bib concurrently; the registry
    /// is consulted only to supplement a missing cover image.
    async fn fetch_isbn_records(&self, isbn: &str) -> EnrichedResponse {
        let (volume, openbib) = tokio::join!(
            self.deps.volume.search_by_isbn(isbn),
            self.deps.openbib.lookup_isbn(isbn),
        );

        let mut records: Vec<ProviderRecords> = Vec::new();
        if let Some(payload) = volume.into_payload() {
            records.extend(payload.items.iter().map(normalize_hit));
        }
        if let Some(Some(doc)) = openbib.into_payload() {
            records.push(normalize_doc(&doc));
        }

        let has_cover = records.iter().any(|r| {
            r.work.as_ref().is_some_and(|w| w.cover_image_url.is_some())
                || r.editions.iter().any(|e| e.cover_image_url.is_some())
        });
        if !has_cover {
            if let Some(Some(book)) = self.deps.registry.lookup_isbn(isbn).await.into_payload() {
                records.push(normalize_book(&book));
            }
        }

        merge_lookup(records)
    }

    /// Search fan-out shared by title/author/advanced.
    async fn fetch_search_records(
        &self,
        volume_query: &str,
        openbib_query: &str,
    ) -> EnrichedResponse {
        let (volume, openbib) = tokio::join!(
            self.deps.volume.search_by_free_text(volume_query, SEARCH_FAN_OUT),
            self.deps.openbib.search(openbib_query, SEARCH_FAN_OUT),
        );

        let mut records: Vec<ProviderRecords> = Vec::new();
        if let Some(payload) = volume.into_payload() {
            records.extend(payload.items.iter().map(normalize_hit));
        }
        if let Some(payload) = openbib.into_payload() {
            records.extend(payload.docs.iter().map(normalize_doc));
        }

        merge_search(records)
    }

    // ------------------------------------------------------------------
    // Cache plumbing
    // ------------------------------------------------------------------

    /// Run one operation through the cache with the best-effort policy.
    ///
    /// The fetcher returns an empty response when every provider failed;
    /// that empty is surfaced as success but never cached, so the next
    /// caller retries upstream.
    async fn cached<F, Fut>(&self, key: CacheKey, ttl_seconds: u64, fetch: F) -> EnrichOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = EnrichedResponse>,
    {
        // Decode-check the hit before entering single-flight: an unreadable
        // entry (written by an incompatible version) is dropped and refetched
        // instead of being served forever.
        if let Some(hit) = self.cache.get(&key).await {
            if let Some(outcome) = decode_hit(&hit) {
                return outcome;
            }
            warn!(key = %key, "cached enrichment payload was unreadable, dropping entry");
            if let Err(e) = self.cache.delete(&key).await {
                debug!(key = %key, error = %e, "failed to drop unreadable entry");
            }
        }

        let key_class = key.class();
        let config = self.config.clone();
        let fetched = self
            .cache
            .get_or_fetch(&key, || async move {
                let response = fetch().await;
                if response.is_empty() {
                    return Err(FetchError("all providers failed or empty".to_string()));
                }
                let quality = response.merged_quality();
                // Enrichment entries earn their TTL: high-quality merges
                // stick for a day, thin ones for an hour.
                let ttl_seconds = if key_class == CacheClass::Enrich {
                    config.enrich_ttl_for_quality(quality)
                } else {
                    ttl_seconds
                };
                let payload =
                    serde_json::to_value(&response).map_err(|e| FetchError(e.to_string()))?;
                Ok(FetchedValue {
                    payload,
                    provider: response_provider(&response),
                    quality,
                    ttl_seconds,
                })
            })
            .await;

        match fetched {
            Ok(GetOrFetch::Cached(hit)) => decode_hit(&hit).unwrap_or_else(|| {
                warn!(key = %key, "raced unreadable cache entry, serving empty");
                EnrichOutcome::fresh(EnrichedResponse::default(), None)
            }),
            Ok(GetOrFetch::Fresh(value)) => {
                let response: EnrichedResponse =
                    serde_json::from_value(value.payload).unwrap_or_default();
                EnrichOutcome::fresh(response, value.provider)
            }
            Err(e) => {
                debug!(key = %key, error = %e, "enrichment degraded to empty response");
                EnrichOutcome::fresh(EnrichedResponse::default(), None)
            }
        }
    }

    /// Enrich one batch entry: by ISBN when present (the shared ISBN cache
    /// key plus single-flight is the in-batch dedup point), otherwise by
    /// title + author.
    async fn enrich_one(&self, book: &BookQuery) -> Result<EnrichOutcome, String> {
        if let Some(isbn) = book.isbn.as_deref() {
            if let Ok(outcome) = self.enrich_by_isbn(isbn).await {
                return Ok(outcome);
            }
            // Invalid ISBN: fall through to the title search, the batch is
            // best-effort.
        }
        if book.title.trim().is_empty() && book.author.trim().is_empty() {
            return Err("book entry has neither ISBN nor title/author".to_string());
        }

        self.enrich_advanced(AdvancedQuery {
            title: Some(book.title.clone()).filter(|t| !t.trim().is_empty()),
            author: Some(book.author.clone()).filter(|a| !a.trim().is_empty()),
            year: None,
            publisher: None,
        })
        .await
        .map_err(|e| e.to_string())
    }
}

/// Primary provider of a merged response: the best-ranked contributor.
fn response_provider(response: &EnrichedResponse) -> Option<ProviderId> {
    response
        .works
        .iter()
        .map(|w| w.primary_provider)
        .chain(response.editions.iter().map(|e| e.primary_provider))
        .min_by_key(ProviderId::rank)
}

/// Decode a cache hit into an annotated outcome.
fn decode_hit(hit: &CacheHit) -> Option<EnrichOutcome> {
    let response: EnrichedResponse = serde_json::from_value(hit.entry.payload.clone()).ok()?;
    Some(EnrichOutcome {
        response,
        provider: hit.entry.provider,
        cached: true,
        cache_source: Some(hit.source),
        age_seconds: Some(hit.age_seconds),
    })
}

#[async_trait]
impl EnrichmentPort for Enricher {
    async fn enrich_by_isbn(&self, isbn: &str) -> Result<EnrichOutcome, EnrichError> {
        let normalized = normalize_isbn(isbn)
            .ok_or_else(|| EnrichError::InvalidIsbn(isbn.trim().to_string()))?;

        let key = CacheKey::isbn(&normalized);
        let ttl = self.config.cache_ttls.isbn;
        Ok(self.cached(key, ttl, || self.fetch_isbn_records(&normalized)).await)
    }

    async fn enrich_by_title(&self, query: &str) -> Result<EnrichOutcome, EnrichError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(EnrichError::InvalidQuery("title must not be empty".to_string()));
        }

        let key = CacheKey::title(query);
        let ttl = self.config.cache_ttls.title;
        let volume_query = format!("intitle:{query}");
        let openbib_query = format!("title:{query}");
        Ok(self
            .cached(key, ttl, || self.fetch_search_records(&volume_query, &openbib_query))
            .await)
    }

    async fn enrich_by_author(&self, query: &str) -> Result<EnrichOutcome, EnrichError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(EnrichError::InvalidQuery("author must not be empty".to_string()));
        }

        let key = CacheKey::author(query);
        let ttl = self.config.cache_ttls.title;
        let volume_query = format!("inauthor:{query}");
        let openbib_query = format!("author:{query}");
        Ok(self
            .cached(key, ttl, || self.fetch_search_records(&volume_query, &openbib_query))
            .await)
    }

    async fn enrich_advanced(&self, query: AdvancedQuery) -> Result<EnrichOutcome, EnrichError> {
        let title = query.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
        let author = query.author.as_deref().map(str::trim).filter(|a| !a.is_empty());
        if title.is_none() && author.is_none() {
            return Err(EnrichError::InvalidQuery(
                "at least one of title or author is required".to_string(),
            ));
        }

        let key = CacheKey::advanced(title, author, query.year, query.publisher.as_deref());
        let ttl = self.config.cache_ttls.advanced;

        let mut volume_parts = Vec::new();
        let mut openbib_parts = Vec::new();
        if let Some(t) = title {
            volume_parts.push(format!("intitle:{t}"));
            openbib_parts.push(format!("title:{t}"));
        }
        if let Some(a) = author {
            volume_parts.push(format!("inauthor:{a}"));
            openbib_parts.push(format!("author:{a}"));
        }
        if let Some(p) = query.publisher.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            volume_parts.push(format!("inpublisher:{p}"));
            openbib_parts.push(format!("publisher:{p}"));
        }
        let volume_query = volume_parts.join(" ");
        let openbib_query = openbib_parts.join(" ");
        let year = query.year;

        Ok(self
            .cached(key, ttl, || async move {
                let mut response =
                    self.fetch_search_records(&volume_query, &openbib_query).await;
                if let Some(year) = year {
                    // Post-filter on year, keeping records that carry no
                    // year at all rather than guessing.
                    response
                        .works
                        .retain(|w| w.first_publication_year.is_none_or(|y| y == year));
                    response
                        .editions
                        .retain(|e| e.publication_year().is_none_or(|y| y == year));
                }
                response
            })
            .await)
    }

    async fn enrich_editions(
        &self,
        work_title: &str,
        author: &str,
        limit: Option<u32>,
    ) -> Result<EnrichOutcome, EnrichError> {
        let work_title = work_title.trim();
        if work_title.is_empty() {
            return Err(EnrichError::InvalidQuery("work title must not be empty".to_string()));
        }

        let key = CacheKey::editions(work_title, author);
        let limit = clamp_limit(limit);
        let query_title = work_title.to_string();
        let volume_query = format!("intitle:{work_title} inauthor:{author}");
        let openbib_query = format!("title:{work_title} author:{author}");

        // The cache holds the full sorted candidate list so callers with
        // different limits share one entry; truncation happens per request.
        let mut outcome = self
            .cached(key, self.config.cache_ttls.enrich_high, || async move {
                let merged = self.fetch_search_records(&volume_query, &openbib_query).await;

                let matching: Vec<_> = merged
                    .editions
                    .into_iter()
                    .filter(|e| {
                        e.title
                            .as_deref()
                            .is_none_or(|t| fuzzy_title_match(&query_title, t))
                    })
                    .collect();
                let mut editions = merge_editions(matching);
                sort_editions(&mut editions);

                EnrichedResponse { works: Vec::new(), editions, authors: Vec::new() }
            })
            .await;

        outcome.response.works.clear();
        outcome.response.authors.clear();
        outcome.response.editions.truncate(limit);
        Ok(outcome)
    }

    /// Best-effort parallel enrichment with bounded concurrency. In-batch
    /// ISBN deduplication falls out of the ISBN cache key: concurrent
    /// requests for one ISBN share a single provider fetch via single-flight.
    async fn enrich_multiple(&self, books: Vec<BookQuery>) -> Vec<BookResult> {
        let tasks = books.into_iter().map(|book| {
            let slots = Arc::clone(&self.batch_slots);
            async move {
                let _permit = slots.acquire().await.ok();
                let result = self.enrich_one(&book).await;
                BookResult { query: book, result }
            }
        });

        join_all(tasks).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookdex_cache::MemoryTier;
    use bookdex_core::ports::providers::{
        OpenBibDoc, OpenBibSearchPayload, ProviderErrorKind, ProviderFailure, ProviderResponse,
        RegistryBook, VolumeHit, VolumeSearchPayload,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ------------------------------------------------------------------
    // Stub providers
    // ------------------------------------------------------------------

    #[derive(Default)]
    struct StubVolume {
        hits: Vec<VolumeHit>,
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl VolumeCatalogPort for StubVolume {
        async fn search_by_free_text(
            &self,
            _query: &str,
            _max_results: u32,
        ) -> ProviderResponse<VolumeSearchPayload> {
            self.respond()
        }

        async fn search_by_isbn(&self, _isbn: &str) -> ProviderResponse<VolumeSearchPayload> {
            self.respond()
        }

        async fn search_by_volume_id(&self, _volume_id: &str) -> ProviderResponse<VolumeHit> {
            ProviderResponse::failed(
                ProviderId::VolumeCatalog,
                1,
                ProviderFailure::new(ProviderErrorKind::NotFound, "not found"),
            )
        }
    }

    impl StubVolume {
        fn respond(&self) -> ProviderResponse<VolumeSearchPayload> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return ProviderResponse::failed(
                    ProviderId::VolumeCatalog,
                    1,
                    ProviderFailure::new(ProviderErrorKind::Timeout, "deadline exceeded"),
                );
            }
            ProviderResponse::ok(
                ProviderId::VolumeCatalog,
                1,
                VolumeSearchPayload {
                    total_items: self.hits.len() as u32,
                    items: self.hits.clone(),
                },
            )
        }
    }

    #[derive(Default)]
    struct StubOpenBib {
        doc: Option<OpenBibDoc>,
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl OpenBibPort for StubOpenBib {
        async fn search(&self, _query: &str, _limit: u32) -> ProviderResponse<OpenBibSearchPayload> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return ProviderResponse::failed(
                    ProviderId::OpenBib,
                    1,
                    ProviderFailure::new(ProviderErrorKind::Timeout, "deadline exceeded"),
                );
            }
            ProviderResponse::ok(
                ProviderId::OpenBib,
                1,
                OpenBibSearchPayload {
                    num_found: u32::from(self.doc.is_some()),
                    docs: self.doc.clone().into_iter().collect(),
                },
            )
        }

        async fn lookup_isbn(&self, _isbn: &str) -> ProviderResponse<Option<OpenBibDoc>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return ProviderResponse::failed(
                    ProviderId::OpenBib,
                    1,
                    ProviderFailure::new(ProviderErrorKind::Timeout, "deadline exceeded"),
                );
            }
            ProviderResponse::ok(ProviderId::OpenBib, 1, self.doc.clone())
        }
    }

    #[derive(Default)]
    struct StubRegistry {
        book: Option<RegistryBook>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IsbnRegistryPort for StubRegistry {
        async fn lookup_isbn(&self, _isbn: &str) -> ProviderResponse<Option<RegistryBook>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ProviderResponse::ok(ProviderId::IsbnRegistry, 1, self.book.clone())
        }
    }

    fn volume_hit(title: &str, cover: Option<&str>) -> VolumeHit {
        VolumeHit {
            volume_id: "v1".to_string(),
            title: Some(title.to_string()),
            authors: vec!["Ursula K. Le Guin".to_string()],
            publisher: Some("Harper & Row".to_string()),
            published_date: Some("1974".to_string()),
            isbn_13s: vec!["9780061054884".to_string()],
            thumbnail: cover.map(str::to_string),
            ..VolumeHit::default()
        }
    }

    fn build_enricher(
        volume: StubVolume,
        openbib: StubOpenBib,
        registry: StubRegistry,
    ) -> (Enricher, Arc<StubVolume>, Arc<StubOpenBib>, Arc<StubRegistry>) {
        let volume = Arc::new(volume);
        let openbib = Arc::new(openbib);
        let registry = Arc::new(registry);
        let cache = Arc::new(Cache::new(
            Arc::new(MemoryTier::new()),
            Arc::new(MemoryTier::new()),
        ));
        let deps = EnrichDeps {
            volume: Arc::clone(&volume) as Arc<dyn VolumeCatalogPort>,
            openbib: Arc::clone(&openbib) as Arc<dyn OpenBibPort>,
            registry: Arc::clone(&registry) as Arc<dyn IsbnRegistryPort>,
        };
        (
            Enricher::new(deps, cache, CoreConfig::default()),
            volume,
            openbib,
            registry,
        )
    }

    // ------------------------------------------------------------------
    // Tests
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_invalid_isbn_is_rejected() {
        let (enricher, ..) = build_enricher(StubVolume::default(), StubOpenBib::default(), StubRegistry::default());
        let err = enricher.enrich_by_isbn("not-an-isbn").await.unwrap_err();
        assert!(matches!(err, EnrichError::InvalidIsbn(_)));
    }

    #[tokio::test]
    async fn test_isbn_miss_then_hit() {
        let volume = StubVolume {
            hits: vec![volume_hit("The Dispossessed", Some("https://img.example/c.jpg"))],
            ..StubVolume::default()
        };
        let (enricher, volume, ..) =
            build_enricher(volume, StubOpenBib::default(), StubRegistry::default());

        let first = enricher.enrich_by_isbn("978-0-06-105488-4").await.unwrap();
        assert!(!first.cached);
        assert_eq!(first.response.works[0].title, "The Dispossessed");
        assert_eq!(first.provider, Some(ProviderId::VolumeCatalog));

        // Wait for write-through, then the same query is served from cache.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let second = enricher.enrich_by_isbn("9780061054884").await.unwrap();
        assert!(second.cached);
        assert!(second.cache_source.is_some());
        assert_eq!(second.response, first.response);
        assert_eq!(volume.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_registry_called_only_without_cover() {
        let with_cover = StubVolume {
            hits: vec![volume_hit("The Dispossessed", Some("https://img.example/c.jpg"))],
            ..StubVolume::default()
        };
        let (enricher, _, _, registry) =
            build_enricher(with_cover, StubOpenBib::default(), StubRegistry::default());
        enricher.enrich_by_isbn("9780061054884").await.unwrap();
        assert_eq!(registry.calls.load(Ordering::SeqCst), 0);

        let without_cover = StubVolume {
            hits: vec![volume_hit("The Dispossessed", None)],
            ..StubVolume::default()
        };
        let registry_book = RegistryBook {
            title: Some("The Dispossessed".to_string()),
            cover_url: Some("https://img.example/registry.jpg".to_string()),
            isbn13: Some("9780061054884".to_string()),
            ..RegistryBook::default()
        };
        let (enricher, _, _, registry) = build_enricher(
            without_cover,
            StubOpenBib::default(),
            StubRegistry { book: Some(registry_book), calls: AtomicUsize::new(0) },
        );
        let outcome = enricher.enrich_by_isbn("9780061054884").await.unwrap();
        assert_eq!(registry.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            outcome.response.works[0].cover_image_url.as_deref(),
            Some("https://img.example/registry.jpg")
        );
    }

    #[tokio::test]
    async fn test_total_outage_is_empty_success_and_uncached() {
        let (enricher, volume, ..) = build_enricher(
            StubVolume { fail: true, ..StubVolume::default() },
            StubOpenBib { fail: true, ..StubOpenBib::default() },
            StubRegistry::default(),
        );

        let outcome = enricher.enrich_by_isbn("9780451524935").await.unwrap();
        assert!(outcome.response.is_empty());
        assert_eq!(outcome.provider, None);
        assert!(!outcome.cached);

        // Not cached: a second call goes upstream again.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        enricher.enrich_by_isbn("9780451524935").await.unwrap();
        assert_eq!(volume.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_advanced_requires_title_or_author() {
        let (enricher, ..) = build_enricher(StubVolume::default(), StubOpenBib::default(), StubRegistry::default());
        let err = enricher
            .enrich_advanced(AdvancedQuery { year: Some(1974), ..AdvancedQuery::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_editions_listing_is_editions_only() {
        let volume = StubVolume {
            hits: vec![
                volume_hit("The Dispossessed", None),
                volume_hit("The Dispossessed: An Ambiguous Utopia", None),
                volume_hit("Completely Different Book", None),
            ],
            ..StubVolume::default()
        };
        let (enricher, ..) = build_enricher(volume, StubOpenBib::default(), StubRegistry::default());

        let outcome = enricher
            .enrich_editions("The Dispossessed", "Le Guin", Some(10))
            .await
            .unwrap();
        assert!(outcome.response.works.is_empty());
        assert!(outcome.response.authors.is_empty());
        // All three hits share one ISBN so they merge into one edition; the
        // non-matching title was filtered before merging.
        assert_eq!(outcome.response.editions.len(), 1);
    }

    #[tokio::test]
    async fn test_enrich_multiple_dedupes_by_isbn() {
        let volume = StubVolume {
            hits: vec![volume_hit("The Dispossessed", Some("https://img.example/c.jpg"))],
            ..StubVolume::default()
        };
        let (enricher, volume, ..) =
            build_enricher(volume, StubOpenBib::default(), StubRegistry::default());

        let book = BookQuery {
            title: "The Dispossessed".to_string(),
            author: "Ursula K. Le Guin".to_string(),
            isbn: Some("9780061054884".to_string()),
        };
        let results = enricher
            .enrich_multiple(vec![book.clone(), book.clone(), book])
            .await;

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.result.is_ok()));
        // One shared fetch for the three identical ISBNs.
        assert_eq!(volume.calls.load(Ordering::SeqCst), 1);
    }
}
