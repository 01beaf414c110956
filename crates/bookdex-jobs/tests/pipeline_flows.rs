//! End-to-end pipeline tests against stubbed enrichment and vision ports.

use async_trait::async_trait;
use bookdex_cache::{Cache, MemoryTier};
use bookdex_core::config::CoreConfig;
use bookdex_core::domain::{EnrichOutcome, EnrichedResponse, ProviderId, Work};
use bookdex_core::job::JobStatus;
use bookdex_core::ports::JobStorePort;
use bookdex_core::ports::providers::{
    CsvParsePayload, CsvRow, ImageSource, ProviderErrorKind, ProviderFailure, ProviderResponse,
    ScannedBook, ShelfScanPayload, VisionModelPort,
};
use bookdex_enrich::{AdvancedQuery, BookQuery, BookResult, EnrichError, EnrichmentPort};
use bookdex_jobs::socket_testing::{ChannelSocket, drain, json_frames};
use bookdex_jobs::{
    JobError, JobRegistry, MemoryJobStore, PipelineDeps, start_batch_enrichment,
    start_bookshelf_scan, start_csv_import, start_single_enrichment,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// ----------------------------------------------------------------------
// Stubs
// ----------------------------------------------------------------------

struct StubEnricher {
    delay: Duration,
    calls: AtomicUsize,
}

impl StubEnricher {
    fn instant() -> Self {
        Self { delay: Duration::ZERO, calls: AtomicUsize::new(0) }
    }

    fn slow(delay: Duration) -> Self {
        Self { delay, calls: AtomicUsize::new(0) }
    }

    async fn outcome(&self) -> EnrichOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let mut response = EnrichedResponse::default();
        response.works.push(Work::from_provider("Stub Book", ProviderId::VolumeCatalog));
        EnrichOutcome::fresh(response, Some(ProviderId::VolumeCatalog))
    }
}

#[async_trait]
impl EnrichmentPort for StubEnricher {
    async fn enrich_by_isbn(&self, _isbn: &str) -> Result<EnrichOutcome, EnrichError> {
        Ok(self.outcome().await)
    }

    async fn enrich_by_title(&self, _query: &str) -> Result<EnrichOutcome, EnrichError> {
        Ok(self.outcome().await)
    }

    async fn enrich_by_author(&self, _query: &str) -> Result<EnrichOutcome, EnrichError> {
        Ok(self.outcome().await)
    }

    async fn enrich_advanced(&self, _query: AdvancedQuery) -> Result<EnrichOutcome, EnrichError> {
        Ok(self.outcome().await)
    }

    async fn enrich_editions(
        &self,
        _work_title: &str,
        _author: &str,
        _limit: Option<u32>,
    ) -> Result<EnrichOutcome, EnrichError> {
        Ok(self.outcome().await)
    }

    async fn enrich_multiple(&self, books: Vec<BookQuery>) -> Vec<BookResult> {
        let mut results = Vec::with_capacity(books.len());
        for book in books {
            let result = Ok(self.outcome().await);
            results.push(BookResult { query: book, result });
        }
        results
    }
}

struct StubVision {
    rows: Vec<CsvRow>,
    books_per_photo: usize,
    failure: Option<ProviderFailure>,
    calls: AtomicUsize,
}

impl StubVision {
    fn with_rows(rows: Vec<CsvRow>) -> Self {
        Self { rows, books_per_photo: 0, failure: None, calls: AtomicUsize::new(0) }
    }

    fn with_books_per_photo(count: usize) -> Self {
        Self { rows: Vec::new(), books_per_photo: count, failure: None, calls: AtomicUsize::new(0) }
    }

    fn failing(failure: ProviderFailure) -> Self {
        Self { rows: Vec::new(), books_per_photo: 0, failure: Some(failure), calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl VisionModelPort for StubVision {
    async fn scan_image(&self, _image: &ImageSource) -> ProviderResponse<ShelfScanPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = &self.failure {
            return ProviderResponse::failed(ProviderId::VisionModel, 1, failure.clone());
        }
        let books = (0..self.books_per_photo)
            .map(|i| ScannedBook {
                title: format!("Shelf Book {i}"),
                author: "Shelf Author".to_string(),
                isbn: None,
                confidence: Some(0.9),
            })
            .collect();
        ProviderResponse::ok(ProviderId::VisionModel, 1, ShelfScanPayload { books })
    }

    async fn parse_csv(&self, _csv_text: &str) -> ProviderResponse<CsvParsePayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = &self.failure {
            return ProviderResponse::failed(ProviderId::VisionModel, 1, failure.clone());
        }
        ProviderResponse::ok(
            ProviderId::VisionModel,
            1,
            CsvParsePayload { rows: self.rows.clone() },
        )
    }
}

// ----------------------------------------------------------------------
// Harness
// ----------------------------------------------------------------------

struct Harness {
    deps: PipelineDeps,
    enricher: Arc<StubEnricher>,
    vision: Arc<StubVision>,
}

fn harness(enricher: StubEnricher, vision: StubVision) -> Harness {
    let store = Arc::new(MemoryJobStore::new());
    let config = CoreConfig {
        // Tests attach promptly or not at all; no reason to wait 10 s.
        ready_handshake_timeout_ms: 100,
        ..CoreConfig::default()
    };
    let registry = Arc::new(JobRegistry::new(
        Arc::clone(&store) as Arc<dyn JobStorePort>,
        config.clone(),
    ));
    let cache = Arc::new(Cache::new(Arc::new(MemoryTier::new()), Arc::new(MemoryTier::new())));
    let enricher = Arc::new(enricher);
    let vision = Arc::new(vision);

    let deps = PipelineDeps {
        registry,
        enricher: Arc::clone(&enricher) as Arc<dyn EnrichmentPort>,
        vision: Arc::clone(&vision) as Arc<dyn VisionModelPort>,
        cache,
        config,
    };
    Harness { deps, enricher, vision }
}

async fn wait_for_terminal(
    deps: &PipelineDeps,
    job_id: uuid::Uuid,
    timeout: Duration,
) -> JobStatus {
    let handle = deps.registry.lookup(job_id);
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let state = handle.get_job_state().await.unwrap();
        if state.status.is_terminal() {
            return state.status;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job did not reach a terminal status in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn csv_rows() -> Vec<CsvRow> {
    vec![
        CsvRow {
            title: Some(" Dune ".to_string()),
            author: Some("Frank Herbert".to_string()),
            isbn: Some("9780441172719".to_string()),
        },
        CsvRow {
            title: Some("The Dispossessed".to_string()),
            author: Some("Ursula K. Le Guin".to_string()),
            isbn: None,
        },
        // Missing author: dropped by the filter.
        CsvRow { title: Some("Orphan".to_string()), author: None, isbn: None },
    ]
}

// ----------------------------------------------------------------------
// Batch enrichment
// ----------------------------------------------------------------------

#[tokio::test]
async fn test_batch_lifecycle_with_connected_client() {
    let h = harness(StubEnricher::instant(), StubVision::with_rows(vec![]));
    let books: Vec<BookQuery> = (0..4)
        .map(|i| BookQuery {
            title: format!("Book {i}"),
            author: "Author".to_string(),
            isbn: None,
        })
        .collect();

    let ticket = start_batch_enrichment(h.deps.clone(), books).await.unwrap();
    assert_eq!(ticket.total_count, 4);
    assert!(ticket.token.starts_with("jt_"));

    // Connect and complete the handshake straight away.
    let handle = h.deps.registry.lookup(ticket.job_id);
    handle.validate_token(&ticket.token).await.unwrap();
    let (socket, mut client) = ChannelSocket::pair();
    handle.attach_socket(Box::new(socket)).await.unwrap();
    handle.client_ready().await.unwrap();

    let status = wait_for_terminal(&h.deps, ticket.job_id, Duration::from_secs(5)).await;
    assert_eq!(status, JobStatus::Completed);
    tokio::time::sleep(Duration::from_millis(30)).await;

    let frames = json_frames(&drain(&mut client));
    let progress_frames: Vec<_> =
        frames.iter().filter(|f| f["type"] == "progress").collect();
    let complete_frames: Vec<_> =
        frames.iter().filter(|f| f["type"] == "complete").collect();

    assert!(!progress_frames.is_empty());
    let mut last = -1.0;
    for frame in &progress_frames {
        let p = frame["payload"]["progress"].as_f64().unwrap();
        assert!(p >= last);
        assert!((0.0..=1.0).contains(&p));
        last = p;
    }
    assert_eq!(complete_frames.len(), 1);
    let payload = &complete_frames[0]["payload"];
    let books_len = payload["books"].as_array().unwrap().len();
    let errors_len = payload["errors"].as_array().unwrap().len();
    assert_eq!(books_len + errors_len, 4);
}

#[tokio::test]
async fn test_batch_rejects_empty_input() {
    let h = harness(StubEnricher::instant(), StubVision::with_rows(vec![]));
    let err = start_batch_enrichment(h.deps.clone(), Vec::new()).await.unwrap_err();
    assert_eq!(err, JobError::EmptyBatch);
}

#[tokio::test]
async fn test_batch_cancellation_stops_new_launches() {
    let h = harness(
        StubEnricher::slow(Duration::from_millis(80)),
        StubVision::with_rows(vec![]),
    );
    let books: Vec<BookQuery> = (0..20)
        .map(|i| BookQuery {
            title: format!("Book {i}"),
            author: "Author".to_string(),
            isbn: None,
        })
        .collect();

    let ticket = start_batch_enrichment(h.deps.clone(), books).await.unwrap();
    let handle = h.deps.registry.lookup(ticket.job_id);

    // Let a couple of enrichments start, then cancel.
    tokio::time::sleep(Duration::from_millis(150)).await;
    handle.cancel(Some("operator cancelled".to_string())).await.unwrap();

    let status = wait_for_terminal(&h.deps, ticket.job_id, Duration::from_secs(5)).await;
    assert_eq!(status, JobStatus::Cancelled);

    // In-flight work finished but the tail was never launched.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(h.enricher.calls.load(Ordering::SeqCst) < 20);
}

// ----------------------------------------------------------------------
// CSV import
// ----------------------------------------------------------------------

#[tokio::test]
async fn test_csv_import_filters_and_reports_success_rate() {
    let h = harness(StubEnricher::instant(), StubVision::with_rows(csv_rows()));
    let csv = "title,author,isbn\nDune,Frank Herbert,9780441172719\n...";

    let ticket = start_csv_import(h.deps.clone(), csv.to_string()).await.unwrap();
    let handle = h.deps.registry.lookup(ticket.job_id);
    let (socket, mut client) = ChannelSocket::pair();
    handle.attach_socket(Box::new(socket)).await.unwrap();
    handle.client_ready().await.unwrap();

    let status = wait_for_terminal(&h.deps, ticket.job_id, Duration::from_secs(5)).await;
    assert_eq!(status, JobStatus::Completed);
    tokio::time::sleep(Duration::from_millis(30)).await;

    let frames = json_frames(&drain(&mut client));
    let complete = frames.iter().find(|f| f["type"] == "complete").unwrap();
    let payload = &complete["payload"];
    assert_eq!(payload["books"].as_array().unwrap().len(), 2);
    assert_eq!(payload["successRate"], "2/3");
    // Whitespace was trimmed during filtering.
    assert_eq!(payload["books"][0]["title"], "Dune");
}

#[tokio::test]
async fn test_csv_import_parse_cache_round_trip() {
    let h = harness(StubEnricher::instant(), StubVision::with_rows(csv_rows()));
    let csv = "title,author\nDune,Frank Herbert";

    let first = start_csv_import(h.deps.clone(), csv.to_string()).await.unwrap();
    assert_eq!(
        wait_for_terminal(&h.deps, first.job_id, Duration::from_secs(5)).await,
        JobStatus::Completed
    );
    assert_eq!(h.vision.calls.load(Ordering::SeqCst), 1);

    // Give the background write-through a moment to land.
    tokio::time::sleep(Duration::from_millis(30)).await;

    // The identical file completes from cache without a model call.
    let second = start_csv_import(h.deps.clone(), csv.to_string()).await.unwrap();
    assert_eq!(
        wait_for_terminal(&h.deps, second.job_id, Duration::from_secs(5)).await,
        JobStatus::Completed
    );
    assert_eq!(h.vision.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_csv_import_rejects_oversized_input() {
    let h = harness(StubEnricher::instant(), StubVision::with_rows(vec![]));
    let huge = format!("title,author\n{}", "x,y\n".repeat(400_000));

    let err = start_csv_import(h.deps.clone(), huge).await.unwrap_err();
    assert!(matches!(err, JobError::FileTooLarge { .. }));
}

#[tokio::test]
async fn test_csv_import_rejects_unrecognizable_input() {
    let h = harness(StubEnricher::instant(), StubVision::with_rows(vec![]));

    let ticket = start_csv_import(h.deps.clone(), "not a csv at all".to_string()).await.unwrap();
    assert_eq!(
        wait_for_terminal(&h.deps, ticket.job_id, Duration::from_secs(5)).await,
        JobStatus::Failed
    );
    assert_eq!(h.vision.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_csv_import_no_valid_books() {
    let rows = vec![CsvRow { title: Some("Orphan".to_string()), author: None, isbn: None }];
    let h = harness(StubEnricher::instant(), StubVision::with_rows(rows));

    let ticket = start_csv_import(h.deps.clone(), "title,author\nOrphan,".to_string())
        .await
        .unwrap();
    let handle = h.deps.registry.lookup(ticket.job_id);
    assert_eq!(
        wait_for_terminal(&h.deps, ticket.job_id, Duration::from_secs(5)).await,
        JobStatus::Failed
    );
    let state = handle.get_job_state().await.unwrap();
    assert_eq!(state.error.as_deref(), Some("No valid books found"));
}

#[tokio::test]
async fn test_csv_import_model_rate_limit_is_retryable() {
    let failure = ProviderFailure::rate_limited("model quota exhausted", Some(30));
    let h = harness(StubEnricher::instant(), StubVision::failing(failure));

    let ticket = start_csv_import(h.deps.clone(), "title,author\nDune,Herbert".to_string())
        .await
        .unwrap();
    let handle = h.deps.registry.lookup(ticket.job_id);
    let (socket, mut client) = ChannelSocket::pair();
    handle.attach_socket(Box::new(socket)).await.unwrap();
    handle.client_ready().await.unwrap();

    assert_eq!(
        wait_for_terminal(&h.deps, ticket.job_id, Duration::from_secs(5)).await,
        JobStatus::Failed
    );
    tokio::time::sleep(Duration::from_millis(30)).await;

    let frames = json_frames(&drain(&mut client));
    let error = frames.iter().find(|f| f["type"] == "error").unwrap();
    assert_eq!(error["payload"]["retryable"], true);
    // The model's message is surfaced intact.
    assert_eq!(error["payload"]["message"], "model quota exhausted");
}

// ----------------------------------------------------------------------
// Bookshelf scan
// ----------------------------------------------------------------------

#[tokio::test]
async fn test_bookshelf_scan_aggregates_photos() {
    let h = harness(StubEnricher::instant(), StubVision::with_books_per_photo(3));
    let images = vec![
        ImageSource::Url { url: "https://photos.example/a.jpg".to_string() },
        ImageSource::Base64 { data: "aGVsbG8=".to_string() },
    ];

    let ticket = start_bookshelf_scan(h.deps.clone(), images).await.unwrap();
    assert_eq!(ticket.total_count, 2);
    let handle = h.deps.registry.lookup(ticket.job_id);
    let (socket, mut client) = ChannelSocket::pair();
    handle.attach_socket(Box::new(socket)).await.unwrap();
    handle.client_ready().await.unwrap();

    assert_eq!(
        wait_for_terminal(&h.deps, ticket.job_id, Duration::from_secs(5)).await,
        JobStatus::Completed
    );
    tokio::time::sleep(Duration::from_millis(30)).await;

    let frames = json_frames(&drain(&mut client));
    let complete = frames.iter().find(|f| f["type"] == "complete").unwrap();
    let payload = &complete["payload"];
    assert_eq!(payload["totalBooksFound"], 6);
    assert_eq!(payload["books"].as_array().unwrap().len(), 6);
    let photos = payload["photos"].as_array().unwrap();
    assert_eq!(photos.len(), 2);
    assert!(photos.iter().all(|p| p["status"] == "completed"));
}

#[tokio::test]
async fn test_bookshelf_scan_marks_failed_photos() {
    let failure = ProviderFailure::new(ProviderErrorKind::Provider, "model choked");
    let h = harness(StubEnricher::instant(), StubVision::failing(failure));
    let images = vec![ImageSource::Url { url: "https://photos.example/a.jpg".to_string() }];

    let ticket = start_bookshelf_scan(h.deps.clone(), images).await.unwrap();
    let handle = h.deps.registry.lookup(ticket.job_id);

    assert_eq!(
        wait_for_terminal(&h.deps, ticket.job_id, Duration::from_secs(5)).await,
        JobStatus::Completed
    );
    let state = handle.get_job_state().await.unwrap();
    assert_eq!(state.pipeline_state["photos"][0]["status"], "failed");
    assert_eq!(state.pipeline_state["photos"][0]["booksFound"], 0);
}

#[tokio::test]
async fn test_bookshelf_scan_rejects_empty_input() {
    let h = harness(StubEnricher::instant(), StubVision::with_books_per_photo(0));
    assert_eq!(
        start_bookshelf_scan(h.deps.clone(), Vec::new()).await.unwrap_err(),
        JobError::EmptyBatch
    );
}

// ----------------------------------------------------------------------
// Single enrichment
// ----------------------------------------------------------------------

#[tokio::test]
async fn test_single_enrichment_streams_result() {
    let h = harness(StubEnricher::instant(), StubVision::with_rows(vec![]));

    let ticket = start_single_enrichment(h.deps.clone(), "978-0-441-17271-9").await.unwrap();
    let handle = h.deps.registry.lookup(ticket.job_id);
    let (socket, mut client) = ChannelSocket::pair();
    handle.attach_socket(Box::new(socket)).await.unwrap();
    handle.client_ready().await.unwrap();

    assert_eq!(
        wait_for_terminal(&h.deps, ticket.job_id, Duration::from_secs(5)).await,
        JobStatus::Completed
    );
    tokio::time::sleep(Duration::from_millis(30)).await;

    let frames = json_frames(&drain(&mut client));
    let complete = frames.iter().find(|f| f["type"] == "complete").unwrap();
    assert_eq!(complete["pipeline"], "single_enrichment");
    assert_eq!(complete["payload"]["data"]["works"][0]["title"], "Stub Book");
}

#[tokio::test]
async fn test_single_enrichment_validates_isbn_up_front() {
    let h = harness(StubEnricher::instant(), StubVision::with_rows(vec![]));
    let err = start_single_enrichment(h.deps.clone(), "junk").await.unwrap_err();
    assert!(matches!(err, JobError::InvalidIsbn(_)));
}
