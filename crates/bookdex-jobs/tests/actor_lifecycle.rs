//! Lifecycle tests for the progress actor: handshake, ordering, terminal
//! idempotence, versioning, eviction recovery, corruption surfacing,
//! token refresh, and the cleanup alarm.

use bookdex_core::config::CoreConfig;
use bookdex_core::job::{JobPipeline, JobStatus};
use bookdex_core::ports::JobStorePort;
use bookdex_jobs::socket_testing::{ChannelSocket, SocketEvent, drain, json_frames};
use bookdex_jobs::{JobError, JobRegistry, MemoryJobStore, PhotoStatus, mint_token};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn registry_with(config: CoreConfig) -> (Arc<JobRegistry>, Arc<MemoryJobStore>) {
    let store = Arc::new(MemoryJobStore::new());
    let registry = Arc::new(JobRegistry::new(
        Arc::clone(&store) as Arc<dyn JobStorePort>,
        config,
    ));
    (registry, store)
}

fn registry() -> (Arc<JobRegistry>, Arc<MemoryJobStore>) {
    registry_with(CoreConfig::default())
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}

#[tokio::test]
async fn test_ready_handshake_and_ordered_messages() {
    let (registry, _) = registry();
    let job_id = Uuid::new_v4();
    let handle = registry.create(job_id, JobPipeline::BatchEnrichment, 4).await.unwrap();

    let (socket, mut client) = ChannelSocket::pair();
    handle.attach_socket(Box::new(socket)).await.unwrap();
    handle.client_ready().await.unwrap();

    for i in 1..=4_u32 {
        handle
            .update_progress(
                f64::from(i) / 4.0,
                i,
                json!({ "progress": f64::from(i) / 4.0, "processedCount": i }),
            )
            .await
            .unwrap();
    }
    handle.complete(json!({ "books": [], "errors": [] })).await.unwrap();
    settle().await;

    let frames = json_frames(&drain(&mut client));
    assert_eq!(frames.len(), 6, "ready_ack + 4 progress + complete");
    assert_eq!(frames[0]["type"], "ready_ack");
    // Messages arrive in enqueue order with non-decreasing progress.
    let mut last = 0.0;
    for frame in &frames[1..5] {
        assert_eq!(frame["type"], "progress");
        assert_eq!(frame["pipeline"], "batch_enrichment");
        assert_eq!(frame["version"], "1.0.0");
        assert_eq!(frame["jobId"], job_id.to_string());
        let progress = frame["payload"]["progress"].as_f64().unwrap();
        assert!(progress >= last);
        last = progress;
    }
    assert_eq!(frames[5]["type"], "complete");
}

#[tokio::test]
async fn test_wait_for_ready_outcomes() {
    let (registry, _) = registry();

    // Never connected: times out.
    let handle = registry
        .create(Uuid::new_v4(), JobPipeline::CsvImport, 0)
        .await
        .unwrap();
    let wait = handle.wait_for_ready(Duration::from_millis(50)).await;
    assert!(wait.timed_out && !wait.ready && !wait.disconnected);

    // Ready during the wait.
    let handle = registry
        .create(Uuid::new_v4(), JobPipeline::CsvImport, 0)
        .await
        .unwrap();
    let waiter = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.wait_for_ready(Duration::from_secs(5)).await })
    };
    let (socket, _client) = ChannelSocket::pair();
    handle.attach_socket(Box::new(socket)).await.unwrap();
    handle.client_ready().await.unwrap();
    let wait = waiter.await.unwrap();
    assert!(wait.ready);

    // Socket closes before the handshake: disconnected.
    let handle = registry
        .create(Uuid::new_v4(), JobPipeline::CsvImport, 0)
        .await
        .unwrap();
    let waiter = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.wait_for_ready(Duration::from_secs(5)).await })
    };
    let (socket, _client) = ChannelSocket::pair();
    handle.attach_socket(Box::new(socket)).await.unwrap();
    handle.client_closed().await.unwrap();
    let wait = waiter.await.unwrap();
    assert!(wait.disconnected && !wait.ready);
}

#[tokio::test]
async fn test_token_validation_and_supersession() {
    let (registry, _) = registry();
    let handle = registry
        .create(Uuid::new_v4(), JobPipeline::BookshelfScan, 2)
        .await
        .unwrap();

    let token = mint_token();
    handle.set_auth_token(token.clone(), 7_200).await.unwrap();
    handle.validate_token(&token).await.unwrap();
    assert_eq!(
        handle.validate_token("jt_forged").await.unwrap_err(),
        JobError::InvalidToken
    );

    // Second upgrade supersedes the first socket with 1000/"Superseded".
    let (first, mut first_client) = ChannelSocket::pair();
    handle.attach_socket(Box::new(first)).await.unwrap();
    let (second, mut second_client) = ChannelSocket::pair();
    handle.attach_socket(Box::new(second)).await.unwrap();
    settle().await;

    let events = drain(&mut first_client);
    assert!(events.contains(&SocketEvent::Closed {
        code: 1000,
        reason: "Superseded".to_string()
    }));

    // Traffic flows to the surviving socket only.
    handle.client_ready().await.unwrap();
    settle().await;
    assert_eq!(json_frames(&drain(&mut second_client)).len(), 1);
    assert!(json_frames(&drain(&mut first_client)).is_empty());
}

#[tokio::test]
async fn test_terminal_transitions_are_idempotent_and_absorbing() {
    let (registry, _) = registry();
    let handle = registry
        .create(Uuid::new_v4(), JobPipeline::BatchEnrichment, 1)
        .await
        .unwrap();

    handle.update_progress(0.5, 1, json!({})).await.unwrap();
    let first = handle.complete(json!({ "books": [] })).await.unwrap();
    assert!(!first.already);

    let state_after = handle.get_job_state().await.unwrap();
    assert_eq!(state_after.status, JobStatus::Completed);
    assert!(state_after.completed_at.is_some());

    // Re-applying the same terminal is a no-op success.
    let again = handle.complete(json!({ "books": [] })).await.unwrap();
    assert!(again.already);
    assert_eq!(handle.get_job_state().await.unwrap().version, state_after.version);

    // A different terminal fails.
    assert!(matches!(
        handle.cancel(None).await.unwrap_err(),
        JobError::InvalidTransition(_)
    ));

    // Progress after terminal is rejected.
    assert!(matches!(
        handle.update_progress(0.9, 1, json!({})).await.unwrap_err(),
        JobError::InvalidTransition(_)
    ));
}

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let (registry, _) = registry();
    let handle = registry
        .create(Uuid::new_v4(), JobPipeline::BatchEnrichment, 5)
        .await
        .unwrap();

    let first = handle.cancel(Some("user clicked stop".to_string())).await.unwrap();
    assert!(!first.already);
    let second = handle.cancel(None).await.unwrap();
    assert!(second.already);

    let state = handle.get_job_state().await.unwrap();
    assert_eq!(state.status, JobStatus::Cancelled);
    assert!(state.cancelled);
    assert_eq!(state.error.as_deref(), Some("user clicked stop"));
}

#[tokio::test]
async fn test_photo_updates_and_version_conflict() {
    let (registry, _) = registry();
    let handle = registry
        .create(Uuid::new_v4(), JobPipeline::BookshelfScan, 3)
        .await
        .unwrap();
    handle.init_batch(3).await.unwrap();

    let version = handle.get_job_state().await.unwrap().version;
    handle
        .update_photo(0, PhotoStatus::Completed, 7, Some(version))
        .await
        .unwrap();

    // Same index, same expected version: the second writer loses.
    let err = handle
        .update_photo(0, PhotoStatus::Completed, 7, Some(version))
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::VersionConflict { .. }));

    // Out-of-range index is rejected.
    assert!(matches!(
        handle.update_photo(9, PhotoStatus::Failed, 0, None).await.unwrap_err(),
        JobError::PhotoIndexOutOfRange(9)
    ));

    let state = handle.get_job_state().await.unwrap();
    assert_eq!(state.pipeline_state["photos"][0]["status"], "completed");
    assert_eq!(state.pipeline_state["photos"][0]["booksFound"], 7);
    assert_eq!(state.pipeline_state["photos"][1]["status"], "pending");
}

#[tokio::test]
async fn test_eviction_recovers_persisted_state() {
    let (registry, _) = registry();
    let job_id = Uuid::new_v4();
    let handle = registry.create(job_id, JobPipeline::BatchEnrichment, 20).await.unwrap();

    // Eight updates: cadence checkpoints at five, the final flush covers
    // the rest.
    for i in 1..=8_u32 {
        handle
            .update_progress(f64::from(i) * 0.05, i, json!({ "processedCount": i }))
            .await
            .unwrap();
    }

    registry.evict(job_id);
    drop(handle);
    settle().await;

    // A fresh actor instance answers from persisted state.
    let revived = registry.lookup(job_id);
    let state = revived.get_job_state().await.unwrap();
    assert_eq!(state.status, JobStatus::Running);
    assert!((state.progress - 0.4).abs() < 1e-9);
    assert_eq!(state.processed_count, 8);
}

#[tokio::test]
async fn test_missing_or_corrupt_state_presents_failure() {
    let (registry, store) = registry();

    // Unknown job id.
    let handle = registry.lookup(Uuid::new_v4());
    let state = handle.get_job_state().await.unwrap();
    assert_eq!(state.status, JobStatus::Failed);
    assert_eq!(state.error.as_deref(), Some("State corruption detected"));

    // Unparseable persisted bytes.
    let job_id = Uuid::new_v4();
    store.corrupt_state(job_id).await;
    let handle = registry.lookup(job_id);
    let state = handle.get_job_state().await.unwrap();
    assert_eq!(state.status, JobStatus::Failed);
    assert_eq!(state.error.as_deref(), Some("State corruption detected"));
}

#[tokio::test]
async fn test_token_refresh_boundaries() {
    let (registry, _) = registry();
    let handle = registry
        .create(Uuid::new_v4(), JobPipeline::CsvImport, 0)
        .await
        .unwrap();

    // Fresh two-hour token: far outside the refresh window.
    let token = mint_token();
    handle.set_auth_token(token.clone(), 7_200).await.unwrap();
    assert_eq!(
        handle.refresh_token(&token).await.unwrap_err(),
        JobError::RefreshTooEarly
    );
    assert_eq!(
        handle.refresh_token("jt_wrong").await.unwrap_err(),
        JobError::InvalidToken
    );

    // Inside the final 30 minutes: refresh succeeds and rotates the token.
    handle.set_auth_token(token.clone(), 60).await.unwrap();
    let grant = handle.refresh_token(&token).await.unwrap();
    assert_ne!(grant.token, token);
    assert_eq!(grant.expires_in_seconds, 7_200);
    handle.validate_token(&grant.token).await.unwrap();
    assert_eq!(
        handle.validate_token(&token).await.unwrap_err(),
        JobError::InvalidToken
    );

    // Expired token cannot refresh.
    let stale = mint_token();
    handle.set_auth_token(stale.clone(), 0).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(
        handle.refresh_token(&stale).await.unwrap_err(),
        JobError::TokenExpired
    );
}

#[tokio::test]
async fn test_cleanup_alarm_deletes_terminal_state_without_socket() {
    let config = CoreConfig { cleanup_after_terminal_hours: 0, ..CoreConfig::default() };
    let (registry, store) = registry_with(config);

    let job_id = Uuid::new_v4();
    let handle = registry.create(job_id, JobPipeline::CsvImport, 0).await.unwrap();
    handle.update_progress(0.5, 0, json!({})).await.unwrap();
    handle.complete(json!({ "books": [] })).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!store.contains(job_id).await, "terminal state should be swept");
}

#[tokio::test]
async fn test_cleanup_alarm_spares_connected_clients() {
    let config = CoreConfig { cleanup_after_terminal_hours: 0, ..CoreConfig::default() };
    let (registry, store) = registry_with(config);

    let job_id = Uuid::new_v4();
    let handle = registry.create(job_id, JobPipeline::CsvImport, 0).await.unwrap();
    let (socket, _client) = ChannelSocket::pair();
    handle.attach_socket(Box::new(socket)).await.unwrap();
    handle.update_progress(0.5, 0, json!({})).await.unwrap();
    handle.complete(json!({ "books": [] })).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(store.contains(job_id).await, "state survives while a socket is attached");
}

#[tokio::test]
async fn test_messages_without_socket_are_dropped_not_buffered() {
    let (registry, _) = registry();
    let handle = registry
        .create(Uuid::new_v4(), JobPipeline::BatchEnrichment, 2)
        .await
        .unwrap();

    // No socket attached: updates succeed, messages vanish.
    handle.update_progress(0.5, 1, json!({ "processedCount": 1 })).await.unwrap();

    let (socket, mut client) = ChannelSocket::pair();
    handle.attach_socket(Box::new(socket)).await.unwrap();
    handle.client_ready().await.unwrap();
    settle().await;

    let frames = json_frames(&drain(&mut client));
    // Only the ready_ack: earlier progress was not replayed.
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["type"], "ready_ack");

    // Reconnecting clients reconcile through job state instead.
    let state = handle.get_job_state().await.unwrap();
    assert_eq!(state.processed_count, 1);
}
