use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use thought_chain::{
    FileThoughtRepository, KickoffResponse, RecentThoughtCache, StepKind, StepResponse,
    ThoughtKind, ThoughtRecord, ThoughtRepository,
};

/// Record with a pinned updated_at so recency ordering is deterministic
fn record(id: &str, completed: bool, updated_at: &str) -> ThoughtRecord {
    ThoughtRecord {
        id: id.to_string(),
        model: "gpt-4".to_string(),
        kickoff: Some(KickoffResponse {
            thought_type: ThoughtKind::Reflect,
            rationale: format!("rationale for {}", id),
        }),
        steps: vec![StepResponse {
            kind: StepKind::Reflect,
            rationale: "step".to_string(),
            content: None,
        }],
        status_log: vec![format!("Thought initiated {}", id)],
        completed,
        errored: false,
        created_at: "2026-01-01T00:00:00+00:00".to_string(),
        updated_at: updated_at.to_string(),
    }
}

#[tokio::test]
async fn listings_split_by_completion_and_order_by_recency() {
    let dir = TempDir::new().unwrap();
    let repository = Arc::new(FileThoughtRepository::new(dir.path()).unwrap());
    repository
        .save_thought(&record("a", true, "2026-01-01T01:00:00+00:00"))
        .await
        .unwrap();
    repository
        .save_thought(&record("b", true, "2026-01-01T02:00:00+00:00"))
        .await
        .unwrap();
    repository
        .save_thought(&record("c", false, "2026-01-01T03:00:00+00:00"))
        .await
        .unwrap();

    let cache = RecentThoughtCache::new(repository.clone(), Duration::from_secs(60));

    let recent = cache.recently_completed(5).await.unwrap();
    let recent_ids: Vec<&str> = recent.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(recent_ids, vec!["b", "a"]);

    let incomplete = cache.incomplete().await.unwrap();
    let incomplete_ids: Vec<&str> = incomplete.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(incomplete_ids, vec!["c"]);
}

#[tokio::test]
async fn listing_inside_freshness_window_ignores_store_writes() {
    let dir = TempDir::new().unwrap();
    let repository = Arc::new(FileThoughtRepository::new(dir.path()).unwrap());
    repository
        .save_thought(&record("a", true, "2026-01-01T01:00:00+00:00"))
        .await
        .unwrap();

    let cache = RecentThoughtCache::new(repository.clone(), Duration::from_secs(60));
    let first = cache.recently_completed(5).await.unwrap();

    // The store changes, but the window has not expired
    repository
        .save_thought(&record("b", true, "2026-01-01T02:00:00+00:00"))
        .await
        .unwrap();
    let second = cache.recently_completed(5).await.unwrap();
    assert_eq!(first, second);

    // A fresh cache sees the new state immediately
    let fresh = RecentThoughtCache::new(repository.clone(), Duration::from_secs(60));
    let fresh_listing = fresh.recently_completed(5).await.unwrap();
    let ids: Vec<&str> = fresh_listing.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
}

#[tokio::test]
async fn expired_window_recomputes_from_the_store() {
    let dir = TempDir::new().unwrap();
    let repository = Arc::new(FileThoughtRepository::new(dir.path()).unwrap());
    repository
        .save_thought(&record("a", true, "2026-01-01T01:00:00+00:00"))
        .await
        .unwrap();

    let cache = RecentThoughtCache::new(repository.clone(), Duration::from_millis(40));
    let first = cache.recently_completed(5).await.unwrap();
    assert_eq!(first.len(), 1);

    repository
        .save_thought(&record("b", true, "2026-01-01T02:00:00+00:00"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;

    let second = cache.recently_completed(5).await.unwrap();
    let ids: Vec<&str> = second.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
}

#[tokio::test]
async fn cache_key_includes_the_listing_limit() {
    let dir = TempDir::new().unwrap();
    let repository = Arc::new(FileThoughtRepository::new(dir.path()).unwrap());
    for (id, hour) in [("a", 1), ("b", 2), ("c", 3)] {
        repository
            .save_thought(&record(id, true, &format!("2026-01-01T0{}:00:00+00:00", hour)))
            .await
            .unwrap();
    }

    let cache = RecentThoughtCache::new(repository.clone(), Duration::from_secs(60));
    assert_eq!(cache.recently_completed(1).await.unwrap().len(), 1);
    // A different limit is a different cache key, computed on its own
    assert_eq!(cache.recently_completed(2).await.unwrap().len(), 2);
    assert_eq!(cache.recently_completed(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_stored_record_fails_the_listing() {
    let dir = TempDir::new().unwrap();
    let repository = Arc::new(FileThoughtRepository::new(dir.path()).unwrap());
    repository
        .save_thought(&record("a", false, "2026-01-01T01:00:00+00:00"))
        .await
        .unwrap();
    std::fs::write(dir.path().join("corrupt.json"), "{ nope").unwrap();

    let cache = RecentThoughtCache::new(repository.clone(), Duration::from_secs(60));
    assert!(cache.incomplete().await.is_err());
}
