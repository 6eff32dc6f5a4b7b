use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::{Result, ThoughtChainError};
use crate::models::ThoughtRecord;
use crate::repository::ThoughtRepository;

/// Default freshness window for cached listings
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(5);

/// Cache key; includes every argument of the listing call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ListingKey {
    RecentlyCompleted(usize),
    Incomplete,
}

struct CachedListing {
    thoughts: Vec<ThoughtRecord>,
    computed_at: Instant,
}

/// Time-bounded read cache over a [`ThoughtRepository`], serving the
/// recently-completed and incomplete listings without rescanning the store
/// on every refresh. Writes do not invalidate entries; a listing may lag
/// the store by up to the freshness window.
pub struct RecentThoughtCache<R> {
    repository: Arc<R>,
    freshness: Duration,
    entries: Mutex<HashMap<ListingKey, CachedListing>>,
}

impl<R: ThoughtRepository> RecentThoughtCache<R> {
    pub fn new(repository: Arc<R>, freshness: Duration) -> Self {
        Self {
            repository,
            freshness,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_default_freshness(repository: Arc<R>) -> Self {
        Self::new(repository, DEFAULT_FRESHNESS)
    }

    /// The `limit` most recently completed thoughts, newest first
    pub async fn recently_completed(&self, limit: usize) -> Result<Vec<ThoughtRecord>> {
        let key = ListingKey::RecentlyCompleted(limit);
        if let Some(hit) = self.lookup(&key) {
            return Ok(hit);
        }
        let mut thoughts = self.load_by_recency().await?;
        thoughts.retain(|t| t.completed);
        thoughts.truncate(limit);
        self.store(key, thoughts.clone());
        Ok(thoughts)
    }

    /// All thoughts not yet completed, newest first. Abandoned and errored
    /// chains stay in this listing until something completes them.
    pub async fn incomplete(&self) -> Result<Vec<ThoughtRecord>> {
        let key = ListingKey::Incomplete;
        if let Some(hit) = self.lookup(&key) {
            return Ok(hit);
        }
        let mut thoughts = self.load_by_recency().await?;
        thoughts.retain(|t| !t.completed);
        self.store(key, thoughts.clone());
        Ok(thoughts)
    }

    fn lookup(&self, key: &ListingKey) -> Option<Vec<ThoughtRecord>> {
        if let Ok(entries) = self.entries.lock() {
            if let Some(cached) = entries.get(key) {
                if cached.computed_at.elapsed() < self.freshness {
                    tracing::debug!("Listing cache hit for {:?}", key);
                    return Some(cached.thoughts.clone());
                }
            }
        }
        tracing::debug!("Listing cache miss for {:?}", key);
        None
    }

    fn store(&self, key: ListingKey, thoughts: Vec<ThoughtRecord>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key,
                CachedListing {
                    thoughts,
                    computed_at: Instant::now(),
                },
            );
        }
    }

    async fn load_by_recency(&self) -> Result<Vec<ThoughtRecord>> {
        let ids = self.repository.list_thought_ids().await?;
        let mut keyed = Vec::with_capacity(ids.len());
        for id in ids {
            let record = self
                .repository
                .get_thought(&id)
                .await?
                .ok_or_else(|| ThoughtChainError::NotFound(id.clone()))?;
            let updated = record.updated_at_time()?;
            keyed.push((updated, record));
        }
        keyed.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(keyed.into_iter().map(|(_, record)| record).collect())
    }
}
