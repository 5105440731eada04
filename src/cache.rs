use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::normalize::NewsItem;

struct CachedFeed {
    items: Vec<NewsItem>,
    fetched_at: Instant,
}

/// Normalized items per feed URL, served until the revalidation interval
/// elapses. A zero interval disables caching.
pub struct FeedCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedFeed>>,
}

impl FeedCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub async fn get(&self, url: &str) -> Option<Vec<NewsItem>> {
        if !self.is_enabled() {
            return None;
        }

        let entries = self.entries.read().await;
        entries
            .get(url)
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| cached.items.clone())
    }

    pub async fn insert(&self, url: &str, items: Vec<NewsItem>) {
        if !self.is_enabled() {
            return;
        }

        let mut entries = self.entries.write().await;
        entries.insert(
            url.to_string(),
            CachedFeed {
                items,
                fetched_at: Instant::now(),
            },
        );
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
