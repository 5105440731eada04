use std::collections::HashSet;

use chrono::Utc;
use futures::future::join_all;
use reqwest::{Client, Response};
use tracing::{debug, info, warn};

use crate::cache::FeedCache;
use crate::config::Config;
use crate::document::FeedDocument;
use crate::error::{FeedError, FetchError};
use crate::normalize::{normalize_feed, NewsItem};

const USER_AGENT: &str = "DashboardNews/1.0 (Feed Aggregator)";

pub struct FeedAggregator {
    client: Client,
    sources: Vec<String>,
    per_feed_limit: usize,
    total_limit: usize,
    max_body_bytes: usize,
    cache: FeedCache,
}

impl FeedAggregator {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            sources: config.feeds.clone(),
            per_feed_limit: config.per_feed_limit,
            total_limit: config.total_limit,
            max_body_bytes: config.max_body_bytes,
            cache: FeedCache::new(config.revalidate_interval()),
        })
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Fetch every configured feed concurrently and merge the results.
    ///
    /// Never fails: a feed that cannot be fetched or parsed is logged and
    /// contributes nothing, so the worst case is an empty list.
    pub async fn aggregate(&self) -> Vec<NewsItem> {
        info!("Aggregating {} feeds", self.sources.len());

        let results = join_all(self.sources.iter().map(|url| self.load_feed(url))).await;

        let lists: Vec<Vec<NewsItem>> = self
            .sources
            .iter()
            .zip(results)
            .filter_map(|(url, result)| match result {
                Ok(items) => Some(items),
                Err(e) => {
                    warn!("Failed to fetch feed '{}': {}", url, e);
                    None
                }
            })
            .collect();

        let merged = merge(lists, self.total_limit);
        info!("Aggregated {} items", merged.len());
        merged
    }

    /// Drop every cached feed, then aggregate from the network.
    pub async fn refresh(&self) -> Vec<NewsItem> {
        self.cache.clear().await;
        self.aggregate().await
    }

    async fn load_feed(&self, url: &str) -> Result<Vec<NewsItem>, FeedError> {
        if let Some(items) = self.cache.get(url).await {
            debug!("Serving {} cached items for {}", items.len(), url);
            return Ok(items);
        }

        let items = self.fetch_feed(url).await?;
        self.cache.insert(url, items.clone()).await;
        Ok(items)
    }

    /// Fetch, parse and normalize a single feed, bypassing the cache.
    pub async fn fetch_feed(&self, url: &str) -> Result<Vec<NewsItem>, FeedError> {
        info!("Fetching feed: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()).into());
        }

        let body = self.read_body(response).await?;
        let body = String::from_utf8_lossy(&body);
        let fetched_at = Utc::now();

        let document = FeedDocument::parse(&body, self.per_feed_limit)?;
        let items = normalize_feed(&document, fetched_at);

        info!(
            "Parsed {} items from '{}' ({:?})",
            items.len(),
            document.source_name,
            document.shape
        );
        Ok(items)
    }

    /// Read the body, giving up once it grows past `max_body_bytes`.
    async fn read_body(&self, mut response: Response) -> Result<Vec<u8>, FetchError> {
        let limit = self.max_body_bytes;
        if response.content_length().is_some_and(|length| length > limit as u64) {
            return Err(FetchError::BodyTooLarge(limit));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > limit {
                return Err(FetchError::BodyTooLarge(limit));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

/// Concatenate per-feed lists in order, keep the first item for each
/// `(title, link)` pair, sort newest first and keep `total_limit` items.
///
/// The sort is stable, so items with equal dates stay in feed order.
pub fn merge<I>(lists: I, total_limit: usize) -> Vec<NewsItem>
where
    I: IntoIterator<Item = Vec<NewsItem>>,
{
    let mut seen = HashSet::new();
    let mut merged: Vec<NewsItem> = lists
        .into_iter()
        .flatten()
        .filter(|item| seen.insert((item.title.clone(), item.link.clone())))
        .collect();

    merged.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));
    merged.truncate(total_limit);
    merged
}
