//! In-memory search index.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::SearchRepository;
use crate::domain::Feed;
use crate::error::PusherError;

/// Search index keyed by feed id.
///
/// A query is split into lowercase terms; a feed matches when any term
/// occurs in its title or description. Results are ranked by the number
/// of matching terms, title hits counting double, then by recency.
#[derive(Debug, Default)]
pub struct InMemorySearchRepository {
    documents: RwLock<HashMap<String, Feed>>,
}

impl InMemorySearchRepository {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn score(feed: &Feed, terms: &[String]) -> usize {
    let title = feed.title.to_lowercase();
    let description = feed.description.to_lowercase();
    terms
        .iter()
        .map(|term| {
            usize::from(title.contains(term.as_str())) * 2
                + usize::from(description.contains(term.as_str()))
        })
        .sum()
}

#[async_trait]
impl SearchRepository for InMemorySearchRepository {
    async fn index_feed(&self, feed: &Feed) -> Result<(), PusherError> {
        let _ = self
            .documents
            .write()
            .await
            .insert(feed.id.clone(), feed.clone());
        Ok(())
    }

    async fn search_feeds(&self, query: &str) -> Result<Vec<Feed>, PusherError> {
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let documents = self.documents.read().await;
        let mut hits: Vec<(usize, &Feed)> = documents
            .values()
            .map(|feed| (score(feed, &terms), feed))
            .filter(|(score, _)| *score > 0)
            .collect();
        hits.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then(b.created_at.cmp(&a.created_at)));
        Ok(hits.into_iter().map(|(_, feed)| feed.clone()).collect())
    }

    async fn count(&self) -> Result<u64, PusherError> {
        Ok(self.documents.read().await.len() as u64)
    }
}
