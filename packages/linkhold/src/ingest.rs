//! Link ingestion: validate, fetch, extract a title, dedup, persist.

use serde::Serialize;

use crate::error::LinkError;
use crate::fetch::PageFetcher;
use crate::storage::LinkStore;
use crate::title::{extract_title, TITLE_SCAN_LIMIT};
use crate::types::{Link, LinkId, UserId};

/// Outcome of one candidate URL within a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    Added { id: LinkId },
    AlreadySaved,
    MissingScheme,
    StoreFailed,
}

/// One candidate URL and what became of it, in batch order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItem {
    pub url: String,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

fn has_http_scheme(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Fetch `url` and scrape a title from the response, degrading instead of
/// failing: a dead link is still worth keeping, annotated with why the
/// title is unavailable.
async fn resolve_title(fetcher: &impl PageFetcher, url: &str) -> String {
    match fetcher.fetch_prefix(url, TITLE_SCAN_LIMIT).await {
        Ok(body) => extract_title(&body, url),
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "fetch failed, keeping the error as the title");
            format!("{e:#}")
        }
    }
}

/// Save one URL for `owner`.
///
/// The pipeline short-circuits on the first failure: empty or scheme-less
/// input, a URL the owner already saved, or a store error. A failed fetch
/// is not a failure; the error message becomes the title.
pub async fn add_link(
    store: &impl LinkStore,
    fetcher: &impl PageFetcher,
    owner: UserId,
    raw_url: &str,
) -> Result<LinkId, LinkError> {
    let url = raw_url.trim();
    if url.is_empty() {
        return Err(LinkError::InvalidInput("empty URLs are not allowed".to_string()));
    }
    if !has_http_scheme(url) {
        return Err(LinkError::InvalidInput(
            "please specify http:// or https:// in your URL".to_string(),
        ));
    }

    let mut link = Link::new(url.to_string(), String::new());
    link.title = resolve_title(fetcher, url).await;

    if store.url_exists(owner, url).await.map_err(LinkError::Store)? {
        return Err(LinkError::Conflict);
    }

    let id = store.save_link(owner, &link).await.map_err(LinkError::Store)?;
    tracing::info!(url = %link.url, link_id = %id, "saved link");
    Ok(id)
}

/// Save a `;`-separated list of URLs for `owner`, best effort.
///
/// The owner's existing URLs are loaded once up front; every candidate is
/// then processed independently and no per-item failure aborts the rest.
/// Because the snapshot is never refreshed, a new URL repeated within one
/// batch is attempted each time it appears.
///
/// Returns the per-item outcomes in input order. Only an empty input or a
/// failure to load the snapshot fails the batch as a whole.
pub async fn add_links(
    store: &impl LinkStore,
    fetcher: &impl PageFetcher,
    owner: UserId,
    raw_list: &str,
) -> Result<Vec<BatchItem>, LinkError> {
    let list = raw_list.trim();
    if list.is_empty() {
        return Err(LinkError::InvalidInput(
            "empty URL lists are not allowed".to_string(),
        ));
    }

    let existing = store.url_snapshot(owner).await.map_err(LinkError::Store)?;

    let mut results = Vec::new();
    for url in list.split(';') {
        // Candidates are used exactly as split, with no per-item trimming:
        // a padded URL fails the scheme check and is skipped.
        let outcome = if existing.contains(url) {
            ItemOutcome::AlreadySaved
        } else if !has_http_scheme(url) {
            ItemOutcome::MissingScheme
        } else {
            let mut link = Link::new(url.to_string(), String::new());
            link.title = resolve_title(fetcher, url).await;
            match store.save_link(owner, &link).await {
                Ok(id) => {
                    tracing::info!(url = %url, link_id = %id, "saved link");
                    ItemOutcome::Added { id }
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "failed to store link, continuing");
                    ItemOutcome::StoreFailed
                }
            }
        };
        results.push(BatchItem {
            url: url.to_string(),
            outcome,
        });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::title::PARSE_FAILED_TITLE;
    use anyhow::{anyhow, bail, Result};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::collections::HashSet;
    use crate::types::{SavedLink, User};

    /// Fetcher serving canned bodies; unknown URLs fail like a dead host.
    #[derive(Default)]
    struct CannedFetcher {
        pages: HashMap<String, Vec<u8>>,
    }

    impl CannedFetcher {
        fn with_page(mut self, url: &str, body: &[u8]) -> Self {
            self.pages.insert(url.to_string(), body.to_vec());
            self
        }
    }

    #[async_trait]
    impl PageFetcher for CannedFetcher {
        async fn fetch_prefix(&self, url: &str, limit: usize) -> Result<Bytes> {
            match self.pages.get(url) {
                Some(body) => Ok(Bytes::copy_from_slice(&body[..body.len().min(limit)])),
                None => Err(anyhow!("connection timed out: {url}")),
            }
        }
    }

    /// Store whose link writes always fail, for batch resilience tests.
    struct WriteFailStore(MemoryStore);

    #[async_trait]
    impl LinkStore for WriteFailStore {
        async fn get_or_create_user(&self, identity: &str, email: &str) -> Result<User> {
            self.0.get_or_create_user(identity, email).await
        }
        async fn save_user(&self, user: &User) -> Result<()> {
            self.0.save_user(user).await
        }
        async fn save_link(&self, _owner: UserId, _link: &Link) -> Result<LinkId> {
            bail!("disk full")
        }
        async fn get_link(&self, id: LinkId) -> Result<Option<Link>> {
            self.0.get_link(id).await
        }
        async fn put_link(&self, id: LinkId, link: &Link) -> Result<()> {
            self.0.put_link(id, link).await
        }
        async fn delete_link(&self, id: LinkId) -> Result<()> {
            self.0.delete_link(id).await
        }
        async fn list_links(&self, owner: UserId) -> Result<Vec<SavedLink>> {
            self.0.list_links(owner).await
        }
        async fn url_exists(&self, owner: UserId, url: &str) -> Result<bool> {
            self.0.url_exists(owner, url).await
        }
        async fn url_snapshot(&self, owner: UserId) -> Result<HashSet<String>> {
            self.0.url_snapshot(owner).await
        }
    }

    const PAGE: &[u8] = b"<html><head><title>A Page</title></head></html>";

    #[tokio::test]
    async fn add_link_scrapes_the_title() {
        let store = MemoryStore::new();
        let fetcher = CannedFetcher::default().with_page("https://a.example", PAGE);
        let owner = UserId::new();

        add_link(&store, &fetcher, owner, "https://a.example").await.unwrap();

        let links = store.list_links(owner).await.unwrap();
        assert_eq!(links[0].link.title, "A Page");
    }

    #[tokio::test]
    async fn add_link_trims_the_input() {
        let store = MemoryStore::new();
        let fetcher = CannedFetcher::default().with_page("https://a.example", PAGE);
        let owner = UserId::new();

        add_link(&store, &fetcher, owner, "  https://a.example\n").await.unwrap();

        let links = store.list_links(owner).await.unwrap();
        assert_eq!(links[0].link.url, "https://a.example");
    }

    #[tokio::test]
    async fn empty_url_is_invalid_input() {
        let store = MemoryStore::new();
        let fetcher = CannedFetcher::default();
        let err = add_link(&store, &fetcher, UserId::new(), "   ").await.unwrap_err();
        assert!(matches!(err, LinkError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn url_without_scheme_is_invalid_input() {
        let store = MemoryStore::new();
        let fetcher = CannedFetcher::default();
        for bad in ["a.example", "ftp://a.example", "HTTP://a.example"] {
            let err = add_link(&store, &fetcher, UserId::new(), bad).await.unwrap_err();
            assert!(matches!(err, LinkError::InvalidInput(_)), "accepted {bad:?}");
        }
    }

    #[tokio::test]
    async fn adding_twice_conflicts_and_keeps_one_link() {
        let store = MemoryStore::new();
        let fetcher = CannedFetcher::default().with_page("https://a.example", PAGE);
        let owner = UserId::new();

        add_link(&store, &fetcher, owner, "https://a.example").await.unwrap();
        let err = add_link(&store, &fetcher, owner, "https://a.example").await.unwrap_err();

        assert!(matches!(err, LinkError::Conflict));
        assert_eq!(store.list_links(owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn the_same_url_is_fine_for_another_user() {
        let store = MemoryStore::new();
        let fetcher = CannedFetcher::default().with_page("https://a.example", PAGE);

        add_link(&store, &fetcher, UserId::new(), "https://a.example").await.unwrap();
        add_link(&store, &fetcher, UserId::new(), "https://a.example").await.unwrap();
    }

    #[tokio::test]
    async fn fetch_failure_saves_the_link_with_the_error_as_title() {
        let store = MemoryStore::new();
        let fetcher = CannedFetcher::default(); // every fetch fails
        let owner = UserId::new();

        add_link(&store, &fetcher, owner, "https://dead.example").await.unwrap();

        let links = store.list_links(owner).await.unwrap();
        assert!(links[0].link.title.contains("connection timed out"));
    }

    #[tokio::test]
    async fn titleless_page_falls_back_to_the_url() {
        let store = MemoryStore::new();
        let fetcher =
            CannedFetcher::default().with_page("https://a.example", b"<html><body>hi</body></html>");
        let owner = UserId::new();

        add_link(&store, &fetcher, owner, "https://a.example").await.unwrap();

        let links = store.list_links(owner).await.unwrap();
        assert_eq!(links[0].link.title, "https://a.example");
    }

    #[tokio::test]
    async fn empty_title_page_gets_the_parse_failure_message() {
        let store = MemoryStore::new();
        let fetcher =
            CannedFetcher::default().with_page("https://a.example", b"<head><title></title></head>");
        let owner = UserId::new();

        add_link(&store, &fetcher, owner, "https://a.example").await.unwrap();

        let links = store.list_links(owner).await.unwrap();
        assert_eq!(links[0].link.title, PARSE_FAILED_TITLE);
    }

    #[tokio::test]
    async fn empty_batch_is_invalid_input() {
        let store = MemoryStore::new();
        let fetcher = CannedFetcher::default();
        let err = add_links(&store, &fetcher, UserId::new(), " \n ").await.unwrap_err();
        assert!(matches!(err, LinkError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn batch_survives_bad_items_and_saves_the_rest() {
        let store = MemoryStore::new();
        let fetcher = CannedFetcher::default()
            .with_page("https://a.example", PAGE)
            .with_page("https://b.example", PAGE)
            .with_page("https://c.example", PAGE);
        let owner = UserId::new();
        store
            .save_link(owner, &Link::new("https://old.example".to_string(), "old".to_string()))
            .await
            .unwrap();

        // One dead host, one scheme-less item, one already saved; the
        // dead host is still bookmarked, annotated with the fetch error.
        let results = add_links(
            &store,
            &fetcher,
            owner,
            "https://a.example;https://dead.example;no-scheme;https://b.example;https://old.example",
        )
        .await
        .unwrap();

        assert_eq!(results.len(), 5);
        assert!(matches!(results[0].outcome, ItemOutcome::Added { .. }));
        assert!(matches!(results[1].outcome, ItemOutcome::Added { .. }));
        assert_eq!(results[2].outcome, ItemOutcome::MissingScheme);
        assert!(matches!(results[3].outcome, ItemOutcome::Added { .. }));
        assert_eq!(results[4].outcome, ItemOutcome::AlreadySaved);

        let links = store.list_links(owner).await.unwrap();
        assert_eq!(links.len(), 4); // old + a + dead + b
        let dead = links.iter().find(|l| l.link.url == "https://dead.example").unwrap();
        assert!(dead.link.title.contains("connection timed out"));
    }

    #[tokio::test]
    async fn batch_items_are_not_trimmed() {
        let store = MemoryStore::new();
        let fetcher = CannedFetcher::default().with_page("https://a.example", PAGE);
        let owner = UserId::new();

        let results = add_links(&store, &fetcher, owner, "https://a.example; https://b.example")
            .await
            .unwrap();

        // The padded second item fails the scheme check as-is.
        assert!(matches!(results[0].outcome, ItemOutcome::Added { .. }));
        assert_eq!(results[1].url, " https://b.example");
        assert_eq!(results[1].outcome, ItemOutcome::MissingScheme);
    }

    #[tokio::test]
    async fn batch_snapshot_is_not_refreshed_mid_batch() {
        let store = MemoryStore::new();
        let fetcher = CannedFetcher::default().with_page("https://a.example", PAGE);
        let owner = UserId::new();

        // Known relaxation: a new URL repeated within one batch is checked
        // against the stale snapshot both times, so both inserts land.
        let results = add_links(&store, &fetcher, owner, "https://a.example;https://a.example")
            .await
            .unwrap();

        assert!(matches!(results[0].outcome, ItemOutcome::Added { .. }));
        assert!(matches!(results[1].outcome, ItemOutcome::Added { .. }));
        assert_eq!(store.list_links(owner).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn batch_swallows_store_write_failures() {
        let store = WriteFailStore(MemoryStore::new());
        let fetcher = CannedFetcher::default()
            .with_page("https://a.example", PAGE)
            .with_page("https://b.example", PAGE);

        let results = add_links(
            &store,
            &fetcher,
            UserId::new(),
            "https://a.example;https://b.example",
        )
        .await
        .unwrap();

        assert_eq!(results[0].outcome, ItemOutcome::StoreFailed);
        assert_eq!(results[1].outcome, ItemOutcome::StoreFailed);
    }

    #[tokio::test]
    async fn single_add_surfaces_store_write_failures() {
        let store = WriteFailStore(MemoryStore::new());
        let fetcher = CannedFetcher::default().with_page("https://a.example", PAGE);

        let err = add_link(&store, &fetcher, UserId::new(), "https://a.example")
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::Store(_)));
    }
}
