//! Paginated aggregation
//!
//! Reads `meta.total_count` from the first page, works out how many pages
//! remain, fetches them and concatenates everything in page order.

use super::types::{BoundFetcher, FetchMode, KeyedPageFetcher, PageCountPolicy, PageFetcher};
use crate::error::{Error, Result};
use crate::http::ConnectionContext;
use crate::types::Record;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::fmt::Debug;
use std::time::Instant;
use tracing::{debug, info};

/// Aggregates every page of a collection into one ordered `Vec`
#[derive(Debug, Clone, Copy, Default)]
pub struct Paginator {
    policy: PageCountPolicy,
    mode: FetchMode,
}

impl Paginator {
    /// Sequential paginator with the default page-count policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page-count policy
    #[must_use]
    pub fn with_policy(mut self, policy: PageCountPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the fetch mode
    #[must_use]
    pub fn with_mode(mut self, mode: FetchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Page-count policy in use
    pub fn policy(&self) -> PageCountPolicy {
        self.policy
    }

    /// Fetch mode in use
    pub fn mode(&self) -> FetchMode {
        self.mode
    }

    /// Fetch every page and return the records in page order
    ///
    /// Any failed page aborts the whole fetch; nothing fetched so far is
    /// returned.
    pub async fn fetch_all<F>(&self, fetcher: &F, page_size: u32) -> Result<Vec<Record>>
    where
        F: PageFetcher + ?Sized,
    {
        if page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be positive"));
        }

        let started = Instant::now();
        let first = fetcher.fetch_page(1, page_size).await?;
        debug!(
            page = 1,
            records = first.data.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Page fetched"
        );

        let total_count = first.total_count();
        let page_count = self.policy.page_count(total_count, page_size);
        info!(total_count, page_count, page_size, "Collection size known");

        let mut records = first.data;
        if page_count == 1 {
            return Ok(records);
        }

        match self.mode {
            FetchMode::Sequential => {
                for page in 2..=page_count {
                    let started = Instant::now();
                    let envelope = fetcher.fetch_page(page, page_size).await?;
                    debug!(
                        page,
                        records = envelope.data.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Page fetched"
                    );
                    records.extend(envelope.data);
                }
            }
            FetchMode::Concurrent { limit } => {
                // `buffered` yields in input order, so pages stay in sequence.
                let pages: Vec<_> = stream::iter(2..=page_count)
                    .map(|page| fetcher.fetch_page(page, page_size))
                    .buffered(limit.max(1))
                    .try_collect()
                    .await?;
                for envelope in pages {
                    records.extend(envelope.data);
                }
            }
        }

        debug!(
            records = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Collection fetched"
        );
        Ok(records)
    }

    /// Fetch every page of each key's collection, one key after another
    ///
    /// All requests go through `context`. Results keep the order of `keys`.
    /// A failure for any key aborts the whole batch.
    pub async fn fetch_all_for_keys<K, F>(
        &self,
        keys: &[K],
        fetcher: &F,
        page_size: u32,
        context: &ConnectionContext,
    ) -> Result<KeyedRecords<K>>
    where
        K: Clone + PartialEq + Debug + Send + Sync,
        F: KeyedPageFetcher<K> + ?Sized,
    {
        let mut results = KeyedRecords::with_capacity(keys.len());
        for key in keys {
            debug!(?key, context = context.id(), "Fetching collection for key");
            let bound = BoundFetcher::new(fetcher, context, key);
            let records = self.fetch_all(&bound, page_size).await?;
            results.insert(key.clone(), records);
        }
        info!(
            keys = results.len(),
            requests = context.requests_sent(),
            "Batch fetch complete"
        );
        Ok(results)
    }
}

// ============================================================================
// Keyed Results
// ============================================================================

/// Records per key, iterated in insertion order
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedRecords<K> {
    entries: Vec<(K, Vec<Record>)>,
}

impl<K> Default for KeyedRecords<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: PartialEq> KeyedRecords<K> {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty map with room for `capacity` keys
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert records for `key`
    ///
    /// A key already present keeps its position and takes the new records.
    pub fn insert(&mut self, key: K, records: Vec<Record>) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = records,
            None => self.entries.push((key, records)),
        }
    }

    /// Records for `key`
    pub fn get(&self, key: &K) -> Option<&[Record]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[Record])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K> IntoIterator for KeyedRecords<K> {
    type Item = (K, Vec<Record>);
    type IntoIter = std::vec::IntoIter<(K, Vec<Record>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
