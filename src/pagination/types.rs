//! Pagination types and traits
//!
//! Defines the page envelope, the page-count policy and the fetcher traits
//! the paginator drives.

use crate::error::{Error, Result};
use crate::http::ConnectionContext;
use crate::types::Record;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

/// Largest page size the remote service honours
///
/// Not enforced locally: larger values are capped by the service.
pub const MAX_PAGE_SIZE: u32 = 200;

// ============================================================================
// Page Envelope
// ============================================================================

/// Metadata block of a list response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Size of the whole collection, not of this page
    pub total_count: u64,
}

/// One page of a list response: `{ data: [...], meta: { total_count } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEnvelope {
    /// Records on this page
    pub data: Vec<Record>,
    /// Collection metadata
    pub meta: PageMeta,
}

impl PageEnvelope {
    /// Create an envelope
    pub fn new(data: Vec<Record>, total_count: u64) -> Self {
        Self {
            data,
            meta: PageMeta { total_count },
        }
    }

    /// Decode an envelope from a response body
    pub fn from_value(body: Value) -> Result<Self> {
        serde_json::from_value(body)
            .map_err(|e| Error::decode(format!("invalid page envelope: {e}")))
    }

    /// Total number of records in the collection
    pub fn total_count(&self) -> u64 {
        self.meta.total_count
    }
}

// ============================================================================
// Page Count Policy
// ============================================================================

/// How many pages to request for a given total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageCountPolicy {
    /// `floor(total / size) + 1`
    ///
    /// Requests one extra, empty page when `total` is an exact multiple of
    /// `size`. This is what the service's reference client does.
    #[default]
    FloorPlusOne,
    /// `ceil(total / size)`, at least 1
    Ceil,
}

impl PageCountPolicy {
    /// Number of pages, including the first, for `total` records
    ///
    /// `page_size` must be non-zero.
    pub fn page_count(self, total: u64, page_size: u32) -> u32 {
        let size = u64::from(page_size.max(1));
        let count = match self {
            Self::FloorPlusOne => total / size + 1,
            Self::Ceil => total.div_ceil(size).max(1),
        };
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

// ============================================================================
// Fetch Mode
// ============================================================================

/// How pages after the first are requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum FetchMode {
    /// One page at a time, in ascending order
    #[default]
    Sequential,
    /// Up to `limit` pages in flight; results still assembled in page order
    Concurrent {
        /// Maximum number of in-flight page requests
        limit: usize,
    },
}

// ============================================================================
// Fetcher Traits
// ============================================================================

/// Fetches one page of one logical collection
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch page `page` (1-based) holding up to `page_size` records
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<PageEnvelope>;
}

/// Fetches one page of the collection identified by `key`, through `context`
#[async_trait]
pub trait KeyedPageFetcher<K: Sync>: Send + Sync {
    /// Fetch page `page` (1-based) of `key`'s collection
    async fn fetch_page(
        &self,
        context: &ConnectionContext,
        key: &K,
        page: u32,
        page_size: u32,
    ) -> Result<PageEnvelope>;
}

/// A keyed fetcher bound to one key and one context
pub struct BoundFetcher<'a, F: ?Sized, K> {
    fetcher: &'a F,
    context: &'a ConnectionContext,
    key: &'a K,
}

impl<'a, F: ?Sized, K> BoundFetcher<'a, F, K> {
    /// Bind `fetcher` to `key`, sending requests through `context`
    pub fn new(fetcher: &'a F, context: &'a ConnectionContext, key: &'a K) -> Self {
        Self {
            fetcher,
            context,
            key,
        }
    }
}

#[async_trait]
impl<F, K> PageFetcher for BoundFetcher<'_, F, K>
where
    F: KeyedPageFetcher<K> + ?Sized,
    K: Send + Sync,
{
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<PageEnvelope> {
        self.fetcher
            .fetch_page(self.context, self.key, page, page_size)
            .await
    }
}

/// Adapts a closure `(page, page_size) -> Future<Result<PageEnvelope>>`
pub struct FnFetcher<F>(pub F);

#[async_trait]
impl<F, Fut> PageFetcher for FnFetcher<F>
where
    F: Fn(u32, u32) -> Fut + Send + Sync,
    Fut: Future<Output = Result<PageEnvelope>> + Send,
{
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<PageEnvelope> {
        (self.0)(page, page_size).await
    }
}
