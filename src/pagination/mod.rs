//! Pagination module
//!
//! # Overview
//!
//! List endpoints return bounded pages plus the size of the whole
//! collection. The [`Paginator`] fetches the first page, derives the page
//! count from `meta.total_count`, fetches the rest and returns one ordered
//! `Vec` of records. Batch fetches run one full pagination per key through
//! a single shared connection context.

mod paginator;
mod types;

pub use paginator::{KeyedRecords, Paginator};
pub use types::{
    BoundFetcher, FetchMode, FnFetcher, KeyedPageFetcher, PageCountPolicy, PageEnvelope,
    PageFetcher, PageMeta, MAX_PAGE_SIZE,
};
