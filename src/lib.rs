//! # YCLIENTS API client
//!
//! Async client for the YCLIENTS online-booking service: booking-form
//! discovery and booking, user authorization, and paginated reads of the
//! company's client and visit records.
//!
//! ## Features
//!
//! - **Booking**: staff, services, free days and time slots, `book_record`
//! - **Authorization**: partner token plus an optional user token
//! - **Pagination**: every page of a list endpoint aggregated in order
//! - **Batch reads**: visits of many clients over one shared connection
//! - **Arrow Output**: records and visit summaries as Arrow RecordBatches
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use yclients_api::{ApiConfig, YClientsApi, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let api = YClientsApi::new(ApiConfig::from_env()?)?;
//!     api.login("admin@example.com", "secret").await?;
//!
//!     let clients = api.get_clients_data(200).await?;
//!     let ids: Vec<u64> = clients
//!         .iter()
//!         .filter_map(|c| c.get("id").and_then(|v| v.as_u64()))
//!         .collect();
//!
//!     let summaries = api
//!         .get_attended_visits_dates_information(&ids, 200, None)
//!         .await?;
//!     println!("{summaries:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        YClientsApi                          │
//! │  book()  get_staff()  get_clients_data()  get_visits_*()    │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//! ┌──────────┬──────────────────┴───┬──────────────┬────────────┐
//! │   Auth   │        HTTP          │   Paginate   │   Output   │
//! ├──────────┼──────────────────────┼──────────────┼────────────┤
//! │ Partner  │ GET/POST, JSON       │ total_count  │ Arrow      │
//! │ User     │ Connection contexts  │ Batch by key │ Pretty     │
//! │          │ Rate Limit           │ Concurrent   │            │
//! └──────────┴──────────────────────┴──────────────┴────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
// Allow common clippy pedantic lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod output;
pub mod pagination;
pub mod types;
pub mod visits;

// Re-exports for convenience
pub use api::{BookingOutcome, BookingRequest, YClientsApi};
pub use config::ApiConfig;
pub use error::{Error, Result};
pub use http::{ConnectionContext, HttpClient, HttpClientConfig};
pub use output::{records_to_batch, summaries_to_batch, ColumnPolicy};
pub use pagination::{FetchMode, KeyedRecords, PageCountPolicy, PageEnvelope, Paginator};
pub use types::{ClientId, JsonValue, Record};
pub use visits::VisitSummary;
