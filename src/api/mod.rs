//! YCLIENTS API module
//!
//! [`YClientsApi`] ties the configuration, the authenticated transport and
//! the paginator together and exposes one method per remote endpoint.

mod client;
mod types;

pub use client::YClientsApi;
pub use types::{BookingOutcome, BookingRequest};

#[cfg(test)]
mod tests;
