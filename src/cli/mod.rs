//! CLI module
//!
//! Command-line interface over [`crate::api::YClientsApi`].
//!
//! # Commands
//!
//! - `staff`, `services`, `days`, `times` - booking-form discovery
//! - `book` - make a booking
//! - `permissions` - permissions of the authorized user
//! - `clients`, `visits`, `summary` - paginated account data

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
