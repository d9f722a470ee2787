//! Output module
//!
//! Tabular export of fetched records as Arrow RecordBatches, plus a text
//! rendering for the CLI. Nothing is written to disk.

mod table;

pub use table::{columns_for, pretty_table, records_to_batch, summaries_to_batch, ColumnPolicy};

#[cfg(test)]
mod tests;
