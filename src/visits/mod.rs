//! Visit-record helpers
//!
//! Filtering attended visits and summarising a client's visit history.
//! These are the only places that look inside records.

mod summary;

pub use summary::{
    attendance_of, filter_attended, is_attended, parse_visit_datetime, summarize_visits,
    visit_datetime, Attendance, VisitSummary,
};
