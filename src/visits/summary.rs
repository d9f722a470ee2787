//! Attendance filtering and per-client visit summaries

use crate::error::{Error, Result};
use crate::types::{ClientId, Record};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Visit attendance status, as reported in the `attendance` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attendance {
    /// Client did not come (`-1`)
    NoShow,
    /// Waiting for the client (`0`)
    Waiting,
    /// Client came and the services were provided (`1`)
    Arrived,
    /// Client confirmed the booking (`2`)
    Confirmed,
}

impl Attendance {
    /// Map a raw attendance code
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(Self::NoShow),
            0 => Some(Self::Waiting),
            1 => Some(Self::Arrived),
            2 => Some(Self::Confirmed),
            _ => None,
        }
    }

    /// Raw attendance code
    pub fn code(self) -> i64 {
        match self {
            Self::NoShow => -1,
            Self::Waiting => 0,
            Self::Arrived => 1,
            Self::Confirmed => 2,
        }
    }
}

/// Attendance of a visit record, if the field is present and known
pub fn attendance_of(visit: &Record) -> Option<Attendance> {
    visit
        .get("attendance")
        .and_then(Value::as_i64)
        .and_then(Attendance::from_code)
}

/// Whether the visit was attended (services rendered)
pub fn is_attended(visit: &Record) -> bool {
    attendance_of(visit) == Some(Attendance::Arrived)
}

/// Keep only attended visits, in their original order
pub fn filter_attended(visits: impl IntoIterator<Item = Record>) -> Vec<Record> {
    visits.into_iter().filter(is_attended).collect()
}

/// Parse a visit timestamp such as `2024-03-01T10:00:00+03:00`
///
/// Returns the wall-clock time of the visit; the UTC offset is validated and
/// dropped. Both `+` and `-` offsets are accepted, with or without a colon,
/// as well as `Z` and offset-less timestamps.
pub fn parse_visit_datetime(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Ok(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map_err(|e| Error::decode(format!("invalid visit datetime '{raw}': {e}")))
}

/// Timestamp of a visit record
pub fn visit_datetime(visit: &Record) -> Result<NaiveDateTime> {
    let raw = visit
        .get("datetime")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::decode("visit record has no 'datetime' string"))?;
    parse_visit_datetime(raw)
}

/// Attended-visit summary for one client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitSummary {
    /// Client id
    pub id: ClientId,
    /// Number of attended visits
    pub visits_number: usize,
    /// Date of the earliest attended visit
    pub first_visit: Option<NaiveDate>,
    /// Date of the latest attended visit
    pub last_visit: Option<NaiveDate>,
}

impl VisitSummary {
    /// Summary of a client with no attended visits
    pub fn empty(id: ClientId) -> Self {
        Self {
            id,
            visits_number: 0,
            first_visit: None,
            last_visit: None,
        }
    }
}

/// Summarise `visits` for client `id`
///
/// Only attended visits count; `visits` may contain any mix.
pub fn summarize_visits(id: ClientId, visits: &[Record]) -> Result<VisitSummary> {
    let mut summary = VisitSummary::empty(id);
    let mut first: Option<NaiveDateTime> = None;
    let mut last: Option<NaiveDateTime> = None;

    for visit in visits.iter().filter(|v| is_attended(v)) {
        let at = visit_datetime(visit)?;
        summary.visits_number += 1;
        first = Some(first.map_or(at, |f| f.min(at)));
        last = Some(last.map_or(at, |l| l.max(at)));
    }

    summary.first_visit = first.map(|dt| dt.date());
    summary.last_visit = last.map(|dt| dt.date());
    Ok(summary)
}
