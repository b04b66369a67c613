use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CycleStatus {
    #[serde(rename = "Aberto", alias = "OPEN", alias = "Open")]
    Open,
    #[serde(rename = "Fechado", alias = "CLOSED", alias = "Closed")]
    Closed,
    #[serde(other)]
    Unknown,
}

impl Default for CycleStatus {
    fn default() -> Self {
        CycleStatus::Unknown
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Cycle {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub status: CycleStatus,
}

impl Cycle {
    pub fn is_open(&self) -> bool {
        self.status == CycleStatus::Open
    }
}

/// Picks the cycle whose `start_date` string is greatest. The comparison is
/// lexical, so it only orders correctly for same-length ISO dates. Ties keep
/// the first cycle in input order.
pub fn latest_by_start_date(cycles: &[Cycle]) -> Option<&Cycle> {
    cycles.iter().fold(None, |best: Option<&Cycle>, cycle| match best {
        Some(current) if cycle.start_date.as_str() <= current.start_date.as_str() => Some(current),
        _ => Some(cycle),
    })
}

/// Dashboard ordering: open cycles first, then most recent `end_date` first.
pub fn order_for_dashboard(cycles: &mut [Cycle]) {
    cycles.sort_by(|a, b| match (a.is_open(), b.is_open()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => match (parse_date(&a.end_date), parse_date(&b.end_date)) {
            (Some(left), Some(right)) => right.cmp(&left),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    });
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
