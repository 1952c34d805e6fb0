use crate::models::RecordingRecord;
use chrono::{Local, Months, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    All,
    Today,
    Week,
    Month,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::All => "all",
            Period::Today => "today",
            Period::Week => "week",
            Period::Month => "month",
        }
    }

    /// Whether a recording made at `timestamp` falls in this period, seen from `now`.
    pub fn contains(&self, timestamp: NaiveDateTime, now: NaiveDateTime) -> bool {
        match self {
            Period::All => true,
            Period::Today => timestamp.date() == now.date(),
            Period::Week => match now.checked_sub_signed(TimeDelta::days(7)) {
                Some(cutoff) => timestamp >= cutoff,
                None => true,
            },
            Period::Month => match now.checked_sub_months(Months::new(1)) {
                Some(cutoff) => timestamp >= cutoff,
                None => true,
            },
        }
    }
}

/// Unknown names select [`Period::All`].
impl FromStr for Period {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "today" => Period::Today,
            "week" => Period::Week,
            "month" => Period::Month,
            _ => Period::All,
        })
    }
}

/// Period plus free-text search, as selected in the recordings view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingFilter {
    pub period: Period,
    pub search_text: String,
}

impl RecordingFilter {
    pub fn new(period: Period, search_text: impl Into<String>) -> Self {
        Self {
            period,
            search_text: search_text.into(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.period == Period::All && self.search_text.trim().is_empty()
    }

    pub fn matches(&self, record: &RecordingRecord, now: NaiveDateTime) -> bool {
        if !self.period.contains(record.metadata.timestamp, now) {
            return false;
        }
        let query = self.search_text.trim();
        if query.is_empty() {
            return true;
        }
        let query = query.to_lowercase();
        record.display_name().to_lowercase().contains(&query)
            || record.phone_number().to_lowercase().contains(&query)
    }

    pub fn apply(&self, records: &[RecordingRecord]) -> Vec<RecordingRecord> {
        self.apply_at(records, Local::now().naive_local())
    }

    /// Keeps the relative order of `records`; never touches the input.
    pub fn apply_at(&self, records: &[RecordingRecord], now: NaiveDateTime) -> Vec<RecordingRecord> {
        records
            .iter()
            .filter(|r| self.matches(r, now))
            .cloned()
            .collect()
    }
}

pub fn apply_filter(records: &[RecordingRecord], period: Period, search_text: &str) -> Vec<RecordingRecord> {
    RecordingFilter::new(period, search_text).apply(records)
}
