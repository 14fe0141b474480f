use chrono::{DateTime, FixedOffset, SecondsFormat};

use super::category::Category;
use super::hours::Hours;

/// One time record as delivered by the time tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub project: String,
    pub client: String,
    pub description: String,
}

impl RawEntry {
    /// Whole minutes between start and end. Half a minute rounds up.
    pub fn duration_minutes(&self) -> i64 {
        let millis = (self.end - self.start).num_milliseconds();
        (millis + 30_000).div_euclid(60_000)
    }
}

/// One line of the CRM import file.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub description: String,
    pub start: DateTime<FixedOffset>,
    pub minutes: i64,
    pub category: Option<Category>,
    pub owner: String,
    pub case_reference: String,
    pub order: String,
    pub opportunity: String,
    pub quote: String,
    pub invoice: String,
}

impl ReportRow {
    pub fn hours(&self) -> Hours {
        Hours::from_minutes(self.minutes)
    }

    /// Start time as RFC 3339 with seconds precision, e.g. `2024-01-15T09:00:00+01:00`.
    pub fn start_rfc3339(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Secs, false)
    }

    pub fn category_label(&self) -> &'static str {
        self.category.map(Category::label).unwrap_or("")
    }
}
