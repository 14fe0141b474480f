use std::sync::Mutex;

use chrono::{DateTime, Duration, NaiveDate};
use timesheet_core::{DateRange, RawEntry};

use crate::source::{EntryPage, PageFetcher, SourceError};

/// Serves canned pages; `Err` pages carry an error payload.
pub(crate) struct ScriptedFetcher {
    pages: Vec<Result<Vec<RawEntry>, String>>,
    calls: Mutex<Vec<u32>>,
}

impl ScriptedFetcher {
    pub(crate) fn new(pages: Vec<Result<Vec<RawEntry>, String>>) -> Self {
        Self {
            pages,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

impl PageFetcher for ScriptedFetcher {
    async fn fetch_page(&self, _range: DateRange, page: u32) -> Result<EntryPage, SourceError> {
        self.calls.lock().unwrap().push(page);
        let page = match self.pages.get(page as usize - 1) {
            Some(Ok(entries)) => EntryPage {
                entries: entries.clone(),
                error: None,
            },
            Some(Err(message)) => EntryPage {
                entries: Vec::new(),
                error: Some(message.clone()),
            },
            None => EntryPage::default(),
        };
        Ok(page)
    }
}

pub(crate) fn range() -> DateRange {
    DateRange::single_day(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
}

/// A one-hour entry on 2024-01-15.
pub(crate) fn entry(project: &str, description: &str) -> RawEntry {
    let start = DateTime::parse_from_rfc3339("2024-01-15T09:00:00+00:00").unwrap();
    RawEntry {
        start,
        end: start + Duration::hours(1),
        project: project.to_string(),
        client: String::new(),
        description: description.to_string(),
    }
}
