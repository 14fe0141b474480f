use std::io::Write;
use std::pin::Pin;

use thiserror::Error;
use timesheet_core::{DateRange, Hours, RawEntry, ReportRow};
use tokio_stream::{Stream, StreamExt};

use crate::classify::{Classification, ClassifyError, EntryClassifier, SkipReason};
use crate::csv::CsvReportWriter;
use crate::source::{PageFetcher, PagedEntrySource, SourceError};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("Failed to write report: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Running totals for one report run. Only produced rows count towards
/// `rows` and `minutes`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub rows: usize,
    pub minutes: i64,
    /// Entries dropped because no rule matched or the description was malformed.
    pub skipped: usize,
    /// Entries dropped by an ignore rule.
    pub ignored: usize,
}

impl RunTotals {
    pub fn hours(&self) -> Hours {
        Hours::from_minutes(self.minutes)
    }

    fn record_row(&mut self, row: &ReportRow) {
        self.rows += 1;
        self.minutes += row.minutes;
    }

    fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::Ignored => self.ignored += 1,
            SkipReason::Unmatched | SkipReason::MalformedDescription => self.skipped += 1,
        }
    }
}

/// Entry source → classifier → rows.
pub struct ReportPipeline<F> {
    source: PagedEntrySource<F>,
    classifier: EntryClassifier,
}

impl<F: PageFetcher> ReportPipeline<F> {
    pub fn new(source: PagedEntrySource<F>, classifier: EntryClassifier) -> Self {
        Self { source, classifier }
    }

    /// Starts a fresh run over `range`. Nothing is fetched until the first
    /// call to [`ReportRun::next_row`].
    pub fn run(&self, range: DateRange) -> ReportRun<'_> {
        tracing::info!("From {range} (both inclusive)");
        ReportRun {
            entries: Box::pin(self.source.entries(range)),
            classifier: &self.classifier,
            totals: RunTotals::default(),
            finished: false,
        }
    }
}

/// A single pass over the source, pulled one row at a time.
pub struct ReportRun<'a> {
    entries: Pin<Box<dyn Stream<Item = Result<RawEntry, SourceError>> + 'a>>,
    classifier: &'a EntryClassifier,
    totals: RunTotals,
    finished: bool,
}

impl<'a> ReportRun<'a> {
    /// Next classified row, `Ok(None)` at the end of the run.
    ///
    /// A fatal error finishes the run; later calls return `Ok(None)`.
    pub async fn next_row(&mut self) -> Result<Option<ReportRow>, ReportError> {
        if self.finished {
            return Ok(None);
        }

        while let Some(next) = self.entries.next().await {
            let outcome = next
                .map_err(ReportError::from)
                .and_then(|entry| self.classifier.classify(&entry).map_err(ReportError::from));

            match outcome {
                Ok(Classification::Row(row)) => {
                    self.totals.record_row(&row);
                    return Ok(Some(row));
                }
                Ok(Classification::Skipped(reason)) => self.totals.record_skip(reason),
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                }
            }
        }

        self.finished = true;
        Ok(None)
    }

    pub fn totals(&self) -> RunTotals {
        self.totals
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Drains the run into `writer`, flushing after every row so partial
    /// output survives a fatal error. `observe` sees each row once it is written.
    pub async fn write_to<W: Write>(
        mut self,
        writer: &mut CsvReportWriter<W>,
        mut observe: impl FnMut(&ReportRow),
    ) -> Result<RunTotals, ReportError> {
        while let Some(row) = self.next_row().await? {
            writer.write_row(&row)?;
            writer.flush()?;
            observe(&row);
        }
        writer.flush()?;
        Ok(self.totals)
    }
}
