use std::io::{self, Write};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use timesheet_core::ReportRow;

/// Column names of the CRM timesheet import, in order.
pub const HEADERS: [&str; 11] = [
    "Name",
    "Start Time",
    "Hours",
    "Time Spent",
    "Category",
    "Owner",
    "Case",
    "Order",
    "Opportunity",
    "Quote",
    "Invoice",
];

/// Writes report rows as CSV with every field quoted.
pub struct CsvReportWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl<W: Write> CsvReportWriter<W> {
    /// Wraps `out` and writes the header row.
    pub fn new(out: W) -> Result<Self, csv::Error> {
        let mut inner = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .double_quote(true)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(out);
        inner.write_record(HEADERS)?;
        Ok(Self { inner })
    }

    pub fn write_row(&mut self, row: &ReportRow) -> Result<(), csv::Error> {
        let start = row.start_rfc3339();
        let hours = row.hours().to_string();
        let minutes = row.minutes.to_string();
        self.inner.write_record([
            row.description.as_str(),
            start.as_str(),
            hours.as_str(),
            minutes.as_str(),
            row.category_label(),
            row.owner.as_str(),
            row.case_reference.as_str(),
            row.order.as_str(),
            row.opportunity.as_str(),
            row.quote.as_str(),
            row.invoice.as_str(),
        ])
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> io::Result<W> {
        self.inner.into_inner().map_err(|e| e.into_error())
    }
}
