pub mod classify;
pub mod csv;
pub mod description;
pub mod pipeline;
pub mod rules;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::classify::{Classification, ClassifyError, EntryClassifier, SkipReason};
pub use crate::csv::{CsvReportWriter, HEADERS};
pub use crate::description::{parse as parse_description, DescriptionError, ParsedDescription};
pub use crate::pipeline::{ReportError, ReportPipeline, ReportRun, RunTotals};
pub use crate::rules::{ClassificationRule, ConfigError, Matcher, RuleConfig, RuleSet};
pub use crate::source::{EntryPage, PageFetcher, PagedEntrySource, SourceError};
