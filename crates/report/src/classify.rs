use chrono::{DateTime, FixedOffset};
use thiserror::Error;
use timesheet_core::{RawEntry, ReportRow};

use crate::description::{self, DescriptionError};
use crate::rules::RuleSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No rule matched the project/client pair.
    Unmatched,
    /// The matching rule is an ignore rule.
    Ignored,
    /// The description markers could not be parsed.
    MalformedDescription,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Row(ReportRow),
    Skipped(SkipReason),
}

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error(
        "Cannot match project {project:?} / client {client:?} for entry starting {start}, add a rule to continue"
    )]
    UnmatchedRule {
        project: String,
        client: String,
        start: DateTime<FixedOffset>,
    },
    #[error("Entry starting {start}: {source}")]
    Description {
        start: DateTime<FixedOffset>,
        source: DescriptionError,
    },
}

/// Turns raw entries into report rows using the configured rules.
///
/// With `halt_on_missing` unset, entries that match no rule or carry a
/// malformed description are logged and skipped. With it set, they fail.
pub struct EntryClassifier {
    rules: RuleSet,
    owner: String,
    halt_on_missing: bool,
}

impl EntryClassifier {
    pub fn new(rules: RuleSet, owner: impl Into<String>) -> Self {
        Self {
            rules,
            owner: owner.into(),
            halt_on_missing: false,
        }
    }

    pub fn halt_on_missing(mut self, halt: bool) -> Self {
        self.halt_on_missing = halt;
        self
    }

    pub fn classify(&self, entry: &RawEntry) -> Result<Classification, ClassifyError> {
        let minutes = entry.duration_minutes();

        let Some(rule) = self.rules.find_match(&entry.project, &entry.client) else {
            tracing::warn!(
                project = %entry.project,
                client = %entry.client,
                start = %entry.start,
                "Cannot match project, add to config to continue"
            );
            if self.halt_on_missing {
                return Err(ClassifyError::UnmatchedRule {
                    project: entry.project.clone(),
                    client: entry.client.clone(),
                    start: entry.start,
                });
            }
            return Ok(Classification::Skipped(SkipReason::Unmatched));
        };

        if rule.ignore {
            tracing::debug!(project = %entry.project, start = %entry.start, "Ignoring entry");
            return Ok(Classification::Skipped(SkipReason::Ignored));
        }

        let parsed = match description::parse(&entry.description) {
            Ok(parsed) => parsed,
            Err(source) => {
                tracing::warn!(
                    project = %entry.project,
                    start = %entry.start,
                    description = %entry.description,
                    "{source}"
                );
                if self.halt_on_missing {
                    return Err(ClassifyError::Description {
                        start: entry.start,
                        source,
                    });
                }
                return Ok(Classification::Skipped(SkipReason::MalformedDescription));
            }
        };

        let description = if parsed.remaining_text.is_empty() {
            undescribed(&entry.project)
        } else {
            parsed.remaining_text
        };

        Ok(Classification::Row(ReportRow {
            description,
            start: entry.start,
            minutes,
            category: parsed.category.or(rule.category),
            owner: self.owner.clone(),
            case_reference: parsed.case_reference,
            order: rule.order.clone().unwrap_or_default(),
            opportunity: rule.opportunity.clone().unwrap_or_default(),
            quote: String::new(),
            invoice: String::new(),
        }))
    }
}

fn undescribed(project: &str) -> String {
    if project.is_empty() {
        "(Undescribed work)".to_string()
    } else {
        format!("(Undescribed {project} work)")
    }
}
