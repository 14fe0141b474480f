use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use timesheet_core::DateRange;
use timesheet_crm::{
    OrganizationDataClient, ReferenceCache, ReferenceKind, ReferenceLookup, References,
};
use timesheet_report::{
    CsvReportWriter, EntryClassifier, PagedEntrySource, ReportPipeline, RuleSet, RunTotals,
};
use timesheet_toggl::TogglClient;

use crate::cli::Output;
use crate::config::AppConfig;

pub struct ReportOptions {
    pub range: DateRange,
    pub output: Output,
    pub halt_on_missing: bool,
    pub check_crm: bool,
}

/// Fetches the entries in `options.range`, writes the CSV, and reports totals.
pub async fn run_report(config: AppConfig, options: ReportOptions) -> Result<RunTotals> {
    let rules = RuleSet::from_configs(config.rules).context("Invalid classification rules")?;
    if rules.is_empty() {
        tracing::warn!("No classification rules configured");
    }
    tracing::debug!(rules = rules.len(), "Loaded classification rules");

    let owner = config.crm.username.clone();
    let classifier = EntryClassifier::new(rules, owner.clone())
        .halt_on_missing(options.halt_on_missing || config.report.halt_on_missing);
    let toggl = TogglClient::new(config.toggl).context("Failed to build Toggl client")?;
    let pipeline = ReportPipeline::new(PagedEntrySource::new(toggl), classifier);

    let mut writer = CsvReportWriter::new(open_output(&options.output)?)
        .context("Failed to write CSV header")?;
    let mut references = References::default();
    let totals = pipeline
        .run(options.range)
        .write_to(&mut writer, |row| references.record(row))
        .await?;

    if let Output::File(path) = &options.output {
        tracing::info!("Timesheet written to {}", path.display());
    }
    tracing::info!("{} row(s) produced", totals.rows);
    tracing::info!("Total hours worked: {}", totals.hours());
    if totals.skipped > 0 {
        tracing::warn!("{} entries skipped", totals.skipped);
    }
    if totals.ignored > 0 {
        tracing::info!("{} entries ignored by rules", totals.ignored);
    }

    if options.check_crm {
        match OrganizationDataClient::from_settings(&config.crm)
            .context("Failed to build CRM client")?
        {
            Some(client) => {
                let mut cache = ReferenceCache::new(client);
                check_references(&mut cache, &references, &owner).await;
            }
            None => tracing::warn!("No CRM base_url configured; skipping reference check"),
        }
    }

    Ok(totals)
}

fn open_output(output: &Output) -> Result<Box<dyn Write>> {
    match output {
        Output::Stdout => Ok(Box::new(io::stdout())),
        Output::File(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
    }
}

/// Logs every reference the CRM does not know. Returns how many were unresolved.
pub async fn check_references<L: ReferenceLookup>(
    cache: &mut ReferenceCache<L>,
    references: &References,
    owner: &str,
) -> usize {
    let orders: Vec<String> = references.orders.iter().cloned().collect();
    let cases: Vec<String> = references.cases.iter().cloned().collect();
    let owner = vec![owner.to_string()];

    let mut unresolved = 0;
    for (kind, keys) in [
        (ReferenceKind::User, &owner),
        (ReferenceKind::SalesOrder, &orders),
        (ReferenceKind::Case, &cases),
    ] {
        if keys.is_empty() {
            continue;
        }
        match cache.resolve(kind, keys).await {
            Ok(resolved) => {
                for key in keys {
                    if !matches!(resolved.get(key), Some(Some(_))) {
                        tracing::warn!("Unknown {kind} in CRM: {key}");
                        unresolved += 1;
                    }
                }
            }
            Err(e) => tracing::warn!("CRM {kind} lookup failed: {e}"),
        }
    }

    if unresolved == 0 {
        tracing::info!("All CRM references resolved");
    }
    unresolved
}
