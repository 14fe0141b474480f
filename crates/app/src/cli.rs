use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::{ArgGroup, Parser};
use timesheet_core::{DateRange, PeriodError};

const DEFAULT_OUTFILE: &str = "timesheet.csv";

/// Export Toggl time entries as a CRM timesheet CSV.
#[derive(Debug, Parser)]
#[command(name = "timesheet", version, about)]
#[command(group(ArgGroup::new("shortcut").args(["today", "yesterday", "days_ago"])))]
pub struct Cli {
    /// First day to export (inclusive). Defaults to Monday of this week.
    #[arg(long, value_name = "YYYY-MM-DD", conflicts_with = "shortcut")]
    pub since: Option<NaiveDate>,

    /// Last day to export (inclusive). Defaults to today.
    #[arg(long, value_name = "YYYY-MM-DD", conflicts_with = "shortcut")]
    pub until: Option<NaiveDate>,

    /// Export today only.
    #[arg(long)]
    pub today: bool,

    /// Export yesterday only.
    #[arg(long)]
    pub yesterday: bool,

    /// Export N days ago, or the span from N to M days ago.
    #[arg(long, value_name = "N[-M]")]
    pub days_ago: Option<DaysAgo>,

    /// Write the CSV to a file instead of stdout. Without a value the file
    /// is `timesheet.csv` in the system temp directory.
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    pub outfile: Option<Option<PathBuf>>,

    /// Configuration file. Defaults to the platform config directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Abort on the first entry no rule matches.
    #[arg(long)]
    pub halt_on_missing: bool,

    /// Look up every order, case and the owner in the CRM after exporting.
    #[arg(long)]
    pub check_crm: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaysAgo {
    pub from: u64,
    pub to: Option<u64>,
}

impl FromStr for DaysAgo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number = |part: &str| {
            part.trim()
                .parse::<u64>()
                .map_err(|_| format!("expected N or N-M, got '{s}'"))
        };
        match s.split_once('-') {
            Some((from, to)) => Ok(DaysAgo {
                from: number(from)?,
                to: Some(number(to)?),
            }),
            None => Ok(DaysAgo {
                from: number(s)?,
                to: None,
            }),
        }
    }
}

/// Where the CSV goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

impl Cli {
    /// Resolves the date flags against `today`.
    pub fn date_range(&self, today: NaiveDate) -> Result<DateRange, PeriodError> {
        if self.today {
            return Ok(DateRange::single_day(today));
        }
        if self.yesterday {
            return DateRange::days_ago(today, 1, None);
        }
        if let Some(days) = self.days_ago {
            return DateRange::days_ago(today, days.from, days.to);
        }

        let default = DateRange::week_to_date(today);
        DateRange::new(
            self.since.unwrap_or(default.start),
            self.until.unwrap_or(default.end),
        )
    }

    pub fn output(&self) -> Output {
        match &self.outfile {
            None => Output::Stdout,
            Some(Some(path)) => Output::File(path.clone()),
            Some(None) => Output::File(std::env::temp_dir().join(DEFAULT_OUTFILE)),
        }
    }
}
