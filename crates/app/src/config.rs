use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use timesheet_crm::CrmSettings;
use timesheet_report::RuleConfig;
use timesheet_toggl::TogglSettings;

const CONFIG_FILE: &str = "config.toml";

/// Everything the exporter reads from its TOML file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub toggl: TogglSettings,
    pub crm: CrmSettings,
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportSettings {
    #[serde(default)]
    pub halt_on_missing: bool,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("com", "timesheet", "timesheet")
        .context("Failed to determine the config directory")?;
    Ok(dirs.config_dir().join(CONFIG_FILE))
}
