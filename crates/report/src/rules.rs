use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use timesheet_core::{Category, UnknownCategory};

/// A rule as written in the config file, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub name: Option<String>,
    pub project: Option<String>,
    pub project_regex: Option<String>,
    pub client: Option<String>,
    pub client_regex: Option<String>,
    #[serde(default)]
    pub ignore: bool,
    pub order: Option<String>,
    pub opportunity: Option<String>,
    pub category: Option<String>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Rule {rule} sets neither order nor opportunity")]
    MissingBillingReference { rule: String },
    #[error("Rule {rule}: invalid {field} pattern: {source}")]
    InvalidPattern {
        rule: String,
        field: &'static str,
        source: regex::Error,
    },
    #[error("Rule {rule}: both {field} and {field}_regex are set")]
    ConflictingMatcher { rule: String, field: &'static str },
    #[error("Rule {rule}: {source}")]
    UnknownCategory {
        rule: String,
        source: UnknownCategory,
    },
}

/// How one field of a rule is tested against an entry.
#[derive(Debug, Clone)]
pub enum Matcher {
    Any,
    Exact(String),
    Pattern(Regex),
}

impl Matcher {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Exact(expected) => expected == value,
            Matcher::Pattern(re) => re.is_match(value),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassificationRule {
    pub name: Option<String>,
    pub project: Matcher,
    pub client: Matcher,
    pub ignore: bool,
    pub order: Option<String>,
    pub opportunity: Option<String>,
    pub category: Option<Category>,
}

impl ClassificationRule {
    pub fn matches(&self, project: &str, client: &str) -> bool {
        self.project.matches(project) && self.client.matches(client)
    }

    /// Validates and compiles one configured rule. `index` is zero-based.
    pub fn compile(index: usize, config: RuleConfig) -> Result<Self, ConfigError> {
        let rule = rule_label(index, config.name.as_deref());

        let project = compile_matcher(&rule, "project", config.project, config.project_regex)?;
        let client = compile_matcher(&rule, "client", config.client, config.client_regex)?;

        let order = non_blank(config.order);
        let opportunity = non_blank(config.opportunity);
        if !config.ignore && order.is_none() && opportunity.is_none() {
            return Err(ConfigError::MissingBillingReference { rule });
        }

        let category = non_blank(config.category)
            .map(|label| label.parse::<Category>())
            .transpose()
            .map_err(|source| ConfigError::UnknownCategory {
                rule: rule.clone(),
                source,
            })?;

        Ok(ClassificationRule {
            name: config.name,
            project,
            client,
            ignore: config.ignore,
            order,
            opportunity,
            category,
        })
    }
}

fn rule_label(index: usize, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("#{} ({name})", index + 1),
        None => format!("#{}", index + 1),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn compile_matcher(
    rule: &str,
    field: &'static str,
    exact: Option<String>,
    pattern: Option<String>,
) -> Result<Matcher, ConfigError> {
    match (exact, pattern) {
        (Some(_), Some(_)) => Err(ConfigError::ConflictingMatcher {
            rule: rule.to_string(),
            field,
        }),
        (Some(exact), None) => Ok(Matcher::Exact(exact)),
        (None, Some(pattern)) => Regex::new(&pattern)
            .map(Matcher::Pattern)
            .map_err(|source| ConfigError::InvalidPattern {
                rule: rule.to_string(),
                field,
                source,
            }),
        (None, None) => Ok(Matcher::Any),
    }
}

/// Ordered rule table. The first matching rule wins.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<ClassificationRule>,
}

impl RuleSet {
    pub fn from_configs(configs: Vec<RuleConfig>) -> Result<Self, ConfigError> {
        let rules = configs
            .into_iter()
            .enumerate()
            .map(|(idx, config)| ClassificationRule::compile(idx, config))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn find_match(&self, project: &str, client: &str) -> Option<&ClassificationRule> {
        self.rules.iter().find(|rule| rule.matches(project, client))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
