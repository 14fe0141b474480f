use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Billing category accepted by the CRM timesheet import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Deployment,
    Infrastructure,
    UserSupport,
    Development,
    BusinessAnalysis,
    KnowledgeTransfer,
    ProjectManagement,
    SalesMarketing,
    Planning,
    Strategic,
    Testing,
    Training,
    Travel,
    Strategy,
    Support,
}

pub const ALL_CATEGORIES: &[Category] = &[
    Category::Deployment,
    Category::Infrastructure,
    Category::UserSupport,
    Category::Development,
    Category::BusinessAnalysis,
    Category::KnowledgeTransfer,
    Category::ProjectManagement,
    Category::SalesMarketing,
    Category::Planning,
    Category::Strategic,
    Category::Testing,
    Category::Training,
    Category::Travel,
    Category::Strategy,
    Category::Support,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognized category: {0}")]
pub struct UnknownCategory(pub String);

impl Category {
    /// The label exactly as the CRM expects it.
    pub fn label(self) -> &'static str {
        match self {
            Category::Deployment => "Deployment",
            Category::Infrastructure => "Infrastructure",
            Category::UserSupport => "User Support / Configuration",
            Category::Development => "Development / Sprint",
            Category::BusinessAnalysis => "Information Architecture / Business Analysis",
            Category::KnowledgeTransfer => "Knowledge Transfer",
            Category::ProjectManagement => "Project Management",
            Category::SalesMarketing => "Sales & Marketing",
            Category::Planning => "Specification / Planning / Researching",
            Category::Strategic => "Strategic",
            Category::Testing => "Testing",
            Category::Training => "Training",
            Category::Travel => "Travel",
            Category::Strategy => "Strategy",
            Category::Support => "Support",
        }
    }

    /// Case-insensitive lookup against the canonical labels.
    pub fn from_label(label: &str) -> Option<Self> {
        let wanted = label.to_lowercase();
        ALL_CATEGORIES
            .iter()
            .copied()
            .find(|c| c.label().to_lowercase() == wanted)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::from_label(s).ok_or_else(|| UnknownCategory(s.to_string()))
    }
}
