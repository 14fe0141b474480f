//! Extraction of the `[Category]` and `CAS-` markers that may lead a
//! time-entry description.
//!
//! Both markers are optional, may appear in either order, and must sit at the
//! start of the text separated only by whitespace. Each is taken at most once;
//! anything after the markers is the description proper.

use thiserror::Error;
use timesheet_core::Category;

/// Literal prefix of a support-case reference.
pub const CASE_PREFIX: &str = "CAS-";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedDescription {
    pub case_reference: String,
    pub category: Option<Category>,
    pub remaining_text: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptionError {
    #[error("Missing ']' from {text:?}")]
    MalformedCategoryMarker { text: String },
    #[error("Unrecognized category {label:?}")]
    UnknownCategory { label: String },
}

pub fn parse(text: &str) -> Result<ParsedDescription, DescriptionError> {
    let mut rest = text;
    let mut case_reference: Option<&str> = None;
    let mut category: Option<Category> = None;

    loop {
        rest = rest.trim_start();

        if category.is_none() {
            if let Some(inner) = rest.strip_prefix('[') {
                let close = inner
                    .find(']')
                    .ok_or_else(|| DescriptionError::MalformedCategoryMarker {
                        text: rest.to_string(),
                    })?;
                let label = &inner[..close];
                category = Some(Category::from_label(label).ok_or_else(|| {
                    DescriptionError::UnknownCategory {
                        label: label.to_string(),
                    }
                })?);
                rest = &inner[close + 1..];
                continue;
            }
        }

        if case_reference.is_none() && rest.starts_with(CASE_PREFIX) {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            case_reference = Some(&rest[..end]);
            rest = &rest[end..];
            continue;
        }

        break;
    }

    Ok(ParsedDescription {
        case_reference: case_reference.unwrap_or_default().to_string(),
        category,
        remaining_text: rest.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_trimmed_and_untouched() {
        let parsed = parse("  fixed the login page \t").unwrap();
        assert_eq!(parsed.remaining_text, "fixed the login page");
        assert_eq!(parsed.case_reference, "");
        assert_eq!(parsed.category, None);
    }

    #[test]
    fn empty_and_blank_text() {
        assert_eq!(parse("").unwrap(), ParsedDescription::default());
        assert_eq!(parse("   ").unwrap(), ParsedDescription::default());
    }

    #[test]
    fn category_then_case() {
        let parsed = parse("[Testing] CAS-123 fix bug").unwrap();
        assert_eq!(parsed.category, Some(Category::Testing));
        assert_eq!(parsed.case_reference, "CAS-123");
        assert_eq!(parsed.remaining_text, "fix bug");
    }

    #[test]
    fn marker_order_is_irrelevant() {
        assert_eq!(
            parse("CAS-123 [Testing] fix bug").unwrap(),
            parse("[Testing] CAS-123 fix bug").unwrap()
        );
    }

    #[test]
    fn category_label_is_case_insensitive() {
        let parsed = parse("[project management] weekly sync").unwrap();
        assert_eq!(parsed.category, Some(Category::ProjectManagement));
        assert_eq!(parsed.remaining_text, "weekly sync");
    }

    #[test]
    fn category_marker_needs_no_trailing_space() {
        let parsed = parse("[Travel]train to site").unwrap();
        assert_eq!(parsed.category, Some(Category::Travel));
        assert_eq!(parsed.remaining_text, "train to site");
    }

    #[test]
    fn unknown_category_fails() {
        assert_eq!(
            parse("[Unknown] text"),
            Err(DescriptionError::UnknownCategory {
                label: "Unknown".to_string()
            })
        );
    }

    #[test]
    fn unterminated_bracket_fails() {
        assert!(matches!(
            parse("[Testing text"),
            Err(DescriptionError::MalformedCategoryMarker { .. })
        ));
    }

    #[test]
    fn case_reference_runs_to_end_of_text() {
        let parsed = parse("CAS-98765").unwrap();
        assert_eq!(parsed.case_reference, "CAS-98765");
        assert_eq!(parsed.remaining_text, "");
    }

    #[test]
    fn case_reference_stops_at_any_whitespace() {
        let parsed = parse("CAS-1\tdeploy").unwrap();
        assert_eq!(parsed.case_reference, "CAS-1");
        assert_eq!(parsed.remaining_text, "deploy");
    }

    #[test]
    fn second_marker_of_same_kind_is_left_as_text() {
        let parsed = parse("CAS-1 CAS-2 merged tickets").unwrap();
        assert_eq!(parsed.case_reference, "CAS-1");
        assert_eq!(parsed.remaining_text, "CAS-2 merged tickets");

        let parsed = parse("[Testing] CAS-1 [Training] notes").unwrap();
        assert_eq!(parsed.category, Some(Category::Testing));
        assert_eq!(parsed.remaining_text, "[Training] notes");
    }

    #[test]
    fn markers_later_in_text_are_not_extracted() {
        let parsed = parse("review CAS-5 with [Testing]").unwrap();
        assert_eq!(parsed.case_reference, "");
        assert_eq!(parsed.category, None);
        assert_eq!(parsed.remaining_text, "review CAS-5 with [Testing]");
    }

    #[test]
    fn lowercase_case_prefix_is_plain_text() {
        let parsed = parse("cas-12 call").unwrap();
        assert_eq!(parsed.case_reference, "");
        assert_eq!(parsed.remaining_text, "cas-12 call");
    }
}
