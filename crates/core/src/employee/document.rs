//! Passport and visa documents.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::employee::error::EmployeeError;

/// Kind of identity document kept on file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// Passport.
    Passport,
    /// Work visa.
    Visa,
}

impl DocumentType {
    /// Returns the string stored in `employee_documents.document_type`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passport => "passport",
            Self::Visa => "visa",
        }
    }

    /// Parses a stored document type.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "passport" => Some(Self::Passport),
            "visa" => Some(Self::Visa),
            _ => None,
        }
    }
}

/// Document fields that cross-field rules apply to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDates<'a> {
    /// Document kind.
    pub document_type: DocumentType,
    /// Visa category, visas only.
    pub visa_type: Option<&'a str>,
    /// Issue date.
    pub issued_on: NaiveDate,
    /// Expiry date.
    pub expires_on: NaiveDate,
}

/// Validates a document's dates and visa type.
///
/// # Errors
///
/// `DocumentExpiryBeforeIssue` when `expires_on <= issued_on`;
/// `VisaTypeRequired` for a visa without a (non-blank) visa type.
pub fn validate_document(doc: &DocumentDates<'_>) -> Result<(), EmployeeError> {
    if doc.expires_on <= doc.issued_on {
        return Err(EmployeeError::DocumentExpiryBeforeIssue);
    }
    if doc.document_type == DocumentType::Visa
        && doc.visa_type.is_none_or(|visa| visa.trim().is_empty())
    {
        return Err(EmployeeError::VisaTypeRequired);
    }
    Ok(())
}

/// Whether a document has expired as of `today`.
#[must_use]
pub fn is_expired(expires_on: NaiveDate, today: NaiveDate) -> bool {
    expires_on < today
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(DocumentType::Passport, None, date(2020, 1, 1), date(2030, 1, 1), Ok(()))]
    #[case(DocumentType::Passport, None, date(2020, 1, 1), date(2020, 1, 1), Err(EmployeeError::DocumentExpiryBeforeIssue))]
    #[case(DocumentType::Visa, Some("H-1B"), date(2023, 10, 1), date(2026, 9, 30), Ok(()))]
    #[case(DocumentType::Visa, None, date(2023, 10, 1), date(2026, 9, 30), Err(EmployeeError::VisaTypeRequired))]
    #[case(DocumentType::Visa, Some("  "), date(2023, 10, 1), date(2026, 9, 30), Err(EmployeeError::VisaTypeRequired))]
    fn test_validate_document(
        #[case] document_type: DocumentType,
        #[case] visa_type: Option<&str>,
        #[case] issued_on: NaiveDate,
        #[case] expires_on: NaiveDate,
        #[case] expected: Result<(), EmployeeError>,
    ) {
        let doc = DocumentDates {
            document_type,
            visa_type,
            issued_on,
            expires_on,
        };
        assert_eq!(validate_document(&doc), expected);
    }

    #[test]
    fn test_expiry_is_exclusive_of_today() {
        let today = date(2025, 3, 1);
        assert!(!is_expired(today, today));
        assert!(is_expired(date(2025, 2, 28), today));
    }

    #[test]
    fn test_parse_document_type() {
        assert_eq!(DocumentType::parse("visa"), Some(DocumentType::Visa));
        assert_eq!(DocumentType::parse("license"), None);
    }
}
