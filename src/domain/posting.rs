//! Outcome types for importing vouchers through the gateway.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Why a voucher import failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingErrorKind {
    NetworkError,
    MissingLedger,
    InvalidVoucherType,
    UnbalancedEntry,
    MalformedXml,
    DuplicateVoucher,
    AccessDenied,
    CompanyError,
    ValidationError,
    BusinessRuleViolation,
    XmlParseError,
    UnknownError,
}

impl PostingErrorKind {
    /// Classify the gateway's `LINEERROR` messages.
    ///
    /// Patterns are matched in priority order against the lowercased,
    /// space-joined messages; the first match wins.
    #[must_use]
    pub fn classify<S: AsRef<str>>(messages: &[S]) -> Self {
        if messages.is_empty() {
            return Self::UnknownError;
        }
        let combined = messages
            .iter()
            .map(|m| m.as_ref().to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        let has = |needle: &str| combined.contains(needle);

        if has("could not find ledger") {
            Self::MissingLedger
        } else if has("voucher type does not exist") {
            Self::InvalidVoucherType
        } else if has("voucher totals do not match") || has("balance") {
            Self::UnbalancedEntry
        } else if has("unknown request") || has("xml") {
            Self::MalformedXml
        } else if has("duplicate") || has("already exists") {
            Self::DuplicateVoucher
        } else if has("permission") || has("access") {
            Self::AccessDenied
        } else if has("company") {
            Self::CompanyError
        } else {
            Self::BusinessRuleViolation
        }
    }

    /// Remedy to show next to the error.
    #[must_use]
    pub fn suggestion(self) -> &'static str {
        match self {
            Self::MissingLedger => {
                "Create the missing ledger in the gateway or check the spelling and case of ledger names."
            }
            Self::InvalidVoucherType => {
                "Use a voucher type that exists in the company configuration."
            }
            Self::UnbalancedEntry => "Ensure that total debit amounts equal total credit amounts.",
            Self::MalformedXml => {
                "Check the XML structure and ensure it matches the expected import format."
            }
            Self::DuplicateVoucher => {
                "Use a unique voucher number or check if this voucher already exists."
            }
            Self::AccessDenied => "Check permissions and ensure the company is not locked.",
            Self::CompanyError => "Verify the company is open and accessible.",
            Self::NetworkError => "Check the connection and ensure the HTTP-XML gateway is enabled.",
            Self::ValidationError => "Review voucher details and fix validation issues before posting.",
            Self::BusinessRuleViolation => "Check business rules and configuration settings.",
            Self::XmlParseError | Self::UnknownError => {
                "Review the error message and check the gateway configuration."
            }
        }
    }
}

impl fmt::Display for PostingErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NetworkError => "network_error",
            Self::MissingLedger => "missing_ledger",
            Self::InvalidVoucherType => "invalid_voucher_type",
            Self::UnbalancedEntry => "unbalanced_entry",
            Self::MalformedXml => "malformed_xml",
            Self::DuplicateVoucher => "duplicate_voucher",
            Self::AccessDenied => "access_denied",
            Self::CompanyError => "company_error",
            Self::ValidationError => "validation_error",
            Self::BusinessRuleViolation => "business_rule_violation",
            Self::XmlParseError => "xml_parse_error",
            Self::UnknownError => "unknown_error",
        };
        f.write_str(name)
    }
}

/// Result of one voucher import.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostingResult {
    pub success: bool,
    /// `LASTVCHID` reported by the gateway.
    pub voucher_id: Option<String>,
    pub created: u32,
    pub altered: u32,
    pub deleted: u32,
    pub ignored: u32,
    pub cancelled: u32,
    pub errors: u32,
    pub error_kind: Option<PostingErrorKind>,
    pub error_message: Option<String>,
    pub error_details: Vec<String>,
    #[serde(with = "duration_ms")]
    pub response_time: Duration,
}

impl PostingResult {
    pub fn failure(kind: PostingErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_kind: Some(kind),
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Short human-readable outcome.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.success {
            match &self.voucher_id {
                Some(id) => format!("Voucher posted successfully (id {id})"),
                None => "Voucher posted successfully".to_string(),
            }
        } else {
            let message = self.error_message.as_deref().unwrap_or("unknown error");
            match self.error_kind {
                Some(kind) => format!("Posting failed: {message}. {}", kind.suggestion()),
                None => format!("Posting failed: {message}"),
            }
        }
    }
}

/// Findings of the local pre-posting check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VoucherValidation {
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}

impl VoucherValidation {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_line_errors_in_priority_order() {
        assert_eq!(
            PostingErrorKind::classify(&["Could not find Ledger 'Sales A/c'"]),
            PostingErrorKind::MissingLedger
        );
        assert_eq!(
            PostingErrorKind::classify(&["Voucher totals do not match!"]),
            PostingErrorKind::UnbalancedEntry
        );
        assert_eq!(
            PostingErrorKind::classify(&["Voucher Number 'S-1' already exists"]),
            PostingErrorKind::DuplicateVoucher
        );
        assert_eq!(
            PostingErrorKind::classify(&["Something odd"]),
            PostingErrorKind::BusinessRuleViolation
        );
        assert_eq!(
            PostingErrorKind::classify::<&str>(&[]),
            PostingErrorKind::UnknownError
        );
    }

    #[test]
    fn failure_summary_includes_suggestion() {
        let result = PostingResult::failure(PostingErrorKind::MissingLedger, "no ledger");
        let summary = result.summary();
        assert!(summary.contains("no ledger"));
        assert!(summary.contains("Create the missing ledger"));
    }
}
