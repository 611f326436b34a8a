//! Structural and per-data-type validation of parsed replies.

use tracing::{info, warn};

use crate::domain::{DataType, XmlElement};
use crate::error::{ErrorKind, GatewayError};

/// Reject empty trees and trees carrying the gateway's own error markers.
pub fn validate_structure(root: &XmlElement) -> Result<(), GatewayError> {
    if root.is_empty() {
        return Err(GatewayError::new(
            ErrorKind::EmptyStructure,
            format!(
                "XML structure is empty, root element '{}' has no content",
                root.name
            ),
        ));
    }

    let messages: Vec<String> = root
        .descendants()
        .filter(|el| is_error_marker(el))
        .map(describe)
        .collect();
    if !messages.is_empty() {
        return Err(GatewayError::new(
            ErrorKind::TallyErrorResponse,
            format!("Gateway returned errors: {}", messages.join("; ")),
        ));
    }

    if let Some(auth) = root.find_all("AUTHENTICATION").find(|el| {
        el.text
            .as_deref()
            .is_some_and(|text| text.to_lowercase().contains("failed"))
    }) {
        return Err(GatewayError::new(
            ErrorKind::AuthError,
            format!(
                "Gateway authentication failed: {}",
                auth.text.as_deref().unwrap_or_default()
            ),
        ));
    }

    Ok(())
}

/// Per-data-type content checks.
///
/// Company info must name a company. List reports may legitimately be empty
/// (a new company, a date range without vouchers) and are only logged.
pub fn validate_data_type(root: &XmlElement, data_type: DataType) -> Result<(), GatewayError> {
    match data_type {
        DataType::CompanyInfo => {
            let has_company = root.descendants().any(|el| {
                el.name == "COMPANY"
                    || el.name == "NAME"
                    || (el.name == "TALLYMESSAGE" && has_vchtype(el, Some("Company")))
            });
            if !has_company {
                return Err(GatewayError::new(
                    ErrorKind::MissingData(data_type),
                    "Company information request returned no company data elements",
                ));
            }
        }
        DataType::LedgerList => {
            let has_ledgers = root.descendants().any(|el| {
                el.name == "LEDGER"
                    || el.name == "DSP_NAME"
                    || (el.name == "TALLYMESSAGE" && has_vchtype(el, Some("Ledger")))
            });
            if !has_ledgers {
                warn!("Ledger list returned no ledger elements, company may be empty");
            }
        }
        DataType::VoucherList | DataType::DayBook => {
            let has_vouchers = root.descendants().any(|el| {
                el.name == "VOUCHER" || (el.name == "TALLYMESSAGE" && has_vchtype(el, None))
            });
            if !has_vouchers {
                info!(data_type = %data_type, "No voucher elements, date range may be empty");
            }
        }
        _ => {}
    }
    Ok(())
}

fn is_error_marker(el: &XmlElement) -> bool {
    match el.name.as_str() {
        "ERROR" | "LINEERROR" | "ERRORMESSAGE" => true,
        "TALLYMESSAGE" => has_vchtype(el, Some("Error")),
        "REQUESTSTATUS" => el.attribute("STATUS") == Some("FAILED"),
        _ => false,
    }
}

/// `VCHTYPE` attribute present and, when `expected` is given, equal to it.
fn has_vchtype(el: &XmlElement, expected: Option<&str>) -> bool {
    match (el.attribute("VCHTYPE"), expected) {
        (Some(value), Some(expected)) => value == expected,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

fn describe(el: &XmlElement) -> String {
    if let Some(text) = &el.text {
        return text.clone();
    }
    if !el.attributes.is_empty() {
        return el
            .attributes
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ");
    }
    format!("Error in {} element", el.name)
}
