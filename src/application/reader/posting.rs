//! Voucher import: reply interpretation and local pre-validation.

use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use super::clean::clean;
use super::parse::parse_xml;
use crate::domain::{PostingErrorKind, PostingResult, VoucherValidation, XmlElement};

const SUCCESS_ERRORS: &str = "<ERRORS>0</ERRORS>";
const SUCCESS_CREATED: &str = "<CREATED>1</CREATED>";

/// Largest debit/credit difference still considered balanced.
fn balance_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

/// Text between `<TAG>` and `</TAG>`, first occurrence.
fn tag_value<'a>(body: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    Some(body[start..end].trim())
}

fn count(body: &str, tag: &str) -> u32 {
    tag_value(body, tag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// Interpret the gateway's reply to an Import Data request.
///
/// The import succeeded iff the body reports zero errors and exactly one
/// created voucher.
#[must_use]
pub fn interpret_import_reply(body: &str, response_time: Duration) -> PostingResult {
    let mut result = PostingResult {
        created: count(body, "CREATED"),
        altered: count(body, "ALTERED"),
        deleted: count(body, "DELETED"),
        ignored: count(body, "IGNORED"),
        cancelled: count(body, "CANCELLED"),
        errors: count(body, "ERRORS"),
        voucher_id: tag_value(body, "LASTVCHID")
            .filter(|id| !id.is_empty() && *id != "0")
            .map(str::to_string),
        response_time,
        ..PostingResult::default()
    };

    if body.contains(SUCCESS_ERRORS) && body.contains(SUCCESS_CREATED) {
        result.success = true;
        return result;
    }

    let tree = clean(body).and_then(|cleaned| parse_xml(&cleaned));
    let line_errors: Vec<String> = match &tree {
        Ok(root) => root
            .find_all("LINEERROR")
            .filter_map(|el| el.text.clone())
            .collect(),
        Err(_) => Vec::new(),
    };

    let kind = match &tree {
        Err(_) if tag_value(body, "ERRORS").is_none() => PostingErrorKind::XmlParseError,
        _ => PostingErrorKind::classify(&line_errors),
    };

    let mut message = match tag_value(body, "ERRORS") {
        Some(n) if result.errors > 0 => format!("Gateway reported {n} errors"),
        Some(_) => format!(
            "Voucher was not created (created {}, altered {})",
            result.created, result.altered
        ),
        None => match &tree {
            Err(err) => format!("Could not parse import response: {}", err.message),
            Ok(_) => "Import response carried no result counters".to_string(),
        },
    };
    if let Some(first) = line_errors.first() {
        message.push_str(": ");
        message.push_str(first);
    }

    result.error_kind = Some(kind);
    result.error_message = Some(message);
    result.error_details = line_errors;
    result
}

/// Check a voucher locally before sending it.
#[must_use]
pub fn validate_voucher(voucher_xml: &str) -> VoucherValidation {
    validate_voucher_against(voucher_xml, None)
}

/// [`validate_voucher`], additionally warning about ledgers missing from
/// `known_ledgers`.
#[must_use]
pub fn validate_voucher_against(
    voucher_xml: &str,
    known_ledgers: Option<&HashSet<String>>,
) -> VoucherValidation {
    let mut validation = VoucherValidation::default();

    let root = match clean(voucher_xml).and_then(|cleaned| parse_xml(&cleaned)) {
        Ok(root) => root,
        Err(err) => {
            validation
                .issues
                .push(format!("XML parsing error: {}", err.message));
            return validation;
        }
    };

    let Some(voucher) = root.find("VOUCHER") else {
        validation
            .issues
            .push("No VOUCHER element found in XML".to_string());
        return validation;
    };

    if voucher.attribute("VCHTYPE").map_or(true, str::is_empty) {
        validation
            .issues
            .push("VCHTYPE attribute is missing".to_string());
    }
    if text(voucher, "VOUCHERNUMBER").is_none() {
        validation.issues.push("VOUCHERNUMBER is missing".to_string());
    }
    if text(voucher, "DATE").is_none() {
        validation.issues.push("DATE is missing".to_string());
    }

    let entries: Vec<&XmlElement> = voucher.find_all("ALLLEDGERENTRIES.LIST").collect();
    if entries.len() < 2 {
        validation
            .issues
            .push("At least two ledger entries are required".to_string());
    }

    let mut debit = Decimal::ZERO;
    let mut credit = Decimal::ZERO;
    for entry in &entries {
        let Some(ledger) = text(entry, "LEDGERNAME") else {
            validation
                .issues
                .push("Ledger name is missing in an entry".to_string());
            continue;
        };

        let amount_text = text(entry, "AMOUNT").unwrap_or_default();
        match Decimal::from_str(amount_text) {
            Ok(amount) => {
                let deemed_positive = text(entry, "ISDEEMEDPOSITIVE")
                    .is_some_and(|flag| flag.eq_ignore_ascii_case("yes"));
                if deemed_positive {
                    debit += amount.abs();
                } else {
                    credit += amount.abs();
                }
            }
            Err(_) => validation.issues.push(format!(
                "Invalid amount for ledger '{ledger}': {amount_text}"
            )),
        }

        if let Some(known) = known_ledgers {
            if !known.contains(ledger) {
                validation
                    .warnings
                    .push(format!("Ledger '{ledger}' may not exist in the company"));
            }
        }
    }

    if (debit - credit).abs() >= balance_tolerance() {
        validation.issues.push(format!(
            "Voucher is not balanced - Debit: {debit}, Credit: {credit}"
        ));
    }

    validation
}

fn text<'a>(el: &'a XmlElement, tag: &str) -> Option<&'a str> {
    el.text_of(tag).map(str::trim).filter(|t| !t.is_empty())
}
