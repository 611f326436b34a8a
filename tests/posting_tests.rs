mod support;

use std::collections::HashSet;

use rust_decimal_macros::dec;
use support::harness;
use tallybridge::application::reader::posting::{validate_voucher, validate_voucher_against};
use tallybridge::domain::{FailureKind, PostingErrorKind};
use tallybridge::port::Event;
use tallybridge::testkit::fixtures;
use tallybridge::testkit::transport::ScriptedTransport;

fn posted(events: &[Event]) -> Vec<bool> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::VoucherPosted(result) => Some(result.success),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn created_voucher_reports_its_id() {
    let h = harness(ScriptedTransport::new().ok(fixtures::IMPORT_CREATED));

    let result = h
        .reader
        .post_voucher(fixtures::VOUCHER_BALANCED, "Rent payment")
        .await;

    assert!(result.success, "{:?}", result.error_message);
    assert_eq!(result.voucher_id.as_deref(), Some("4521"));
    assert_eq!(result.created, 1);
    assert_eq!(result.errors, 0);
    assert_eq!(result.summary(), "Voucher posted successfully (id 4521)");
    assert_eq!(posted(&h.events.events()), [true]);

    let body = h.transport.requests()[0].body.clone().unwrap_or_default();
    assert!(body.contains("<TALLYREQUEST>Import Data</TALLYREQUEST>"));
    assert!(body.contains("<VOUCHERNUMBER>17</VOUCHERNUMBER>"));
}

#[tokio::test]
async fn missing_ledger_is_classified() {
    let h = harness(ScriptedTransport::new().ok(fixtures::IMPORT_MISSING_LEDGER));

    let result = h
        .reader
        .post_voucher(fixtures::VOUCHER_BALANCED, "Rent payment")
        .await;

    assert!(!result.success);
    assert_eq!(result.errors, 1);
    assert!(result.voucher_id.is_none());
    assert_eq!(result.error_kind, Some(PostingErrorKind::MissingLedger));
    let message = result.error_message.clone().unwrap_or_default();
    assert!(message.contains('1'), "{message}");
    assert!(message.contains("Could not find Ledger 'Shop Rent'"));
    assert_eq!(result.error_details, ["Could not find Ledger 'Shop Rent'"]);
    assert!(result.summary().contains("Create the missing ledger"));
    assert_eq!(posted(&h.events.events()), [false]);
    assert_eq!(h.reader.statistics().failed_requests, 1);
}

#[tokio::test]
async fn network_failure_is_a_network_error() {
    let h = harness(ScriptedTransport::new().fail(FailureKind::ConnectionRefused, "refused"));

    let result = h
        .reader
        .post_voucher(fixtures::VOUCHER_BALANCED, "Rent payment")
        .await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(PostingErrorKind::NetworkError));
    assert_eq!(h.events.error_kinds(), ["CONNECTION_REFUSED"]);
}

#[tokio::test]
async fn validated_posting_never_sends_an_invalid_voucher() {
    let h = harness(ScriptedTransport::new().ok(fixtures::IMPORT_CREATED));

    let result = h
        .reader
        .post_voucher_validated(fixtures::VOUCHER_UNBALANCED, "Rent payment")
        .await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(PostingErrorKind::ValidationError));
    assert!(result.error_details[0].contains("not balanced"));
    assert_eq!(h.transport.call_count(), 0);
    assert_eq!(posted(&h.events.events()), [false]);
}

#[tokio::test]
async fn validated_posting_sends_a_valid_voucher() {
    let h = harness(ScriptedTransport::new().ok(fixtures::IMPORT_CREATED));

    let result = h
        .reader
        .post_voucher_validated(fixtures::VOUCHER_BALANCED, "Rent payment")
        .await;

    assert!(result.success);
    assert_eq!(h.transport.call_count(), 1);
}

#[test]
fn balanced_voucher_passes() {
    let validation = validate_voucher(fixtures::VOUCHER_BALANCED);
    assert!(validation.is_valid(), "{:?}", validation.issues);
    assert!(validation.warnings.is_empty());
}

#[test]
fn unbalanced_voucher_names_both_totals() {
    let validation = validate_voucher(fixtures::VOUCHER_UNBALANCED);

    assert_eq!(
        validation.issues,
        [format!(
            "Voucher is not balanced - Debit: {}, Credit: {}",
            dec!(1500.50),
            dec!(1500.00)
        )]
    );
}

#[test]
fn differences_under_a_paisa_are_tolerated() {
    let xml = fixtures::VOUCHER_BALANCED.replace("-1500.00", "-1500.004");
    assert!(validate_voucher(&xml).is_valid());
}

#[test]
fn structural_problems_are_all_reported() {
    let xml = r#"<VOUCHER>
 <ALLLEDGERENTRIES.LIST>
  <LEDGERNAME>Cash</LEDGERNAME>
  <AMOUNT>abc</AMOUNT>
 </ALLLEDGERENTRIES.LIST>
</VOUCHER>"#;

    let issues = validate_voucher(xml).issues;

    assert!(issues.contains(&"VCHTYPE attribute is missing".to_string()));
    assert!(issues.contains(&"VOUCHERNUMBER is missing".to_string()));
    assert!(issues.contains(&"DATE is missing".to_string()));
    assert!(issues.contains(&"At least two ledger entries are required".to_string()));
    assert!(issues.contains(&"Invalid amount for ledger 'Cash': abc".to_string()));
}

#[test]
fn non_voucher_documents_are_rejected() {
    assert_eq!(
        validate_voucher("<LEDGER NAME=\"Cash\"/>").issues,
        ["No VOUCHER element found in XML"]
    );
    let broken = validate_voucher("<VOUCHER><DATE>");
    assert!(broken.issues[0].starts_with("XML parsing error"));
}

#[test]
fn unknown_ledgers_only_warn() {
    let known: HashSet<String> = ["Cash".to_string()].into_iter().collect();

    let validation = validate_voucher_against(fixtures::VOUCHER_BALANCED, Some(&known));

    assert!(validation.is_valid());
    assert_eq!(
        validation.warnings,
        ["Ledger 'Shop Rent' may not exist in the company"]
    );
}
