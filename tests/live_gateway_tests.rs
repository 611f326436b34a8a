//! Tests against a running TallyPrime gateway.
//!
//! Run with `--features integration-tests`; `TALLY_HOST` and `TALLY_PORT`
//! select the gateway (default `localhost:9000`).

#![cfg(feature = "integration-tests")]

use tallybridge::domain::{ConnectionStatus, DataType, RequestParams};
use tallybridge::infrastructure::bootstrap::Gateway;
use tallybridge::infrastructure::config::Config;

fn live_config() -> Config {
    let mut config = Config::default();
    config
        .apply_env_overrides(|name| std::env::var(name).ok())
        .expect("valid TALLY_* overrides");
    config
}

#[tokio::test]
async fn live_gateway_answers_the_probe() {
    let gateway = Gateway::from_config(&live_config()).expect("gateway");

    let probe = gateway.connection.test_connection().await;

    assert!(probe.success, "{}", probe.message);
    assert_eq!(gateway.connection.status(), ConnectionStatus::Connected);
}

#[tokio::test]
async fn live_gateway_lists_ledgers() {
    let gateway = Gateway::from_config(&live_config()).expect("gateway");

    let payload = gateway
        .reader
        .fetch(DataType::LedgerList, &RequestParams::new())
        .await
        .expect("ledger list");

    assert!(payload.as_document().is_some());
    let names = gateway.reader.ledger_names().await.expect("ledger names");
    assert!(!names.is_empty());
}
