//! Configuration and connection validation commands.

use std::path::Path;
use std::sync::Arc;

use super::{load_config, output};
use crate::adapter::outbound::http::ReqwestTransport;
use crate::application::connection::ConnectionManager;
use crate::error::{ConfigError, Error, Result};
use crate::infrastructure::bootstrap::build_notifier_registry;
use crate::infrastructure::config::settings::Config;

/// Validate a configuration file and print a summary.
#[allow(clippy::result_large_err)]
pub fn execute_config(config_path: &Path) -> Result<()> {
    output::note(&format!("Checking configuration: {}", config_path.display()));
    if !config_path.exists() {
        return Err(ConfigError::Other(format!(
            "configuration file not found: {}",
            config_path.display()
        ))
        .into());
    }

    let config = Config::load(config_path)?;
    output::ok("Configuration file is valid");

    output::section("Summary");
    output::key_value("Gateway", config.connection.url());
    output::key_value("Timeout", format!("{} ms", config.connection.timeout_ms));
    output::key_value(
        "Retries",
        format!(
            "{} attempts, {} ms apart",
            config.connection.retry_count, config.connection.retry_delay_ms
        ),
    );
    if config.cache.enabled {
        output::key_value(
            "Cache",
            format!(
                "{} entries, default TTL {} s",
                config.cache.max_size, config.cache.default_ttl_secs
            ),
        );
    } else {
        output::key_value("Cache", "disabled");
    }
    output::key_value("Workers", config.executor.width());
    output::key_value(
        "Discovery",
        format!(
            "{} candidates",
            config.discovery.candidates(Some(&config.connection.host)).len()
        ),
    );
    Ok(())
}

/// Probe the configured gateway and print what it reports.
#[allow(clippy::result_large_err)]
pub async fn execute_connection(config_path: &Path, log_level: Option<&str>) -> Result<()> {
    let config = load_config(config_path, log_level)?;
    let notifier = Arc::new(build_notifier_registry(Vec::new()));
    let connection = ConnectionManager::new(
        config.connection.clone(),
        Arc::new(ReqwestTransport::new()),
        notifier,
    )?;

    output::progress(&format!("Probing {}", connection.url()));
    let probe = connection.test_connection().await;
    output::progress_done(probe.success);

    if !probe.success {
        return Err(Error::Connection(probe.message));
    }
    output::ok(&probe.message);

    if let Some(company) = connection.company_info() {
        output::section("Company");
        output::key_value("Name", &company.name);
        if let Some(guid) = &company.guid {
            output::key_value("GUID", guid);
        }
        if let (Some(from), Some(to)) = (&company.financial_year_from, &company.financial_year_to) {
            output::key_value("Year", format!("{from} to {to}"));
        }
        if let Some(currency) = &company.base_currency {
            output::key_value("Currency", currency);
        }
    }

    let stats = connection.stats();
    output::section("Statistics");
    output::key_value("Requests", stats.total_requests);
    output::key_value("Success", format!("{:.2}%", stats.success_rate));
    output::key_value("Last reply", format!("{} ms", stats.last_response_time_ms));
    Ok(())
}
