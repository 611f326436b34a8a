//! Gateway instance discovery command.

use std::path::Path;
use std::sync::Arc;

use super::{load_config, output};
use crate::adapter::outbound::http::ReqwestTransport;
use crate::application::connection::discover;
use crate::error::Result;

/// Probe the discovery candidates and list the gateways that answered.
#[allow(clippy::result_large_err)]
pub async fn execute(config_path: &Path, log_level: Option<&str>) -> Result<()> {
    let config = load_config(config_path, log_level)?;
    let candidates = config
        .discovery
        .candidates(Some(&config.connection.host));
    let transport = Arc::new(ReqwestTransport::new());

    output::progress(&format!("Probing {} candidates", candidates.len()));
    let found = discover(transport.as_ref(), &candidates, config.discovery.probe_timeout()).await;
    output::progress_done(true);

    if found.is_empty() {
        output::warn("No gateway found");
        output::note("  Enable the HTTP-XML gateway in TallyPrime (F1 > Settings > Connectivity)");
        return Ok(());
    }

    output::section("Gateways");
    for instance in &found {
        output::ok(&instance.url());
    }
    Ok(())
}
