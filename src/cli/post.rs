//! Voucher import command.

use std::path::Path;

use super::{load_config, output, PostArgs};
use crate::application::executor::PostVoucherJob;
use crate::application::reader::posting::validate_voucher;
use crate::error::{Error, Result};
use crate::infrastructure::bootstrap::Gateway;

/// Validate a voucher file and, unless `--validate-only`, import it.
#[allow(clippy::result_large_err)]
pub async fn execute(args: &PostArgs, log_level: Option<&str>) -> Result<()> {
    let voucher_xml = std::fs::read_to_string(&args.file)?;

    let validation = validate_voucher(&voucher_xml);
    for warning in &validation.warnings {
        output::warn(warning);
    }
    if !validation.is_valid() {
        for issue in &validation.issues {
            output::error(issue);
        }
        return Err(Error::Runtime(format!(
            "voucher has {} validation issue(s)",
            validation.issues.len()
        )));
    }
    output::ok("Voucher is valid");
    if args.validate_only {
        return Ok(());
    }

    let config = load_config(Path::new(&args.config), log_level)?;
    let gateway = Gateway::from_config(&config)?;

    let description = args
        .file
        .file_name()
        .map_or_else(|| "voucher".to_string(), |name| name.to_string_lossy().into_owned());
    let task_id = gateway
        .executor
        .submit(PostVoucherJob::new(gateway.reader.clone(), voucher_xml, description));

    let result = gateway
        .executor
        .wait(task_id)
        .await
        .ok_or_else(|| Error::Runtime(format!("task {task_id} vanished")))?;

    if !result.is_success() {
        return Err(Error::Runtime(
            result
                .error
                .unwrap_or_else(|| format!("task ended as {}", result.status)),
        ));
    }
    output::json(&result.data)?;
    Ok(())
}
