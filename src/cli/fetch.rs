//! Fetch command: load one data type through the task executor.

use std::path::Path;

use super::{load_config, output, FetchArgs};
use crate::application::executor::DataLoadJob;
use crate::error::{Error, Result};
use crate::infrastructure::bootstrap::Gateway;

/// Run a [`DataLoadJob`] and print its result as JSON.
#[allow(clippy::result_large_err)]
pub async fn execute(args: &FetchArgs, log_level: Option<&str>) -> Result<()> {
    let config = load_config(Path::new(&args.config), log_level)?;
    let gateway = Gateway::from_config(&config)?;

    let job = DataLoadJob::new(
        gateway.reader.clone(),
        args.data_type,
        args.request_params(),
    )
    .force_refresh(args.refresh);
    let task_id = gateway.executor.submit(job);

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
