//! Background task execution.

pub mod config;
mod context;
pub mod jobs;
mod pool;
mod worker;

pub use config::{default_width, ExecutorConfig};
pub use context::TaskContext;
pub use jobs::{ConnectionTestJob, DataLoadJob, PostVoucherJob};
pub use pool::TaskExecutor;
pub use worker::{from_fn, FnWorker, Worker};
