//! Composition root helpers: build and wire the core components.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::http::ReqwestTransport;
use crate::application::connection::ConnectionManager;
use crate::application::executor::TaskExecutor;
use crate::application::reader::ResponseReader;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::{LogNotifier, Notifier, NotifierRegistry, Transport};

/// Build the notifier registry: structured logging plus any extra sinks.
pub fn build_notifier_registry(extra: Vec<Box<dyn Notifier>>) -> NotifierRegistry {
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(LogNotifier));
    for notifier in extra {
        registry.register(notifier);
    }
    registry
}

/// The wired core: one connection, one reader on top of it, one task pool.
pub struct Gateway {
    pub connection: Arc<ConnectionManager>,
    pub reader: Arc<ResponseReader>,
    pub executor: TaskExecutor,
}

impl Gateway {
    /// Wire the components from configuration with explicit adapters.
    ///
    /// Must be called inside a tokio runtime.
    #[allow(clippy::result_large_err)]
    pub fn build(
        config: &Config,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        config.validate()?;
        let connection = Arc::new(ConnectionManager::new(
            config.connection.clone(),
            transport,
            Arc::clone(&notifier),
        )?);
        let reader = Arc::new(ResponseReader::new(
            Arc::clone(&connection),
            &config.cache,
            &config.reader,
            Arc::clone(&notifier),
        ));
        let executor = TaskExecutor::new(&config.executor, notifier)?;

        info!(
            url = %connection.url(),
            cache = config.cache.enabled,
            max_threads = executor.max_threads(),
            "Gateway core ready"
        );
        Ok(Self {
            connection,
            reader,
            executor,
        })
    }

    /// Wire the components over HTTP with the logging notifier.
    #[allow(clippy::result_large_err)]
    pub fn from_config(config: &Config) -> Result<Self> {
        let notifier: Arc<dyn Notifier> = Arc::new(build_notifier_registry(Vec::new()));
        Self::build(config, Arc::new(ReqwestTransport::new()), notifier)
    }
}
