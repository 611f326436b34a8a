use std::sync::Arc;

use tallybridge::application::cache::CacheConfig;
use tallybridge::application::connection::{ConnectionConfig, ConnectionManager};
use tallybridge::application::reader::ResponseReader;
use tallybridge::port::Notifier;
use tallybridge::testkit::config;
use tallybridge::testkit::notifier::RecordingNotifier;
use tallybridge::testkit::transport::ScriptedTransport;

/// Connection manager and reader wired to a scripted transport.
pub struct Harness {
    pub transport: ScriptedTransport,
    pub events: RecordingNotifier,
    pub connection: Arc<ConnectionManager>,
    pub reader: Arc<ResponseReader>,
}

pub fn harness(transport: ScriptedTransport) -> Harness {
    harness_with(transport, config::connection(9000), CacheConfig::default())
}

pub fn harness_with(
    transport: ScriptedTransport,
    connection_config: ConnectionConfig,
    cache: CacheConfig,
) -> Harness {
    let events = RecordingNotifier::new();
    let notifier: Arc<dyn Notifier> = Arc::new(events.clone());
    let connection = Arc::new(
        ConnectionManager::new(connection_config, Arc::new(transport.clone()), notifier.clone())
            .expect("valid connection config"),
    );
    let reader = Arc::new(ResponseReader::new(
        Arc::clone(&connection),
        &cache,
        &config::reader(),
        notifier,
    ));
    Harness {
        transport,
        events,
        connection,
        reader,
    }
}
