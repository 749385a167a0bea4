use std::sync::Arc;

use serde_json::Value as JsonValue;

use dealroom_events::{EventBus, EventEnvelope, InMemoryEventBus};
use dealroom_infra::{InMemoryTransactionStore, LifecycleConfig, LifecycleService};

pub type AppBus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;
pub type AppLifecycle = LifecycleService<Arc<InMemoryTransactionStore>, AppBus>;

/// Shared state behind every protected route.
#[derive(Debug)]
pub struct AppServices {
    pub lifecycle: AppLifecycle,
}

pub fn build_services(config: LifecycleConfig) -> AppServices {
    let store = Arc::new(InMemoryTransactionStore::new());
    let bus: AppBus = Arc::new(InMemoryEventBus::new());
    spawn_event_log_consumer(&bus);

    AppServices {
        lifecycle: LifecycleService::with_clock(store, bus, dealroom_core::SystemClock, config),
    }
}

/// Downstream consumer stand-in: traces every committed lifecycle event.
///
/// Invitation delivery would subscribe the same way.
fn spawn_event_log_consumer(bus: &AppBus) {
    let subscription = bus.subscribe();
    std::thread::spawn(move || {
        while let Ok(envelope) = subscription.recv() {
            tracing::info!(
                event_id = %envelope.event_id(),
                aggregate_type = envelope.aggregate_type(),
                transaction_id = %envelope.aggregate_id(),
                sequence = envelope.sequence_number(),
                event_type = envelope.event_type(),
                occurred_at = %envelope.occurred_at(),
                payload = %envelope.payload(),
                "lifecycle event published"
            );
        }
    });
}
