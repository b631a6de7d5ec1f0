use tallyx_core::event::LedgerEvent;
use tokio::sync::broadcast;
use tracing::trace;

/// Capacity of the event channel. Slow subscribers skip ahead (`Lagged`).
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Fan-out of committed ledger events to any number of subscribers.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.tx.subscribe()
    }

    /// Publish after commit. Having no subscribers is not an error.
    pub fn emit(&self, event: LedgerEvent) {
        trace!(%event, "ledger event");
        let _ = self.tx.send(event);
    }

    pub fn emit_all(&self, events: impl IntoIterator<Item = LedgerEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tallyx_core::claim::LifecycleStatus;

    #[test]
    fn subscribers_see_events_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.emit_all([
            LedgerEvent::StatusChanged {
                claim_id: 1,
                from: LifecycleStatus::Submitted,
                to: LifecycleStatus::Verified,
            },
            LedgerEvent::StatusChanged {
                claim_id: 1,
                from: LifecycleStatus::Verified,
                to: LifecycleStatus::Finalized,
            },
        ]);
        assert!(matches!(
            rx.try_recv().unwrap(),
            LedgerEvent::StatusChanged { to: LifecycleStatus::Verified, .. }
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            LedgerEvent::StatusChanged { to: LifecycleStatus::Finalized, .. }
        ));
    }

    #[test]
    fn emit_without_subscribers_is_fine() {
        EventBus::new().emit(LedgerEvent::StatusChanged {
            claim_id: 9,
            from: LifecycleStatus::Submitted,
            to: LifecycleStatus::Rejected,
        });
    }
}
