use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::Scope;

const DEFAULT_CAPACITY: usize = 64;

/// Host notifications that may change the current scope
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// Host state variables finished updating; carries the updated variables
    StateUpdated(Value),
    /// The operator picked a scope explicitly
    ScopeSelected(Scope),
}

/// Publish/subscribe channel between the host and the orchestrator
#[derive(Debug, Clone)]
pub struct ChangeBus {
    tx: broadcast::Sender<HostEvent>,
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChangeBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publishes an event, returns how many subscribers will see it
    pub fn publish(&self, event: HostEvent) -> usize {
        match self.tx.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                debug!(?event, "No subscribers for host event");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = ChangeBus::default();
        assert_eq!(bus.publish(HostEvent::ScopeSelected(Scope::Sanctuary)), 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = ChangeBus::new(8);
        let mut rx = bus.subscribe();

        let event = HostEvent::StateUpdated(json!({"stat_data": {"current_area": {"type": "sanctuary"}}}));
        assert_eq!(bus.publish(event.clone()), 1);
        assert_eq!(rx.recv().await.unwrap(), event);

        drop(rx);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
