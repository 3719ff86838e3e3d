//! Broadcast channel: a registry of connected subscribers with per-connection FIFO queues.
//!
//! Emitting serializes an event once and enqueues it on every live connection.
//! Queues whose receiving side is gone are dropped on the next emit. A
//! connection whose queue is full is cut off rather than skipped, so its client
//! reconnects and resyncs from a fresh full-state frame instead of silently
//! missing an event.

mod event;
mod ws;

pub use event::*;
pub use ws::*;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{channel, Receiver, Sender};
use uuid::Uuid;

/// Details recorded for every connected device.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub id: String,
    pub connected_at: String,
    pub user_agent: String,
}

/// Frames a connection may have queued before it counts as stalled.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

struct Subscriber {
    info: DeviceInfo,
    sender: Sender<Arc<str>>,
}

/// Registry of active event-channel connections.
pub struct Hub {
    subscribers: Mutex<HashMap<Uuid, Subscriber>>,
    capacity: usize,
}

impl Default for Hub {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<Uuid, Subscriber>> {
        // A panicked emitter leaves the map itself intact.
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a connection whose queue starts with `first`.
    ///
    /// Callers that need the first frame to be consistent with later events must
    /// hold the store lock across building `first` and this call.
    pub fn subscribe(self: &Arc<Self>, first: &Event, user_agent: &str) -> Subscription {
        let (sender, receiver) = channel(self.capacity);
        let id = Uuid::new_v4();

        match encode(first) {
            Some(frame) => {
                let _ = sender.try_send(frame);
            }
            None => tracing::error!("Failed to encode initial frame for {}", id),
        }

        let info = DeviceInfo {
            id: id.to_string(),
            connected_at: Utc::now().to_rfc3339(),
            user_agent: user_agent.to_string(),
        };

        let total = {
            let mut registry = self.registry();
            registry.insert(id, Subscriber { info, sender });
            registry.len()
        };
        tracing::info!("Device connected: {} (Total: {})", id, total);

        Subscription {
            id,
            hub: Arc::clone(self),
            receiver,
        }
    }

    fn unsubscribe(&self, id: &Uuid) {
        let total = {
            let mut registry = self.registry();
            registry.remove(id);
            registry.len()
        };
        tracing::info!("Device disconnected: {} (Total: {})", id, total);
    }

    /// Enqueue an event on every connection. Returns the number of recipients.
    pub fn emit(&self, event: &Event) -> usize {
        let Some(frame) = encode(event) else {
            return 0;
        };

        let mut registry = self.registry();
        registry.retain(|id, subscriber| match subscriber.sender.try_send(Arc::clone(&frame)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Device {} is not keeping up, disconnecting it", id);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        });
        registry.len()
    }

    /// Snapshot of connected device details.
    pub fn devices(&self) -> Vec<DeviceInfo> {
        self.registry().values().map(|s| s.info.clone()).collect()
    }
}

fn encode(event: &Event) -> Option<Arc<str>> {
    match serde_json::to_string(event) {
        Ok(text) => Some(Arc::from(text)),
        Err(e) => {
            tracing::error!("Failed to encode event: {}", e);
            None
        }
    }
}

/// A live registration. Dropping it removes the connection from the hub.
pub struct Subscription {
    id: Uuid,
    hub: Arc<Hub>,
    receiver: Receiver<Arc<str>>,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next encoded frame, in emission order. `None` once the hub has let go
    /// of this connection and the queue is drained.
    pub async fn recv(&mut self) -> Option<Arc<str>> {
        self.receiver.recv().await
    }

    /// Next frame if one is already queued.
    pub fn try_recv(&mut self) -> Option<Arc<str>> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Event {
        Event::FullState {
            revision: 0,
            classes: Default::default(),
        }
    }

    fn decode(frame: Arc<str>) -> Event {
        serde_json::from_str(&frame).unwrap()
    }

    #[test]
    fn test_first_frame_precedes_events() {
        let hub = Arc::new(Hub::new());
        let mut sub = hub.subscribe(&snapshot(), "test-agent");

        hub.emit(&Event::WeekReset {
            revision: 1,
            class_name: "Bio".to_string(),
            timestamp: "t1".to_string(),
        });

        assert!(matches!(
            decode(sub.try_recv().unwrap()),
            Event::FullState { .. }
        ));
        assert!(matches!(
            decode(sub.try_recv().unwrap()),
            Event::WeekReset { revision: 1, .. }
        ));
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn test_emit_fans_out_in_order() {
        let hub = Arc::new(Hub::new());
        let mut a = hub.subscribe(&snapshot(), "a");
        let mut b = hub.subscribe(&snapshot(), "b");

        for revision in 1..=3 {
            assert_eq!(
                hub.emit(&Event::ClassDeleted {
                    revision,
                    class_name: format!("C{}", revision),
                }),
                2
            );
        }

        for sub in [&mut a, &mut b] {
            sub.try_recv().unwrap();
            let revisions: Vec<i64> = std::iter::from_fn(|| sub.try_recv())
                .map(|f| decode(f).revision().unwrap())
                .collect();
            assert_eq!(revisions, vec![1, 2, 3]);
        }
    }

    #[test]
    fn test_dropped_subscription_leaves_registry() {
        let hub = Arc::new(Hub::new());
        let sub = hub.subscribe(&snapshot(), "a");
        assert_eq!(hub.devices().len(), 1);
        assert_eq!(hub.devices()[0].user_agent, "a");

        drop(sub);
        assert_eq!(hub.devices().len(), 0);
        assert_eq!(
            hub.emit(&Event::SelectionCleared {
                class_name: "Bio".to_string()
            }),
            0
        );
    }

    #[test]
    fn test_stalled_connection_is_cut_off() {
        let hub = Arc::new(Hub::with_capacity(2));
        let mut stalled = hub.subscribe(&snapshot(), "stalled");
        let mut live = hub.subscribe(&snapshot(), "live");
        live.try_recv().unwrap();

        for revision in 1..=2 {
            hub.emit(&Event::ClassDeleted {
                revision,
                class_name: format!("C{}", revision),
            });
            live.try_recv().unwrap();
        }

        // The stalled queue overflowed on the second emit
        assert_eq!(hub.devices().len(), 1);
        assert_eq!(hub.devices()[0].user_agent, "live");

        let drained: Vec<Event> = std::iter::from_fn(|| stalled.try_recv())
            .map(decode)
            .collect();
        assert_eq!(drained.len(), 2);
        assert!(matches!(drained[0], Event::FullState { .. }));
        assert!(stalled.try_recv().is_none());
    }
}
