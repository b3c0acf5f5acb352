use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::events::presence::Presence;
use crate::events::Event;

#[derive(Clone)]
pub struct SyncEvent {
    pub event: Arc<Event>,
    pub encoded: String,
}

impl SyncEvent {
    pub fn new(event: Event) -> SyncEvent {
        let encoded = serde_json::to_string(&event).unwrap();
        let event = Arc::new(event);
        SyncEvent { encoded, event }
    }
}

/// The fan-out hub. A mailbox is a room id, or [`Event::lobby`] for the
/// room-listing scope. Constructed once in `main` and passed around as
/// `Arc<EventHub>`; nothing mutates the presence registry but the
/// registry itself.
pub struct EventHub {
    broadcast: RwLock<HashMap<Uuid, broadcast::Sender<SyncEvent>>>,
    pub presence: Presence,
}

impl EventHub {
    pub fn new() -> EventHub {
        EventHub {
            broadcast: RwLock::new(HashMap::new()),
            presence: Presence::new(),
        }
    }

    pub async fn subscribe(&self, mailbox: Uuid) -> broadcast::Receiver<SyncEvent> {
        let table = self.broadcast.read().await;
        if let Some(sender) = table.get(&mailbox) {
            return sender.subscribe();
        }
        drop(table);
        let mut table = self.broadcast.write().await;
        // the table could have changed between the two locks
        if let Some(sender) = table.get(&mailbox) {
            return sender.subscribe();
        }
        let capacity = 256;
        let (tx, rx) = broadcast::channel(capacity);
        table.insert(mailbox, tx);
        rx
    }

    /// Best-effort delivery: no subscribers, lagged or gone receivers
    /// are all fine.
    pub async fn send(&self, mailbox: Uuid, event: SyncEvent) {
        let table = self.broadcast.read().await;
        if let Some(tx) = table.get(&mailbox) {
            tx.send(event).ok();
        }
    }

    /// Drops broadcast senders nobody listens to anymore.
    pub async fn sweep(&self) {
        let mut table = self.broadcast.write().await;
        table.retain(|_, tx| tx.receiver_count() != 0);
    }
}

impl Default for EventHub {
    fn default() -> EventHub {
        EventHub::new()
    }
}
