use std::sync::Arc;

use serde::Serialize;
use tokio::spawn;
use uuid::Uuid;

use crate::chats::Chat;
use crate::events::context::{EventHub, SyncEvent};
use crate::rooms::Room;
use crate::utils::timestamp;

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SystemMessage {
    pub user: &'static str,
    pub chat: String,
}

impl SystemMessage {
    fn new(chat: String) -> SystemMessage {
        SystemMessage { user: "system", chat }
    }
}

#[derive(Serialize, Debug)]
#[serde(tag = "type")]
#[serde(rename_all = "camelCase")]
pub enum EventBody {
    NewRoom { room: Box<Room> },
    #[serde(rename_all = "camelCase")]
    RemoveRoom { room_id: Uuid },
    Join { message: SystemMessage },
    Exit { message: SystemMessage },
    Chat { message: Box<Chat> },
    HistoryCleared,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub mailbox: Uuid,
    pub timestamp: i64,
    pub body: EventBody,
}

impl Event {
    /// The mailbox of the room-listing scope.
    pub fn lobby() -> Uuid {
        Uuid::nil()
    }

    fn build(mailbox: Uuid, body: EventBody) -> SyncEvent {
        SyncEvent::new(Event {
            mailbox,
            timestamp: timestamp(),
            body,
        })
    }

    /// Chat events are published inline, after the message has been
    /// persisted, to keep the persist-then-broadcast order.
    pub async fn new_chat(hub: &EventHub, chat: Chat) {
        let mailbox = chat.room_id;
        let message = Box::new(chat);
        hub.send(mailbox, Event::build(mailbox, EventBody::Chat { message })).await;
    }

    pub async fn joined(hub: &EventHub, room_id: Uuid, username: &str) {
        let message = SystemMessage::new(format!("{} joined", username));
        hub.send(room_id, Event::build(room_id, EventBody::Join { message })).await;
    }

    pub async fn left(hub: &EventHub, room_id: Uuid, username: &str) {
        let message = SystemMessage::new(format!("{} left", username));
        hub.send(room_id, Event::build(room_id, EventBody::Exit { message })).await;
    }

    pub async fn history_cleared(hub: &EventHub, room_id: Uuid) {
        hub.send(room_id, Event::build(room_id, EventBody::HistoryCleared)).await;
    }

    /// Room-listing notification, fire-and-forget: a missed notify
    /// never fails the request that created the room.
    pub fn new_room(hub: Arc<EventHub>, room: Room) {
        spawn(async move {
            let room = Box::new(room);
            let lobby = Event::lobby();
            hub.send(lobby, Event::build(lobby, EventBody::NewRoom { room })).await;
        });
    }

    pub fn room_removed(hub: Arc<EventHub>, room_id: Uuid) {
        spawn(async move {
            let lobby = Event::lobby();
            hub.send(lobby, Event::build(lobby, EventBody::RemoveRoom { room_id })).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{Event, EventBody, SystemMessage};
    use crate::events::context::{EventHub, SyncEvent};
    use crate::utils::id;

    fn join_event(mailbox: uuid::Uuid, username: &str) -> SyncEvent {
        let message = SystemMessage::new(format!("{} joined", username));
        Event::build(mailbox, EventBody::Join { message })
    }

    #[test]
    fn test_encoding() {
        let mailbox = id();
        let event = join_event(mailbox, "orange");
        assert!(event.encoded.contains(r#""type":"join""#));
        assert!(event.encoded.contains("orange joined"));
        assert!(event.encoded.contains(&mailbox.to_string()));
    }

    #[tokio::test]
    async fn test_fan_out() {
        let hub = EventHub::new();
        let mailbox = id();
        let mut first = hub.subscribe(mailbox).await;
        let mut second = hub.subscribe(mailbox).await;
        let mut other = hub.subscribe(id()).await;

        hub.send(mailbox, join_event(mailbox, "orange")).await;
        let received = first.recv().await.unwrap();
        assert!(received.encoded.contains("orange joined"));
        let received = second.recv().await.unwrap();
        assert!(received.encoded.contains("orange joined"));
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_joiner_not_notified() {
        // The join event fires before the joiner subscribes, so only
        // earlier members see it.
        let hub = EventHub::new();
        let mailbox = id();
        let mut earlier = hub.subscribe(mailbox).await;
        Event::joined(&hub, mailbox, "orange").await;
        let mut joiner = hub.subscribe(mailbox).await;
        assert!(earlier.recv().await.unwrap().encoded.contains("orange joined"));
        assert!(joiner.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_order_preserved() {
        let hub = EventHub::new();
        let mailbox = id();
        let mut rx = hub.subscribe(mailbox).await;
        for name in ["a", "b", "c"] {
            Event::joined(&hub, mailbox, name).await;
        }
        for name in ["a", "b", "c"] {
            let event = rx.recv().await.unwrap();
            assert!(event.encoded.contains(&format!("{} joined", name)));
        }
    }

    #[tokio::test]
    async fn test_sweep() {
        let hub = EventHub::new();
        let mailbox = id();
        let rx = hub.subscribe(mailbox).await;
        hub.sweep().await;
        drop(rx);
        hub.sweep().await;
        // sending into a swept mailbox is a silent no-op
        hub.send(mailbox, join_event(mailbox, "orange")).await;
    }
}
