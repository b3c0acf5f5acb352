//! Live membership tracking. Entries are never persisted; a restart
//! starts from an empty registry.
use std::collections::HashMap;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct PresenceEntry {
    pub connection: Uuid,
    pub username: String,
}

pub struct Presence {
    inner: Mutex<HashMap<Uuid, Vec<PresenceEntry>>>,
}

impl Presence {
    pub fn new() -> Presence {
        Presence {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a connection, refusing it when the room is already at
    /// capacity. The check and the insert share one critical section,
    /// so in-process joins cannot slip past the limit; the check at the
    /// HTTP enter endpoint remains best-effort.
    pub async fn register(
        &self,
        room_id: Uuid,
        connection: Uuid,
        username: &str,
        capacity: i32,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        let entries = inner.entry(room_id).or_insert_with(Vec::new);
        if entries.len() >= capacity.max(0) as usize {
            return Err(AppError::CapacityExceeded);
        }
        entries.push(PresenceEntry {
            connection,
            username: username.to_string(),
        });
        Ok(())
    }

    pub async fn unregister(&self, room_id: Uuid, connection: Uuid) -> Option<PresenceEntry> {
        let mut inner = self.inner.lock().await;
        let entries = inner.get_mut(&room_id)?;
        let index = entries.iter().position(|entry| entry.connection == connection)?;
        let removed = entries.swap_remove(index);
        if entries.is_empty() {
            inner.remove(&room_id);
        }
        Some(removed)
    }

    pub async fn count(&self, room_id: Uuid) -> usize {
        let inner = self.inner.lock().await;
        inner.get(&room_id).map(Vec::len).unwrap_or(0)
    }

    pub async fn members(&self, room_id: Uuid) -> Vec<PresenceEntry> {
        let inner = self.inner.lock().await;
        inner.get(&room_id).cloned().unwrap_or_default()
    }
}

impl Default for Presence {
    fn default() -> Presence {
        Presence::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Presence;
    use crate::error::AppError;
    use crate::utils::id;

    #[tokio::test]
    async fn test_capacity() {
        let presence = Presence::new();
        let room = id();
        presence.register(room, id(), "a", 2).await.unwrap();
        presence.register(room, id(), "b", 2).await.unwrap();
        let refused = presence.register(room, id(), "c", 2).await;
        assert!(matches!(refused, Err(AppError::CapacityExceeded)));
        assert_eq!(presence.count(room).await, 2);
    }

    #[tokio::test]
    async fn test_unregister() {
        let presence = Presence::new();
        let room = id();
        let conn = id();
        presence.register(room, conn, "a", 2).await.unwrap();
        presence.register(room, id(), "b", 2).await.unwrap();
        let removed = presence.unregister(room, conn).await.unwrap();
        assert_eq!(removed.username, "a");
        assert_eq!(presence.count(room).await, 1);
        // freed seat can be taken again
        presence.register(room, id(), "c", 2).await.unwrap();
        // unknown connection is a no-op
        assert!(presence.unregister(room, conn).await.is_none());
    }

    #[tokio::test]
    async fn test_members() {
        let presence = Presence::new();
        let room = id();
        presence.register(room, id(), "a", 10).await.unwrap();
        presence.register(room, id(), "b", 10).await.unwrap();
        let mut names: Vec<String> = presence
            .members(room)
            .await
            .into_iter()
            .map(|entry| entry.username)
            .collect();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
        assert!(presence.members(id()).await.is_empty());
    }
}
