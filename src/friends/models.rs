//! Friend relations. The request/accept endpoints live upstream; the
//! fan-out core only needs the pair lookup, the DM back-reference and
//! the cascading removal.
use chrono::naive::NaiveDateTime;
use postgres_types::FromSql;
use serde::Serialize;
use uuid::Uuid;

use crate::database::Querist;
use crate::error::{AppError, DbError};
use crate::rooms::Room;

#[derive(Debug, Serialize, FromSql, Clone)]
#[serde(rename_all = "camelCase")]
#[postgres(name = "friends")]
pub struct Friend {
    pub id: Uuid,
    pub sender: String,
    pub receiver: String,
    pub is_accepted: bool,
    #[serde(with = "crate::date_format")]
    pub created: NaiveDateTime,
    pub dm_room: Option<Uuid>,
}

impl Friend {
    pub async fn create<T: Querist>(db: &mut T, sender: &str, receiver: &str) -> Result<Friend, AppError> {
        let row = db
            .query_one(include_str!("sql/create.sql"), &[&sender, &receiver])
            .await?
            .ok_or(AppError::AlreadyExists("friend relation"))?;
        Ok(row.get(0))
    }

    pub async fn accept<T: Querist>(db: &mut T, id: &Uuid) -> Result<Option<Friend>, DbError> {
        let row = db.query_one(include_str!("sql/accept.sql"), &[id]).await?;
        Ok(row.map(|row| row.get(0)))
    }

    /// The relation for the unordered pair, regardless of who sent it.
    pub async fn find_by_pair<T: Querist>(db: &mut T, a: &str, b: &str) -> Result<Option<Friend>, DbError> {
        let row = db.query_one(include_str!("sql/find_by_pair.sql"), &[&a, &b]).await?;
        Ok(row.map(|row| row.get(0)))
    }

    pub async fn set_dm_room<T: Querist>(db: &mut T, id: &Uuid, room_id: &Uuid) -> Result<u64, DbError> {
        db.execute(include_str!("sql/set_dm_room.sql"), &[id, room_id]).await
    }

    /// Removes the relation and its direct message room; the room's
    /// chats and flags go with it through the foreign keys.
    pub async fn remove<T: Querist>(db: &mut T, id: &Uuid) -> Result<(), DbError> {
        let row = db.query_one(include_str!("sql/delete.sql"), &[id]).await?;
        let dm_room: Option<Uuid> = row.and_then(|row| {
            let friend: Friend = row.get(0);
            friend.dm_room
        });
        if let Some(room_id) = dm_room {
            Room::delete(db, &room_id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Friend;
    use crate::database::Client;
    use crate::rooms::Room;

    #[tokio::test]
    async fn friend_test() -> Result<(), crate::error::AppError> {
        dotenv::dotenv().ok();
        let mut client = Client::new().await?;
        let mut trans = client.transaction().await?;
        let db = &mut trans;

        let friend = Friend::create(db, "alice", "bob").await?;
        assert!(!friend.is_accepted);
        assert!(Friend::create(db, "bob", "alice").await.is_err());
        let friend = Friend::accept(db, &friend.id).await?.unwrap();
        assert!(friend.is_accepted);

        let found = Friend::find_by_pair(db, "bob", "alice").await?.unwrap();
        assert_eq!(found.id, friend.id);
        assert!(Friend::find_by_pair(db, "alice", "carol").await?.is_none());

        let (dm, _) = Room::resolve_dm(db, "alice", "bob").await?;
        Friend::set_dm_room(db, &friend.id, &dm.id).await?;
        Friend::remove(db, &friend.id).await?;
        assert!(Friend::find_by_pair(db, "alice", "bob").await?.is_none());
        assert!(Room::get_by_id(db, &dm.id).await?.is_none());
        Ok(())
    }
}
