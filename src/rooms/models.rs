use chrono::naive::NaiveDateTime;
use postgres_types::FromSql;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::Querist;
use crate::error::{AppError, DbError, ValidationFailed};
use crate::validators::ROOM_TITLE;

pub const DEFAULT_CAPACITY: i32 = 10;
pub const DM_CAPACITY: i32 = 2;
pub const DM_TITLE: &str = "Direct Message";

#[derive(Debug, Serialize, Deserialize, FromSql, Clone)]
#[serde(rename_all = "camelCase")]
#[postgres(name = "rooms")]
pub struct Room {
    pub id: Uuid,
    pub title: String,
    pub capacity: i32,
    pub owner: String,
    #[serde(skip)]
    pub password: Option<String>,
    #[serde(with = "crate::date_format")]
    pub created: NaiveDateTime,
    pub is_dm: bool,
    pub target: Option<String>,
}

impl Room {
    pub async fn create<T: Querist>(
        db: &mut T,
        title: &str,
        capacity: Option<i32>,
        owner: &str,
        password: Option<&str>,
    ) -> Result<Room, AppError> {
        let title = title.trim();
        ROOM_TITLE.run(title)?;
        let capacity = capacity.unwrap_or(DEFAULT_CAPACITY);
        if capacity < 2 {
            return Err(ValidationFailed("Room capacity shall not be less than 2.").into());
        }
        let password = password.filter(|password| !password.is_empty());
        let row = db
            .query_one(include_str!("sql/create.sql"), &[&title, &capacity, &owner, &password])
            .await?
            .ok_or_else(|| unexpected!("room insertion returned no row"))?;
        Ok(row.get(0))
    }

    /// Resolves the direct message room for the unordered pair
    /// `{requester, target}`, creating it when absent. The partial
    /// unique index on the pair makes the create idempotent, so two
    /// concurrent calls end up with the same room. Returns the room
    /// and whether this call created it.
    pub async fn resolve_dm<T: Querist>(db: &mut T, requester: &str, target: &str) -> Result<(Room, bool), AppError> {
        let created = db
            .query_one(
                include_str!("sql/create_dm.sql"),
                &[&DM_TITLE, &DM_CAPACITY, &requester, &target],
            )
            .await?;
        if let Some(row) = created {
            return Ok((row.get(0), true));
        }
        let room = Room::find_dm_pair(db, requester, target)
            .await?
            .ok_or_else(|| unexpected!("the direct message room vanished after a conflicting insert"))?;
        Ok((room, false))
    }

    pub async fn find_dm_pair<T: Querist>(db: &mut T, a: &str, b: &str) -> Result<Option<Room>, DbError> {
        let row = db.query_one(include_str!("sql/find_dm_pair.sql"), &[&a, &b]).await?;
        Ok(row.map(|row| row.get(0)))
    }

    pub async fn get_by_id<T: Querist>(db: &mut T, id: &Uuid) -> Result<Option<Room>, DbError> {
        let row = db.query_one(include_str!("sql/get_by_id.sql"), &[id]).await?;
        Ok(row.map(|row| row.get(0)))
    }

    pub async fn all_public<T: Querist>(db: &mut T) -> Result<Vec<Room>, DbError> {
        let rows = db.query(include_str!("sql/all_public.sql"), &[]).await?;
        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    /// Chats and flags go with the room through the foreign keys.
    pub async fn delete<T: Querist>(db: &mut T, id: &Uuid) -> Result<u64, DbError> {
        db.execute(include_str!("sql/delete.sql"), &[id]).await
    }

    pub fn check_password(&self, supplied: Option<&str>) -> Result<(), AppError> {
        match self.password.as_deref() {
            None => Ok(()),
            Some(password) if supplied == Some(password) => Ok(()),
            Some(_) => Err(AppError::NoPermission),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Room;
    use crate::chats::{Chat, ChatBody};
    use crate::database::Client;
    use crate::flags::Flag;
    use crate::friends::Friend;

    #[test]
    fn test_check_password() {
        let mut room = Room {
            id: uuid::Uuid::new_v4(),
            title: "General".to_string(),
            capacity: 10,
            owner: "orange".to_string(),
            password: None,
            created: crate::date_format::timestamp_to_date_time(0),
            is_dm: false,
            target: None,
        };
        assert!(room.check_password(None).is_ok());
        assert!(room.check_password(Some("anything")).is_ok());
        room.password = Some("sesame".to_string());
        assert!(room.check_password(Some("sesame")).is_ok());
        assert!(room.check_password(Some("wrong")).is_err());
        assert!(room.check_password(None).is_err());
    }

    #[tokio::test]
    async fn room_test() -> Result<(), crate::error::AppError> {
        dotenv::dotenv().ok();
        let mut client = Client::new().await?;
        let mut trans = client.transaction().await?;
        let db = &mut trans;

        let room = Room::create(db, "Test Room", Some(5), "alice", Some("sesame")).await?;
        assert_eq!(room.capacity, 5);
        assert!(!room.is_dm);
        let found = Room::get_by_id(db, &room.id).await?.unwrap();
        assert_eq!(found.id, room.id);
        found.check_password(Some("sesame")).unwrap();
        assert!(found.check_password(Some("open")).is_err());

        assert!(Room::create(db, "", None, "alice", None).await.is_err());
        assert!(Room::create(db, "Tiny", Some(1), "alice", None).await.is_err());

        // direct message resolution is idempotent in both directions
        let friend = Friend::create(db, "alice", "bob").await?;
        let friend = Friend::accept(db, &friend.id).await?.unwrap();
        let (dm, created) = Room::resolve_dm(db, "alice", "bob").await?;
        assert!(created);
        assert!(dm.is_dm);
        assert_eq!(dm.capacity, 2);
        Friend::set_dm_room(db, &friend.id, &dm.id).await?;
        let (again, created) = Room::resolve_dm(db, "bob", "alice").await?;
        assert!(!created);
        assert_eq!(again.id, dm.id);
        let found = Room::find_dm_pair(db, "bob", "alice").await?.unwrap();
        assert_eq!(found.id, dm.id);

        // history, the visibility cut line and the owner purge
        let body = ChatBody::Text {
            text: "hello".to_string(),
        };
        let first = Chat::create(db, &room.id, "alice", body).await?;
        let cut = Flag::cut_line(db, "bob", &room.id).await?;
        assert!(cut.is_none());
        let chats = Chat::get_by_room(db, &room.id, None).await?;
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].id, first.id);

        let flag = Flag::clear(db, "bob", &room.id).await?;
        let cut = Flag::cut_line(db, "bob", &room.id).await?.unwrap();
        assert_eq!(cut, flag.cleared_at);
        let hidden = Chat::get_by_room(db, &room.id, Some(cut)).await?;
        assert!(hidden.is_empty());
        // clearing again never moves the cut line backwards
        let second_flag = Flag::clear(db, "bob", &room.id).await?;
        assert!(second_flag.cleared_at >= flag.cleared_at);
        assert_eq!(second_flag.id, flag.id);

        // the owner purge removes history for everyone
        let body = ChatBody::Image {
            filename: "cat.png".to_string(),
        };
        Chat::create(db, &room.id, "bob", body).await?;
        Chat::delete_by_room(db, &room.id).await?;
        let chats = Chat::get_by_room(db, &room.id, None).await?;
        assert!(chats.is_empty());

        // cascade: deleting the room deletes its chats and flags
        Chat::create(db, &room.id, "alice", ChatBody::Text { text: "bye".to_string() }).await?;
        Room::delete(db, &room.id).await?;
        assert!(Room::get_by_id(db, &room.id).await?.is_none());
        Ok(())
    }
}
