//! The visibility ledger. A flag hides a room's history up to an
//! instant, for one user only; the owner purge in the chats module is
//! the hard counterpart.
use chrono::naive::NaiveDateTime;
use postgres_types::FromSql;
use serde::Serialize;
use uuid::Uuid;

use crate::database::Querist;
use crate::error::{AppError, DbError};

#[derive(Debug, Serialize, FromSql, Clone)]
#[serde(rename_all = "camelCase")]
#[postgres(name = "flags")]
pub struct Flag {
    pub id: Uuid,
    pub username: String,
    pub room_id: Uuid,
    #[serde(with = "crate::date_format")]
    pub cleared_at: NaiveDateTime,
}

impl Flag {
    /// One flag per (user, room); messages created at or before the
    /// returned instant are hidden from this user. `None` means the
    /// full history is visible.
    pub async fn cut_line<T: Querist>(db: &mut T, username: &str, room_id: &Uuid) -> Result<Option<NaiveDateTime>, DbError> {
        let row = db
            .query_one(include_str!("sql/get.sql"), &[&username, room_id])
            .await?;
        Ok(row.map(|row| {
            let flag: Flag = row.get(0);
            flag.cleared_at
        }))
    }

    /// Upsert to now. `GREATEST` keeps the cut line monotonic even if
    /// clocks or concurrent clears misbehave.
    pub async fn clear<T: Querist>(db: &mut T, username: &str, room_id: &Uuid) -> Result<Flag, AppError> {
        let row = db
            .query_one(include_str!("sql/upsert.sql"), &[&username, room_id])
            .await?
            .ok_or_else(|| unexpected!("flag upsert returned no row"))?;
        Ok(row.get(0))
    }
}
