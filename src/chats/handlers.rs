use std::sync::Arc;

use super::api::NewChat;
use super::Chat;
use crate::api::{self, parse_query, IdQuery};
use crate::database;
use crate::error::AppError;
use crate::events::{Event, EventHub};
use crate::flags::Flag;
use crate::rooms::Room;
use crate::session::authenticate;

/// Persist first, publish second. A failed insert never reaches the
/// fan-out; a publish without subscribers is not an error.
async fn send(req: api::Request, hub: Arc<EventHub>) -> api::AppResult {
    let session = authenticate(&req).await?;
    let NewChat { room_id, body } = api::parse_body(req).await?;
    let mut conn = database::get().await;
    let db = &mut *conn;
    Room::get_by_id(db, &room_id).await?.ok_or(AppError::NotFound("room"))?;
    let chat = Chat::create(db, &room_id, &session.username, body).await?;
    let result = api::Return::new(&chat).build();
    Event::new_chat(&hub, chat).await;
    result
}

/// The dual-purpose clear: the owner purges the room history for
/// everyone, anyone else merely hides it from themselves.
async fn clear(req: api::Request, hub: Arc<EventHub>) -> api::AppResult {
    let session = authenticate(&req).await?;
    let IdQuery { id } = parse_query(req.uri())?;
    let mut conn = database::get().await;
    let db = &mut *conn;
    let room = Room::get_by_id(db, &id).await?.ok_or(AppError::NotFound("room"))?;
    if room.owner == session.username {
        let deleted = Chat::delete_by_room(db, &room.id).await?;
        log::info!("{} purged {} chats from the room {}", room.owner, deleted, room.id);
        Event::history_cleared(&hub, room.id).await;
    } else {
        Flag::clear(db, &session.username, &room.id).await?;
    }
    api::Return::new(&true).build()
}

pub async fn router(req: api::Request, path: &str, hub: Arc<EventHub>) -> api::AppResult {
    use hyper::Method;

    match (path, req.method().clone()) {
        ("/send", Method::POST) => send(req, hub).await,
        ("/clear", Method::POST) => clear(req, hub).await,
        _ => Err(AppError::missing()),
    }
}
