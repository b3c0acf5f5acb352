use std::sync::Arc;

use super::api::{CreateRoom, DmRequest, EnterQuery, RoomWithHistory};
use super::Room;
use crate::api::{self, parse_query, IdQuery};
use crate::chats::Chat;
use crate::error::AppError;
use crate::events::{Event, EventHub};
use crate::flags::Flag;
use crate::friends::Friend;
use crate::session::authenticate;
use crate::database;

async fn create(req: api::Request, hub: Arc<EventHub>) -> api::AppResult {
    let session = authenticate(&req).await?;
    let CreateRoom {
        title,
        capacity,
        password,
    } = api::parse_body(req).await?;
    let mut conn = database::get().await;
    let db = &mut *conn;
    let room = Room::create(db, &title, capacity, &session.username, password.as_deref()).await?;
    log::info!("a room ({}) was created by {}", room.id, room.owner);
    let result = api::Return::new(&room).build();
    Event::new_room(hub, room);
    result
}

async fn dm(req: api::Request) -> api::AppResult {
    let session = authenticate(&req).await?;
    let DmRequest { friend } = api::parse_body(req).await?;
    let mut conn = database::get().await;
    let mut trans = conn.transaction().await?;
    let db = &mut trans;
    let relation = Friend::find_by_pair(db, &session.username, &friend)
        .await?
        .ok_or(AppError::NotFound("friend relation"))?;
    if !relation.is_accepted {
        return Err(AppError::NoPermission);
    }
    let (room, created) = Room::resolve_dm(db, &session.username, &friend).await?;
    if created {
        Friend::set_dm_room(db, &relation.id, &room.id).await?;
        log::info!("a direct message room ({}) was created", room.id);
    }
    trans.commit().await?;
    api::Return::new(&room).build()
}

async fn enter(req: api::Request, hub: Arc<EventHub>) -> api::AppResult {
    let session = authenticate(&req).await?;
    let EnterQuery { id, password } = parse_query(req.uri())?;
    let mut conn = database::get().await;
    let db = &mut *conn;
    let room = Room::get_by_id(db, &id).await?.ok_or(AppError::NotFound("room"))?;
    room.check_password(password.as_deref())?;
    // best-effort: the authoritative check happens at registration
    if hub.presence.count(room.id).await >= room.capacity.max(0) as usize {
        return Err(AppError::CapacityExceeded);
    }
    let cut_line = Flag::cut_line(db, &session.username, &room.id).await?;
    let chats = Chat::get_by_room(db, &room.id, cut_line).await?;
    api::Return::new(&RoomWithHistory { room, chats }).build()
}

async fn list(_req: api::Request) -> api::AppResult {
    let mut conn = database::get().await;
    let rooms = Room::all_public(&mut *conn).await?;
    api::Return::new(&rooms).build()
}

async fn delete(req: api::Request, hub: Arc<EventHub>) -> api::AppResult {
    let session = authenticate(&req).await?;
    let IdQuery { id } = parse_query(req.uri())?;
    let mut conn = database::get().await;
    let db = &mut *conn;
    let room = Room::get_by_id(db, &id).await?.ok_or(AppError::NotFound("room"))?;
    if room.owner != session.username {
        log::warn!("{} tried to delete the room {}", session.username, room.id);
        return Err(AppError::NoPermission);
    }
    Room::delete(db, &id).await?;
    log::info!("the room {} was deleted by its owner", room.id);
    Event::room_removed(hub, room.id);
    api::Return::new(&true).build()
}

pub async fn router(req: api::Request, path: &str, hub: Arc<EventHub>) -> api::AppResult {
    use hyper::Method;

    match (path, req.method().clone()) {
        ("/create", Method::POST) => create(req, hub).await,
        ("/dm", Method::POST) => dm(req).await,
        ("/enter", Method::GET) => enter(req, hub).await,
        ("/list", Method::GET) => list(req).await,
        ("/delete", Method::DELETE) => delete(req, hub).await,
        _ => Err(AppError::missing()),
    }
}
