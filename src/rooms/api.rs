use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chats::Chat;
use crate::rooms::Room;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoom {
    pub title: String,
    pub capacity: Option<i32>,
    pub password: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DmRequest {
    pub friend: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EnterQuery {
    pub id: Uuid,
    pub password: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RoomWithHistory {
    pub room: Room,
    pub chats: Vec<Chat>,
}
