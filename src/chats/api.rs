use serde::Deserialize;
use uuid::Uuid;

use crate::chats::ChatBody;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewChat {
    pub room_id: Uuid,
    pub body: ChatBody,
}
