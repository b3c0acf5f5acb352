use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize, Debug)]
pub struct ConnectQuery {
    pub mailbox: Option<Uuid>,
    pub token: Option<String>,
}
