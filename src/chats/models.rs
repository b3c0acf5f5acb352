use chrono::naive::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

use crate::database::Querist;
use crate::error::{AppError, DbError, ValidationFailed};
use crate::validators::ATTACHMENT;

/// A chat message carries exactly one payload. The storage keeps three
/// nullable columns; exclusivity is enforced here, at construction.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
#[serde(tag = "type")]
#[serde(rename_all = "camelCase")]
pub enum ChatBody {
    Text { text: String },
    Image { filename: String },
    File { filename: String },
}

impl ChatBody {
    pub fn validate(&self) -> Result<(), ValidationFailed> {
        match self {
            ChatBody::Text { text } => {
                if text.trim().is_empty() {
                    return Err(ValidationFailed("Chat text shall not be empty."));
                }
                Ok(())
            }
            ChatBody::Image { filename } | ChatBody::File { filename } => ATTACHMENT.run(filename),
        }
    }

    fn columns(&self) -> (Option<&str>, Option<&str>, Option<&str>) {
        match self {
            ChatBody::Text { text } => (Some(text), None, None),
            ChatBody::Image { filename } => (None, Some(filename), None),
            ChatBody::File { filename } => (None, None, Some(filename)),
        }
    }

    pub fn from_columns(text: Option<String>, image: Option<String>, file: Option<String>) -> ChatBody {
        if let Some(text) = text {
            ChatBody::Text { text }
        } else if let Some(filename) = image {
            ChatBody::Image { filename }
        } else if let Some(filename) = file {
            ChatBody::File { filename }
        } else {
            ChatBody::Text { text: String::new() }
        }
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender: String,
    #[serde(flatten)]
    pub body: ChatBody,
    #[serde(with = "crate::date_format")]
    pub created: NaiveDateTime,
}

impl Chat {
    fn from_row(row: Row) -> Chat {
        let text: Option<String> = row.get(3);
        let image: Option<String> = row.get(4);
        let file: Option<String> = row.get(5);
        Chat {
            id: row.get(0),
            room_id: row.get(1),
            sender: row.get(2),
            body: ChatBody::from_columns(text, image, file),
            created: row.get(6),
        }
    }

    pub async fn create<T: Querist>(db: &mut T, room_id: &Uuid, sender: &str, body: ChatBody) -> Result<Chat, AppError> {
        body.validate()?;
        let (text, image, file) = body.columns();
        let row = db
            .query_one(include_str!("sql/create.sql"), &[room_id, &sender, &text, &image, &file])
            .await?
            .ok_or_else(|| unexpected!("chat insertion returned no row"))?;
        Ok(Chat::from_row(row))
    }

    /// History for a room, oldest first. With a cut line, only
    /// messages created strictly after it are visible.
    pub async fn get_by_room<T: Querist>(
        db: &mut T,
        room_id: &Uuid,
        after: Option<NaiveDateTime>,
    ) -> Result<Vec<Chat>, DbError> {
        use postgres_types::Type;
        let rows = db
            .query_typed(
                include_str!("sql/get_by_room.sql"),
                &[Type::UUID, Type::TIMESTAMP],
                &[room_id, &after],
            )
            .await?;
        Ok(rows.into_iter().map(Chat::from_row).collect())
    }

    pub async fn delete_by_room<T: Querist>(db: &mut T, room_id: &Uuid) -> Result<u64, DbError> {
        db.execute(include_str!("sql/delete_by_room.sql"), &[room_id]).await
    }
}

#[cfg(test)]
mod tests {
    use super::ChatBody;

    #[test]
    fn test_body_columns() {
        let text = ChatBody::Text {
            text: "hello".to_string(),
        };
        assert_eq!(text.columns(), (Some("hello"), None, None));
        let image = ChatBody::Image {
            filename: "cat.png".to_string(),
        };
        assert_eq!(image.columns(), (None, Some("cat.png"), None));
        let file = ChatBody::File {
            filename: "notes.pdf".to_string(),
        };
        assert_eq!(file.columns(), (None, None, Some("notes.pdf")));
    }

    #[test]
    fn test_body_from_columns() {
        let body = ChatBody::from_columns(Some("hi".to_string()), None, None);
        assert_eq!(body, ChatBody::Text { text: "hi".to_string() });
        let body = ChatBody::from_columns(None, Some("cat.png".to_string()), None);
        assert_eq!(
            body,
            ChatBody::Image {
                filename: "cat.png".to_string()
            }
        );
        let body = ChatBody::from_columns(None, None, Some("notes.pdf".to_string()));
        assert_eq!(
            body,
            ChatBody::File {
                filename: "notes.pdf".to_string()
            }
        );
    }

    #[test]
    fn test_body_validation() {
        assert!(ChatBody::Text { text: "hi".to_string() }.validate().is_ok());
        assert!(ChatBody::Text { text: "  ".to_string() }.validate().is_err());
        assert!(ChatBody::Image {
            filename: String::new()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_body_wire_form() {
        let body = ChatBody::Text {
            text: "hello".to_string(),
        };
        let encoded = serde_json::to_string(&body).unwrap();
        assert_eq!(encoded, r#"{"type":"text","text":"hello"}"#);
        let decoded: ChatBody = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, body);
    }
}
