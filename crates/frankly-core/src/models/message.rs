use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::User;
use crate::api::resources::{Resource, ResourceKind, ResourceRef};

/// One piece of a message: text, an image, a link...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent {
    #[serde(rename = "type")]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl MessageContent {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            mime_type: "text/plain".to_string(),
            value: Some(value.into()),
            url: None,
        }
    }

    pub fn link(mime_type: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            value: None,
            url: Some(url.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    #[serde(default)]
    pub contents: Vec<MessageContent>,
    #[serde(default)]
    pub contextual: bool,
    pub sender: Option<User>,
    pub announcement: Option<i64>,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
}

impl Message {
    /// Concatenated text parts, for display.
    pub fn text(&self) -> String {
        self.contents
            .iter()
            .filter(|c| c.mime_type == "text/plain")
            .filter_map(|c| c.value.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewMessage {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<MessageContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contextual: Option<bool>,
    /// Post an existing announcement instead of new contents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub announcement: Option<i64>,
}

impl NewMessage {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            contents: vec![MessageContent::text(value)],
            ..Default::default()
        }
    }

    pub fn announcement(announcement_id: i64) -> Self {
        Self {
            announcement: Some(announcement_id),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<Vec<MessageContent>>,
}

impl Resource for Message {
    const KIND: ResourceKind = ResourceKind::Message;
    /// Room the messages belong to.
    type Parent = i64;
    type Draft = NewMessage;
    type Patch = MessageUpdate;

    fn collection_path(room_id: i64) -> String {
        format!("/rooms/{room_id}/messages")
    }

    fn reference(room_id: i64, id: i64) -> ResourceRef {
        ResourceRef::Message { room_id, id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message() {
        let json = r#"{"id":77,"contents":[{"type":"text/plain","value":"hello"},{"type":"image/*","url":"https://cdn/x.png"}],"sender":{"id":3,"display_name":"Bob"},"created_on":"2015-06-01T10:00:00Z"}"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.id, 77);
        assert_eq!(message.contents.len(), 2);
        assert_eq!(message.text(), "hello");
        assert_eq!(message.sender.as_ref().map(|u| u.id), Some(3));
        assert!(!message.contextual);
    }

    #[test]
    fn test_new_message_serialization() {
        let draft = NewMessage::text("hi");
        assert_eq!(
            serde_json::to_value(&draft).unwrap(),
            serde_json::json!({"contents": [{"type": "text/plain", "value": "hi"}]})
        );
    }

    #[test]
    fn test_announcement_message_serialization() {
        assert_eq!(
            serde_json::to_value(NewMessage::announcement(4)).unwrap(),
            serde_json::json!({"announcement": 4})
        );
    }

    #[test]
    fn test_messages_live_under_room() {
        assert_eq!(Message::collection_path(5), "/rooms/5/messages");
        assert_eq!(Message::reference(5, 8).path(), "/rooms/5/messages/8");
    }
}
