use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MessageContent;
use crate::api::resources::{Resource, ResourceKind, ResourceRef};

/// App-wide message template that can be published into any room.
///
/// Publishing creates a regular message in the target room; deleting the
/// announcement afterwards leaves those messages in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: i64,
    #[serde(default)]
    pub contents: Vec<MessageContent>,
    #[serde(default)]
    pub contextual: bool,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewAnnouncement {
    pub contents: Vec<MessageContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contextual: Option<bool>,
}

impl NewAnnouncement {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            contents: vec![MessageContent::text(value)],
            contextual: None,
        }
    }

    pub fn contextual(mut self, contextual: bool) -> Self {
        self.contextual = Some(contextual);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnnouncementUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<Vec<MessageContent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contextual: Option<bool>,
}

impl Resource for Announcement {
    const KIND: ResourceKind = ResourceKind::Announcement;
    type Parent = ();
    type Draft = NewAnnouncement;
    type Patch = AnnouncementUpdate;

    fn collection_path(_: ()) -> String {
        "/announcements".to_string()
    }

    fn reference(_: (), id: i64) -> ResourceRef {
        ResourceRef::Announcement { id }
    }
}
