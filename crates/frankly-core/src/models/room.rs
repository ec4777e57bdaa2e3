use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::resources::{Resource, ResourceKind, ResourceRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    #[default]
    Unpublished,
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub status: RoomStatus,
    pub description: Option<String>,
    pub avatar_image_url: Option<String>,
    pub featured_image_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    pub version: Option<i64>,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
}

/// Properties of a room to create.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewRoom {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RoomStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

impl NewRoom {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn status(mut self, status: RoomStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Fields to change on an existing room. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoomUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RoomStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

impl Resource for Room {
    const KIND: ResourceKind = ResourceKind::Room;
    type Parent = ();
    type Draft = NewRoom;
    type Patch = RoomUpdate;

    fn collection_path(_: ()) -> String {
        "/rooms".to_string()
    }

    fn reference(_: (), id: i64) -> ResourceRef {
        ResourceRef::Room { id }
    }
}
