use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::resources::{Resource, ResourceKind, ResourceRef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub display_name: Option<String>,
    pub role: Option<String>,
    pub avatar_image_url: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
}

impl User {
    pub fn display_name_or_id(&self) -> String {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => format!("user {}", self.id),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewUser {
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_image_url: Option<String>,
}

impl NewUser {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_image_url: Option<String>,
}

impl Resource for User {
    const KIND: ResourceKind = ResourceKind::User;
    type Parent = ();
    type Draft = NewUser;
    type Patch = UserUpdate;

    fn collection_path(_: ()) -> String {
        "/users".to_string()
    }

    fn reference(_: (), id: i64) -> ResourceRef {
        ResourceRef::User { id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user() {
        let user: User =
            serde_json::from_str(r#"{"id":4,"display_name":"Ada","role":"regular"}"#).unwrap();
        assert_eq!(user.display_name_or_id(), "Ada");
        assert_eq!(user.role.as_deref(), Some("regular"));
    }

    #[test]
    fn test_display_name_fallback() {
        let user: User = serde_json::from_str(r#"{"id":4,"display_name":" "}"#).unwrap();
        assert_eq!(user.display_name_or_id(), "user 4");
    }
}
