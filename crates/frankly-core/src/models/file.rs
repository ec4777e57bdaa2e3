use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category used when the caller does not pick one.
pub const DEFAULT_FILE_CATEGORY: &str = "chat";

/// File hosted by the platform. Its content is written separately, with a
/// `PUT` of the raw bytes to `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub id: i64,
    pub url: String,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub file_type: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
}

/// Query parameters for creating a file object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFile {
    pub category: String,
    pub file_type: Option<String>,
}

impl NewFile {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            file_type: None,
        }
    }

    pub fn file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = Some(file_type.into());
        self
    }
}

impl Default for NewFile {
    fn default() -> Self {
        Self::new(DEFAULT_FILE_CATEGORY)
    }
}
