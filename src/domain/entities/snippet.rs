use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored group snippet. Rows are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: i64,
    pub from_user_uin: i64,
    pub from_user_display: String,
    pub from_group: i64,
    pub image_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Fields supplied by the caller when recording a snippet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSnippet {
    pub from_user_uin: i64,
    pub from_user_display: String,
    pub from_group: i64,
    pub image_path: String,
}
