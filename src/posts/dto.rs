use serde::{Deserialize, Serialize};

use crate::{posts::domain::Post, users::dto::UserResponse};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCreate {
    pub writer_id: i64,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostUpdate {
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: Option<i64>,
    pub content: String,
    pub created_at: i64,
    pub modified_at: Option<i64>,
    pub writer: UserResponse,
}

impl From<Post> for PostResponse {
    fn from(p: Post) -> Self {
        Self {
            id: p.id,
            content: p.content,
            created_at: p.created_at,
            modified_at: p.modified_at,
            writer: p.writer.into(),
        }
    }
}
