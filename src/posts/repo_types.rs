use sqlx::FromRow;

use crate::{
    posts::domain::Post,
    users::domain::User,
};

/// Post joined with its writer.
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: i64,
    pub content: String,
    pub created_at: i64,
    pub modified_at: Option<i64>,
    pub writer_id: i64,
    pub writer_email: String,
    pub writer_nickname: String,
    pub writer_address: String,
    pub writer_certification_code: String,
    pub writer_status: String,
    pub writer_last_login_at: Option<i64>,
}

impl TryFrom<PostRow> for Post {
    type Error = anyhow::Error;

    fn try_from(r: PostRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Some(r.id),
            content: r.content,
            created_at: r.created_at,
            modified_at: r.modified_at,
            writer: User {
                id: Some(r.writer_id),
                email: r.writer_email,
                nickname: r.writer_nickname,
                address: r.writer_address,
                certification_code: r.writer_certification_code,
                status: r.writer_status.parse()?,
                last_login_at: r.writer_last_login_at,
            },
        })
    }
}
