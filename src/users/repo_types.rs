use sqlx::FromRow;

use crate::users::domain::User;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub nickname: String,
    pub address: String,
    pub certification_code: String,
    pub status: String,             // PENDING | ACTIVE | INACTIVE
    pub last_login_at: Option<i64>, // epoch millis
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Some(r.id),
            email: r.email,
            nickname: r.nickname,
            address: r.address,
            certification_code: r.certification_code,
            status: r.status.parse()?,
            last_login_at: r.last_login_at,
        })
    }
}
