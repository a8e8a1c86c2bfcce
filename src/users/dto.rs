use serde::{Deserialize, Serialize};

use crate::users::domain::{User, UserStatus};

/// Request body for registration.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub nickname: String,
    pub address: String,
}

/// Request body for profile changes.
#[derive(Debug, Clone, Deserialize)]
pub struct UserUpdate {
    pub nickname: String,
    pub address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyQuery {
    pub certification_code: String,
}

/// Public view of a user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Option<i64>,
    pub email: String,
    pub nickname: String,
    pub status: UserStatus,
    pub last_login_at: Option<i64>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            nickname: u.nickname,
            status: u.status,
            last_login_at: u.last_login_at,
        }
    }
}

/// What the owner sees about themselves; includes the address.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyProfileResponse {
    pub id: Option<i64>,
    pub email: String,
    pub nickname: String,
    pub address: String,
    pub status: UserStatus,
    pub last_login_at: Option<i64>,
}

impl From<User> for MyProfileResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            nickname: u.nickname,
            address: u.address,
            status: u.status,
            last_login_at: u.last_login_at,
        }
    }
}
