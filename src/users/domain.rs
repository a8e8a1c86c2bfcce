use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    providers::{ClockHolder, UuidHolder},
    users::dto::{UserCreate, UserUpdate},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Pending,
    Active,
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Pending => "PENDING",
            UserStatus::Active => "ACTIVE",
            UserStatus::Inactive => "INACTIVE",
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(UserStatus::Pending),
            "ACTIVE" => Ok(UserStatus::Active),
            "INACTIVE" => Ok(UserStatus::Inactive),
            other => anyhow::bail!("unknown user status {:?}", other),
        }
    }
}

/// A user as the domain sees it. Never mutated in place: every transition
/// returns a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Option<i64>,
    pub email: String,
    pub nickname: String,
    pub address: String,
    pub certification_code: String,
    pub status: UserStatus,
    pub last_login_at: Option<i64>,
}

impl User {
    pub fn from_create(req: UserCreate, uuid: &dyn UuidHolder) -> Self {
        Self {
            id: None,
            email: req.email,
            nickname: req.nickname,
            address: req.address,
            certification_code: uuid.random(),
            status: UserStatus::Pending,
            last_login_at: None,
        }
    }

    pub fn update(&self, req: UserUpdate) -> Self {
        Self {
            nickname: req.nickname,
            address: req.address,
            ..self.clone()
        }
    }

    pub fn login(&self, clock: &dyn ClockHolder) -> Self {
        Self {
            status: UserStatus::Active,
            last_login_at: Some(clock.millis()),
            ..self.clone()
        }
    }

    pub fn certificate(&self, certification_code: &str) -> AppResult<Self> {
        if self.certification_code != certification_code {
            return Err(AppError::CertificationCodeNotMatched);
        }
        Ok(Self {
            status: UserStatus::Active,
            ..self.clone()
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}
