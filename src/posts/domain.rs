use crate::{
    posts::dto::{PostCreate, PostUpdate},
    providers::ClockHolder,
    users::domain::User,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: Option<i64>,
    pub content: String,
    pub created_at: i64,
    pub modified_at: Option<i64>,
    pub writer: User,
}

impl Post {
    pub fn from_create(writer: User, req: PostCreate, clock: &dyn ClockHolder) -> Self {
        Self {
            id: None,
            content: req.content,
            created_at: clock.millis(),
            modified_at: None,
            writer,
        }
    }

    pub fn update(&self, req: PostUpdate, clock: &dyn ClockHolder) -> Self {
        Self {
            content: req.content,
            modified_at: Some(clock.millis()),
            ..self.clone()
        }
    }
}
