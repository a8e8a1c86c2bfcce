use std::sync::Arc;

use tracing::info;

use crate::{
    error::{AppError, AppResult},
    posts::{
        domain::Post,
        dto::{PostCreate, PostUpdate},
        repo::PostRepository,
    },
    providers::ClockHolder,
    users::services::UserService,
};

#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostRepository>,
    users: UserService,
    clock: Arc<dyn ClockHolder>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>, users: UserService, clock: Arc<dyn ClockHolder>) -> Self {
        Self { repo, users, clock }
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Post> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Posts", id))
    }

    /// Only active users may write.
    pub async fn create(&self, req: PostCreate) -> AppResult<Post> {
        let writer = self.users.get_by_id(req.writer_id).await?;
        let post = Post::from_create(writer, req, self.clock.as_ref());
        let post = self.repo.save(post).await?;
        info!(post_id = ?post.id, writer_id = ?post.writer.id, "post created");
        Ok(post)
    }

    pub async fn update(&self, id: i64, req: PostUpdate) -> AppResult<Post> {
        let post = self.get_by_id(id).await?.update(req, self.clock.as_ref());
        let post = self.repo.save(post).await?;
        info!(post_id = id, "post updated");
        Ok(post)
    }
}
