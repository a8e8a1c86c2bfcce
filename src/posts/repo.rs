use std::{collections::BTreeMap, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::{
    posts::{domain::Post, repo_types::PostRow},
    users::repo::UserRepository,
};

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn save(&self, post: Post) -> anyhow::Result<Post>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Post>>;
}

#[derive(Clone)]
pub struct PgPostRepository {
    db: PgPool,
}

impl PgPostRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn save(&self, post: Post) -> anyhow::Result<Post> {
        let writer_id = post.writer.id.context("post writer has no id")?;
        let id = match post.id {
            None => sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO posts (content, created_at, modified_at, writer_id)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(&post.content)
            .bind(post.created_at)
            .bind(post.modified_at)
            .bind(writer_id)
            .fetch_one(&self.db)
            .await
            .context("insert post")?,
            Some(id) => sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO posts (id, content, created_at, modified_at, writer_id)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO UPDATE
                   SET content = EXCLUDED.content, created_at = EXCLUDED.created_at,
                       modified_at = EXCLUDED.modified_at, writer_id = EXCLUDED.writer_id
                RETURNING id
                "#,
            )
            .bind(id)
            .bind(&post.content)
            .bind(post.created_at)
            .bind(post.modified_at)
            .bind(writer_id)
            .fetch_one(&self.db)
            .await
            .with_context(|| format!("save post {}", id))?,
        };
        Ok(Post {
            id: Some(id),
            ..post
        })
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT p.id, p.content, p.created_at, p.modified_at,
                   u.id AS writer_id, u.email AS writer_email, u.nickname AS writer_nickname,
                   u.address AS writer_address,
                   u.certification_code AS writer_certification_code,
                   u.status AS writer_status, u.last_login_at AS writer_last_login_at
              FROM posts p
              JOIN users u ON u.id = p.writer_id
             WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find post by id")?;
        row.map(Post::try_from).transpose()
    }
}

/// Keeps posts by id and writers by reference: the writer is looked up in
/// the user store on every read, the way the SQL join does.
pub struct InMemoryPostRepository {
    users: Arc<dyn UserRepository>,
    rows: RwLock<BTreeMap<i64, Post>>,
}

impl InMemoryPostRepository {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self {
            users,
            rows: RwLock::default(),
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn save(&self, post: Post) -> anyhow::Result<Post> {
        let writer_id = post.writer.id.context("post writer has no id")?;
        if self.users.find_by_id(writer_id).await?.is_none() {
            anyhow::bail!("writer {} does not exist", writer_id);
        }

        let mut rows = self.rows.write().await;
        let id = match post.id {
            Some(id) => id,
            None => rows.keys().next_back().map_or(1, |last| last + 1),
        };
        let stored = Post {
            id: Some(id),
            ..post
        };
        rows.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Post>> {
        let Some(post) = self.rows.read().await.get(&id).cloned() else {
            return Ok(None);
        };
        let writer_id = post.writer.id.context("post writer has no id")?;
        Ok(self
            .users
            .find_by_id(writer_id)
            .await?
            .map(|writer| Post { writer, ..post }))
    }
}
