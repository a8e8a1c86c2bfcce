use std::collections::BTreeMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::users::{
    domain::{User, UserStatus},
    repo_types::UserRow,
};

/// Raised by `save` when another row already holds the email.
#[derive(Debug, thiserror::Error)]
#[error("email {0} already registered")]
pub struct DuplicateEmail(pub String);

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts when `user.id` is `None`, otherwise writes the row under that id,
    /// creating it if missing. Fails with [`DuplicateEmail`] when the email
    /// belongs to another row.
    async fn save(&self, user: User) -> anyhow::Result<User>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;
    /// Any status.
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id_and_status(&self, id: i64, status: UserStatus)
        -> anyhow::Result<Option<User>>;
    async fn find_by_email_and_status(
        &self,
        email: &str,
        status: UserStatus,
    ) -> anyhow::Result<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn save(&self, user: User) -> anyhow::Result<User> {
        let res = match user.id {
            None => {
                sqlx::query_as::<_, UserRow>(
                    r#"
                INSERT INTO users (email, nickname, address, certification_code, status, last_login_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, email, nickname, address, certification_code, status, last_login_at
                "#,
                )
                .bind(&user.email)
                .bind(&user.nickname)
                .bind(&user.address)
                .bind(&user.certification_code)
                .bind(user.status.as_str())
                .bind(user.last_login_at)
                .fetch_one(&self.db)
                .await
            }
            Some(id) => {
                sqlx::query_as::<_, UserRow>(
                    r#"
                INSERT INTO users (id, email, nickname, address, certification_code, status, last_login_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (id) DO UPDATE
                   SET email = EXCLUDED.email, nickname = EXCLUDED.nickname,
                       address = EXCLUDED.address,
                       certification_code = EXCLUDED.certification_code,
                       status = EXCLUDED.status, last_login_at = EXCLUDED.last_login_at
                RETURNING id, email, nickname, address, certification_code, status, last_login_at
                "#,
                )
                .bind(id)
                .bind(&user.email)
                .bind(&user.nickname)
                .bind(&user.address)
                .bind(&user.certification_code)
                .bind(user.status.as_str())
                .bind(user.last_login_at)
                .fetch_one(&self.db)
                .await
            }
        };

        let row = match res {
            Ok(row) => row,
            Err(e) if is_email_violation(&e) => {
                return Err(DuplicateEmail(user.email).into());
            }
            Err(e) => {
                return Err(anyhow::Error::new(e).context(format!("save user {:?}", user.id)));
            }
        };
        row.try_into()
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, nickname, address, certification_code, status, last_login_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, nickname, address, certification_code, status, last_login_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_id_and_status(
        &self,
        id: i64,
        status: UserStatus,
    ) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, nickname, address, certification_code, status, last_login_at
            FROM users
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.db)
        .await
        .context("find user by id and status")?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_email_and_status(
        &self,
        email: &str,
        status: UserStatus,
    ) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, nickname, address, certification_code, status, last_login_at
            FROM users
            WHERE email = $1 AND status = $2
            "#,
        )
        .bind(email)
        .bind(status.as_str())
        .fetch_optional(&self.db)
        .await
        .context("find user by email and status")?;
        row.map(User::try_from).transpose()
    }
}

fn is_email_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|d| d.is_unique_violation() && d.constraint() == Some("users_email_key"))
        .unwrap_or(false)
}

/// Map-backed store used by tests and local runs without Postgres.
#[derive(Default)]
pub struct InMemoryUserRepository {
    rows: RwLock<BTreeMap<i64, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn save(&self, user: User) -> anyhow::Result<User> {
        let mut rows = self.rows.write().await;
        if rows
            .values()
            .any(|u| u.email == user.email && u.id != user.id)
        {
            return Err(DuplicateEmail(user.email).into());
        }
        let id = match user.id {
            Some(id) => id,
            None => rows.keys().next_back().map_or(1, |last| last + 1),
        };
        let stored = User {
            id: Some(id),
            ..user
        };
        rows.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id_and_status(
        &self,
        id: i64,
        status: UserStatus,
    ) -> anyhow::Result<Option<User>> {
        Ok(self
            .rows
            .read()
            .await
            .get(&id)
            .filter(|u| u.status == status)
            .cloned())
    }

    async fn find_by_email_and_status(
        &self,
        email: &str,
        status: UserStatus,
    ) -> anyhow::Result<Option<User>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|u| u.email == email && u.status == status)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::domain::fixtures;

    #[tokio::test]
    async fn in_memory_save_assigns_increasing_ids() {
        let repo = InMemoryUserRepository::new();
        let mut first = fixtures::user(0, "a@test.com", UserStatus::Pending);
        first.id = None;
        let mut second = first.clone();
        second.email = "b@test.com".into();

        let first = repo.save(first).await.unwrap();
        let second = repo.save(second).await.unwrap();
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
    }

    #[tokio::test]
    async fn in_memory_save_with_id_overwrites() {
        let repo = InMemoryUserRepository::new();
        let user = repo
            .save(fixtures::user(5, "a@test.com", UserStatus::Pending))
            .await
            .unwrap();
        let active = User {
            status: UserStatus::Active,
            ..user
        };
        repo.save(active).await.unwrap();
        let found = repo.find_by_id(5).await.unwrap().expect("row exists");
        assert_eq!(found.status, UserStatus::Active);
    }

    #[tokio::test]
    async fn in_memory_save_rejects_email_of_another_row() {
        let repo = InMemoryUserRepository::new();
        repo.save(fixtures::user(1, "dup@test.com", UserStatus::Pending))
            .await
            .unwrap();
        let mut second = fixtures::user(0, "dup@test.com", UserStatus::Pending);
        second.id = None;

        let err = repo.save(second).await.unwrap_err();
        assert!(err.downcast_ref::<DuplicateEmail>().is_some());
        assert!(repo.find_by_id(2).await.unwrap().is_none());

        // rewriting the owner of the email is fine
        repo.save(fixtures::user(1, "dup@test.com", UserStatus::Active))
            .await
            .expect("same row keeps its email");
    }

    #[tokio::test]
    async fn find_by_email_ignores_status() {
        let repo = InMemoryUserRepository::new();
        repo.save(fixtures::user(1, "p@test.com", UserStatus::Pending))
            .await
            .unwrap();
        let found = repo.find_by_email("p@test.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(Some(1)));
        assert!(repo.find_by_email("x@test.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn status_filtered_lookups_skip_other_statuses() {
        let repo = InMemoryUserRepository::new();
        repo.save(fixtures::user(1, "p@test.com", UserStatus::Pending))
            .await
            .unwrap();

        assert!(repo.find_by_id(1).await.unwrap().is_some());
        assert!(repo
            .find_by_id_and_status(1, UserStatus::Active)
            .await
            .unwrap()
            .is_none());
        assert!(repo
            .find_by_email_and_status("p@test.com", UserStatus::Active)
            .await
            .unwrap()
            .is_none());
        assert!(repo
            .find_by_email_and_status("p@test.com", UserStatus::Pending)
            .await
            .unwrap()
            .is_some());
    }
}

#[cfg(test)]
mod pg_tests {
    use super::*;
    use crate::users::domain::fixtures;

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL"]
    async fn save_with_unknown_id_inserts(pool: PgPool) {
        let repo = PgUserRepository::new(pool);
        let saved = repo
            .save(fixtures::user(42, "a@test.com", UserStatus::Pending))
            .await
            .unwrap();
        assert_eq!(saved.id, Some(42));

        let active = repo
            .save(User {
                status: UserStatus::Active,
                ..saved
            })
            .await
            .unwrap();
        assert_eq!(active.status, UserStatus::Active);
        assert_eq!(
            repo.find_by_id(42).await.unwrap().map(|u| u.status),
            Some(UserStatus::Active)
        );
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL"]
    async fn save_maps_taken_email_to_duplicate(pool: PgPool) {
        let repo = PgUserRepository::new(pool);
        let mut first = fixtures::user(0, "dup@test.com", UserStatus::Pending);
        first.id = None;
        repo.save(first.clone()).await.unwrap();

        let err = repo.save(first).await.unwrap_err();
        assert!(err.downcast_ref::<DuplicateEmail>().is_some());
    }
}
