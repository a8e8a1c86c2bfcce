use crate::config::AppConfig;
use crate::mail::{FakeMailSender, MailSender, SmtpMailSender};
use crate::posts::{
    repo::{InMemoryPostRepository, PgPostRepository, PostRepository},
    services::PostService,
};
use crate::providers::{
    ClockHolder, FixedClockHolder, FixedUuidHolder, SystemClockHolder, SystemUuidHolder,
    UuidHolder,
};
use crate::users::{
    certification::CertificationService,
    repo::{InMemoryUserRepository, PgUserRepository, UserRepository},
    services::UserService,
};
use anyhow::Context;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Option<PgPool>,
    pub config: Arc<AppConfig>,
    pub users: UserService,
    pub posts: PostService,
}

/// Collaborators the services are built from.
pub struct Parts {
    pub user_repo: Arc<dyn UserRepository>,
    pub post_repo: Arc<dyn PostRepository>,
    pub mail_sender: Arc<dyn MailSender>,
    pub clock: Arc<dyn ClockHolder>,
    pub uuid: Arc<dyn UuidHolder>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let mail_sender =
            Arc::new(SmtpMailSender::new(&config.mail).context("build smtp mail sender")?)
                as Arc<dyn MailSender>;

        let parts = Parts {
            user_repo: Arc::new(PgUserRepository::new(db.clone())),
            post_repo: Arc::new(PgPostRepository::new(db.clone())),
            mail_sender,
            clock: Arc::new(SystemClockHolder),
            uuid: Arc::new(SystemUuidHolder),
        };
        Ok(Self::from_parts(Some(db), config, parts))
    }

    pub fn from_parts(db: Option<PgPool>, config: Arc<AppConfig>, parts: Parts) -> Self {
        let certification = CertificationService::new(parts.mail_sender, config.base_url.clone());
        let users = UserService::new(
            parts.user_repo,
            certification,
            parts.clock.clone(),
            parts.uuid,
        );
        let posts = PostService::new(parts.post_repo, users.clone(), parts.clock);
        Self {
            db,
            config,
            users,
            posts,
        }
    }

    /// In-memory state with fixed time and token, for tests and local poking.
    pub fn fake() -> Self {
        Self::fake_with(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(FakeMailSender::new()),
        )
    }

    pub fn fake_with(user_repo: Arc<dyn UserRepository>, mail_sender: Arc<dyn MailSender>) -> Self {
        let parts = Parts {
            post_repo: Arc::new(InMemoryPostRepository::new(user_repo.clone())),
            user_repo,
            mail_sender,
            clock: Arc::new(FixedClockHolder(1_678_530_673_958)),
            uuid: Arc::new(FixedUuidHolder(
                "aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa".into(),
            )),
        };
        Self::from_parts(None, Arc::new(AppConfig::test()), parts)
    }
}
