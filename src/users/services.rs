use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    error::{AppError, AppResult},
    providers::{ClockHolder, UuidHolder},
    users::{
        certification::CertificationService,
        domain::{User, UserStatus},
        dto::{UserCreate, UserUpdate},
        repo::{DuplicateEmail, UserRepository},
    },
};

const RESOURCE: &str = "Users";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    certification: CertificationService,
    clock: Arc<dyn ClockHolder>,
    uuid: Arc<dyn UuidHolder>,
}

impl UserService {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        certification: CertificationService,
        clock: Arc<dyn ClockHolder>,
        uuid: Arc<dyn UuidHolder>,
    ) -> Self {
        Self {
            repo,
            certification,
            clock,
            uuid,
        }
    }

    /// Active user with this email; pending users are reported as missing.
    pub async fn get_by_email(&self, email: &str) -> AppResult<User> {
        self.repo
            .find_by_email_and_status(email, UserStatus::Active)
            .await?
            .ok_or_else(|| AppError::not_found(RESOURCE, email))
    }

    /// Active user with this id; pending users are reported as missing.
    pub async fn get_by_id(&self, id: i64) -> AppResult<User> {
        self.repo
            .find_by_id_and_status(id, UserStatus::Active)
            .await?
            .ok_or_else(|| AppError::not_found(RESOURCE, id))
    }

    pub async fn create(&self, req: UserCreate) -> AppResult<User> {
        if self.repo.find_by_email(&req.email).await?.is_some() {
            warn!(email = %req.email, "email already registered");
            return Err(AppError::Conflict("Email already registered".into()));
        }

        let user = User::from_create(req, self.uuid.as_ref());
        let user = self.repo.save(user).await.map_err(|e| {
            if e.downcast_ref::<DuplicateEmail>().is_some() {
                AppError::Conflict("Email already registered".into())
            } else {
                AppError::Internal(e)
            }
        })?;
        let id = user.id.ok_or_else(|| anyhow::anyhow!("store returned user without id"))?;

        // delivery is best-effort; the account exists either way
        if let Err(e) = self
            .certification
            .send(&user.email, id, &user.certification_code)
            .await
        {
            warn!(error = %e, user_id = id, email = %user.email, "certification mail not sent");
        }

        info!(user_id = id, email = %user.email, "user created");
        Ok(user)
    }

    pub async fn update(&self, id: i64, req: UserUpdate) -> AppResult<User> {
        let user = self.find_any(id).await?.update(req);
        let user = self.repo.save(user).await?;
        info!(user_id = id, "user updated");
        Ok(user)
    }

    pub async fn login(&self, id: i64) -> AppResult<User> {
        let user = self.find_any(id).await?.login(self.clock.as_ref());
        let user = self.repo.save(user).await?;
        info!(user_id = id, last_login_at = ?user.last_login_at, "user logged in");
        Ok(user)
    }

    pub async fn verify_email(&self, id: i64, certification_code: &str) -> AppResult<User> {
        let user = match self.find_any(id).await?.certificate(certification_code) {
            Ok(u) => u,
            Err(e) => {
                warn!(user_id = id, "certification code mismatch");
                return Err(e);
            }
        };
        let user = self.repo.save(user).await?;
        info!(user_id = id, "email verified");
        Ok(user)
    }

    async fn find_any(&self, id: i64) -> AppResult<User> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(RESOURCE, id))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::{mail::FakeMailSender, users::domain::fixtures};

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@test.com"));
        assert!(!is_valid_email("a@test"));
        assert!(!is_valid_email("not an email"));
    }

    #[tokio::test]
    async fn get_by_email_finds_active_user() {
        let h = harness().await;
        let user = h.service.get_by_email("tester@test.com").await.unwrap();
        assert_eq!(user.email, "tester@test.com");
    }

    #[tokio::test]
    async fn get_by_email_hides_pending_user() {
        let h = harness().await;
        let err = h.service.get_by_email("tester2@test.com").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn get_by_id_finds_active_user() {
        let h = harness().await;
        let user = h.service.get_by_id(1).await.unwrap();
        assert_eq!(user.id, Some(1));
    }

    #[tokio::test]
    async fn get_by_id_hides_pending_user() {
        let h = harness().await;
        let err = h.service.get_by_id(2).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn get_by_id_reports_missing_user() {
        let h = harness().await;
        let err = h.service.get_by_id(404).await.unwrap_err();
        assert_eq!(err.to_string(), "Users with id 404 not found");
    }

    #[tokio::test]
    async fn create_stores_pending_user_and_mails_code() {
        let h = harness().await;
        let user = h
            .service
            .create(UserCreate {
                email: "tester3@test.com".into(),
                nickname: "tester3".into(),
                address: "Seoul".into(),
            })
            .await
            .unwrap();

        assert!(user.id.is_some());
        assert_eq!(user.email, "tester3@test.com");
        assert_eq!(user.nickname, "tester3");
        assert_eq!(user.address, "Seoul");
        assert_eq!(user.status, UserStatus::Pending);
        assert_eq!(user.certification_code, fixtures::CODE);

        let sent = h.mail.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].email, "tester3@test.com");
        assert!(sent[0].content.contains(fixtures::CODE));
    }

    #[tokio::test]
    async fn created_user_is_invisible_until_verified() {
        let h = harness().await;
        let user = h
            .service
            .create(UserCreate {
                email: "a@test.com".into(),
                nickname: "a".into(),
                address: "Busan".into(),
            })
            .await
            .unwrap();
        let id = user.id.unwrap();

        assert!(matches!(
            h.service.get_by_email("a@test.com").await,
            Err(AppError::NotFound { .. })
        ));

        h.service.verify_email(id, fixtures::CODE).await.unwrap();
        let found = h.service.get_by_email("a@test.com").await.unwrap();
        assert_eq!(found.id, Some(id));
    }

    #[tokio::test]
    async fn create_rejects_taken_email_even_if_pending() {
        let h = harness().await;
        let err = h
            .service
            .create(UserCreate {
                email: "tester2@test.com".into(),
                nickname: "again".into(),
                address: "Seoul".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(h.mail.sent().await.is_empty());
    }

    #[tokio::test]
    async fn create_succeeds_when_mail_fails() {
        let h = harness_with(FakeMailSender::failing()).await;
        let user = h
            .service
            .create(UserCreate {
                email: "tester3@test.com".into(),
                nickname: "tester3".into(),
                address: "Seoul".into(),
            })
            .await
            .expect("creation does not depend on delivery");
        let stored = h.repo.find_by_id(user.id.unwrap()).await.unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn update_changes_profile_only() {
        let h = harness().await;
        let before = h.repo.find_by_id(1).await.unwrap().unwrap();
        h.service
            .update(
                1,
                UserUpdate {
                    nickname: "tester1".into(),
                    address: "Jeju".into(),
                },
            )
            .await
            .unwrap();

        let user = h.service.get_by_id(1).await.unwrap();
        assert_eq!(user.nickname, "tester1");
        assert_eq!(user.address, "Jeju");
        assert_eq!(user.email, before.email);
        assert_eq!(user.certification_code, before.certification_code);
        assert_eq!(user.status, before.status);
    }

    #[tokio::test]
    async fn update_reaches_pending_user() {
        let h = harness().await;
        let user = h
            .service
            .update(
                2,
                UserUpdate {
                    nickname: "n".into(),
                    address: "a".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(user.status, UserStatus::Pending);
    }

    #[tokio::test]
    async fn login_refreshes_last_login_of_active_user() {
        let h = harness().await;
        h.repo
            .save(User {
                last_login_at: Some(1),
                ..fixtures::user(1, "tester@test.com", UserStatus::Active)
            })
            .await
            .unwrap();

        h.service.login(1).await.unwrap();
        let user = h.service.get_by_id(1).await.unwrap();
        assert_eq!(user.last_login_at, Some(fixtures::NOW));
        assert_eq!(user.status, UserStatus::Active);
    }

    #[tokio::test]
    async fn login_activates_pending_user() {
        let h = harness().await;
        let user = h.service.login(2).await.unwrap();
        assert_eq!(user.status, UserStatus::Active);
        assert!(h.service.get_by_id(2).await.is_ok());
    }

    #[tokio::test]
    async fn verify_email_with_correct_code_activates() {
        let h = harness().await;
        h.service.verify_email(2, fixtures::CODE).await.unwrap();
        let user = h.service.get_by_id(2).await.unwrap();
        assert_eq!(user.status, UserStatus::Active);
    }

    #[tokio::test]
    async fn verify_email_with_wrong_code_fails_and_keeps_pending() {
        let h = harness().await;
        let err = h
            .service
            .verify_email(2, "aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaab")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CertificationCodeNotMatched));

        let stored = h.repo.find_by_id(2).await.unwrap().unwrap();
        assert_eq!(stored.status, UserStatus::Pending);
    }

    #[tokio::test]
    async fn verify_email_unknown_user_is_not_found() {
        let h = harness().await;
        let err = h.service.verify_email(99, fixtures::CODE).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
