use std::sync::Arc;

use tracing::debug;

use crate::{error::AppResult, mail::MailSender};

pub const CERTIFICATION_TITLE: &str = "Please certify your email address";

/// Issues verification mails for freshly registered users.
#[derive(Clone)]
pub struct CertificationService {
    mail_sender: Arc<dyn MailSender>,
    base_url: String,
}

impl CertificationService {
    pub fn new(mail_sender: Arc<dyn MailSender>, base_url: impl Into<String>) -> Self {
        Self {
            mail_sender,
            base_url: base_url.into(),
        }
    }

    pub async fn send(&self, email: &str, user_id: i64, certification_code: &str) -> AppResult<()> {
        let url = self.certification_url(user_id, certification_code);
        let content = format!(
            "Please click the following link to certify your email address: {}",
            url
        );
        debug!(%email, user_id, "sending certification mail");
        self.mail_sender
            .send(email, CERTIFICATION_TITLE, &content)
            .await?;
        Ok(())
    }

    fn certification_url(&self, user_id: i64, certification_code: &str) -> String {
        format!(
            "{}/api/users/{}/verify?certificationCode={}",
            self.base_url.trim_end_matches('/'),
            user_id,
            certification_code
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::FakeMailSender;

    #[tokio::test]
    async fn send_mails_link_with_code() {
        let sender = Arc::new(FakeMailSender::new());
        let service = CertificationService::new(sender.clone(), "http://localhost:8080/");

        service
            .send("tester@test.com", 1, "aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa")
            .await
            .expect("send succeeds");

        let sent = sender.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].email, "tester@test.com");
        assert_eq!(sent[0].title, CERTIFICATION_TITLE);
        assert!(sent[0].content.contains(
            "http://localhost:8080/api/users/1/verify?certificationCode=aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa"
        ));
    }

    #[tokio::test]
    async fn send_surfaces_transport_failure() {
        let service = CertificationService::new(Arc::new(FakeMailSender::failing()), "http://x");
        assert!(service.send("a@test.com", 1, "code").await.is_err());
    }
}
