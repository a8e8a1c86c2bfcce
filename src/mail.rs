use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::MailConfig;

#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, email: &str, title: &str, content: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailSender {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let builder = match (&config.smtp_username, &config.smtp_password) {
            (Some(user), Some(pass)) => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
                .context("configure smtp relay")?
                .credentials(Credentials::new(user.clone(), pass.clone())),
            // local catchers (mailhog, mailpit) speak plain smtp without auth
            _ => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host),
        };

        Ok(Self {
            transport: builder.port(config.smtp_port).build(),
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl MailSender for SmtpMailSender {
    async fn send(&self, email: &str, title: &str, content: &str) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.parse().context("parse from address")?)
            .to(email.parse().context("parse recipient address")?)
            .subject(title)
            .header(ContentType::TEXT_PLAIN)
            .body(content.to_string())
            .context("build mail message")?;

        self.transport
            .send(message)
            .await
            .with_context(|| format!("smtp send to {}", email))?;
        info!(%email, "mail sent");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub email: String,
    pub title: String,
    pub content: String,
}

/// Keeps every message in memory instead of delivering it.
#[derive(Default)]
pub struct FakeMailSender {
    sent: Mutex<Vec<SentMail>>,
    failing: bool,
}

impl FakeMailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender whose every delivery fails.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub async fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl MailSender for FakeMailSender {
    async fn send(&self, email: &str, title: &str, content: &str) -> anyhow::Result<()> {
        if self.failing {
            anyhow::bail!("mail transport unavailable");
        }
        debug!(%email, %title, "fake mail recorded");
        self.sent.lock().await.push(SentMail {
            email: email.to_string(),
            title: title.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }
}
